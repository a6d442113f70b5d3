//! Population runner
//!
//! Simulates each person to completion with a fresh scheduler and a random
//! stream derived from the run seed and the person's position in the input,
//! then collects the per-person histories in input order. Because no state
//! is shared between people, `run` and `run_parallel` produce identical logs.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::rng::RandomStream;
use crate::core::types::{PersonId, PersonSpec};
use crate::person::{Person, PersonHistory, StateChange};

/// What to do when one person's simulation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop the whole run and return the error
    #[default]
    Abort,
    /// Drop that person's output, record the failure, and continue
    SkipPerson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPerson {
    pub id: PersonId,
    pub reason: String,
}

/// Output of a population run, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationLog {
    pub histories: Vec<PersonHistory>,
    pub skipped: Vec<SkippedPerson>,
}

/// Population-level counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub people: usize,
    pub skipped: usize,
    pub cancer_deaths: usize,
    pub other_deaths: usize,
    pub cures: u64,
    pub tests_performed: usize,
    pub mean_expected_lifespan: f64,
}

impl PopulationLog {
    /// Every disease state change, person by person in time order
    pub fn state_changes(&self) -> impl Iterator<Item = &StateChange> {
        self.histories
            .iter()
            .flat_map(|history| history.state_changes.iter())
    }

    pub fn summary(&self) -> PopulationSummary {
        let mut summary = PopulationSummary {
            people: self.histories.len(),
            skipped: self.skipped.len(),
            ..PopulationSummary::default()
        };

        let mut lifespan_total = 0.0;
        for history in &self.histories {
            if history.died_of_cancer() {
                summary.cancer_deaths += 1;
            } else if history.death().is_some() {
                summary.other_deaths += 1;
            }
            summary.cures += u64::from(history.cures);
            summary.tests_performed += history.tests_performed();
            lifespan_total += history.expected_lifespan;
        }
        if summary.people > 0 {
            summary.mean_expected_lifespan = lifespan_total / summary.people as f64;
        }
        summary
    }
}

#[derive(Debug, Clone)]
pub struct PopulationRunner {
    config: SimulationConfig,
    seed: u64,
    policy: FailurePolicy,
}

impl PopulationRunner {
    /// Fails with `Configuration` if any parameter is outside its domain
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            policy: FailurePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Simulate the people one after another
    pub fn run(&self, people: &[PersonSpec]) -> Result<PopulationLog> {
        tracing::info!(people = people.len(), seed = self.seed, "population run starting");
        let results = people
            .iter()
            .enumerate()
            .map(|(index, spec)| (spec.id, self.simulate(index, *spec)));
        self.collect(results)
    }

    /// Simulate the people on the rayon thread pool
    ///
    /// Produces the same log as `run` for the same seed and input.
    pub fn run_parallel(&self, people: &[PersonSpec]) -> Result<PopulationLog> {
        tracing::info!(
            people = people.len(),
            seed = self.seed,
            threads = rayon::current_num_threads(),
            "parallel population run starting"
        );
        let results: Vec<(PersonId, Result<PersonHistory>)> = people
            .par_iter()
            .enumerate()
            .map(|(index, spec)| (spec.id, self.simulate(index, *spec)))
            .collect();
        self.collect(results)
    }

    fn simulate(&self, index: usize, spec: PersonSpec) -> Result<PersonHistory> {
        let rng = RandomStream::for_person(self.seed, index as u64);
        Person::simulate(spec, &self.config, rng)
    }

    fn collect(
        &self,
        results: impl IntoIterator<Item = (PersonId, Result<PersonHistory>)>,
    ) -> Result<PopulationLog> {
        let mut log = PopulationLog::default();
        for (id, result) in results {
            match result {
                Ok(history) => log.histories.push(history),
                Err(err) => match self.policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::SkipPerson => {
                        tracing::warn!(person = %id, error = %err, "skipping person");
                        log.skipped.push(SkippedPerson {
                            id,
                            reason: err.to_string(),
                        });
                    }
                },
            }
        }

        let summary = log.summary();
        tracing::info!(
            people = summary.people,
            skipped = summary.skipped,
            cancer_deaths = summary.cancer_deaths,
            other_deaths = summary.other_deaths,
            "population run complete"
        );
        Ok(log)
    }
}

/// Ids `0..count`, all entering at age zero
pub fn cohort(count: u64) -> Vec<PersonSpec> {
    (0..count).map(PersonSpec::new).collect()
}

/// Reject runs whose people would collide in the output
pub fn check_unique_ids(people: &[PersonSpec]) -> Result<()> {
    let mut seen = ahash::AHashSet::with_capacity(people.len());
    for spec in people {
        if !seen.insert(spec.id) {
            return Err(SimError::Configuration(format!(
                "duplicate person id {}",
                spec.id
            )));
        }
    }
    Ok(())
}
