//! Model parameters with documented defaults
//!
//! All distribution means and screening constants live here. The bundle is
//! read-only once a run starts; `validate` is called before any event is
//! scheduled.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Parameter bundle for the natural-history and screening model
///
/// Every duration is in years. Defaults are the base-model values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === LESION NATURAL HISTORY ===
    /// Mean of the exponential waiting time between lesion onsets
    ///
    /// At 60 years, most people develop zero or one lesion over a lifetime.
    pub lesion_interarrival_mean: f64,

    /// Mean of the exponential sojourn time from polyp to cancer
    pub polyp_to_cancer_mean: f64,

    /// Mean of the exponential sojourn time from cancer to death
    pub cancer_to_dead_mean: f64,

    // === SCREENING TEST ===
    /// Probability that a routine test is positive when at least one
    /// lesion is a polyp or cancer
    pub test_sensitivity: f64,

    /// Probability that a routine test is negative when no lesion is active
    ///
    /// At 1.0 there are no false positives.
    pub test_specificity: f64,

    /// Probability that a person attends a due routine test
    pub routine_compliance_rate: f64,

    // === SCREENING SCHEDULE ===
    /// Age at which routine testing begins
    pub screening_start_age: f64,

    /// Age at which routine testing stops
    ///
    /// Tests that would fall at or after this age are never scheduled.
    pub screening_end_age: f64,

    /// Years between consecutive routine tests
    pub screening_interval_years: f64,

    // === OTHER-CAUSE MORTALITY ===
    /// Lower bound of the uniform lifespan draw
    pub lifespan_min: f64,

    /// Upper bound of the uniform lifespan draw
    pub lifespan_max: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lesion_interarrival_mean: 60.0,
            polyp_to_cancer_mean: 30.0,
            cancer_to_dead_mean: 5.0,

            test_sensitivity: 0.6,
            test_specificity: 1.0,
            routine_compliance_rate: 1.0,

            screening_start_age: 50.0,
            screening_end_age: 75.0,
            screening_interval_years: 5.0,

            lifespan_min: 40.0,
            lifespan_max: 90.0,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML parameter file body. Missing keys take default values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate every parameter against its domain
    pub fn validate(&self) -> Result<()> {
        let means = [
            ("lesion_interarrival_mean", self.lesion_interarrival_mean),
            ("polyp_to_cancer_mean", self.polyp_to_cancer_mean),
            ("cancer_to_dead_mean", self.cancer_to_dead_mean),
        ];
        for (name, mean) in means {
            if !mean.is_finite() || mean <= 0.0 {
                return Err(SimError::Configuration(format!(
                    "{} must be a positive finite number, got {}",
                    name, mean
                )));
            }
        }

        let probabilities = [
            ("test_sensitivity", self.test_sensitivity),
            ("test_specificity", self.test_specificity),
            ("routine_compliance_rate", self.routine_compliance_rate),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }

        if !self.screening_start_age.is_finite() || self.screening_start_age < 0.0 {
            return Err(SimError::Configuration(format!(
                "screening_start_age must be a non-negative finite age, got {}",
                self.screening_start_age
            )));
        }
        if !self.screening_end_age.is_finite()
            || self.screening_end_age <= self.screening_start_age
        {
            return Err(SimError::Configuration(format!(
                "screening_end_age ({}) must be greater than screening_start_age ({})",
                self.screening_end_age, self.screening_start_age
            )));
        }
        if !self.screening_interval_years.is_finite() || self.screening_interval_years <= 0.0 {
            return Err(SimError::Configuration(format!(
                "screening_interval_years must be positive, got {}",
                self.screening_interval_years
            )));
        }

        if !self.lifespan_min.is_finite() || self.lifespan_min < 0.0 {
            return Err(SimError::Configuration(format!(
                "lifespan_min must be a non-negative finite age, got {}",
                self.lifespan_min
            )));
        }
        if !self.lifespan_max.is_finite() || self.lifespan_max < self.lifespan_min {
            return Err(SimError::Configuration(format!(
                "lifespan_max ({}) must not be below lifespan_min ({})",
                self.lifespan_max, self.lifespan_min
            )));
        }

        Ok(())
    }
}
