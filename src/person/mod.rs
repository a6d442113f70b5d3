//! One simulated person: lifespan clock, lesions, three statecharts
//!
//! Scheduled messages arrive through [`Receiver::receive`]. Everything a
//! single message causes (lesion change, disease re-evaluation, log entry,
//! cure) happens synchronously before control returns to the scheduler, so
//! no queued event ever observes a stale aggregate state.
//!
//! Synchronous chains are bounded: a scheduled lesion or creator event
//! reaches Lesion -> Disease, a test reaches Testing -> cure -> Lesion and
//! then Disease once. Nothing cascades back into Testing.

pub mod history;

pub use history::{LesionChange, PersonHistory, StateChange, TestRecord};

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::rng::{Draw, RandomSource};
use crate::core::types::{LesionId, PersonId, PersonSpec, Time};
use crate::model::{
    aggregate_state, eligibility, next_test_time, screening_result, CreatorEffect,
    CreatorMachine, CreatorMessage, CreatorState, DiseaseEffect, DiseaseMachine, DiseaseMessage,
    DiseaseState, Eligibility, Lesion, LesionEffect, LesionMessage, TestOutcome, TestingEffect,
    TestingMachine, TestingMessage, TestingState,
};
use crate::scheduler::{Receiver, RunOutcome, Scheduler};
use crate::statechart::Statechart;

/// Deepest synchronous cascade a single dispatched message may cause
pub const MAX_CASCADE_DEPTH: u8 = 4;

/// A message addressed to one of a person's statecharts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Disease(DiseaseMessage),
    Testing(TestingMessage),
    Creator(CreatorMessage),
    Lesion(LesionId, LesionMessage),
}

#[derive(Debug)]
pub struct Person<'a, R: RandomSource> {
    id: PersonId,
    config: &'a SimulationConfig,
    rng: R,
    lifespan: Time,
    other_death: bool,
    lesions: Vec<Lesion>,
    disease: Statechart<DiseaseMachine>,
    testing: Statechart<TestingMachine>,
    creator: Statechart<CreatorMachine>,
    history: PersonHistory,
    depth: u8,
    max_depth: u8,
}

impl<'a, R: RandomSource> Person<'a, R> {
    /// Create a person and sample their other-cause lifespan
    pub fn new(spec: PersonSpec, config: &'a SimulationConfig, mut rng: R) -> Self {
        let lifespan = rng.uniform_between(Draw::Lifespan, config.lifespan_min, config.lifespan_max);
        Self {
            id: spec.id,
            config,
            rng,
            lifespan,
            other_death: false,
            lesions: Vec::new(),
            disease: Statechart::new(),
            testing: Statechart::new(),
            creator: Statechart::new(),
            history: PersonHistory::new(spec.id, spec.entry_age, lifespan),
            depth: 0,
            max_depth: 0,
        }
    }

    /// Simulate one whole lifetime and return its history
    ///
    /// The history is only returned if the run completes; an error leaves
    /// nothing behind.
    pub fn simulate(spec: PersonSpec, config: &'a SimulationConfig, rng: R) -> Result<PersonHistory> {
        let mut scheduler = Scheduler::starting_at(spec.entry_age)?;
        let mut person = Person::new(spec, config, rng);
        person.start(&mut scheduler)?;
        let outcome = person.run(&mut scheduler)?;
        tracing::trace!(
            person = %person.id,
            dispatched = outcome.dispatched,
            discarded = outcome.discarded,
            "lifetime complete"
        );
        Ok(person.into_history())
    }

    /// Send `init` to every statechart and start the other-cause death clock
    ///
    /// The death clock is queued first so that a person whose lifespan is
    /// already behind them dies at entry before any test due at that instant.
    pub fn start(&mut self, scheduler: &mut Scheduler<Message>) -> Result<()> {
        self.disease.send(DiseaseMessage::Init);
        scheduler.add_event(
            self.lifespan.max(scheduler.now()),
            Message::Disease(DiseaseMessage::OtherDeath),
        )?;
        self.testing_transition(TestingMessage::Init, scheduler)?;
        self.creator_transition(CreatorMessage::Init, scheduler)
    }

    pub fn run(&mut self, scheduler: &mut Scheduler<Message>) -> Result<RunOutcome> {
        scheduler.run(self)
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn lifespan(&self) -> Time {
        self.lifespan
    }

    pub fn disease_state(&self) -> DiseaseState {
        self.disease.current()
    }

    pub fn testing_state(&self) -> TestingState {
        self.testing.current()
    }

    pub fn creator_state(&self) -> CreatorState {
        self.creator.current()
    }

    pub fn is_dead(&self) -> bool {
        self.disease_state() == DiseaseState::Dead
    }

    pub fn lesions(&self) -> &[Lesion] {
        &self.lesions
    }

    pub fn history(&self) -> &PersonHistory {
        &self.history
    }

    pub fn into_history(self) -> PersonHistory {
        self.history
    }

    /// Deepest synchronous cascade observed so far
    pub fn max_cascade_depth(&self) -> u8 {
        self.max_depth
    }

    /// Cure protocol: remove every polyp and cancer, then re-evaluate once
    ///
    /// Ignored for a dead person. A person with no active lesion is left
    /// unchanged and nothing is logged.
    pub fn cure(&mut self, scheduler: &mut Scheduler<Message>) -> Result<()> {
        if self.is_dead() {
            return Ok(());
        }

        self.cascade(|person| {
            let active: Vec<LesionId> = person
                .lesions
                .iter()
                .filter(|lesion| lesion.is_active())
                .map(|lesion| lesion.id)
                .collect();
            if active.is_empty() {
                return Ok(());
            }

            for id in &active {
                person.lesion_transition(*id, LesionMessage::Cure, false, scheduler)?;
            }
            person.history.cures += 1;
            tracing::debug!(
                person = %person.id,
                time = scheduler.now(),
                removed = active.len(),
                "cure"
            );
            person.reevaluate_disease(scheduler)
        })
    }

    fn cascade<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        debug_assert!(
            self.depth <= MAX_CASCADE_DEPTH,
            "cascade depth {} exceeds {}",
            self.depth,
            MAX_CASCADE_DEPTH
        );
        let out = f(self);
        self.depth -= 1;
        out
    }

    /// Recompute the aggregate disease state and move the chart there
    fn reevaluate_disease(&mut self, scheduler: &mut Scheduler<Message>) -> Result<()> {
        self.cascade(|person| {
            let target = aggregate_state(
                person.lesions.iter().map(Lesion::state),
                person.other_death,
            );
            if target == person.disease.current() {
                return Ok(());
            }
            let Some(message) = DiseaseMessage::toward(target, person.other_death) else {
                return Ok(());
            };
            let Some(fired) = person.disease.send(message) else {
                return Ok(());
            };

            let time = scheduler.now();
            if fired.effect != DiseaseEffect::None {
                tracing::debug!(
                    person = %person.id,
                    time,
                    from = ?fired.from,
                    to = ?fired.to,
                    cause = ?fired.message,
                    "disease transition"
                );
                person.history.state_changes.push(StateChange {
                    person_id: person.id,
                    time,
                    old_state: fired.from,
                    new_state: fired.to,
                    cause: fired.message,
                });
            }
            if fired.effect == DiseaseEffect::LogAndEnd {
                scheduler.end_simulation();
            }
            Ok(())
        })
    }

    fn lesion_transition(
        &mut self,
        id: LesionId,
        message: LesionMessage,
        reevaluate: bool,
        scheduler: &mut Scheduler<Message>,
    ) -> Result<()> {
        self.cascade(|person| {
            let Some(lesion) = person.lesions.get_mut(id.index()) else {
                tracing::warn!(person = %person.id, lesion = id.0, "message for unknown lesion");
                return Ok(());
            };
            let Some(fired) = lesion.chart.send(message) else {
                return Ok(());
            };

            person.history.lesion_changes.push(LesionChange {
                person_id: person.id,
                lesion_id: id,
                time: scheduler.now(),
                old_state: fired.from,
                new_state: fired.to,
            });

            if let LesionEffect::ScheduleProgression { stage, next } = fired.effect {
                let delay = person.rng.exponential(stage.draw(), stage.mean(person.config));
                scheduler.add_event_after(delay, Message::Lesion(id, next))?;
            }

            if reevaluate {
                person.reevaluate_disease(scheduler)?;
            }
            Ok(())
        })
    }

    fn creator_transition(
        &mut self,
        message: CreatorMessage,
        scheduler: &mut Scheduler<Message>,
    ) -> Result<()> {
        let Some(fired) = self.creator.send(message) else {
            return Ok(());
        };

        if fired.effect == CreatorEffect::SpawnAndScheduleNext {
            let id = LesionId(self.lesions.len());
            self.lesions.push(Lesion::new(id, scheduler.now()));
            self.lesion_transition(id, LesionMessage::Init, true, scheduler)?;
        }

        let delay = self
            .rng
            .exponential(Draw::LesionOnset, self.config.lesion_interarrival_mean);
        scheduler.add_event_after(delay, Message::Creator(CreatorMessage::CreateLesion))?;
        Ok(())
    }

    fn testing_transition(
        &mut self,
        message: TestingMessage,
        scheduler: &mut Scheduler<Message>,
    ) -> Result<()> {
        let Some(fired) = self.testing.send(message) else {
            return Ok(());
        };

        match fired.effect {
            TestingEffect::None => Ok(()),
            TestingEffect::ScheduleEligibility => match eligibility(scheduler.now(), self.config) {
                Eligibility::Now => self.cascade(|person| {
                    person.testing_transition(TestingMessage::ReachStartAge, scheduler)
                }),
                Eligibility::At(age) => {
                    scheduler.add_event(age, Message::Testing(TestingMessage::ReachStartAge))?;
                    Ok(())
                }
                Eligibility::Never => Ok(()),
            },
            TestingEffect::EnterRoutine => {
                scheduler.add_event(scheduler.now(), Message::Testing(TestingMessage::PerformTest))?;
                scheduler.add_event(
                    self.config.screening_end_age,
                    Message::Testing(TestingMessage::ReachEndAge),
                )?;
                Ok(())
            }
            TestingEffect::RunTest => self.perform_test(scheduler),
        }
    }

    fn perform_test(&mut self, scheduler: &mut Scheduler<Message>) -> Result<()> {
        let has_active_lesion = self.lesions.iter().any(Lesion::is_active);
        let outcome = screening_result(&mut self.rng, self.config, has_active_lesion);
        self.history.tests.push(TestRecord {
            person_id: self.id,
            time: scheduler.now(),
            outcome,
            had_active_lesion: has_active_lesion,
        });

        if outcome == TestOutcome::Positive {
            self.cure(scheduler)?;
        }

        if let Some(next) = next_test_time(scheduler.now(), self.config) {
            scheduler.add_event(next, Message::Testing(TestingMessage::PerformTest))?;
        }
        Ok(())
    }
}

impl<R: RandomSource> Receiver<Message> for Person<'_, R> {
    fn receive(&mut self, message: Message, scheduler: &mut Scheduler<Message>) -> Result<()> {
        if self.is_dead() {
            tracing::trace!(person = %self.id, ?message, "ignored after death");
            return Ok(());
        }

        match message {
            Message::Disease(DiseaseMessage::OtherDeath) => {
                self.other_death = true;
                self.reevaluate_disease(scheduler)
            }
            // Only other-cause death is ever scheduled; the rest are sent
            // synchronously by re-evaluation
            Message::Disease(message) => {
                tracing::trace!(person = %self.id, ?message, "unscheduled disease message ignored");
                Ok(())
            }
            Message::Testing(message) => self.testing_transition(message, scheduler),
            Message::Creator(message) => self.creator_transition(message, scheduler),
            Message::Lesion(id, message) => self.lesion_transition(id, message, true, scheduler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::{RandomStream, ScriptedSource};
    use crate::model::LesionState;

    fn started<'a>(
        config: &'a SimulationConfig,
        rng: ScriptedSource,
        entry_age: Time,
    ) -> (Person<'a, ScriptedSource>, Scheduler<Message>) {
        let mut scheduler = Scheduler::starting_at(entry_age).unwrap();
        let mut person = Person::new(PersonSpec::new(1).with_entry_age(entry_age), config, rng);
        person.start(&mut scheduler).unwrap();
        (person, scheduler)
    }

    #[test]
    fn test_start_initializes_every_chart() {
        let config = SimulationConfig::default();
        let (person, scheduler) = started(&config, ScriptedSource::new(), 0.0);

        assert_eq!(person.disease_state(), DiseaseState::Healthy);
        assert_eq!(person.testing_state(), TestingState::NoTesting);
        assert_eq!(person.creator_state(), CreatorState::Active);
        // Start age, other death, first lesion onset
        assert_eq!(scheduler.len(), 3);
        assert!(person.history().state_changes.is_empty());
    }

    #[test]
    fn test_entry_inside_window_enters_routine() {
        let config = SimulationConfig::default();
        let (person, _) = started(&config, ScriptedSource::new(), 60.0);
        assert_eq!(person.testing_state(), TestingState::Routine);
    }

    #[test]
    fn test_entry_after_window_never_tests() {
        let config = SimulationConfig::default();
        let rng = ScriptedSource::new().with(Draw::Lifespan, [85.0]);
        let (mut person, mut scheduler) = started(&config, rng, 80.0);
        assert_eq!(person.testing_state(), TestingState::NoTesting);

        person.run(&mut scheduler).unwrap();
        assert!(person.history().tests.is_empty());
    }

    #[test]
    fn test_lifespan_before_entry_dies_at_entry() {
        let config = SimulationConfig::default();
        let rng = ScriptedSource::new().with(Draw::Lifespan, [45.0]);
        let (mut person, mut scheduler) = started(&config, rng, 50.0);
        person.run(&mut scheduler).unwrap();

        let changes = &person.history().state_changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].time, 50.0);
        assert_eq!(changes[0].new_state, DiseaseState::Dead);
    }

    #[test]
    fn test_cure_on_healthy_person_logs_nothing() {
        let config = SimulationConfig::default();
        let (mut person, mut scheduler) = started(&config, ScriptedSource::new(), 0.0);

        person.cure(&mut scheduler).unwrap();
        person.cure(&mut scheduler).unwrap();

        assert_eq!(person.disease_state(), DiseaseState::Healthy);
        assert!(person.history().state_changes.is_empty());
        assert_eq!(person.history().cures, 0);
    }

    #[test]
    fn test_cure_after_death_cannot_resurrect() {
        let config = SimulationConfig::default();
        let rng = ScriptedSource::new()
            .with(Draw::Lifespan, [90.0])
            .with(Draw::LesionOnset, [5.0])
            .with(Draw::PolypToCancer, [1.0])
            .with(Draw::CancerToDeath, [1.0]);
        let (mut person, mut scheduler) = started(&config, rng, 0.0);
        person.run(&mut scheduler).unwrap();
        assert!(person.is_dead());

        let logged = person.history().state_changes.len();
        person.cure(&mut scheduler).unwrap();
        assert!(person.is_dead());
        assert_eq!(person.history().state_changes.len(), logged);
        assert_eq!(person.lesions()[0].state(), LesionState::Dead);
    }

    #[test]
    fn test_events_after_death_are_ignored() {
        let config = SimulationConfig::default();
        let rng = ScriptedSource::new().with(Draw::Lifespan, [45.0]);
        let (mut person, mut scheduler) = started(&config, rng, 0.0);
        person.run(&mut scheduler).unwrap();
        assert!(person.is_dead());

        let before = person.history().clone();
        scheduler.add_event(scheduler.now(), Message::Creator(CreatorMessage::CreateLesion)).unwrap();
        scheduler.add_event(scheduler.now() + 1.0, Message::Testing(TestingMessage::ReachStartAge)).unwrap();
        person.run(&mut scheduler).unwrap();

        assert!(person.lesions().is_empty());
        assert_eq!(person.history(), &before);
    }

    #[test]
    fn test_scheduled_disease_messages_other_than_death_are_ignored() {
        let config = SimulationConfig::default();
        let rng = ScriptedSource::new().with(Draw::Lifespan, [80.0]);
        let (mut person, mut scheduler) = started(&config, rng, 0.0);

        for message in [
            DiseaseMessage::Init,
            DiseaseMessage::PolypOnset,
            DiseaseMessage::CancerOnset,
            DiseaseMessage::CancerDeath,
        ] {
            scheduler.add_event(10.0, Message::Disease(message)).unwrap();
        }
        scheduler.run_until(&mut person, 20.0).unwrap();

        assert_eq!(person.disease_state(), DiseaseState::Healthy);
        assert!(person.history().state_changes.is_empty());
    }

    #[test]
    fn test_cascade_depth_stays_bounded() {
        let config = SimulationConfig::default();
        for seed in 0..200 {
            let spec = PersonSpec::new(seed);
            let mut scheduler = Scheduler::new();
            let mut person = Person::new(spec, &config, RandomStream::for_person(99, seed));
            person.start(&mut scheduler).unwrap();
            person.run(&mut scheduler).unwrap();
            assert!(person.max_cascade_depth() <= MAX_CASCADE_DEPTH);
            assert!(person.max_cascade_depth() >= 1);
        }
    }

    #[test]
    fn test_positive_test_cures_every_active_lesion() {
        let config = SimulationConfig::default();
        // Two lesions before 50; both cured by the first test
        let rng = ScriptedSource::new()
            .with(Draw::Lifespan, [88.0])
            .with(Draw::LesionOnset, [20.0, 15.0])
            .with(Draw::PolypToCancer, [25.0, 40.0])
            .with(Draw::CancerToDeath, [20.0])
            .with(Draw::TestResult, [0.0]);
        let (mut person, mut scheduler) = started(&config, rng, 0.0);
        person.run(&mut scheduler).unwrap();

        let lesions = person.lesions();
        assert_eq!(lesions.len(), 2);
        assert!(lesions.iter().all(|lesion| lesion.state() == LesionState::Removed));
        assert_eq!(person.history().cures, 1);

        let states: Vec<_> = person
            .history()
            .state_changes
            .iter()
            .map(|c| (c.time, c.old_state, c.new_state))
            .collect();
        assert_eq!(
            states,
            vec![
                (20.0, DiseaseState::Healthy, DiseaseState::Polyp),
                (45.0, DiseaseState::Polyp, DiseaseState::Cancer),
                (50.0, DiseaseState::Cancer, DiseaseState::Healthy),
                (88.0, DiseaseState::Healthy, DiseaseState::Dead),
            ]
        );
    }
}
