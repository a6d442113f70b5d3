//! Per-person output records

use serde::{Deserialize, Serialize};

use crate::core::types::{LesionId, PersonId, Time};
use crate::model::{DiseaseMessage, DiseaseState, LesionState, TestOutcome};

/// A disease statechart transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub person_id: PersonId,
    pub time: Time,
    pub old_state: DiseaseState,
    pub new_state: DiseaseState,
    /// Message that caused the transition
    pub cause: DiseaseMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LesionChange {
    pub person_id: PersonId,
    pub lesion_id: LesionId,
    pub time: Time,
    pub old_state: LesionState,
    pub new_state: LesionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub person_id: PersonId,
    pub time: Time,
    pub outcome: TestOutcome,
    pub had_active_lesion: bool,
}

/// Everything recorded over one simulated lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonHistory {
    pub person_id: PersonId,
    pub entry_age: Time,
    /// Sampled age at death from other causes
    pub expected_lifespan: Time,
    pub state_changes: Vec<StateChange>,
    pub lesion_changes: Vec<LesionChange>,
    pub tests: Vec<TestRecord>,
    /// Cure protocols that removed at least one lesion
    pub cures: u32,
}

impl PersonHistory {
    pub fn new(person_id: PersonId, entry_age: Time, expected_lifespan: Time) -> Self {
        Self {
            person_id,
            entry_age,
            expected_lifespan,
            state_changes: Vec::new(),
            lesion_changes: Vec::new(),
            tests: Vec::new(),
            cures: 0,
        }
    }

    pub fn final_state(&self) -> Option<DiseaseState> {
        self.state_changes.last().map(|change| change.new_state)
    }

    pub fn death(&self) -> Option<&StateChange> {
        self.state_changes
            .last()
            .filter(|change| change.new_state == DiseaseState::Dead)
    }

    pub fn died_of_cancer(&self) -> bool {
        self.death()
            .is_some_and(|change| change.cause == DiseaseMessage::CancerDeath)
    }

    /// Tests the person attended
    pub fn tests_performed(&self) -> usize {
        self.tests
            .iter()
            .filter(|test| test.outcome != TestOutcome::Skipped)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(time: Time, old_state: DiseaseState, new_state: DiseaseState, cause: DiseaseMessage) -> StateChange {
        StateChange {
            person_id: PersonId(1),
            time,
            old_state,
            new_state,
            cause,
        }
    }

    #[test]
    fn test_empty_history_has_no_death() {
        let history = PersonHistory::new(PersonId(1), 0.0, 80.0);
        assert_eq!(history.final_state(), None);
        assert!(history.death().is_none());
        assert!(!history.died_of_cancer());
    }

    #[test]
    fn test_cancer_death_detected() {
        let mut history = PersonHistory::new(PersonId(1), 0.0, 80.0);
        history.state_changes.push(change(10.0, DiseaseState::Healthy, DiseaseState::Polyp, DiseaseMessage::PolypOnset));
        history.state_changes.push(change(20.0, DiseaseState::Polyp, DiseaseState::Dead, DiseaseMessage::CancerDeath));
        assert_eq!(history.final_state(), Some(DiseaseState::Dead));
        assert!(history.died_of_cancer());
    }

    #[test]
    fn test_skipped_tests_not_counted() {
        let mut history = PersonHistory::new(PersonId(1), 0.0, 80.0);
        for (time, outcome) in [(50.0, TestOutcome::Negative), (55.0, TestOutcome::Skipped), (60.0, TestOutcome::Positive)] {
            history.tests.push(TestRecord {
                person_id: PersonId(1),
                time,
                outcome,
                had_active_lesion: false,
            });
        }
        assert_eq!(history.tests_performed(), 2);
    }

    #[test]
    fn test_state_change_serializes_flat() {
        let json = serde_json::to_string(&change(45.0, DiseaseState::Healthy, DiseaseState::Dead, DiseaseMessage::OtherDeath)).unwrap();
        assert_eq!(
            json,
            r#"{"person_id":1,"time":45.0,"old_state":"Healthy","new_state":"Dead","cause":"OtherDeath"}"#
        );
    }
}
