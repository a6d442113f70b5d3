//! Person-level disease state
//!
//! The chart's state is derived: after every lesion change, cure, or
//! other-cause death the person computes the aggregate state of its lesions
//! and sends the message that leads there. Rows exist only for real changes,
//! so a message toward the current state is ignored and logs nothing.
//! `Dead` has no outgoing rows.

use serde::{Deserialize, Serialize};

use crate::model::lesion::LesionState;
use crate::statechart::{Machine, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseState {
    Uninitialized,
    Healthy,
    Polyp,
    Cancer,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseMessage {
    Init,
    AllLesionsCleared,
    PolypOnset,
    CancerOnset,
    OtherDeath,
    CancerDeath,
}

impl DiseaseMessage {
    /// Message that drives the chart toward `target`
    ///
    /// `Dead` is reached through `OtherDeath` when the other-cause death
    /// clock has fired, otherwise through `CancerDeath`.
    pub fn toward(target: DiseaseState, other_death: bool) -> Option<Self> {
        match target {
            DiseaseState::Uninitialized => None,
            DiseaseState::Healthy => Some(DiseaseMessage::AllLesionsCleared),
            DiseaseState::Polyp => Some(DiseaseMessage::PolypOnset),
            DiseaseState::Cancer => Some(DiseaseMessage::CancerOnset),
            DiseaseState::Dead if other_death => Some(DiseaseMessage::OtherDeath),
            DiseaseState::Dead => Some(DiseaseMessage::CancerDeath),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiseaseEffect {
    None,
    /// Append the change to the person's log
    Log,
    /// Append the change and end the person's simulation
    LogAndEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiseaseMachine;

use DiseaseEffect as E;
use DiseaseMessage as M;
use DiseaseState as S;

impl Machine for DiseaseMachine {
    type State = DiseaseState;
    type Message = DiseaseMessage;
    type Effect = DiseaseEffect;

    const NAME: &'static str = "disease";
    const INITIAL: DiseaseState = S::Uninitialized;
    const TABLE: &'static [Row<DiseaseState, DiseaseMessage, DiseaseEffect>] = &[
        Row::new(S::Uninitialized, M::Init, S::Healthy, E::None),
        // Healthy
        Row::new(S::Healthy, M::PolypOnset, S::Polyp, E::Log),
        Row::new(S::Healthy, M::CancerOnset, S::Cancer, E::Log),
        Row::new(S::Healthy, M::OtherDeath, S::Dead, E::LogAndEnd),
        Row::new(S::Healthy, M::CancerDeath, S::Dead, E::LogAndEnd),
        // Polyp
        Row::new(S::Polyp, M::AllLesionsCleared, S::Healthy, E::Log),
        Row::new(S::Polyp, M::CancerOnset, S::Cancer, E::Log),
        Row::new(S::Polyp, M::OtherDeath, S::Dead, E::LogAndEnd),
        Row::new(S::Polyp, M::CancerDeath, S::Dead, E::LogAndEnd),
        // Cancer
        Row::new(S::Cancer, M::AllLesionsCleared, S::Healthy, E::Log),
        Row::new(S::Cancer, M::PolypOnset, S::Polyp, E::Log),
        Row::new(S::Cancer, M::OtherDeath, S::Dead, E::LogAndEnd),
        Row::new(S::Cancer, M::CancerDeath, S::Dead, E::LogAndEnd),
    ];
}

/// Aggregate disease state implied by a person's lesions
///
/// Other-cause death overrides everything. Otherwise any dead lesion means
/// `Dead`, any cancer means `Cancer`, any polyp means `Polyp`, and a person
/// whose lesions are all removed (or who has none) is `Healthy`.
pub fn aggregate_state(
    lesions: impl IntoIterator<Item = LesionState>,
    other_death: bool,
) -> DiseaseState {
    if other_death {
        return DiseaseState::Dead;
    }

    let mut state = DiseaseState::Healthy;
    for lesion in lesions {
        match lesion {
            LesionState::Dead => return DiseaseState::Dead,
            LesionState::Cancer => state = DiseaseState::Cancer,
            LesionState::Polyp if state == DiseaseState::Healthy => state = DiseaseState::Polyp,
            _ => {}
        }
    }
    state
}
