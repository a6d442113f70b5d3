//! Lesion natural history: Polyp -> Cancer -> Dead
//!
//! Each stage schedules its own exit on entry, with an exponential sojourn
//! time. A cure moves an active lesion to `Removed`, after which any
//! progression event still in the queue is ignored.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::rng::Draw;
use crate::core::types::{LesionId, Time};
use crate::statechart::{Machine, Row, Statechart};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LesionState {
    Uninitialized,
    Polyp,
    Cancer,
    Dead,
    Removed,
}

impl LesionState {
    /// Polyp or cancer: detectable by a test and removable by a cure
    pub fn is_active(&self) -> bool {
        matches!(self, LesionState::Polyp | LesionState::Cancer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LesionMessage {
    Init,
    BecomeCancer,
    KillPerson,
    Cure,
}

/// A stage whose exit is scheduled on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progression {
    PolypToCancer,
    CancerToDeath,
}

impl Progression {
    pub fn draw(&self) -> Draw {
        match self {
            Progression::PolypToCancer => Draw::PolypToCancer,
            Progression::CancerToDeath => Draw::CancerToDeath,
        }
    }

    /// Mean sojourn time in this stage
    pub fn mean(&self, config: &SimulationConfig) -> f64 {
        match self {
            Progression::PolypToCancer => config.polyp_to_cancer_mean,
            Progression::CancerToDeath => config.cancer_to_dead_mean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LesionEffect {
    None,
    /// Sample a sojourn time and schedule `next` for this lesion
    ScheduleProgression {
        stage: Progression,
        next: LesionMessage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LesionMachine;

impl Machine for LesionMachine {
    type State = LesionState;
    type Message = LesionMessage;
    type Effect = LesionEffect;

    const NAME: &'static str = "lesion";
    const INITIAL: LesionState = LesionState::Uninitialized;
    const TABLE: &'static [Row<LesionState, LesionMessage, LesionEffect>] = &[
        Row::new(
            LesionState::Uninitialized,
            LesionMessage::Init,
            LesionState::Polyp,
            LesionEffect::ScheduleProgression {
                stage: Progression::PolypToCancer,
                next: LesionMessage::BecomeCancer,
            },
        ),
        Row::new(
            LesionState::Polyp,
            LesionMessage::BecomeCancer,
            LesionState::Cancer,
            LesionEffect::ScheduleProgression {
                stage: Progression::CancerToDeath,
                next: LesionMessage::KillPerson,
            },
        ),
        Row::new(
            LesionState::Cancer,
            LesionMessage::KillPerson,
            LesionState::Dead,
            LesionEffect::None,
        ),
        Row::new(
            LesionState::Polyp,
            LesionMessage::Cure,
            LesionState::Removed,
            LesionEffect::None,
        ),
        Row::new(
            LesionState::Cancer,
            LesionMessage::Cure,
            LesionState::Removed,
            LesionEffect::None,
        ),
    ];
}

/// One polyp and its progression chart, owned by a person
#[derive(Debug, Clone)]
pub struct Lesion {
    pub id: LesionId,
    pub created_at: Time,
    pub chart: Statechart<LesionMachine>,
}

impl Lesion {
    pub fn new(id: LesionId, created_at: Time) -> Self {
        Self {
            id,
            created_at,
            chart: Statechart::new(),
        }
    }

    pub fn state(&self) -> LesionState {
        self.chart.current()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }
}
