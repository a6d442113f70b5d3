//! Lesion creator: a single active state that spawns lesions at
//! exponential inter-arrival times

use serde::{Deserialize, Serialize};

use crate::statechart::{Machine, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatorState {
    Uninitialized,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatorMessage {
    Init,
    CreateLesion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreatorEffect {
    /// Schedule the first lesion onset
    ScheduleNext,
    /// Create a lesion now, then schedule the next onset
    SpawnAndScheduleNext,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatorMachine;

impl Machine for CreatorMachine {
    type State = CreatorState;
    type Message = CreatorMessage;
    type Effect = CreatorEffect;

    const NAME: &'static str = "lesion-creator";
    const INITIAL: CreatorState = CreatorState::Uninitialized;
    const TABLE: &'static [Row<CreatorState, CreatorMessage, CreatorEffect>] = &[
        Row::new(
            CreatorState::Uninitialized,
            CreatorMessage::Init,
            CreatorState::Active,
            CreatorEffect::ScheduleNext,
        ),
        Row::new(
            CreatorState::Active,
            CreatorMessage::CreateLesion,
            CreatorState::Active,
            CreatorEffect::SpawnAndScheduleNext,
        ),
    ];
}
