//! The three per-person statecharts and the lesion chart
//!
//! Each machine is a static transition table over tagged-variant states;
//! `Person` interprets the effects.

pub mod creator;
pub mod disease;
pub mod lesion;
pub mod testing;

pub use creator::{CreatorEffect, CreatorMachine, CreatorMessage, CreatorState};
pub use disease::{aggregate_state, DiseaseEffect, DiseaseMachine, DiseaseMessage, DiseaseState};
pub use lesion::{Lesion, LesionEffect, LesionMachine, LesionMessage, LesionState, Progression};
pub use testing::{
    eligibility, next_test_time, screening_result, Eligibility, TestOutcome, TestingEffect,
    TestingMachine, TestingMessage, TestingState,
};
