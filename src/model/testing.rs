//! Routine screening: NoTesting <-> Routine, gated by age
//!
//! Entry into `Routine` schedules the first test immediately and the exit
//! at the end of the screening window. Each test schedules the next one an
//! interval later unless that would fall at or after the end age.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::rng::{Draw, RandomSource};
use crate::core::types::Time;
use crate::statechart::{Machine, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestingState {
    Uninitialized,
    NoTesting,
    Routine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestingMessage {
    Init,
    ReachStartAge,
    PerformTest,
    ReachEndAge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestingEffect {
    None,
    /// Decide from the current age when routine testing begins
    ScheduleEligibility,
    /// Schedule the first test now and the exit at the end age
    EnterRoutine,
    /// Run a test and schedule the next one
    RunTest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestingMachine;

impl Machine for TestingMachine {
    type State = TestingState;
    type Message = TestingMessage;
    type Effect = TestingEffect;

    const NAME: &'static str = "testing";
    const INITIAL: TestingState = TestingState::Uninitialized;
    const TABLE: &'static [Row<TestingState, TestingMessage, TestingEffect>] = &[
        Row::new(
            TestingState::Uninitialized,
            TestingMessage::Init,
            TestingState::NoTesting,
            TestingEffect::ScheduleEligibility,
        ),
        Row::new(
            TestingState::NoTesting,
            TestingMessage::ReachStartAge,
            TestingState::Routine,
            TestingEffect::EnterRoutine,
        ),
        Row::new(
            TestingState::Routine,
            TestingMessage::PerformTest,
            TestingState::Routine,
            TestingEffect::RunTest,
        ),
        Row::new(
            TestingState::Routine,
            TestingMessage::ReachEndAge,
            TestingState::NoTesting,
            TestingEffect::None,
        ),
    ];
}

/// When a person starting at a given age becomes eligible for screening
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eligibility {
    /// Already inside the screening window
    Now,
    /// Eligible once the clock reaches this age
    At(Time),
    /// Past the screening window
    Never,
}

pub fn eligibility(age: Time, config: &SimulationConfig) -> Eligibility {
    if age < config.screening_start_age {
        Eligibility::At(config.screening_start_age)
    } else if age < config.screening_end_age {
        Eligibility::Now
    } else {
        Eligibility::Never
    }
}

/// Age of the next routine test after one at `now`, if still inside the window
pub fn next_test_time(now: Time, config: &SimulationConfig) -> Option<Time> {
    let next = now + config.screening_interval_years;
    (next < config.screening_end_age).then_some(next)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestOutcome {
    Positive,
    Negative,
    /// The person did not attend the test
    Skipped,
}

/// Run one routine test
///
/// With an active lesion the result is positive with probability
/// `test_sensitivity`; without one it is positive with probability
/// `1 - test_specificity`. The compliance draw is only taken when the
/// compliance rate is below one.
pub fn screening_result<R: RandomSource>(
    rng: &mut R,
    config: &SimulationConfig,
    has_active_lesion: bool,
) -> TestOutcome {
    if config.routine_compliance_rate < 1.0
        && !rng.bernoulli(Draw::TestCompliance, config.routine_compliance_rate)
    {
        return TestOutcome::Skipped;
    }

    let p_positive = if has_active_lesion {
        config.test_sensitivity
    } else {
        1.0 - config.test_specificity
    };

    if rng.bernoulli(Draw::TestResult, p_positive) {
        TestOutcome::Positive
    } else {
        TestOutcome::Negative
    }
}
