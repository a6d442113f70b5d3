//! Random streams for the natural-history model
//!
//! Every draw is tagged with the purpose it serves. The production stream
//! ignores the tag; `ScriptedSource` uses it to replay fixed trajectories.

use std::collections::VecDeque;

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// What a random draw is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Draw {
    /// Age at death from causes other than colorectal cancer
    Lifespan,
    /// Waiting time until the next lesion appears
    LesionOnset,
    /// Sojourn time in the polyp stage
    PolypToCancer,
    /// Sojourn time in the cancer stage
    CancerToDeath,
    /// Whether a due routine test is attended
    TestCompliance,
    /// Outcome of a routine test
    TestResult,
}

/// Source of uniform variates, with the derived distributions the model uses
pub trait RandomSource {
    /// Uniform variate in [0, 1)
    fn uniform(&mut self, draw: Draw) -> f64;

    /// Uniform variate in [low, high)
    fn uniform_between(&mut self, draw: Draw, low: f64, high: f64) -> f64 {
        low + (high - low) * self.uniform(draw)
    }

    /// Exponential variate with the given mean (inverse transform)
    fn exponential(&mut self, draw: Draw, mean: f64) -> f64 {
        -mean * (1.0 - self.uniform(draw)).ln()
    }

    /// Bernoulli trial with success probability `p`
    fn bernoulli(&mut self, draw: Draw, p: f64) -> bool {
        self.uniform(draw) < p
    }
}

/// Deterministic pseudo-random stream backed by ChaCha8
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Independent stream for the person at `index` within a run
    ///
    /// Each index selects its own ChaCha stream under the run seed, so a
    /// person's draws do not depend on which other people were simulated
    /// before it or on which thread simulates it.
    pub fn for_person(seed: u64, index: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(index);
        Self { rng }
    }
}

impl RandomSource for RandomStream {
    fn uniform(&mut self, _draw: Draw) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays fixed values per draw purpose
///
/// `exponential` and `uniform_between` draws return the queued value
/// verbatim, i.e. the queue holds the sampled durations or ages themselves.
/// `uniform` and `bernoulli` draws consume a queued uniform variate. When a
/// queue runs dry the fallback applies: durations become [`Self::NEVER`],
/// ranges return their upper bound, and uniforms return a value just below 1
/// (so every Bernoulli trial with `p < 1` fails).
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    queues: AHashMap<Draw, VecDeque<f64>>,
}

impl ScriptedSource {
    /// Duration returned once a duration queue is exhausted
    pub const NEVER: f64 = 1.0e6;

    const UNIFORM_FALLBACK: f64 = 1.0 - f64::EPSILON;

    pub fn new() -> Self {
        Self::default()
    }

    /// Queue values for one draw purpose, in the order they will be consumed
    pub fn with(mut self, draw: Draw, values: impl IntoIterator<Item = f64>) -> Self {
        self.queues.entry(draw).or_default().extend(values);
        self
    }

    fn next(&mut self, draw: Draw) -> Option<f64> {
        self.queues.get_mut(&draw).and_then(VecDeque::pop_front)
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self, draw: Draw) -> f64 {
        self.next(draw).unwrap_or(Self::UNIFORM_FALLBACK)
    }

    fn uniform_between(&mut self, draw: Draw, _low: f64, high: f64) -> f64 {
        self.next(draw).unwrap_or(high)
    }

    fn exponential(&mut self, draw: Draw, _mean: f64) -> f64 {
        self.next(draw).unwrap_or(Self::NEVER)
    }
}
