//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation time, measured in years since birth.
///
/// Time and age are the same quantity: a person's clock starts at their
/// entry age and every scheduled event is an age.
pub type Time = f64;

/// Unique identifier for a simulated person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub u64);

impl PersonId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a lesion, unique within its owning person
///
/// Lesion ids are dense indices into the person's lesion collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LesionId(pub usize);

impl LesionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Demographic record for one simulated individual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonSpec {
    pub id: PersonId,
    /// Age at which the simulation of this person starts
    #[serde(default)]
    pub entry_age: Time,
}

impl PersonSpec {
    /// A person simulated from birth
    pub fn new(id: u64) -> Self {
        Self {
            id: PersonId(id),
            entry_age: 0.0,
        }
    }

    pub fn with_entry_age(mut self, entry_age: Time) -> Self {
        self.entry_age = entry_age;
        self
    }
}
