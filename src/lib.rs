//! crcsim - Colorectal cancer natural history and screening simulation
//!
//! Each person is simulated independently by a discrete-event scheduler
//! driving three statecharts (disease, testing, lesion creation) and one
//! statechart per lesion.

pub mod core;
pub mod model;
pub mod person;
pub mod population;
pub mod scheduler;
pub mod statechart;
