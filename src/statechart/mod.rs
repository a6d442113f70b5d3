//! Generic transition-table statechart engine
//!
//! A machine is described once, as a static table of
//! `(from, message) -> (to, effect)` rows. `Statechart::send` looks the
//! current state and message up in the table; a miss is not an error, the
//! message simply has no effect in that state. A hit moves the chart and
//! hands the row's effect back to the caller, which owns the context the
//! effect needs (scheduler, random stream, sibling charts).

use std::fmt::Debug;

/// One transition: in state `from`, `message` moves the chart to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<S, M, E> {
    pub from: S,
    pub message: M,
    pub to: S,
    pub effect: E,
}

impl<S, M, E> Row<S, M, E> {
    pub const fn new(from: S, message: M, to: S, effect: E) -> Self {
        Self {
            from,
            message,
            to,
            effect,
        }
    }
}

/// A state machine definition: states, messages, effects and the table
pub trait Machine: Debug + Clone + Copy + PartialEq {
    type State: Debug + Clone + Copy + PartialEq + Eq + 'static;
    type Message: Debug + Clone + Copy + PartialEq + Eq + 'static;
    type Effect: Debug + Clone + Copy + PartialEq + 'static;

    /// Used in trace output
    const NAME: &'static str;
    const INITIAL: Self::State;
    const TABLE: &'static [Row<Self::State, Self::Message, Self::Effect>];
}

/// Result of a message that matched a table row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired<T: Machine> {
    pub from: T::State,
    pub to: T::State,
    pub message: T::Message,
    pub effect: T::Effect,
}

impl<T: Machine> Fired<T> {
    /// True when the row moved the chart to a different state
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// A running instance of machine `T`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statechart<T: Machine> {
    current: T::State,
}

impl<T: Machine> Statechart<T> {
    pub fn new() -> Self {
        Self {
            current: T::INITIAL,
        }
    }

    pub fn current(&self) -> T::State {
        self.current
    }

    /// Deliver `message`; returns the fired row, or `None` if ignored
    pub fn send(&mut self, message: T::Message) -> Option<Fired<T>> {
        let Some(row) = lookup::<T>(self.current, message) else {
            tracing::trace!(machine = T::NAME, state = ?self.current, ?message, "ignored");
            return None;
        };

        let from = self.current;
        self.current = row.to;
        Some(Fired {
            from,
            to: row.to,
            message,
            effect: row.effect,
        })
    }
}

impl<T: Machine> Default for Statechart<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<T: Machine>(
    state: T::State,
    message: T::Message,
) -> Option<&'static Row<T::State, T::Message, T::Effect>> {
    T::TABLE
        .iter()
        .find(|row| row.from == state && row.message == message)
}

/// Check that no `(from, message)` pair appears twice in `T::TABLE`
pub fn check_table<T: Machine>() -> Result<(), String> {
    for (i, row) in T::TABLE.iter().enumerate() {
        if let Some(dup) = T::TABLE[i + 1..]
            .iter()
            .find(|other| other.from == row.from && other.message == row.message)
        {
            return Err(format!(
                "{}: duplicate transition for ({:?}, {:?}): {:?} and {:?}",
                T::NAME,
                row.from,
                row.message,
                row.to,
                dup.to
            ));
        }
    }
    Ok(())
}
