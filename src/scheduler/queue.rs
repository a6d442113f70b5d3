//! Time-ordered event queue with FIFO tie-breaking

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::core::types::Time;

/// Identifier of a scheduled event: its insertion sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// What happens when an event comes due
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<M> {
    /// Deliver the message to its target
    Deliver(M),
    /// Stop the run and discard everything still queued
    EndSimulation,
}

/// An event scheduled for a specific simulation time
#[derive(Debug, Clone)]
pub struct ScheduledEvent<M> {
    time: OrderedFloat<Time>,
    sequence: u64,
    dispatch: Dispatch<M>,
}

impl<M> ScheduledEvent<M> {
    pub fn new(time: Time, sequence: u64, dispatch: Dispatch<M>) -> Self {
        Self {
            time: OrderedFloat(time),
            sequence,
            dispatch,
        }
    }

    pub fn time(&self) -> Time {
        self.time.into_inner()
    }

    pub fn id(&self) -> EventId {
        EventId(self.sequence)
    }

    pub fn into_dispatch(self) -> Dispatch<M> {
        self.dispatch
    }
}

// Ordering looks only at (time, sequence); the payload never participates.
impl<M> PartialEq for ScheduledEvent<M> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.sequence == other.sequence
    }
}

impl<M> Eq for ScheduledEvent<M> {}

impl<M> PartialOrd for ScheduledEvent<M> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<M> Ord for ScheduledEvent<M> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for the max-heap: earliest time first, then earliest insertion
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ordering => ordering,
        }
    }
}

/// Priority queue of pending events
#[derive(Debug)]
pub struct EventQueue<M> {
    heap: BinaryHeap<ScheduledEvent<M>>,
}

impl<M> EventQueue<M> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn schedule(&mut self, event: ScheduledEvent<M>) {
        self.heap.push(event);
    }

    /// Removes and returns the earliest scheduled event
    pub fn pop_earliest(&mut self) -> Option<ScheduledEvent<M>> {
        self.heap.pop()
    }

    pub fn peek_earliest(&self) -> Option<&ScheduledEvent<M>> {
        self.heap.peek()
    }

    /// Drops every pending event, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.heap.len();
        self.heap.clear();
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

impl<M> Default for EventQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}
