//! Discrete-event scheduler
//!
//! Owns the simulation clock and the pending-event queue for one person's
//! lifetime. `run` pops the earliest event, advances the clock to it and
//! hands the message to a [`Receiver`], which may schedule further events
//! through the same scheduler. Events at identical times are dispatched in
//! insertion order, so a fixed seed always replays the same trajectory.
//!
//! Scheduled events cannot be cancelled; receivers ignore stale messages
//! with guard conditions instead.

mod queue;

pub use queue::{Dispatch, EventId, EventQueue, ScheduledEvent};

use std::fmt::Debug;

use crate::core::error::{Result, SimError};
use crate::core::types::Time;

/// Target of dispatched messages
pub trait Receiver<M> {
    fn receive(&mut self, message: M, scheduler: &mut Scheduler<M>) -> Result<()>;
}

/// Summary of one `Scheduler::run`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    /// Messages delivered to the receiver
    pub dispatched: u64,
    /// Events still queued when the run was ended
    pub discarded: usize,
    /// True when an end-of-simulation event stopped the run
    pub ended: bool,
    /// Clock value when the run returned
    pub final_time: Time,
}

#[derive(Debug)]
pub struct Scheduler<M> {
    queue: EventQueue<M>,
    now: Time,
    next_sequence: u64,
}

impl<M> Scheduler<M> {
    /// Scheduler with its clock at zero
    pub fn new() -> Self {
        Self {
            queue: EventQueue::new(),
            now: 0.0,
            next_sequence: 0,
        }
    }

    /// Scheduler with its clock at `start`, which must be a non-negative finite time
    pub fn starting_at(start: Time) -> Result<Self> {
        if !start.is_finite() || start < 0.0 {
            return Err(SimError::InvalidTime {
                time: start,
                now: 0.0,
            });
        }
        Ok(Self {
            now: start,
            ..Self::new()
        })
    }

    pub fn now(&self) -> Time {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule `message` for delivery at absolute time `time`
    ///
    /// Fails with `InvalidTime` if `time` is before the current clock or not finite.
    pub fn add_event(&mut self, time: Time, message: M) -> Result<EventId> {
        self.push(time, Dispatch::Deliver(message))
    }

    /// Schedule `message` for delivery `delay` years from now
    pub fn add_event_after(&mut self, delay: Time, message: M) -> Result<EventId> {
        self.push(self.now + delay, Dispatch::Deliver(message))
    }

    /// Schedule the terminal event at the current time
    ///
    /// Events already queued for this same instant still fire first.
    pub fn end_simulation(&mut self) -> EventId {
        let event = ScheduledEvent::new(self.now, self.take_sequence(), Dispatch::EndSimulation);
        let id = event.id();
        self.queue.schedule(event);
        id
    }

    /// Remove the earliest event and advance the clock to its time
    pub fn consume_next_event(&mut self) -> Option<ScheduledEvent<M>> {
        let event = self.queue.pop_earliest()?;
        self.now = event.time();
        Some(event)
    }

    fn push(&mut self, time: Time, dispatch: Dispatch<M>) -> Result<EventId> {
        if !time.is_finite() || time < self.now {
            return Err(SimError::InvalidTime {
                time,
                now: self.now,
            });
        }
        let event = ScheduledEvent::new(time, self.take_sequence(), dispatch);
        let id = event.id();
        self.queue.schedule(event);
        Ok(id)
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}

impl<M: Debug> Scheduler<M> {
    /// Dispatch events until the queue is empty or the simulation is ended
    ///
    /// A receiver error aborts the run immediately and is returned as is.
    pub fn run<R: Receiver<M>>(&mut self, receiver: &mut R) -> Result<RunOutcome> {
        self.run_until(receiver, f64::INFINITY)
    }

    /// Dispatch every event scheduled at or before `horizon`
    ///
    /// Later events stay queued and the clock stays at the last dispatched
    /// event, so a later `run` or `run_until` resumes where this one stopped.
    pub fn run_until<R: Receiver<M>>(
        &mut self,
        receiver: &mut R,
        horizon: Time,
    ) -> Result<RunOutcome> {
        let mut dispatched = 0;

        while self
            .queue
            .peek_earliest()
            .is_some_and(|event| event.time() <= horizon)
        {
            let Some(event) = self.consume_next_event() else {
                break;
            };
            match event.into_dispatch() {
                Dispatch::Deliver(message) => {
                    tracing::trace!(time = self.now, ?message, "dispatch");
                    receiver.receive(message, self)?;
                    dispatched += 1;
                }
                Dispatch::EndSimulation => {
                    let discarded = self.queue.clear();
                    tracing::trace!(time = self.now, discarded, "end of simulation");
                    return Ok(RunOutcome {
                        dispatched,
                        discarded,
                        ended: true,
                        final_time: self.now,
                    });
                }
            }
        }

        Ok(RunOutcome {
            dispatched,
            discarded: 0,
            ended: false,
            final_time: self.now,
        })
    }
}

impl<M> Default for Scheduler<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every delivery and optionally reschedules itself
    #[derive(Default)]
    struct Recorder {
        seen: Vec<(Time, &'static str)>,
    }

    impl Receiver<&'static str> for Recorder {
        fn receive(
            &mut self,
            message: &'static str,
            scheduler: &mut Scheduler<&'static str>,
        ) -> Result<()> {
            self.seen.push((scheduler.now(), message));
            match message {
                "spawn" => {
                    scheduler.add_event_after(1.0, "child")?;
                }
                "stop" => {
                    scheduler.end_simulation();
                }
                "rewind" => {
                    scheduler.add_event(scheduler.now() - 1.0, "past")?;
                }
                _ => {}
            }
            Ok(())
        }
    }

    #[test]
    fn test_new_scheduler_is_empty_at_time_zero() {
        let scheduler: Scheduler<&str> = Scheduler::new();
        assert_eq!(scheduler.now(), 0.0);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_consume_advances_clock() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event(2.5, "a").unwrap();
        let event = scheduler.consume_next_event().unwrap();
        assert_eq!(event.time(), 2.5);
        assert_eq!(scheduler.now(), 2.5);
        assert!(scheduler.consume_next_event().is_none());
    }

    #[test]
    fn test_delay_is_relative_to_clock() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event_after(1.0, "a").unwrap();
        scheduler.consume_next_event();
        scheduler.add_event_after(2.0, "b").unwrap();
        let event = scheduler.consume_next_event().unwrap();
        assert_eq!(event.time(), 3.0);
    }

    #[test]
    fn test_retroactive_event_rejected() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event(5.0, "a").unwrap();
        scheduler.consume_next_event();

        let err = scheduler.add_event(4.0, "late").unwrap_err();
        assert!(matches!(err, SimError::InvalidTime { time, now } if time == 4.0 && now == 5.0));

        // Same instant is allowed
        assert!(scheduler.add_event(5.0, "now").is_ok());
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.add_event(f64::NAN, "nan").is_err());
        assert!(scheduler.add_event(f64::INFINITY, "inf").is_err());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_starting_clock_validated() {
        assert_eq!(Scheduler::<&str>::starting_at(30.0).unwrap().now(), 30.0);
        assert!(Scheduler::<&str>::starting_at(-1.0).is_err());
        assert!(Scheduler::<&str>::starting_at(f64::NAN).is_err());
    }

    #[test]
    fn test_run_dispatches_ties_in_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event(4.0, "d").unwrap();
        scheduler.add_event(2.0, "b1").unwrap();
        scheduler.add_event(2.0, "b2").unwrap();
        scheduler.add_event(3.0, "c").unwrap();
        scheduler.add_event(2.0, "b3").unwrap();

        let mut recorder = Recorder::default();
        let outcome = scheduler.run(&mut recorder).unwrap();

        let order: Vec<_> = recorder.seen.iter().map(|(_, m)| *m).collect();
        assert_eq!(order, vec!["b1", "b2", "b3", "c", "d"]);
        assert_eq!(outcome.dispatched, 5);
        assert!(!outcome.ended);
        assert_eq!(outcome.final_time, 4.0);
    }

    #[test]
    fn test_run_until_stops_at_horizon_and_resumes() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event(1.0, "a").unwrap();
        scheduler.add_event(2.0, "b").unwrap();
        scheduler.add_event(5.0, "c").unwrap();

        let mut recorder = Recorder::default();
        let outcome = scheduler.run_until(&mut recorder, 2.0).unwrap();
        assert_eq!(recorder.seen, vec![(1.0, "a"), (2.0, "b")]);
        assert_eq!(outcome.dispatched, 2);
        assert!(!outcome.ended);
        assert_eq!(scheduler.now(), 2.0);
        assert_eq!(scheduler.len(), 1);

        scheduler.run(&mut recorder).unwrap();
        assert_eq!(recorder.seen.last(), Some(&(5.0, "c")));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_receiver_can_schedule_during_run() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event(1.0, "spawn").unwrap();
        let mut recorder = Recorder::default();
        scheduler.run(&mut recorder).unwrap();
        assert_eq!(recorder.seen, vec![(1.0, "spawn"), (2.0, "child")]);
    }

    #[test]
    fn test_end_simulation_discards_remaining() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event(1.0, "stop").unwrap();
        scheduler.add_event(1.0, "same-instant").unwrap();
        scheduler.add_event(9.0, "later").unwrap();

        let mut recorder = Recorder::default();
        let outcome = scheduler.run(&mut recorder).unwrap();

        // The tie queued before the terminal event still fires
        assert_eq!(recorder.seen, vec![(1.0, "stop"), (1.0, "same-instant")]);
        assert!(outcome.ended);
        assert_eq!(outcome.discarded, 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_receiver_error_aborts_run() {
        let mut scheduler = Scheduler::new();
        scheduler.add_event(3.0, "rewind").unwrap();
        scheduler.add_event(8.0, "never").unwrap();

        let mut recorder = Recorder::default();
        let err = scheduler.run(&mut recorder).unwrap_err();
        assert!(matches!(err, SimError::InvalidTime { .. }));
        assert_eq!(recorder.seen, vec![(3.0, "rewind")]);
    }
}
