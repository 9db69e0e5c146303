//! Simulation time: whole-second timeline driven by a scheduled-event heap.
//!
//! All timestamps and `clock.now()` are in **simulation seconds** (second 0
//! is midnight of the service day; the service window is an interval inside
//! it). The timeline advances by popping the next scheduled event; events at
//! the same second run in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};
use log::warn;

/// One minute in simulation seconds.
pub const ONE_MIN_S: u64 = 60;
/// One hour in simulation seconds.
pub const ONE_HOUR_S: u64 = 60 * ONE_MIN_S;
/// Sample interval of every emitted coordinate stream.
pub const COORD_STEP_S: u64 = ONE_MIN_S;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    OrderPlaced,
    PrepComplete,
    ArriveAtMeeting,
    HandoffComplete,
    ReturnComplete,
    ServiceClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Order(Entity),
    Runner(Entity),
}

/// Simulation event. `timestamp` is in **seconds** (simulation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

/// Heap entry. `seq` is the insertion index: two events at the same second
/// pop in the order they were scheduled, which the output writers rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueuedEvent {
    event: Event,
    seq: u64,
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by (timestamp, insertion seq).
        other
            .event
            .timestamp
            .cmp(&self.event.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

/// Simulation clock: time in **seconds**, advances to the next scheduled event.
#[derive(Debug, Clone, Resource, Default)]
pub struct SimulationClock {
    /// Current simulation time in seconds (updated when an event is popped).
    now: u64,
    next_seq: u64,
    events: BinaryHeap<QueuedEvent>,
}

impl SimulationClock {
    /// Current simulation time in seconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule an event at a specific simulation timestamp (seconds).
    pub fn schedule_at(&mut self, at_s: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule(Event {
            timestamp: at_s,
            kind,
            subject,
        });
    }

    /// Schedule an event at `now + delta_s`.
    pub fn schedule_in(&mut self, delta_s: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now.saturating_add(delta_s), kind, subject);
    }

    /// Schedule a full event. A timestamp in the past is coerced to the
    /// current time and reported; events are never silently dropped.
    pub fn schedule(&mut self, mut event: Event) {
        if event.timestamp < self.now {
            warn!(
                "{:?} scheduled {}s in the past; coerced to t={}",
                event.kind,
                self.now - event.timestamp,
                self.now
            );
            event.timestamp = self.now;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(QueuedEvent { event, seq });
    }

    /// Pop the next event (earliest timestamp; same-second events in
    /// scheduling order). Advances `now` to that timestamp.
    pub fn pop_next(&mut self) -> Option<Event> {
        let queued = self.events.pop()?;
        self.now = queued.event.timestamp;
        Some(queued.event)
    }

    /// Timestamp of the next scheduled event without popping it.
    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|queued| queued.event.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events still in the queue (for tests and scenario validation).
    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(20, EventKind::OrderPlaced, None);
        clock.schedule_at(5, EventKind::OrderPlaced, None);
        clock.schedule_at(20, EventKind::ReturnComplete, None);
        clock.schedule_at(10, EventKind::OrderPlaced, None);

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5);
        assert_eq!(clock.now(), 5);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10);

        // Same timestamp (20): insertion order wins, not event kind.
        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20);
        assert_eq!(third.kind, EventKind::OrderPlaced);
        let fourth = clock.pop_next().expect("fourth event");
        assert_eq!(fourth.kind, EventKind::ReturnComplete);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn past_events_are_coerced_to_now_not_dropped() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(100, EventKind::OrderPlaced, None);
        clock.pop_next().expect("advance to t=100");

        clock.schedule_at(40, EventKind::PrepComplete, None);
        let coerced = clock.pop_next().expect("coerced event");
        assert_eq!(coerced.timestamp, 100);
        assert_eq!(coerced.kind, EventKind::PrepComplete);
    }

    #[test]
    fn schedule_in_is_relative_to_now() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(30, EventKind::OrderPlaced, None);
        clock.pop_next().expect("event");
        clock.schedule_in(15, EventKind::PrepComplete, None);
        assert_eq!(clock.next_event_time(), Some(45));
        assert_eq!(clock.pending_event_count(), 1);
    }
}
