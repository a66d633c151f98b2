//! ## provbana-core::events
//! **Timed scenario events and the queue that orders them**
//!
//! An `Event` is a named, one-shot action bound to a scenario time. Running an
//! event may yield follow-up events which the driver schedules in turn. The
//! `EventQueue` always hands out the event with the smallest time first and
//! keeps insertion order among events sharing a time.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::error::Error;
use std::fmt;

use crate::time::Time;

/// Error type produced by event actions. Anything thread-safe goes.
pub type ActionError = Box<dyn Error + Send + Sync + 'static>;

/// Outcome of running an event: follow-up events or a failure.
pub type ActionResult = Result<Vec<Event>, ActionError>;

type Action = Box<dyn FnOnce() -> ActionResult + Send>;

pub struct Event {
    time: Time,
    name: String,
    action: Action,
}

impl Event {
    /// Creates an event whose action may return successor events.
    pub fn new<F>(time: Time, name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> ActionResult + Send + 'static,
    {
        Self {
            time,
            name: name.into(),
            action: Box::new(action),
        }
    }

    /// Creates an event whose action never produces successors.
    pub fn single<F>(time: Time, name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Result<(), ActionError> + Send + 'static,
    {
        Self::new(time, name, move || action().map(|_| Vec::new()))
    }

    /// An event that does nothing when run. Useful as a marker.
    pub fn noop(time: Time, name: impl Into<String>) -> Self {
        Self::new(time, name, || Ok(Vec::new()))
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consumes the event and executes its action.
    pub fn run(self) -> ActionResult {
        (self.action)()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.time)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Min-time priority queue of pending events. Events sharing a time are
/// handed out in insertion order, so instances of one group scheduled
/// together run in the order they were declared.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Queued>,
    inserted: u64,
}

#[derive(Debug)]
struct Queued {
    seq: u64,
    event: Event,
}

impl Queued {
    fn key(&self) -> (Time, u64) {
        (self.event.time, self.seq)
    }
}

// Reversed so the std max-heap pops the earliest entry.
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: Event) {
        let seq = self.inserted;
        self.inserted += 1;
        self.heap.push(Queued { seq, event });
    }

    pub fn add_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            self.add(event);
        }
    }

    /// Removes and returns the event with the earliest time.
    pub fn next(&mut self) -> Option<Event> {
        self.heap.pop().map(|queued| queued.event)
    }

    /// Time of the next event without removing it.
    pub fn peek_time(&self) -> Option<Time> {
        self.heap.peek().map(|queued| queued.event.time)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    #[test]
    fn empty_queue_yields_nothing() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        assert!(queue.next().is_none());
        assert_eq!(queue.peek_time(), None);
    }

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.add(Event::noop(Time::from_secs(3), "c"));
        queue.add(Event::noop(Time::from_secs(1), "a"));
        queue.add(Event::noop(Time::from_secs(2), "b"));
        assert_eq!(queue.len(), 3);

        let names: Vec<_> = std::iter::from_fn(|| queue.next())
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn run_returns_successors() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let event = Event::new(Time::ZERO, "parent", move || {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(vec![Event::noop(Time::from_secs(1), "child")])
        });

        let successors = event.run().unwrap();
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].name(), "child");
    }

    #[test]
    fn single_propagates_failure() {
        let event = Event::single(Time::ZERO, "broken", || Err("boom".into()));
        let err = event.run().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    proptest! {
        #[test]
        fn pop_order_is_non_decreasing(times in proptest::collection::vec(0u64..10_000, 0..200)) {
            let mut queue = EventQueue::new();
            queue.add_all(times.iter().map(|t| Event::noop(Time::from_nanos(*t), "e")));
            prop_assert_eq!(queue.len(), times.len());

            let mut last = Time::ZERO;
            let mut popped = 0;
            while let Some(event) = queue.next() {
                prop_assert!(event.time() >= last);
                last = event.time();
                popped += 1;
            }
            prop_assert_eq!(popped, times.len());
        }
    }

    #[test]
    fn same_time_events_keep_insertion_order() {
        let mut queue = EventQueue::new();
        queue.add(Event::noop(Time::from_secs(2), "late"));
        for name in ["first", "second", "third"] {
            queue.add(Event::noop(Time::from_secs(1), name));
        }
        let names: Vec<_> = std::iter::from_fn(|| queue.next())
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, ["first", "second", "third", "late"]);
    }
}
