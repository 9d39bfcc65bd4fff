//! Simulation events and the time-ordered event queue.
//!
//! Events are a tagged union rather than a trait hierarchy: the queue sees a
//! uniform type, dispatch is one `match`, and values move in and out of the
//! heap without shared ownership. An in-flight [`Event::Arrival`] owns its
//! [`Train`]; the engine takes the train out when the event fires and either
//! re-schedules it in a fresh arrival or retires it at a terminal.
//!
//! Ordering contract: strictly ascending time, FIFO among equal timestamps.
//! `std::collections::BinaryHeap` is not stable, so each pushed event gets a
//! monotonically increasing sequence number that breaks ties in insertion
//! order. Injections scheduled at time `t` therefore become visible to an
//! arrival at the same `t` exactly when they were pushed first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::models::train::Train;

/// A scheduled occurrence in the network.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The owned train reaches its `arriving_station`.
    Arrival { train: Train },

    /// Inject a full origin×destination matrix of passenger counts.
    NewOd { matrix: Vec<Vec<u32>> },

    /// Inject a single cohort, produced when a transfer requires walking
    /// time.
    Transfer { from: usize, to: usize, count: u32 },

    /// Yield control back to the external agent with a report snapshot.
    Suspend,
}

impl Event {
    /// Short label for logging and FFI.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Arrival { .. } => "arrival",
            Event::NewOd { .. } => "new_od",
            Event::Transfer { .. } => "transfer",
            Event::Suspend => "suspend",
        }
    }
}

#[derive(Debug)]
struct Scheduled {
    time: f64,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.time.total_cmp(&other.time) == Ordering::Equal && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys: BinaryHeap is a max-heap, we want the
        // earliest time first and, within a time, the earliest insertion.
        self.time
            .total_cmp(&other.time)
            .reverse()
            .then_with(|| self.seq.cmp(&other.seq).reverse())
    }
}

/// Min-priority queue over [`Event`]s, ordered by time with FIFO ties.
///
/// # Example
/// ```
/// use transit_simulator_core_rs::{Event, EventQueue};
///
/// let mut queue = EventQueue::new();
/// queue.push(60.0, Event::Suspend);
/// queue.push(30.0, Event::Suspend);
/// let (time, _) = queue.pop().unwrap();
/// assert_eq!(time, 30.0);
/// ```
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` at `time`.
    pub fn push(&mut self, time: f64, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { time, seq, event });
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<(f64, Event)> {
        self.heap.pop().map(|scheduled| (scheduled.time, scheduled.event))
    }

    /// Timestamp of the earliest pending event.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|scheduled| scheduled.time)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending event (episode reset). The sequence counter is
    /// not rewound; ordering only ever compares ties within one episode.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Visit every pending event in unspecified order (conservation checks
    /// and diagnostics; dispatch order comes only from [`pop`]).
    ///
    /// [`pop`]: EventQueue::pop
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Event)> {
        self.heap.iter().map(|scheduled| (scheduled.time, &scheduled.event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(50.0, Event::Suspend);
        queue.push(10.0, Event::Transfer { from: 0, to: 1, count: 5 });
        queue.push(30.0, Event::Suspend);

        let times: Vec<f64> = std::iter::from_fn(|| queue.pop().map(|(t, _)| t)).collect();
        assert_eq!(times, vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn equal_timestamps_pop_in_insertion_order() {
        let mut queue = EventQueue::new();
        queue.push(20.0, Event::Transfer { from: 0, to: 1, count: 1 });
        queue.push(20.0, Event::Transfer { from: 2, to: 3, count: 2 });
        queue.push(20.0, Event::Suspend);

        match queue.pop() {
            Some((_, Event::Transfer { from: 0, count: 1, .. })) => {}
            other => panic!("expected first transfer, got {other:?}"),
        }
        match queue.pop() {
            Some((_, Event::Transfer { from: 2, count: 2, .. })) => {}
            other => panic!("expected second transfer, got {other:?}"),
        }
        assert!(matches!(queue.pop(), Some((_, Event::Suspend))));
    }

    #[test]
    fn injection_before_arrival_at_same_time_stays_before_it() {
        let mut queue = EventQueue::new();
        queue.push(60.0, Event::NewOd { matrix: vec![vec![0, 4], vec![0, 0]] });
        queue.push(60.0, Event::Suspend);
        assert!(matches!(queue.pop(), Some((_, Event::NewOd { .. }))));
        assert!(matches!(queue.pop(), Some((_, Event::Suspend))));
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = EventQueue::new();
        queue.push(1.0, Event::Suspend);
        queue.push(2.0, Event::Suspend);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn peek_time_reports_the_head() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.peek_time(), None);
        queue.push(42.0, Event::Suspend);
        queue.push(7.0, Event::Suspend);
        assert_eq!(queue.peek_time(), Some(7.0));
    }
}
