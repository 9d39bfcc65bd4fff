//! Station queues and in-station delay accounting.
//!
//! Waiting passengers are held as destination-tagged cohorts in strict
//! arrival order, one FIFO per travel direction. Instead of per-cohort
//! timestamps, each queue carries a count-weighted mean entry time; together
//! with the cached queue size this makes the delay integral exact while
//! keeping enqueue and drain O(1).

use std::collections::VecDeque;

use crate::models::train::Train;
use crate::network::StationInfo;

/// A batch of passengers sharing one destination, treated atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cohort {
    /// Logical station the batch is traveling to.
    pub destination: usize,
    /// Number of passengers in the batch.
    pub count: u32,
}

/// Mutable per-station state: two boarding queues plus reporting
/// accumulators.
///
/// The static attributes (`line`, terminal flags, transfer flag) are copied
/// out of the [`StationInfo`] record at construction so the hot path never
/// chases the shared network tables.
#[derive(Debug, Clone)]
pub struct Station {
    line: u32,
    is_terminal: [bool; 2],
    is_transfer: bool,

    queue: [VecDeque<Cohort>; 2],
    /// Cached sum of cohort counts per direction; always equals the queue's
    /// actual total.
    queue_size: [u32; 2],
    /// Count-weighted mean timestamp at which the currently queued
    /// passengers entered.
    avg_in_station_time: [f64; 2],
    /// Wait integral contributed by each direction, for reporting.
    delay: [f64; 2],
    /// Passengers ever enqueued per direction, for reporting.
    num_pass: [u64; 2],
}

impl Station {
    /// Build the mutable state for one station record.
    pub fn new(info: &StationInfo) -> Self {
        Self {
            line: info.line,
            is_terminal: info.is_terminal,
            is_transfer: info.is_transfer,
            queue: [VecDeque::new(), VecDeque::new()],
            queue_size: [0, 0],
            avg_in_station_time: [0.0, 0.0],
            delay: [0.0, 0.0],
            num_pass: [0, 0],
        }
    }

    /// Drop all queued passengers and zero the accumulators (episode reset).
    pub fn reset(&mut self) {
        for dir in 0..2 {
            self.queue[dir].clear();
            self.queue_size[dir] = 0;
            self.avg_in_station_time[dir] = 0.0;
            self.delay[dir] = 0.0;
            self.num_pass[dir] = 0;
        }
    }

    /// Append a cohort and fold its entry time into the running mean.
    ///
    /// The mean stays within `[oldest entry time, now]`, which is what makes
    /// the later drain integral exact.
    pub fn enqueue(&mut self, direction: usize, destination: usize, count: u32, now: f64) {
        debug_assert!(count > 0);
        debug_assert!(
            !self.is_terminal[direction],
            "passengers enqueued toward a terminal direction"
        );
        let old_len = f64::from(self.queue_size[direction]);
        let new_len = old_len + f64::from(count);
        self.avg_in_station_time[direction] =
            (old_len * self.avg_in_station_time[direction] + f64::from(count) * now) / new_len;
        self.queue_size[direction] += count;
        self.num_pass[direction] += u64::from(count);
        self.queue[direction].push_back(Cohort { destination, count });
    }

    /// Settle the wait integral accrued since the last train touched this
    /// direction and restart accumulation from `now`.
    ///
    /// Returns the integral; the caller feeds it into the episode totals.
    /// Passengers still queued afterwards (those who fail to board) are
    /// treated as newly accumulated from this instant.
    pub fn drain(&mut self, direction: usize, now: f64) -> f64 {
        let waited =
            (now - self.avg_in_station_time[direction]) * f64::from(self.queue_size[direction]);
        self.delay[direction] += waited;
        self.avg_in_station_time[direction] = now;
        waited
    }

    /// Board queued cohorts onto `train` in strict FIFO order until the
    /// queue empties or the train fills.
    ///
    /// A cohort larger than the remaining space is split: the boarding part
    /// leaves, the remainder keeps its place at the head of the queue.
    /// Returns the number of passengers boarded.
    pub fn board_onto(&mut self, direction: usize, train: &mut Train) -> u32 {
        let mut boarded = 0;
        while train.remaining_capacity() > 0 {
            let space = train.remaining_capacity();
            let (destination, take, whole_cohort) = match self.queue[direction].front_mut() {
                None => break,
                Some(head) if head.count <= space => (head.destination, head.count, true),
                Some(head) => {
                    head.count -= space;
                    (head.destination, space, false)
                }
            };
            train.absorb(destination, take);
            self.queue_size[direction] -= take;
            boarded += take;
            if whole_cohort {
                self.queue[direction].pop_front();
            }
        }
        boarded
    }

    /// Line this station belongs to.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Whether the station ends the line in `direction`.
    pub fn is_terminal(&self, direction: usize) -> bool {
        self.is_terminal[direction]
    }

    /// Whether arriving trains reconsider onboard passengers here.
    pub fn is_transfer(&self) -> bool {
        self.is_transfer
    }

    /// Passengers currently waiting toward `direction`.
    pub fn queue_size(&self, direction: usize) -> u32 {
        self.queue_size[direction]
    }

    /// Count-weighted mean entry time of the current queue.
    pub fn avg_in_station_time(&self, direction: usize) -> f64 {
        self.avg_in_station_time[direction]
    }

    /// Wait integral this direction has contributed so far.
    pub fn delay(&self, direction: usize) -> f64 {
        self.delay[direction]
    }

    /// Passengers ever enqueued toward `direction`.
    pub fn num_pass(&self, direction: usize) -> u64 {
        self.num_pass[direction]
    }

    /// Queued cohorts in arrival order (test and invariant support).
    pub fn cohorts(&self, direction: usize) -> impl Iterator<Item = &Cohort> {
        self.queue[direction].iter()
    }
}
