//! Per-train mutable state.
//!
//! A train lives for one terminal-to-terminal run. It is created at episode
//! reset from a start-train row, carried by its in-flight arrival event
//! (which owns it), and dropped when it reaches a station that is terminal
//! in its direction, at which point it must be empty.

use crate::network::StartTrain;

/// One train in flight.
///
/// Passengers onboard are stored as a dense per-destination histogram;
/// `sum(destination) == passenger_num` and
/// `capacity + passenger_num == nominal capacity` hold at every event
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Train {
    id: usize,
    line: u32,
    direction: usize,
    arriving_station: usize,
    /// Remaining seats.
    capacity: u32,
    /// Seat count the run started with; fixed for the train's lifetime.
    nominal_capacity: u32,
    /// Departure time from the previous station (or the scheduled start).
    last_time: f64,
    passenger_num: u32,
    destination: Vec<u32>,
    /// Index of the next entry in the train's precomputed stop stream.
    cursor: usize,
}

impl Train {
    /// Instantiate a fresh, empty train from its start-train row.
    pub fn new(start: &StartTrain, num_stations: usize) -> Self {
        Self {
            id: start.train_id,
            line: start.line,
            direction: start.direction,
            arriving_station: start.station,
            capacity: start.capacity,
            nominal_capacity: start.capacity,
            last_time: start.start_time,
            passenger_num: 0,
            destination: vec![0; num_stations],
            cursor: 0,
        }
    }

    /// Unique id of this terminal-to-terminal run; indexes the schedule
    /// table.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Line the train serves.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Travel sense along the line, 0 or 1.
    pub fn direction(&self) -> usize {
        self.direction
    }

    /// Station this train's pending arrival event refers to.
    pub fn arriving_station(&self) -> usize {
        self.arriving_station
    }

    /// Remaining seats.
    pub fn remaining_capacity(&self) -> u32 {
        self.capacity
    }

    /// Seat count the run started with.
    pub fn nominal_capacity(&self) -> u32 {
        self.nominal_capacity
    }

    /// Departure time from the previous station.
    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    /// Total passengers onboard.
    pub fn passenger_num(&self) -> u32 {
        self.passenger_num
    }

    /// Passengers onboard bound for `station`.
    pub fn onboard_to(&self, station: usize) -> u32 {
        self.destination[station]
    }

    /// Alight every passenger bound for `station`, returning how many left.
    pub(crate) fn alight_for(&mut self, station: usize) -> u32 {
        let leaving = self.destination[station];
        self.destination[station] = 0;
        self.passenger_num -= leaving;
        self.capacity += leaving;
        leaving
    }

    /// Take `count` passengers bound for `destination` onboard.
    ///
    /// Callers never ask for more than the remaining capacity; this is
    /// asserted in debug builds.
    pub(crate) fn absorb(&mut self, destination: usize, count: u32) {
        debug_assert!(count <= self.capacity, "boarding beyond remaining capacity");
        self.capacity -= count;
        self.passenger_num += count;
        self.destination[destination] += count;
    }

    /// Consume the next stop-stream index, advancing the cursor.
    pub(crate) fn take_stop_index(&mut self) -> usize {
        let index = self.cursor;
        self.cursor += 1;
        index
    }

    /// Point the train at its next stop and stamp the departure time from
    /// the station it just left.
    pub(crate) fn depart_toward(&mut self, station: usize, now: f64) {
        self.arriving_station = station;
        self.last_time = now;
    }

    /// Check the onboard bookkeeping invariants (test and diagnostic
    /// support).
    pub fn histogram_consistent(&self) -> bool {
        let total: u32 = self.destination.iter().sum();
        total == self.passenger_num && self.capacity + self.passenger_num == self.nominal_capacity
    }
}
