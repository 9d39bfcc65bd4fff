//! Simulation clock and reward counters.
//!
//! The clock carries the network-wide time plus the four cumulative
//! quantities the learning agent reads as its reward signal: the travel-time
//! integral, the in-station delay integral, and the departed/arrived
//! passenger totals. All of them are monotone nondecreasing over an episode.

use serde::{Deserialize, Serialize};

/// Monotonic simulation time plus episode counters.
///
/// # Example
/// ```
/// use transit_simulator_core_rs::SimClock;
///
/// let mut clock = SimClock::new();
/// clock.advance_to(60.0);
/// clock.record_departures(50);
/// clock.add_travel_time(3_000.0);
/// assert_eq!(clock.time(), 60.0);
/// assert_eq!(clock.num_departed(), 50);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Current simulation time, seconds since midnight.
    time: f64,

    /// Sum over passengers of time spent onboard a train or walking a
    /// transfer corridor.
    total_travel_time: f64,

    /// Sum over passengers of time spent waiting in a station queue.
    /// Always also counted into `total_travel_time`.
    total_delay: f64,

    /// Passengers injected into the system so far.
    num_departed: u64,

    /// Passengers that have reached their destination so far.
    num_arrived: u64,
}

impl SimClock {
    /// Create a clock at time zero with all counters cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the start-of-episode state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move the clock to the timestamp of the event being dispatched.
    ///
    /// Event pops are nondecreasing in time by construction of the event
    /// queue; this is asserted in debug builds.
    pub fn advance_to(&mut self, time: f64) {
        debug_assert!(
            time >= self.time,
            "clock moved backwards: {} -> {}",
            self.time,
            time
        );
        self.time = time;
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Add onboard or walking time to the travel-time integral.
    pub fn add_travel_time(&mut self, seconds: f64) {
        debug_assert!(seconds >= 0.0);
        self.total_travel_time += seconds;
    }

    /// Add an in-station wait integral.
    ///
    /// Delay is a component of travel time, so the amount is accumulated
    /// into both totals.
    pub fn add_delay(&mut self, seconds: f64) {
        debug_assert!(seconds >= 0.0);
        self.total_delay += seconds;
        self.total_travel_time += seconds;
    }

    /// Count passengers entering the system.
    pub fn record_departures(&mut self, count: u32) {
        self.num_departed += u64::from(count);
    }

    /// Count passengers reaching their destination.
    pub fn record_arrivals(&mut self, count: u32) {
        self.num_arrived += u64::from(count);
        debug_assert!(
            self.num_arrived <= self.num_departed,
            "more arrivals ({}) than departures ({})",
            self.num_arrived,
            self.num_departed
        );
    }

    /// Travel-time integral so far.
    pub fn total_travel_time(&self) -> f64 {
        self.total_travel_time
    }

    /// Delay integral so far.
    pub fn total_delay(&self) -> f64 {
        self.total_delay
    }

    /// Passengers injected so far.
    pub fn num_departed(&self) -> u64 {
        self.num_departed
    }

    /// Passengers arrived so far.
    pub fn num_arrived(&self) -> u64 {
        self.num_arrived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clock_is_zeroed() {
        let clock = SimClock::new();
        assert_eq!(clock.time(), 0.0);
        assert_eq!(clock.total_travel_time(), 0.0);
        assert_eq!(clock.total_delay(), 0.0);
        assert_eq!(clock.num_departed(), 0);
        assert_eq!(clock.num_arrived(), 0);
    }

    #[test]
    fn delay_feeds_both_integrals() {
        let mut clock = SimClock::new();
        clock.add_delay(120.0);
        clock.add_travel_time(30.0);
        assert_eq!(clock.total_delay(), 120.0);
        assert_eq!(clock.total_travel_time(), 150.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut clock = SimClock::new();
        clock.advance_to(500.0);
        clock.record_departures(10);
        clock.record_arrivals(4);
        clock.add_delay(7.5);
        clock.reset();
        assert_eq!(clock, SimClock::new());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "clock moved backwards")]
    fn backwards_advance_panics_in_debug() {
        let mut clock = SimClock::new();
        clock.advance_to(10.0);
        clock.advance_to(5.0);
    }
}
