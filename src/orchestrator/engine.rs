//! Simulation engine.
//!
//! Drives the event loop that couples every component:
//!
//! ```text
//! pop earliest event, advance clock
//!   Arrival   → segment travel time, alight, transfer injection,
//!               drain + board, schedule follow-on arrival (or retire)
//!   NewOd     → inject every nonzero origin×destination entry
//!   Transfer  → inject one walked-transfer cohort
//!   Suspend   → snapshot a Report, yield to the external agent
//! until Suspend, the time horizon, or an empty queue
//! ```
//!
//! The loop is single-threaded and cooperative: nothing suspends except at
//! `Suspend` events, every state mutation is serialized by the loop, and the
//! only time-based stop is the configured horizon. The static [`Network`] is
//! shared read-only (many simulations may hold the same `Arc`); all mutable
//! state is owned exclusively by one [`Simulation`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transit_simulator_core_rs::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig { start_time: 0.0, ..SimulationConfig::default() };
//! let mut sim = Simulation::from_data_dir("data/", config).unwrap();
//! sim.add_passengers(0, 5, 120).unwrap();
//! let report = sim.run().unwrap();
//! println!("delay integral: {}", report.total_delay);
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::SimulationConfig;
use crate::core::clock::SimClock;
use crate::models::event::{Event, EventQueue};
use crate::models::station::Station;
use crate::models::train::Train;
use crate::network::{LoadError, Network};
use crate::routing::{route, Decision, RoutingError};
use crate::rng::SimRng;

// ============================================================================
// Reporting and state types
// ============================================================================

/// Snapshot handed to the external agent at every yield point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// True iff the clock has reached the configured horizon.
    pub is_finished: bool,
    /// Seconds spent onboard trains or walking transfer corridors, summed
    /// over passengers.
    pub total_travel_time: f64,
    /// Seconds spent waiting in station queues, summed over passengers.
    /// Always a component of `total_travel_time`.
    pub total_delay: f64,
    /// Passengers injected into the system.
    pub num_departed: u64,
    /// Passengers that reached their destination.
    pub num_arrived: u64,
}

/// Where the event loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Freshly constructed or reset; nothing dispatched yet.
    Idle,
    /// Inside `run`.
    Running,
    /// Yielded at a `Suspend` event; `run` may be called again.
    Suspended,
    /// Horizon reached or event queue drained.
    Finished,
}

/// Engine-level failure.
///
/// Static-data problems surface at construction; everything else indicates a
/// malformed run and aborts the episode, after which the simulation must be
/// `reset` before further use. Nothing is retried.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("{count} passengers still aboard train {train} at terminal station {station}")]
    PassengersAtTerminal {
        train: usize,
        station: usize,
        count: u32,
    },

    #[error("train {train} ran out of scheduled stops at non-terminal station {station}")]
    ScheduleExhausted { train: usize, station: usize },

    #[error("no walking link from station {from} to chosen transfer station {via}")]
    MissingTransferLink { from: usize, via: usize },

    #[error("event at t={time} precedes the current clock t={now}")]
    EventInPast { time: f64, now: f64 },

    #[error("OD matrix must be {expected}x{expected}, found {rows} rows with a row of {cols} columns")]
    OdShape {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("passenger injection at t={time} precedes service start t={start}")]
    InjectionBeforeServiceStart { time: f64, start: f64 },

    #[error("station id {station} out of range (network has {total} stations)")]
    UnknownStation { station: usize, total: usize },
}

// ============================================================================
// Simulation
// ============================================================================

/// One independent simulation instance: exclusive mutable state over a
/// shared read-only network.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    network: Arc<Network>,
    clock: SimClock,
    stations: Vec<Station>,
    events: EventQueue,
    rng: SimRng,
    state: RunState,
}

impl Simulation {
    /// Build a simulation over an already loaded network and reset it to
    /// the start of an episode.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is internally inconsistent.
    pub fn new(network: Arc<Network>, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate().map_err(SimulationError::InvalidConfig)?;
        let stations = network.stations().iter().map(Station::new).collect();
        let rng = SimRng::new(config.rng_seed);
        let mut sim = Self {
            clock: SimClock::new(),
            events: EventQueue::new(),
            stations,
            rng,
            network,
            config,
            state: RunState::Idle,
        };
        sim.reset();
        Ok(sim)
    }

    /// Load the static tables from `dir` and build a simulation over them.
    pub fn from_data_dir(
        dir: impl AsRef<Path>,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let network = Network::load(dir, &config)?;
        Self::new(Arc::new(network), config)
    }

    /// Return to the start-of-episode state.
    ///
    /// Clears the clock, the counters, every station queue, and all pending
    /// events, then re-pushes one arrival per start-train row with a fresh
    /// train. The RNG is deliberately left untouched; call [`reseed`]
    /// before the episode for reproducible rollouts.
    ///
    /// [`reseed`]: Simulation::reseed
    pub fn reset(&mut self) {
        self.clock.reset();
        self.events.clear();
        for station in &mut self.stations {
            station.reset();
        }
        for start in self.network.start_trains() {
            let train = Train::new(start, self.network.num_stations());
            self.events.push(start.start_time, Event::Arrival { train });
        }
        self.state = RunState::Idle;
        info!(start_trains = self.network.start_trains().len(), "simulation reset");
    }

    /// Reseed the simulation-owned RNG.
    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Advance until a `Suspend` event, the time horizon, or an empty event
    /// queue, and return the report snapshot.
    ///
    /// An event popped at or past the horizon is still processed before the
    /// loop exits. An empty queue before the horizon is reported, not
    /// fatal.
    ///
    /// # Errors
    ///
    /// A simulation invariant violation (passengers aboard a retiring
    /// train, an exhausted stop stream, a hole in the routing tables)
    /// aborts the episode; the instance must be `reset` afterwards.
    pub fn run(&mut self) -> Result<Report, SimulationError> {
        self.state = RunState::Running;
        loop {
            let Some((time, event)) = self.events.pop() else {
                warn!(time = self.clock.time(), "event queue drained before the horizon");
                self.state = RunState::Finished;
                return Ok(self.report());
            };
            self.clock.advance_to(time);
            trace!(time, kind = event.kind(), "dispatching");

            match event {
                Event::Arrival { train } => self.handle_arrival(train)?,
                Event::NewOd { matrix } => self.inject_matrix(&matrix)?,
                Event::Transfer { from, to, count } => self.reinject(from, to, count)?,
                Event::Suspend => {
                    debug!(time = self.clock.time(), "suspending for external agent");
                    self.state = RunState::Suspended;
                    return Ok(self.report());
                }
            }

            if self.clock.time() >= self.config.simulation_end_time {
                self.state = RunState::Finished;
                return Ok(self.report());
            }
        }
    }

    /// Process one train arrival: settle the segment travel time, alight,
    /// reclassify transfers, board, and schedule the follow-on arrival (or
    /// retire the train at a terminal).
    fn handle_arrival(&mut self, mut train: Train) -> Result<(), SimulationError> {
        let now = self.clock.time();
        let station = train.arriving_station();
        let line = train.line();
        let direction = train.direction();

        // Travel time for the segment just ridden, for everyone aboard,
        // before any alighting.
        self.clock
            .add_travel_time(f64::from(train.passenger_num()) * (now - train.last_time()));

        let arrived_here = train.alight_for(station);
        self.clock.record_arrivals(arrived_here);

        if self.stations[station].is_transfer() {
            self.process_transfers(&mut train, station, line, now)?;
        }

        if !self.stations[station].is_terminal(direction) {
            let waited = self.stations[station].drain(direction, now);
            self.clock.add_delay(waited);
            let boarded = self.stations[station].board_onto(direction, &mut train);
            debug_assert!(train.histogram_consistent());

            let stop_index = train.take_stop_index();
            let stop = self
                .network
                .schedule(train.id())
                .stops
                .get(stop_index)
                .copied()
                .ok_or(SimulationError::ScheduleExhausted { train: train.id(), station })?;
            train.depart_toward(stop.station, now);
            debug!(
                train = train.id(),
                station,
                boarded,
                onboard = train.passenger_num(),
                next_station = stop.station,
                "train departed"
            );
            self.events.push(stop.time, Event::Arrival { train });
        } else {
            if train.passenger_num() > 0 {
                return Err(SimulationError::PassengersAtTerminal {
                    train: train.id(),
                    station,
                    count: train.passenger_num(),
                });
            }
            debug!(train = train.id(), station, "train retired at terminal");
        }
        Ok(())
    }

    /// Reclassify every onboard destination at a transfer station.
    ///
    /// Passengers whose destination is walkably related to this station are
    /// done: the walk is travel time and they never enter a queue.
    /// Passengers routed onto another line alight here; a cross-platform
    /// transfer re-enqueues them immediately, a walked one schedules a
    /// deferred `Transfer` event after the walking time.
    fn process_transfers(
        &mut self,
        train: &mut Train,
        station: usize,
        line: u32,
        now: f64,
    ) -> Result<(), SimulationError> {
        for dest in 0..self.network.num_stations() {
            let riders = train.onboard_to(dest);
            if riders == 0 {
                continue;
            }

            if let Some(walk) = self.network.transfer_time(station, dest) {
                // This station is an acceptable terminal point for `dest`:
                // finish the trip with the walk to the desired exit.
                train.alight_for(dest);
                self.clock.add_travel_time(walk * f64::from(riders));
                self.clock.record_arrivals(riders);
                continue;
            }

            match route(&self.network, station, dest, Some(line), &mut self.rng)? {
                Decision::SameLine { .. } => {} // stays onboard
                Decision::Transfer { via, .. } => {
                    train.alight_for(dest);
                    let walk = self
                        .network
                        .transfer_time(station, via)
                        .ok_or(SimulationError::MissingTransferLink { from: station, via })?;
                    if walk == 0.0 {
                        self.reinject(via, dest, riders)?;
                    } else {
                        self.clock.add_travel_time(walk * f64::from(riders));
                        self.events.push(
                            now + walk,
                            Event::Transfer { from: via, to: dest, count: riders },
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Inject every nonzero entry of an origin×destination matrix.
    fn inject_matrix(&mut self, matrix: &[Vec<u32>]) -> Result<(), SimulationError> {
        for (from, row) in matrix.iter().enumerate() {
            for (to, &count) in row.iter().enumerate() {
                if count > 0 {
                    self.depart(from, to, count)?;
                }
            }
        }
        Ok(())
    }

    /// Route a cohort from `from` toward `to` and enqueue it at the station
    /// where it actually waits, accounting the initial walk if the policy
    /// says to change lines first.
    fn place(&mut self, from: usize, to: usize, count: u32) -> Result<(), SimulationError> {
        let now = self.clock.time();
        let (station, direction) = match route(&self.network, from, to, None, &mut self.rng)? {
            Decision::SameLine { direction } => (from, direction),
            Decision::Transfer { via, direction } => {
                let walk = self
                    .network
                    .transfer_time(from, via)
                    .ok_or(SimulationError::MissingTransferLink { from, via })?;
                self.clock.add_travel_time(walk * f64::from(count));
                (via, direction)
            }
        };
        self.stations[station].enqueue(direction, to, count, now);
        Ok(())
    }

    /// Place a fresh cohort and count it as departed.
    fn depart(&mut self, from: usize, to: usize, count: u32) -> Result<(), SimulationError> {
        self.place(from, to, count)?;
        self.clock.record_departures(count);
        Ok(())
    }

    /// Place a transferring cohort; it was already counted at its origin.
    fn reinject(&mut self, from: usize, to: usize, count: u32) -> Result<(), SimulationError> {
        if count == 0 {
            return Ok(());
        }
        self.place(from, to, count)
    }

    // ========================================================================
    // External surface
    // ========================================================================

    /// Inject `count` passengers traveling `from → to` at the current
    /// simulation time.
    ///
    /// # Errors
    ///
    /// Rejects unknown stations and injections before the configured
    /// service start.
    pub fn add_passengers(
        &mut self,
        from: usize,
        to: usize,
        count: u32,
    ) -> Result<(), SimulationError> {
        self.check_station(from)?;
        self.check_station(to)?;
        if self.clock.time() < self.config.start_time {
            return Err(SimulationError::InjectionBeforeServiceStart {
                time: self.clock.time(),
                start: self.config.start_time,
            });
        }
        if count == 0 {
            return Ok(());
        }
        self.depart(from, to, count)
    }

    /// Schedule a caller-built event.
    ///
    /// Used to place `Suspend` yield points and future `NewOd` matrices.
    ///
    /// # Errors
    ///
    /// Rejects events in the past, OD matrices of the wrong shape, unknown
    /// stations, and passenger injections scheduled before the service
    /// start.
    pub fn add_event(&mut self, time: f64, event: Event) -> Result<(), SimulationError> {
        if time < self.clock.time() {
            return Err(SimulationError::EventInPast { time, now: self.clock.time() });
        }
        match &event {
            Event::NewOd { matrix } => {
                let n = self.network.num_stations();
                if matrix.len() != n {
                    return Err(SimulationError::OdShape {
                        expected: n,
                        rows: matrix.len(),
                        cols: matrix.first().map_or(0, Vec::len),
                    });
                }
                if let Some(row) = matrix.iter().find(|row| row.len() != n) {
                    return Err(SimulationError::OdShape {
                        expected: n,
                        rows: matrix.len(),
                        cols: row.len(),
                    });
                }
                if time < self.config.start_time {
                    return Err(SimulationError::InjectionBeforeServiceStart {
                        time,
                        start: self.config.start_time,
                    });
                }
            }
            Event::Transfer { from, to, .. } => {
                self.check_station(*from)?;
                self.check_station(*to)?;
                if time < self.config.start_time {
                    return Err(SimulationError::InjectionBeforeServiceStart {
                        time,
                        start: self.config.start_time,
                    });
                }
            }
            Event::Arrival { .. } | Event::Suspend => {}
        }
        trace!(time, kind = event.kind(), "event scheduled externally");
        self.events.push(time, event);
        Ok(())
    }

    fn check_station(&self, station: usize) -> Result<(), SimulationError> {
        let total = self.network.num_stations();
        if station >= total {
            return Err(SimulationError::UnknownStation { station, total });
        }
        Ok(())
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Current report snapshot.
    pub fn report(&self) -> Report {
        Report {
            is_finished: self.clock.time() >= self.config.simulation_end_time,
            total_travel_time: self.clock.total_travel_time(),
            total_delay: self.clock.total_delay(),
            num_departed: self.clock.num_departed(),
            num_arrived: self.clock.num_arrived(),
        }
    }

    /// Current simulation time.
    pub fn get_time(&self) -> f64 {
        self.clock.time()
    }

    /// Wait integral accumulated at one station/direction.
    pub fn get_station_delay(&self, station: usize, direction: usize) -> Option<f64> {
        (station < self.stations.len() && direction < 2)
            .then(|| self.stations[station].delay(direction))
    }

    /// Passengers ever enqueued at one station/direction.
    pub fn get_station_pass(&self, station: usize, direction: usize) -> Option<u64> {
        (station < self.stations.len() && direction < 2)
            .then(|| self.stations[station].num_pass(direction))
    }

    /// Passengers currently waiting at one station/direction.
    pub fn get_station_waiting_passengers(&self, station: usize, direction: usize) -> Option<u32> {
        (station < self.stations.len() && direction < 2)
            .then(|| self.stations[station].queue_size(direction))
    }

    /// Where the event loop currently stands.
    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// The shared static network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// The configuration this instance runs under.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Pending events (arrival follow-ons, injections, suspends).
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Passengers waiting across all station queues.
    pub fn passengers_waiting(&self) -> u64 {
        self.stations
            .iter()
            .map(|s| u64::from(s.queue_size(0)) + u64::from(s.queue_size(1)))
            .sum()
    }

    /// Passengers aboard trains whose arrival events are in flight.
    pub fn passengers_onboard(&self) -> u64 {
        self.events
            .iter()
            .map(|(_, event)| match event {
                Event::Arrival { train } => u64::from(train.passenger_num()),
                _ => 0,
            })
            .sum()
    }

    /// Passengers mid-walk between lines (pending `Transfer` events).
    pub fn passengers_walking(&self) -> u64 {
        self.events
            .iter()
            .map(|(_, event)| match event {
                Event::Transfer { count, .. } => u64::from(*count),
                _ => 0,
            })
            .sum()
    }

    /// Station queue state, for tests and invariant checks.
    pub fn station(&self, id: usize) -> &Station {
        &self.stations[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{ScheduledStop, StartTrain, StationInfo, TrainSchedule};

    /// One line, two stations, one train 0 → 1.
    fn line_network(start_time: f64, arrival_time: f64, capacity: u32) -> Arc<Network> {
        let stations = vec![
            StationInfo { line: 0, is_terminal: [false, true], is_transfer: false },
            StationInfo { line: 0, is_terminal: [true, false], is_transfer: false },
        ];
        let mut directions = vec![vec![-1i8; 2]; 2];
        directions[0][1] = 0;
        directions[1][0] = 1;
        let mut policy = vec![vec![Vec::new(); 2]; 2];
        policy[0][1] = vec![1];
        policy[1][0] = vec![0];
        let transfer_time = vec![vec![-1.0; 2]; 2];
        let schedules = vec![TrainSchedule {
            stops: vec![ScheduledStop { time: arrival_time, station: 1 }],
        }];
        let start_trains = vec![StartTrain {
            train_id: 0,
            station: 0,
            line: 0,
            direction: 0,
            capacity,
            start_time,
        }];
        Arc::new(
            Network::from_parts(
                stations,
                directions,
                policy,
                transfer_time,
                schedules,
                start_trains,
                4,
            )
            .unwrap(),
        )
    }

    fn test_config() -> SimulationConfig {
        SimulationConfig {
            start_time: 0.0,
            simulation_end_time: 120.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn new_simulation_starts_idle_with_start_trains_queued() {
        let sim = Simulation::new(line_network(0.0, 60.0, 300), test_config()).unwrap();
        assert_eq!(sim.run_state(), RunState::Idle);
        assert_eq!(sim.pending_events(), 1);
        assert_eq!(sim.get_time(), 0.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimulationConfig { max_policy_num: 0, ..test_config() };
        let err = Simulation::new(line_network(0.0, 60.0, 300), config).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_station_is_rejected() {
        let mut sim = Simulation::new(line_network(0.0, 60.0, 300), test_config()).unwrap();
        let err = sim.add_passengers(0, 9, 10).unwrap_err();
        assert!(matches!(err, SimulationError::UnknownStation { station: 9, total: 2 }));
    }

    #[test]
    fn events_in_the_past_are_rejected() {
        let mut sim = Simulation::new(line_network(0.0, 60.0, 300), test_config()).unwrap();
        sim.run().unwrap(); // runs to the horizon
        let err = sim.add_event(0.0, Event::Suspend).unwrap_err();
        assert!(matches!(err, SimulationError::EventInPast { .. }));
    }

    #[test]
    fn malformed_od_matrix_is_rejected() {
        let mut sim = Simulation::new(line_network(0.0, 60.0, 300), test_config()).unwrap();
        let err = sim
            .add_event(10.0, Event::NewOd { matrix: vec![vec![0, 1]] })
            .unwrap_err();
        assert!(matches!(err, SimulationError::OdShape { expected: 2, rows: 1, .. }));
    }

    #[test]
    fn injection_before_service_start_is_rejected() {
        let config = SimulationConfig {
            start_time: 100.0,
            simulation_end_time: 200.0,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(line_network(0.0, 60.0, 300), config).unwrap();
        let err = sim.add_passengers(0, 1, 5).unwrap_err();
        assert!(matches!(err, SimulationError::InjectionBeforeServiceStart { .. }));
    }

    #[test]
    fn suspend_yields_control() {
        let mut sim = Simulation::new(line_network(0.0, 60.0, 300), test_config()).unwrap();
        sim.add_event(30.0, Event::Suspend).unwrap();
        let report = sim.run().unwrap();
        assert_eq!(sim.run_state(), RunState::Suspended);
        assert!(!report.is_finished);
        assert_eq!(sim.get_time(), 30.0);

        // Resume to the horizon.
        let report = sim.run().unwrap();
        assert_eq!(sim.run_state(), RunState::Finished);
        assert!(!report.is_finished); // queue drained at t=60, before 120
    }

    #[test]
    fn quiescent_run_moves_no_passengers() {
        let mut sim = Simulation::new(line_network(0.0, 60.0, 300), test_config()).unwrap();
        let report = sim.run().unwrap();
        assert_eq!(report.num_departed, 0);
        assert_eq!(report.num_arrived, 0);
        assert_eq!(report.total_travel_time, 0.0);
        assert_eq!(report.total_delay, 0.0);
    }

    #[test]
    fn zero_count_injection_is_a_no_op() {
        let mut sim = Simulation::new(line_network(0.0, 60.0, 300), test_config()).unwrap();
        sim.add_passengers(0, 1, 0).unwrap();
        assert_eq!(sim.passengers_waiting(), 0);
        assert_eq!(sim.report().num_departed, 0);
    }
}
