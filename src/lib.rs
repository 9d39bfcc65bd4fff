//! Rail Transit Simulator Core - Rust Engine
//!
//! Discrete-event simulator of an urban rail network, used as an environment
//! for reinforcement-learning experiments. The engine advances a network-wide
//! clock by processing scheduled events (train arrivals, passenger batch
//! injections, deferred walked transfers, externally requested suspensions),
//! maintains per-station per-direction boarding queues, routes passengers
//! along precomputed policies, and accumulates the travel-time and delay
//! integrals the learning agent consumes as a reward signal.
//!
//! # Architecture
//!
//! - **core**: Simulation clock and cumulative counters
//! - **config**: Tunable constants (horizon, service start, capacities)
//! - **network**: Static tables loaded from CSV, read-only after init
//! - **models**: Domain types (Station, Train, Event, EventQueue)
//! - **routing**: Policy lookup (origin, destination) → next-hop decision
//! - **orchestrator**: Main event loop and episode control
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Passenger counts are conserved: queued + onboard + arrived == departed
//! 2. All randomness is deterministic (seeded, simulation-owned RNG)
//! 3. Events pop in nondecreasing time order, FIFO among equal timestamps

// Module declarations
pub mod config;
pub mod core;
pub mod models;
pub mod network;
pub mod orchestrator;
pub mod routing;
pub mod rng;

// Re-exports for convenience
pub use config::SimulationConfig;
pub use core::clock::SimClock;
pub use models::{
    event::{Event, EventQueue},
    station::{Cohort, Station},
    train::Train,
};
pub use network::{LoadError, Network, ScheduledStop, StartTrain, StationInfo, TrainSchedule};
pub use orchestrator::{Report, RunState, Simulation, SimulationError};
pub use routing::{route, Decision, RoutingError};
pub use rng::SimRng;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn transit_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::simulation::PySimulation>()?;
    Ok(())
}
