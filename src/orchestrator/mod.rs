//! Orchestrator - the discrete-event simulation loop.
//!
//! See `engine.rs` for the full implementation.

pub mod engine;

// Re-export main types for convenience
pub use engine::{Report, RunState, Simulation, SimulationError};
