//! Python FFI layer (feature = "pyo3").
//!
//! Keeps the boundary minimal: one wrapper class around [`Simulation`]
//! plus scalar/dict conversions. All simulation logic stays on the Rust
//! side.
//!
//! [`Simulation`]: crate::Simulation

pub mod simulation;

pub use simulation::PySimulation;
