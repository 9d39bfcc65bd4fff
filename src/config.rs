//! Simulation configuration.
//!
//! Gathers the tunable constants of the engine into a single serde-friendly
//! struct, validated eagerly before a [`Simulation`](crate::Simulation) is
//! built. The number of stations is deliberately absent: it is derived from
//! the station table at load time and cross-checked against every matrix.

use serde::{Deserialize, Serialize};

/// Tunable constants for one simulation instance.
///
/// All times are in seconds since midnight, matching the static schedule
/// tables.
///
/// # Example
/// ```
/// use transit_simulator_core_rs::SimulationConfig;
///
/// let config = SimulationConfig {
///     simulation_end_time: 7200.0,
///     start_time: 0.0,
///     ..SimulationConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Earliest time passengers may be injected into the system.
    ///
    /// `add_event` rejects `NewOd`/`Transfer` events scheduled before this
    /// point, and `add_passengers` rejects calls while the clock is still
    /// before it.
    pub start_time: f64,

    /// Warm-up window in seconds. Carried as a knob for experiment configs;
    /// the engine itself attaches no statistical semantics to it.
    pub warmup_period: f64,

    /// Time horizon: `run` reports `is_finished` once the clock reaches it.
    pub simulation_end_time: f64,

    /// Upper bound on the number of stored next-hop candidates per
    /// origin-destination pair. Exceeding it is a load error.
    pub max_policy_num: usize,

    /// Seats on a train whose start-train row does not carry a capacity
    /// column.
    pub default_capacity: u32,

    /// Seed for the simulation-owned RNG (routing tie-breaks). Reseed per
    /// episode for reproducible rollouts.
    pub rng_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        // Weekday service window: passengers from 05:00, horizon at 18:00.
        Self {
            start_time: 18_000.0,
            warmup_period: 0.0,
            simulation_end_time: 64_800.0,
            max_policy_num: 4,
            default_capacity: 300,
            rng_seed: 1,
        }
    }
}

impl SimulationConfig {
    /// Check the configuration for internal consistency.
    ///
    /// Returns a human-readable description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.simulation_end_time.is_finite() || self.simulation_end_time <= 0.0 {
            return Err("simulation_end_time must be positive and finite".to_string());
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err("start_time must be non-negative and finite".to_string());
        }
        if self.start_time >= self.simulation_end_time {
            return Err(format!(
                "start_time ({}) must precede simulation_end_time ({})",
                self.start_time, self.simulation_end_time
            ));
        }
        if self.warmup_period < 0.0 {
            return Err("warmup_period must be non-negative".to_string());
        }
        if self.max_policy_num == 0 {
            return Err("max_policy_num must be at least 1".to_string());
        }
        if self.default_capacity == 0 {
            return Err("default_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn start_after_end_is_rejected() {
        let config = SimulationConfig {
            start_time: 70_000.0,
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("start_time"));
    }

    #[test]
    fn zero_policy_bound_is_rejected() {
        let config = SimulationConfig {
            max_policy_num: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SimulationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
