//! Error types for experiment configuration

use thiserror::Error;

/// Rejected configuration, raised before any simulation work starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("queue capacity must be at least 1, got {0}")]
    Capacity(usize),

    #[error("{name} must be a positive finite rate, got {value}")]
    Rate { name: &'static str, value: f64 },

    #[error("queue capacity {capacity} is below the server count {servers}")]
    CapacityBelowServers { capacity: usize, servers: usize },

    #[error("replications must be at least 1")]
    Replications,

    #[error("packets per replication must be at least 1")]
    Packets,

    #[error("server count must be at least 1")]
    Servers,

    #[error("sweep step must be positive and finite, got {0}")]
    Step(f64),

    #[error("sweep step {step} cannot advance over [{min}, {max}]")]
    StepResolution { step: f64, min: f64, max: f64 },

    #[error("sweep range is empty: min {min} > max {max}")]
    Range { min: f64, max: f64 },

    #[error("unknown dispatch policy: {0}")]
    UnknownPolicy(String),
}

impl ConfigError {
    /// Checks that `value` can be used as an exponential rate.
    pub fn check_rate(name: &'static str, value: f64) -> Result<f64, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::Rate { name, value })
        }
    }
}
