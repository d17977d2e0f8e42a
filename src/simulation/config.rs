use crate::dispatch::DispatchRegistry;
use crate::error::ConfigError;
use crate::queue::ArrivalReference;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Upper bound on the number of sweep values one config may request.
pub const MAX_SWEEP_VALUES: f64 = 1_000_000.0;

/// The quantity varied across a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepParameter {
    Lambda,
    Mu,
    /// Sets λ = v·μ with μ held at its base value.
    Load,
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lambda => write!(f, "lambda"),
            Self::Mu => write!(f, "mu"),
            Self::Load => write!(f, "load"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub name: String,
    pub parameter: SweepParameter,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub replications: u32,
    pub packets: u64,
    pub capacity: usize,
    pub servers: usize,
    pub lambda: f64,
    pub mu: f64,
    pub policy: String,
    pub seed: u64,
    pub arrival_reference: ArrivalReference,
    pub trace_packets: bool,
    pub parallel: bool,
    pub show_progress: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            name: "default_sweep".to_string(),
            parameter: SweepParameter::Mu,
            min: 1.1,
            max: 3.0,
            step: 0.1,
            replications: 20,
            packets: 10_000,
            capacity: 10,
            servers: 2,
            lambda: 1.0,
            mu: 1.1,
            policy: "shortest-queue".to_string(),
            seed: 0,
            arrival_reference: ArrivalReference::Clock,
            trace_packets: false,
            parallel: true,
            show_progress: false,
        }
    }
}

impl SweepConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    pub fn with_range(mut self, parameter: SweepParameter, min: f64, max: f64, step: f64) -> Self {
        self.parameter = parameter;
        self.min = min;
        self.max = max;
        self.step = step;
        self
    }

    /// Sweeps a single value.
    pub fn at(self, parameter: SweepParameter, value: f64) -> Self {
        self.with_range(parameter, value, value, 1.0)
    }

    pub fn with_rates(mut self, lambda: f64, mu: f64) -> Self {
        self.lambda = lambda;
        self.mu = mu;
        self
    }

    pub fn with_queues(mut self, servers: usize, capacity: usize) -> Self {
        self.servers = servers;
        self.capacity = capacity;
        self
    }

    pub fn with_runs(mut self, replications: u32, packets: u64) -> Self {
        self.replications = replications;
        self.packets = packets;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_trace(mut self, trace_packets: bool) -> Self {
        self.trace_packets = trace_packets;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_arrival_reference(mut self, reference: ArrivalReference) -> Self {
        self.arrival_reference = reference;
        self
    }

    /// `(λ, μ)` for one sweep value.
    pub fn rates_for(&self, value: f64) -> (f64, f64) {
        match self.parameter {
            SweepParameter::Lambda => (value, self.mu),
            SweepParameter::Mu => (self.lambda, value),
            SweepParameter::Load => (value * self.mu, self.mu),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < 1 {
            return Err(ConfigError::Capacity(self.capacity));
        }
        if self.servers < 1 {
            return Err(ConfigError::Servers);
        }
        if self.replications < 1 {
            return Err(ConfigError::Replications);
        }
        if self.packets < 1 {
            return Err(ConfigError::Packets);
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(ConfigError::Step(self.step));
        }
        if self.min > self.max {
            return Err(ConfigError::Range { min: self.min, max: self.max });
        }
        // The sweep accumulates `value += step`; it must move at every magnitude it visits
        let count = (self.max - self.min) / self.step;
        let stalls = self.min + self.step == self.min || self.max + self.step == self.max;
        if stalls || !count.is_finite() || count > MAX_SWEEP_VALUES {
            return Err(ConfigError::StepResolution {
                step: self.step,
                min: self.min,
                max: self.max,
            });
        }
        ConfigError::check_rate("arrival rate", self.lambda)?;
        ConfigError::check_rate("service rate", self.mu)?;

        // Both ends of the sweep must give usable rates
        for value in [self.min, self.max] {
            let (lambda, mu) = self.rates_for(value);
            ConfigError::check_rate("arrival rate", lambda)?;
            ConfigError::check_rate("service rate", mu)?;
        }

        if !DispatchRegistry::global().contains(&self.policy) {
            return Err(ConfigError::UnknownPolicy(self.policy.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Experiment;

    #[test]
    fn default_is_valid() {
        assert!(SweepConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_each_bad_field() {
        let base = SweepConfig::default();

        assert_eq!(base.clone().with_queues(2, 0).validate(), Err(ConfigError::Capacity(0)));
        assert_eq!(base.clone().with_queues(0, 10).validate(), Err(ConfigError::Servers));
        assert_eq!(base.clone().with_runs(0, 10).validate(), Err(ConfigError::Replications));
        assert_eq!(base.clone().with_runs(1, 0).validate(), Err(ConfigError::Packets));
        assert_eq!(
            base.clone().with_range(SweepParameter::Mu, 1.0, 2.0, 0.0).validate(),
            Err(ConfigError::Step(0.0))
        );
        assert_eq!(
            base.clone().with_range(SweepParameter::Mu, 3.0, 2.0, 0.1).validate(),
            Err(ConfigError::Range { min: 3.0, max: 2.0 })
        );
        assert!(matches!(
            base.clone().with_range(SweepParameter::Lambda, 0.0, 2.0, 0.5).validate(),
            Err(ConfigError::Rate { name: "arrival rate", .. })
        ));
        assert_eq!(
            base.with_policy("lifo").validate(),
            Err(ConfigError::UnknownPolicy("lifo".into()))
        );
    }

    #[test]
    fn rejects_steps_that_cannot_advance() {
        let stalled = SweepConfig::default().with_range(SweepParameter::Mu, 1e16, 1e16 + 4.0, 1.0);
        assert!(matches!(stalled.validate(), Err(ConfigError::StepResolution { .. })));
        assert!(Experiment::new(stalled).is_err());

        let too_many = SweepConfig::default().with_range(SweepParameter::Mu, 1.0, 2.0, 1e-12);
        assert_eq!(
            too_many.validate(),
            Err(ConfigError::StepResolution { step: 1e-12, min: 1.0, max: 2.0 })
        );

        let single = SweepConfig::default().with_range(SweepParameter::Mu, 1e16, 1e16, 1e10);
        assert!(single.validate().is_ok());
    }

    #[test]
    fn load_sweep_keeps_mu() {
        let cfg = SweepConfig::default()
            .with_rates(1.0, 2.0)
            .with_range(SweepParameter::Load, 0.5, 0.9, 0.1);
        assert_eq!(cfg.rates_for(0.5), (1.0, 2.0));
        assert_eq!(cfg.rates_for(0.25), (0.5, 2.0));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SweepConfig =
            serde_json::from_str(r#"{ "parameter": "load", "min": 0.3, "max": 0.9, "policy": "random" }"#)
                .unwrap();
        assert_eq!(cfg.parameter, SweepParameter::Load);
        assert_eq!(cfg.policy, "random");
        assert_eq!(cfg.capacity, 10);
        assert_eq!(cfg.arrival_reference, ArrivalReference::Clock);
    }
}
