//! Closed-form M/M/1/K and M/M/c/K performance measures.
//!
//! The single-server formulas are singular at ρ = 1. Within `LOAD_EPSILON` of 1 the
//! L'Hôpital limits are used instead:
//!
//! - blocking probability → 1 / (K + 1)
//! - mean number in system → K / 2
//!
//! Mean wait always follows from Little's law with the effective arrival rate, so
//! it inherits the limit. For ρ > 1 the formulas are evaluated in terms of 1/ρ to
//! keep the powers bounded.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const LOAD_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueModel {
    lambda: f64,
    mu: f64,
    capacity: usize,
    servers: usize,
}

impl QueueModel {
    pub fn new(lambda: f64, mu: f64, capacity: usize, servers: usize) -> Result<Self, ConfigError> {
        let lambda = ConfigError::check_rate("arrival rate", lambda)?;
        let mu = ConfigError::check_rate("service rate", mu)?;
        if servers < 1 {
            return Err(ConfigError::Servers);
        }
        if capacity < servers {
            return Err(ConfigError::CapacityBelowServers { capacity, servers });
        }
        Ok(Self { lambda, mu, capacity, servers })
    }

    /// M/M/1/K.
    pub fn single(lambda: f64, mu: f64, capacity: usize) -> Result<Self, ConfigError> {
        Self::new(lambda, mu, capacity, 1)
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn servers(&self) -> usize {
        self.servers
    }

    /// Offered traffic λ/μ in Erlangs.
    pub fn offered_load(&self) -> f64 {
        self.lambda / self.mu
    }

    /// Utilisation ρ = λ/(c·μ).
    pub fn load(&self) -> f64 {
        self.lambda / (self.servers as f64 * self.mu)
    }

    pub fn blocking_probability(&self) -> f64 {
        if self.servers == 1 {
            single_blocking(self.load(), self.capacity)
        } else if self.capacity == self.servers {
            erlang_b(self.offered_load(), self.servers)
        } else {
            let p = self.state_probabilities();
            p[self.capacity]
        }
    }

    pub fn mean_number_in_system(&self) -> f64 {
        if self.servers == 1 {
            single_mean_number(self.load(), self.capacity)
        } else {
            self.state_probabilities()
                .iter()
                .enumerate()
                .map(|(n, p)| n as f64 * p)
                .sum()
        }
    }

    /// Mean sojourn time of an admitted customer.
    pub fn mean_wait(&self) -> f64 {
        let effective = self.lambda * (1.0 - self.blocking_probability());
        self.mean_number_in_system() / effective
    }

    /// Stationary distribution `p_0..=p_K` of the birth-death chain.
    ///
    /// Terms are accumulated as logarithms and normalised against the largest,
    /// so `(a/c)^K` beyond the f64 range still gives a finite distribution.
    pub fn state_probabilities(&self) -> Vec<f64> {
        let ln_a = self.offered_load().ln();
        let mut log_terms = Vec::with_capacity(self.capacity + 1);
        let mut log_term = 0.0;
        log_terms.push(log_term);
        for n in 1..=self.capacity {
            log_term += ln_a - (n.min(self.servers) as f64).ln();
            log_terms.push(log_term);
        }

        let peak = log_terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let terms: Vec<f64> = log_terms.iter().map(|l| (l - peak).exp()).collect();
        let total: f64 = terms.iter().sum();
        terms.iter().map(|t| t / total).collect()
    }
}

/// Erlang loss formula: `(a^c/c!) / Σ_{i=0}^{c} a^i/i!` for offered traffic `a`.
pub fn erlang_b(offered_load: f64, servers: usize) -> f64 {
    // B(a, n) = a·B(a, n-1) / (n + a·B(a, n-1)), B(a, 0) = 1
    (1..=servers).fold(1.0, |b, n| {
        let ab = offered_load * b;
        ab / (n as f64 + ab)
    })
}

fn single_blocking(rho: f64, k: usize) -> f64 {
    if (rho - 1.0).abs() < LOAD_EPSILON {
        return 1.0 / (k as f64 + 1.0);
    }
    if rho < 1.0 {
        (1.0 - rho) * rho.powi(k as i32) / (1.0 - rho.powi(k as i32 + 1))
    } else {
        let r = 1.0 / rho;
        (1.0 - r) / (1.0 - r.powi(k as i32 + 1))
    }
}

fn single_mean_number(rho: f64, k: usize) -> f64 {
    let k1 = k as f64 + 1.0;
    if (rho - 1.0).abs() < LOAD_EPSILON {
        return k as f64 / 2.0;
    }
    if rho < 1.0 {
        rho / (1.0 - rho) - k1 * rho.powi(k as i32 + 1) / (1.0 - rho.powi(k as i32 + 1))
    } else {
        let r = 1.0 / rho;
        rho / (1.0 - rho) + k1 / (1.0 - r.powi(k as i32 + 1))
    }
}
