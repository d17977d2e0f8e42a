pub mod config;
pub use config::{SweepConfig, SweepParameter};

use crate::analytic::QueueModel;
use crate::dispatch::DispatchRegistry;
use crate::error::ConfigError;
use crate::metrics::{PacketRecord, ReplicationSummary, SweepPoint};
use crate::queue::{BoundedQueue, Packet, PacketId};
use crate::variate::{Variates, substream_seed};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// One finished replication. `queues` are the replication's queues in their final
/// state.
#[derive(Debug, Clone)]
pub struct ReplicationOutcome {
    pub summary: ReplicationSummary,
    pub queues: Vec<BoundedQueue>,
    pub trace: Vec<PacketRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub point: SweepPoint,
    pub replications: Vec<ReplicationSummary>,
    #[serde(skip)]
    pub trace: Vec<PacketRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub config: SweepConfig,
    pub results: Vec<SweepResult>,
}

impl ExperimentReport {
    pub fn points(&self) -> Vec<SweepPoint> {
        self.results.iter().map(|r| r.point.clone()).collect()
    }

    pub fn summaries(&self) -> impl Iterator<Item = &ReplicationSummary> + '_ {
        self.results.iter().flat_map(|r| r.replications.iter())
    }

    pub fn trace(&self) -> impl Iterator<Item = &PacketRecord> + '_ {
        self.results.iter().flat_map(|r| r.trace.iter())
    }
}

/// Parameter sweep over independent replications.
///
/// Each replication gets fresh queues and its own random stream seeded from
/// `(seed, sweep index, replication index)`, so results do not depend on whether
/// replications run in parallel.
pub struct Experiment {
    config: SweepConfig,
}

impl Experiment {
    pub fn new(config: SweepConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// `min, min + step, ...` while the accumulated value stays `<= max`.
    pub fn sweep_values(&self) -> Vec<f64> {
        let mut values = Vec::new();
        let mut value = self.config.min;
        while value <= self.config.max {
            values.push(value);
            value += self.config.step;
        }
        values
    }

    pub fn run(&self) -> Result<ExperimentReport, ConfigError> {
        let values = self.sweep_values();

        info!("Starting sweep: {}", self.config.name);
        info!(
            "Sweeping {} over [{}, {}] step {} ({} values)",
            self.config.parameter,
            self.config.min,
            self.config.max,
            self.config.step,
            values.len()
        );
        info!(
            "Queues: {} x K={}, policy: {}, replications: {}, packets: {}",
            self.config.servers,
            self.config.capacity,
            self.config.policy,
            self.config.replications,
            self.config.packets
        );

        let pb = if self.config.show_progress {
            let pb = ProgressBar::new(values.len() as u64 * self.config.replications as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} runs {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓░"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut results = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let result = self.run_point(index, value, &pb)?;
            pb.set_message(format!(
                "{}={:.3} bp: {:.4} (analytic {:.4})",
                self.config.parameter, value, result.point.empirical_bp, result.point.analytic_bp
            ));
            results.push(result);
        }

        pb.finish_with_message("Sweep complete");
        info!("Sweep finished: {} values", results.len());

        Ok(ExperimentReport {
            config: self.config.clone(),
            results,
        })
    }

    fn run_point(&self, index: usize, value: f64, pb: &ProgressBar) -> Result<SweepResult, ConfigError> {
        let run = |replication: u32| {
            let outcome = self.run_replication(index, value, replication);
            pb.inc(1);
            outcome
        };

        let outcomes: Vec<ReplicationOutcome> = if self.config.parallel {
            (0..self.config.replications)
                .into_par_iter()
                .map(run)
                .collect::<Result<_, _>>()?
        } else {
            (0..self.config.replications)
                .map(run)
                .collect::<Result<_, _>>()?
        };

        let mut replications = Vec::with_capacity(outcomes.len());
        let mut trace = Vec::new();
        for outcome in outcomes {
            replications.push(outcome.summary);
            trace.extend(outcome.trace);
        }

        let point = SweepPoint::aggregate(value, &replications).ok_or(ConfigError::Replications)?;

        debug!(
            "{}={:.4} lambda={:.4} mu={:.4} rho={:.4} bp {:.6}/{:.6} len {:.5}/{:.5} wait {:.6}/{:.6}",
            self.config.parameter,
            value,
            point.lambda,
            point.mu,
            point.load,
            point.analytic_bp,
            point.empirical_bp,
            point.analytic_len,
            point.empirical_len,
            point.analytic_wait,
            point.empirical_wait
        );

        Ok(SweepResult {
            point,
            replications,
            trace,
        })
    }

    /// Feeds `packets` arrivals through fresh queues for one sweep value.
    pub fn run_replication(
        &self,
        index: usize,
        value: f64,
        replication: u32,
    ) -> Result<ReplicationOutcome, ConfigError> {
        let cfg = &self.config;
        let (lambda, mu) = cfg.rates_for(value);
        let model = QueueModel::single(lambda, mu, cfg.capacity)?;
        let dispatcher = DispatchRegistry::global().create(&cfg.policy)?;

        let mut variates = Variates::seeded(substream_seed(cfg.seed, index as u64, replication as u64));
        let mut queues = (0..cfg.servers)
            .map(|i| {
                BoundedQueue::new(format!("q{}", i + 1), cfg.capacity, lambda, mu)
                    .map(|q| q.with_arrival_reference(cfg.arrival_reference))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut trace = Vec::new();
        for t in 0..cfg.packets {
            let draw = variates.uniform();
            let target = dispatcher.select(&queues, draw);
            let queue = &mut queues[target];

            let mut packet = Packet::new(PacketId::new(t));
            let admission = queue.admit(&mut packet, &mut variates);

            if cfg.trace_packets {
                trace.push(PacketRecord::capture(value, replication, queue, &packet, admission));
            }
        }

        let summary = ReplicationSummary::from_queues(replication, &queues, cfg.packets, &model);

        Ok(ReplicationOutcome {
            summary,
            queues,
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SweepConfig {
        SweepConfig::default()
            .with_range(SweepParameter::Mu, 1.0, 2.0, 0.5)
            .with_runs(3, 500)
            .with_seed(17)
    }

    #[test]
    fn sweep_includes_exact_upper_bound() {
        let exp = Experiment::new(small()).unwrap();
        assert_eq!(exp.sweep_values(), vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let cfg = small().with_queues(2, 0);
        assert_eq!(Experiment::new(cfg).err(), Some(ConfigError::Capacity(0)));
    }

    #[test]
    fn replication_is_reproducible() {
        let exp = Experiment::new(small()).unwrap();
        let a = exp.run_replication(1, 1.5, 2).unwrap();
        let b = exp.run_replication(1, 1.5, 2).unwrap();
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn trace_covers_every_packet() {
        let exp = Experiment::new(small().with_trace(true)).unwrap();
        let outcome = exp.run_replication(0, 1.0, 0).unwrap();
        assert_eq!(outcome.trace.len(), 500);
        let ids: Vec<u64> = outcome.trace.iter().map(|r| r.packet_id).collect();
        assert_eq!(ids, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn report_has_one_point_per_value() {
        let report = Experiment::new(small()).unwrap().run().unwrap();
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summaries().count(), 9);
        assert_eq!(report.trace().count(), 0);
        for (result, mu) in report.results.iter().zip([1.0, 1.5, 2.0]) {
            assert_eq!(result.point.mu, mu);
            assert_eq!(result.point.replications, 3);
        }
    }
}
