pub mod logger;

use crate::analytic::QueueModel;
use crate::queue::{Admission, BoundedQueue, Packet};
use serde::{Deserialize, Serialize};

/// One arrival as seen by the queue it was dispatched to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub sweep_value: f64,
    pub replication: u32,
    pub queue_id: String,
    pub packet_id: u64,
    pub arrival_time: f64,
    pub service_start_time: f64,
    pub service_duration: f64,
    pub departure_time: f64,
    pub wait_duration: f64,
    pub queue_head: usize,
    pub queue_tail: usize,
    pub lost_count: u64,
    pub admission: Admission,
}

impl PacketRecord {
    pub fn capture(
        sweep_value: f64,
        replication: u32,
        queue: &BoundedQueue,
        packet: &Packet,
        admission: Admission,
    ) -> Self {
        Self {
            sweep_value,
            replication,
            queue_id: queue.id().to_string(),
            packet_id: packet.id.value(),
            arrival_time: packet.arrival_time,
            service_start_time: packet.service_start_time,
            service_duration: packet.service_duration,
            departure_time: packet.departure_time,
            wait_duration: packet.wait_duration,
            queue_head: queue.head(),
            queue_tail: queue.tail(),
            lost_count: queue.lost(),
            admission,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationSummary {
    pub replication_index: u32,
    pub lambda: f64,
    pub mu: f64,
    pub load: f64,
    pub analytic_bp: f64,
    pub empirical_bp: f64,
    pub analytic_len: f64,
    pub empirical_len: f64,
    pub analytic_wait: f64,
    pub empirical_wait: f64,
    pub empirical_sojourn: f64,
}

impl ReplicationSummary {
    /// Reduces a finished replication's queues to estimates.
    ///
    /// Blocking and length are per offered packet across all queues. The wait
    /// column is each queue's accumulated sojourn over its final clock, averaged
    /// over the queues that received traffic. With more than one queue this is not
    /// the single-queue `total_wait / t` figure, so compare it across policies
    /// rather than against a one-queue run. `empirical_sojourn` is accumulated
    /// sojourn per admitted packet.
    pub fn from_queues(
        replication_index: u32,
        queues: &[BoundedQueue],
        packets: u64,
        model: &QueueModel,
    ) -> Self {
        let offered = packets as f64;
        let lost: u64 = queues.iter().map(BoundedQueue::lost).sum();
        let accepted: u64 = queues.iter().map(BoundedQueue::accepted).sum();
        let length_samples: f64 = queues.iter().map(BoundedQueue::total_length_samples).sum();
        let total_wait: f64 = queues.iter().map(BoundedQueue::total_wait_duration).sum();

        let used: Vec<&BoundedQueue> = queues.iter().filter(|q| q.clock() > 0.0).collect();
        let empirical_wait = if used.is_empty() {
            0.0
        } else {
            used.iter()
                .map(|q| q.total_wait_duration() / q.clock())
                .sum::<f64>()
                / used.len() as f64
        };

        let empirical_sojourn = if accepted > 0 {
            total_wait / accepted as f64
        } else {
            0.0
        };

        Self {
            replication_index,
            lambda: model.lambda(),
            mu: model.mu(),
            load: model.load(),
            analytic_bp: model.blocking_probability(),
            empirical_bp: lost as f64 / offered,
            analytic_len: model.mean_number_in_system(),
            empirical_len: length_samples / offered,
            analytic_wait: model.mean_wait(),
            empirical_wait,
            empirical_sojourn,
        }
    }
}

/// Means over all replications of one sweep value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub value: f64,
    pub replications: u32,
    pub lambda: f64,
    pub mu: f64,
    pub load: f64,
    pub analytic_bp: f64,
    pub empirical_bp: f64,
    pub analytic_len: f64,
    pub empirical_len: f64,
    pub analytic_wait: f64,
    pub empirical_wait: f64,
    pub empirical_sojourn: f64,
}

impl SweepPoint {
    /// Sums in replication order, so identical inputs give bit-identical means.
    /// Rates and analytic columns are taken from the last replication.
    ///
    /// Returns `None` for an empty slice.
    pub fn aggregate(value: f64, summaries: &[ReplicationSummary]) -> Option<Self> {
        let last = summaries.last()?;
        let n = summaries.len() as f64;
        let mean = |f: fn(&ReplicationSummary) -> f64| summaries.iter().map(f).sum::<f64>() / n;

        Some(Self {
            value,
            replications: summaries.len() as u32,
            lambda: last.lambda,
            mu: last.mu,
            load: last.load,
            analytic_bp: last.analytic_bp,
            empirical_bp: mean(|s| s.empirical_bp),
            analytic_len: last.analytic_len,
            empirical_len: mean(|s| s.empirical_len),
            analytic_wait: last.analytic_wait,
            empirical_wait: mean(|s| s.empirical_wait),
            empirical_sojourn: mean(|s| s.empirical_sojourn),
        })
    }

    pub fn bp_error(&self) -> f64 {
        (self.empirical_bp - self.analytic_bp).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(index: u32, bp: f64) -> ReplicationSummary {
        ReplicationSummary {
            replication_index: index,
            lambda: 1.0,
            mu: 2.0,
            load: 0.5,
            analytic_bp: 0.1,
            empirical_bp: bp,
            analytic_len: 1.0,
            empirical_len: 2.0 * bp,
            analytic_wait: 3.0,
            empirical_wait: bp,
            empirical_sojourn: 1.0,
        }
    }

    #[test]
    fn aggregate_averages_empirical_columns() {
        let point = SweepPoint::aggregate(2.0, &[summary(0, 0.1), summary(1, 0.3)]).unwrap();
        assert_eq!(point.replications, 2);
        assert!((point.empirical_bp - 0.2).abs() < 1e-12);
        assert!((point.empirical_len - 0.4).abs() < 1e-12);
        assert_eq!(point.analytic_bp, 0.1);
        assert_eq!(point.value, 2.0);
        assert!((point.bp_error() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn wait_column_averages_only_queues_with_traffic() {
        use crate::queue::{BoundedQueue, Packet, PacketId};
        use crate::variate::Variates;

        let model = QueueModel::single(1.0, 2.0, 4).unwrap();
        let mut queues = vec![
            BoundedQueue::new("q1", 4, 1.0, 2.0).unwrap(),
            BoundedQueue::new("q2", 4, 1.0, 2.0).unwrap(),
        ];
        let mut variates = Variates::seeded(3);
        for id in 0..50 {
            queues[0].admit(&mut Packet::new(PacketId::new(id)), &mut variates);
        }

        let summary = ReplicationSummary::from_queues(0, &queues, 50, &model);
        let busy = &queues[0];
        assert!((summary.empirical_wait - busy.total_wait_duration() / busy.clock()).abs() < 1e-12);
        assert!(
            (summary.empirical_sojourn - busy.total_wait_duration() / busy.accepted() as f64).abs()
                < 1e-12
        );
    }

    #[test]
    fn aggregate_of_nothing_is_none() {
        assert!(SweepPoint::aggregate(1.0, &[]).is_none());
    }
}
