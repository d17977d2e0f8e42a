pub mod packet;

pub use packet::{Packet, PacketId};

use crate::error::ConfigError;
use crate::variate::Variates;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Admission {
    Accepted,
    Rejected,
}

/// Where the next arrival instant is measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrivalReference {
    /// The queue clock, i.e. the instant of the last arrival, admitted or not.
    #[default]
    Clock,
    /// After a rejection, the head packet's arrival plus one gap sample scaled by
    /// the occupancy. Never earlier than the clock.
    HeadScaled,
}

// departure <- [head][*][*][*][tail] <- arrival
//
// `tail` is the next slot to write. Full and empty are both `head == tail`, so
// every admission decision goes through `len`.
#[derive(Debug, Clone)]
pub struct BoundedQueue {
    id: String,
    capacity: usize,
    lambda: f64,
    mu: f64,
    slots: Vec<Packet>,
    head: usize,
    tail: usize,
    len: usize,
    lost: u64,
    accepted: u64,
    total_wait_duration: f64,
    total_length_samples: f64,
    clock: f64,
    last_rejected: bool,
    reference: ArrivalReference,
}

impl BoundedQueue {
    pub fn new(id: impl Into<String>, capacity: usize, lambda: f64, mu: f64) -> Result<Self, ConfigError> {
        if capacity < 1 {
            return Err(ConfigError::Capacity(capacity));
        }
        let lambda = ConfigError::check_rate("arrival rate", lambda)?;
        let mu = ConfigError::check_rate("service rate", mu)?;

        Ok(Self {
            id: id.into(),
            capacity,
            lambda,
            mu,
            slots: vec![Packet::default(); capacity],
            head: 0,
            tail: 0,
            len: 0,
            lost: 0,
            accepted: 0,
            total_wait_duration: 0.0,
            total_length_samples: 0.0,
            clock: 0.0,
            last_rejected: false,
            reference: ArrivalReference::Clock,
        })
    }

    pub fn with_arrival_reference(mut self, reference: ArrivalReference) -> Self {
        self.reference = reference;
        self
    }

    /// Runs one arrival through the queue.
    ///
    /// Draws the inter-arrival gap and then the service duration from `variates`,
    /// fills in the packet's timeline, evicts packets that have departed by the new
    /// arrival instant, and stores the packet if a slot is free. A full queue counts
    /// the packet as lost; its computed timeline never occupies a slot.
    pub fn admit(&mut self, packet: &mut Packet, variates: &mut Variates) -> Admission {
        // Copied out before the tail slot can be written again
        let previous = self.previous();

        let gap = variates.sample(self.lambda);
        let arrival_time = self.next_arrival(gap);
        let service_duration = variates.sample(self.mu);

        let server_free_at = previous.map_or(arrival_time, |p| p.departure_time);
        packet.schedule(arrival_time, service_duration, server_free_at);

        let sampled_len = self.len;
        self.evict_departed(arrival_time);

        let admission = if self.len == self.capacity {
            self.lost += 1;
            Admission::Rejected
        } else {
            self.slots[self.tail] = *packet;
            self.tail = (self.tail + 1) % self.capacity;
            self.len += 1;
            self.accepted += 1;
            self.total_wait_duration += packet.wait_duration;
            self.total_length_samples += sampled_len as f64;
            Admission::Accepted
        };

        self.last_rejected = admission == Admission::Rejected;
        self.clock = arrival_time;

        trace!(
            queue = %self.id,
            packet = packet.id.value(),
            arrival = packet.arrival_time,
            departure = packet.departure_time,
            head = self.head,
            tail = self.tail,
            len = self.len,
            lost = self.lost,
            ?admission,
            "admit"
        );

        admission
    }

    fn previous(&self) -> Option<Packet> {
        if self.accepted == 0 {
            None
        } else {
            Some(self.slots[(self.tail + self.capacity - 1) % self.capacity])
        }
    }

    fn next_arrival(&self, gap: f64) -> f64 {
        match self.reference {
            ArrivalReference::HeadScaled if self.last_rejected => {
                // A rejection leaves the queue full, so the head slot is live
                let head = &self.slots[self.head];
                (head.arrival_time + gap * self.len as f64).max(self.clock)
            }
            _ => self.clock + gap,
        }
    }

    // Departures along the live range are non-decreasing (single FCFS server), so
    // the scan stops at the first packet still in the system.
    fn evict_departed(&mut self, now: f64) {
        while self.len > 0 && self.slots[self.head].departure_time <= now {
            self.head = (self.head + 1) % self.capacity;
            self.len -= 1;
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn load(&self) -> f64 {
        self.lambda / self.mu
    }

    /// Packets in the system as of the last arrival instant.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn lost(&self) -> u64 {
        self.lost
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn arrivals(&self) -> u64 {
        self.accepted + self.lost
    }

    /// Instant of the most recent arrival.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn total_wait_duration(&self) -> f64 {
        self.total_wait_duration
    }

    pub fn total_length_samples(&self) -> f64 {
        self.total_length_samples
    }

    /// Live packets from head to tail.
    pub fn live(&self) -> impl Iterator<Item = &Packet> + '_ {
        (0..self.len).map(move |i| &self.slots[(self.head + i) % self.capacity])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(queue: &mut BoundedQueue, variates: &mut Variates, n: u64) -> Vec<(Packet, Admission)> {
        (0..n)
            .map(|i| {
                let mut p = Packet::new(PacketId::new(i));
                let a = queue.admit(&mut p, variates);
                (p, a)
            })
            .collect()
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(BoundedQueue::new("q", 0, 1.0, 1.0).unwrap_err(), ConfigError::Capacity(0));
        assert!(matches!(
            BoundedQueue::new("q", 4, 0.0, 1.0),
            Err(ConfigError::Rate { name: "arrival rate", .. })
        ));
        assert!(matches!(
            BoundedQueue::new("q", 4, 1.0, f64::NAN),
            Err(ConfigError::Rate { name: "service rate", .. })
        ));
    }

    #[test]
    fn first_arrival_is_served_immediately() {
        let mut q = BoundedQueue::new("q1", 3, 1.0, 1.0).unwrap();
        let mut v = Variates::seeded(3);
        let mut p = Packet::new(PacketId::new(0));

        assert_eq!(q.admit(&mut p, &mut v), Admission::Accepted);
        assert_eq!(p.service_start_time, p.arrival_time);
        assert!(p.arrival_time > 0.0);
        assert_eq!(q.len(), 1);
        assert_eq!(q.tail(), 1);
        assert_eq!(q.head(), 0);
        assert_eq!(q.clock(), p.arrival_time);
        assert_eq!(q.total_length_samples(), 0.0);
    }

    #[test]
    fn single_slot_buffer_only_holds_one_packet() {
        let mut q = BoundedQueue::new("q1", 1, 50.0, 0.01).unwrap();
        let mut v = Variates::seeded(11);
        let results = feed(&mut q, &mut v, 20);

        assert_eq!(results[0].1, Admission::Accepted);
        assert!(q.len() <= 1);
        assert!(q.lost() > 0);
        assert_eq!(q.accepted() + q.lost(), 20);
    }

    #[test]
    fn service_follows_previous_departure() {
        let mut q = BoundedQueue::new("q1", 1000, 2.0, 1.0).unwrap();
        let mut v = Variates::seeded(5);
        let results = feed(&mut q, &mut v, 500);

        let admitted: Vec<Packet> = results
            .iter()
            .filter(|(_, a)| *a == Admission::Accepted)
            .map(|(p, _)| *p)
            .collect();
        for pair in admitted.windows(2) {
            let expected = pair[1].arrival_time.max(pair[0].departure_time);
            assert_eq!(pair[1].service_start_time, expected);
        }
    }

    #[test]
    fn live_packets_have_not_departed() {
        let mut q = BoundedQueue::new("q1", 5, 1.0, 1.1).unwrap();
        let mut v = Variates::seeded(9);
        for i in 0..2000 {
            let mut p = Packet::new(PacketId::new(i));
            q.admit(&mut p, &mut v);
            assert_eq!(q.live().count(), q.len());
            assert!(q.live().all(|live| live.departure_time > q.clock()));
        }
    }

    #[test]
    fn head_scaled_reference_keeps_arrivals_monotone() {
        let mut q = BoundedQueue::new("q1", 2, 5.0, 0.5)
            .unwrap()
            .with_arrival_reference(ArrivalReference::HeadScaled);
        let mut v = Variates::seeded(21);
        let mut last = 0.0;
        for i in 0..1000 {
            let mut p = Packet::new(PacketId::new(i));
            q.admit(&mut p, &mut v);
            assert!(p.arrival_time >= last);
            last = p.arrival_time;
        }
        assert!(q.lost() > 0);
    }
}
