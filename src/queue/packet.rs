use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PacketId(u64);

impl PacketId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// One arrival's timeline, in simulated time units.
///
/// Only the id is set at creation. `BoundedQueue::admit` fills in the rest, and
/// nothing changes the record after that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub id: PacketId,
    pub arrival_time: f64,
    pub service_start_time: f64,
    pub service_duration: f64,
    pub departure_time: f64,
    // Sojourn: departure minus arrival, service included
    pub wait_duration: f64,
}

impl Packet {
    pub fn new(id: PacketId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Time spent queued before service began.
    pub fn queueing_delay(&self) -> f64 {
        self.service_start_time - self.arrival_time
    }

    pub(crate) fn schedule(&mut self, arrival_time: f64, service_duration: f64, server_free_at: f64) {
        self.arrival_time = arrival_time;
        self.service_duration = service_duration;
        self.service_start_time = arrival_time.max(server_free_at);
        self.departure_time = self.service_start_time + service_duration;
        self.wait_duration = self.departure_time - arrival_time;
    }
}
