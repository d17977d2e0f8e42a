pub mod analytic;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod simulation;
pub mod variate;

pub use analytic::QueueModel;
pub use dispatch::Dispatcher;
pub use error::ConfigError;
pub use queue::BoundedQueue;
pub use simulation::{Experiment, SweepConfig};

pub mod prelude {
    pub use crate::analytic::{QueueModel, erlang_b};
    pub use crate::dispatch::{Dispatcher, DispatchRegistry};
    pub use crate::error::ConfigError;
    pub use crate::metrics::{PacketRecord, ReplicationSummary, SweepPoint};
    pub use crate::queue::{Admission, ArrivalReference, BoundedQueue, Packet, PacketId};
    pub use crate::simulation::{Experiment, ExperimentReport, SweepConfig, SweepParameter};
    pub use crate::variate::Variates;
}
