use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RNG_SEED, MAX_ASSIGNMENTS_PER_TICK};
use crate::messages::{
    CancelRequest, DeliveryReport, InsertRequest, JobAssigned, MergePartitions, OfferMaterial,
    PartitionSplit, PartitionsMerged, ReleaseTerritory, ReportJobless, ReprioritizeRequest,
    RequestCancelled, RequestInserted, RequestRejected, RequestSatisfied, RequesterRemoved,
    SplitPartition, WithdrawOffer, WorkerDisplaced, WorkerRemoved,
};

pub mod arena;
pub mod error;
pub mod jobless;
pub mod manager;
pub mod offers;
pub mod partitions;
pub mod priority;
pub mod queue;
pub mod request;
pub mod rng;
pub mod snapshot;
pub mod systems;


pub use arena::{RequestArena, RequestId};
pub use error::LogisticsError;
pub use jobless::{JoblessRegistry, JoblessUnit};
pub use manager::PartitionRequestManager;
pub use offers::{MaterialOffer, OfferRegistry, Pickup};
pub use partitions::{JobAssignment, Partition, PartitionId, Partitions, ReleasedTerritory};
pub use priority::Priority;
pub use queue::RequestQueue;
pub use request::{NewRequest, QueueRef, RequestChannel, RequestKind, RequestRecord};
pub use rng::SimulationRng;
pub use snapshot::{LogisticsSnapshot, PartitionSnapshot};

/// Scheduler systems, chained so topology changes land before requests and
/// dispatch sees everything reported this tick.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct LogisticsSet;

/// Tunables of the scheduler
#[derive(Resource, Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
pub struct LogisticsSettings {
    /// Seed of [`SimulationRng`], applied at startup
    pub seed: u64,
    /// Upper bound of job assignments over all partitions in one tick
    pub max_assignments_per_tick: usize,
}

impl Default for LogisticsSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_RNG_SEED,
            max_assignments_per_tick: MAX_ASSIGNMENTS_PER_TICK,
        }
    }
}

/// Plugin that owns the partition scheduler and its message interface
pub struct LogisticsPlugin;

impl Plugin for LogisticsPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<LogisticsSettings>()
            .init_resource::<LogisticsSettings>()
            .init_resource::<Partitions>()
            .init_resource::<SimulationRng>();

        app.add_message::<InsertRequest>()
            .add_message::<RequestInserted>()
            .add_message::<RequestRejected>()
            .add_message::<CancelRequest>()
            .add_message::<ReprioritizeRequest>()
            .add_message::<RequesterRemoved>()
            .add_message::<RequestCancelled>()
            .add_message::<DeliveryReport>()
            .add_message::<RequestSatisfied>()
            .add_message::<OfferMaterial>()
            .add_message::<WithdrawOffer>()
            .add_message::<SplitPartition>()
            .add_message::<PartitionSplit>()
            .add_message::<MergePartitions>()
            .add_message::<PartitionsMerged>()
            .add_message::<ReleaseTerritory>()
            .add_message::<WorkerDisplaced>()
            .add_message::<ReportJobless>()
            .add_message::<WorkerRemoved>()
            .add_message::<JobAssigned>();

        app.add_systems(Startup, systems::seed_simulation_rng);
        app.add_systems(
            Update,
            (
                systems::apply_topology_changes,
                systems::apply_request_commands,
                systems::apply_offer_changes,
                systems::apply_delivery_reports,
                systems::apply_jobless_reports,
                systems::dispatch_jobs,
            )
                .chain()
                .in_set(LogisticsSet),
        );
    }
}
