//! Testing utilities for the logistics scheduler
//!
//! Helpers to build a bare ECS world with the scheduler resources and message
//! queues, so systems can be run one at a time with `run_system_once`.

use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;

use crate::logistics::{LogisticsSettings, PartitionId, Partitions, SimulationRng};
use crate::messages::{
    CancelRequest, DeliveryReport, InsertRequest, JobAssigned, MergePartitions, OfferMaterial,
    PartitionSplit, PartitionsMerged, ReleaseTerritory, ReportJobless, ReprioritizeRequest,
    RequestCancelled, RequestInserted, RequestRejected, RequestSatisfied, RequesterRemoved,
    SplitPartition, UnitConverted, WithdrawOffer, WorkerDisplaced, WorkerKilled, WorkerRemoved,
};
use crate::units::UnitType;
use crate::workers::{WorkSiteGrid, Worker};

/// Creates a world holding every scheduler resource and message queue
pub fn create_logistics_world() -> World {
    let mut world = World::new();

    world.init_resource::<Partitions>();
    world.init_resource::<LogisticsSettings>();
    world.init_resource::<SimulationRng>();
    world.init_resource::<WorkSiteGrid>();

    world.init_resource::<Messages<InsertRequest>>();
    world.init_resource::<Messages<RequestInserted>>();
    world.init_resource::<Messages<RequestRejected>>();
    world.init_resource::<Messages<CancelRequest>>();
    world.init_resource::<Messages<ReprioritizeRequest>>();
    world.init_resource::<Messages<RequesterRemoved>>();
    world.init_resource::<Messages<RequestCancelled>>();
    world.init_resource::<Messages<DeliveryReport>>();
    world.init_resource::<Messages<RequestSatisfied>>();
    world.init_resource::<Messages<OfferMaterial>>();
    world.init_resource::<Messages<WithdrawOffer>>();
    world.init_resource::<Messages<SplitPartition>>();
    world.init_resource::<Messages<PartitionSplit>>();
    world.init_resource::<Messages<MergePartitions>>();
    world.init_resource::<Messages<PartitionsMerged>>();
    world.init_resource::<Messages<ReleaseTerritory>>();
    world.init_resource::<Messages<WorkerDisplaced>>();
    world.init_resource::<Messages<ReportJobless>>();
    world.init_resource::<Messages<WorkerRemoved>>();
    world.init_resource::<Messages<JobAssigned>>();
    world.init_resource::<Messages<WorkerKilled>>();
    world.init_resource::<Messages<UnitConverted>>();

    world
}

/// Queues a message as if another system had written it
pub fn send<M: Message>(world: &mut World, message: M) {
    world.resource_mut::<Messages<M>>().write(message);
}

/// Takes every queued message of one type
pub fn drain<M: Message>(world: &mut World) -> Vec<M> {
    world.resource_mut::<Messages<M>>().drain().collect()
}

/// Spawns a worker standing at `position`
pub fn spawn_worker(
    world: &mut World,
    unit_type: UnitType,
    partition: PartitionId,
    position: TilePos,
) -> Entity {
    world
        .spawn(Worker {
            unit_type,
            partition,
            position,
        })
        .id()
}
