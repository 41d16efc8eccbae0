use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;

use crate::logistics::{PartitionId, Pickup, RequestChannel, RequestId};
use crate::units::{Capability, UnitType};

/// An idle unit is available for work in a partition
#[derive(Message, Debug, Clone, Copy)]
pub struct ReportJobless {
    pub unit: Entity,
    pub partition: PartitionId,
    pub capability: Capability,
    pub position: TilePos,
}

/// The unit is no longer available, for example because it was converted
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRemoved {
    pub unit: Entity,
}

/// The scheduler matched a jobless unit to a request
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAssigned {
    pub unit: Entity,
    pub partition: PartitionId,
    pub channel: RequestChannel,
    pub request: RequestId,
    /// Offer one unit of material was reserved from, if the job carries any
    pub pickup: Option<Pickup>,
}

/// A jobless unit stood on territory its partition lost
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerDisplaced {
    pub unit: Entity,
    pub partition: PartitionId,
    pub position: TilePos,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct WorkerKilled {
    pub unit: Entity,
}

/// A bearer picked up its tool or weapon and became another unit type
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConverted {
    pub unit: Entity,
    pub from: UnitType,
    pub into: UnitType,
}
