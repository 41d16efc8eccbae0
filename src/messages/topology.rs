use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;

use crate::logistics::PartitionId;

/// The tiles in `moved` were cut off from `source` and form a new partition
#[derive(Message, Debug, Clone)]
pub struct SplitPartition {
    pub source: PartitionId,
    pub moved: Vec<TilePos>,
}

#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct PartitionSplit {
    pub source: PartitionId,
    pub created: PartitionId,
    pub moved: Vec<TilePos>,
}

/// Two partitions of the same player became connected
#[derive(Message, Debug, Clone, Copy)]
pub struct MergePartitions {
    pub survivor: PartitionId,
    pub absorbed: PartitionId,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionsMerged {
    pub survivor: PartitionId,
    pub absorbed: PartitionId,
}

/// The tiles in `positions` were lost to another player or to nobody
#[derive(Message, Debug, Clone)]
pub struct ReleaseTerritory {
    pub partition: PartitionId,
    pub positions: Vec<TilePos>,
}
