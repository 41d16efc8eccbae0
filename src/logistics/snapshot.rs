use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::arena::{RequestArena, RequestId};
use super::error::LogisticsError;
use super::jobless::JoblessUnit;
use super::offers::MaterialOffer;
use super::partitions::{Partition, PartitionId, Partitions};

/// Queue contents of one partition in serving order
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct PartitionSnapshot {
    pub id: PartitionId,
    pub player: u8,
    pub requests: Vec<RequestId>,
    pub jobless: Vec<JoblessUnit>,
    pub offers: Vec<MaterialOffer>,
}

/// Persistent form of [`Partitions`].
///
/// Stored as a plain reflected resource so the save pipeline can write it
/// next to the rest of the world. The arena is written whole, so request ids
/// stay valid across a reload.
#[derive(Resource, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Resource)]
pub struct LogisticsSnapshot {
    pub next_partition: u32,
    pub records: RequestArena,
    pub partitions: Vec<PartitionSnapshot>,
}

impl LogisticsSnapshot {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl Partitions {
    pub fn snapshot(&self) -> LogisticsSnapshot {
        let partitions = self
            .partitions
            .values()
            .map(|partition| PartitionSnapshot {
                id: partition.id,
                player: partition.player,
                requests: partition.requests.record_ids().collect(),
                jobless: partition.jobless.iter().copied().collect(),
                offers: partition.offers.iter().copied().collect(),
            })
            .collect();

        LogisticsSnapshot {
            next_partition: self.next_id,
            records: self.records.clone(),
            partitions,
        }
    }

    /// Rebuilds the scheduler so that every persisted id, queue order,
    /// jobless membership and offer is exactly as it was when the snapshot
    /// was taken.
    ///
    /// Every record must be queued by exactly one partition.
    pub fn restore(snapshot: &LogisticsSnapshot) -> Result<Self, LogisticsError> {
        let records = snapshot.records.clone();
        let mut partitions = BTreeMap::new();
        let mut unit_index = HashMap::new();
        let mut queued = HashSet::new();
        let mut next_id = snapshot.next_partition;

        for saved in &snapshot.partitions {
            let mut partition = Partition::new(saved.id, saved.player);
            for id in &saved.requests {
                if !queued.insert(*id) {
                    return Err(LogisticsError::CorruptSnapshot);
                }
                partition.requests.reattach(*id, &records)?;
            }
            for jobless in &saved.jobless {
                if unit_index.insert(jobless.unit, saved.id).is_some() {
                    return Err(LogisticsError::CorruptSnapshot);
                }
                partition.jobless.add(*jobless);
            }
            for offer in &saved.offers {
                partition
                    .offers
                    .add(offer.position, offer.material, offer.amount);
            }
            if partitions.insert(saved.id, partition).is_some() {
                return Err(LogisticsError::CorruptSnapshot);
            }
            next_id = next_id.max(saved.id.0 + 1);
        }

        if queued.len() != records.len() {
            return Err(LogisticsError::CorruptSnapshot);
        }

        info!(
            "Restored {} partitions with {} requests",
            partitions.len(),
            records.len()
        );
        Ok(Self {
            records,
            partitions,
            unit_index,
            next_id,
        })
    }
}
