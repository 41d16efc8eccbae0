use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use std::collections::{BTreeMap, HashSet};

use super::arena::{RequestArena, RequestId};
use super::error::LogisticsError;
use super::partitions::PartitionId;
use super::priority::Priority;
use super::queue::RequestQueue;
use super::request::{QueueRef, RequestChannel, RequestRecord};

/// All request queues of one partition, one per channel.
#[derive(Debug, Clone)]
pub struct PartitionRequestManager {
    partition: PartitionId,
    queues: BTreeMap<RequestChannel, RequestQueue>,
}

impl PartitionRequestManager {
    pub fn new(partition: PartitionId) -> Self {
        Self {
            partition,
            queues: BTreeMap::new(),
        }
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    /// Number of queued records over all channels and tiers
    pub fn len(&self) -> usize {
        self.queues.values().map(RequestQueue::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(RequestQueue::is_empty)
    }

    /// Channels that currently hold at least one record
    pub fn channels(&self) -> impl Iterator<Item = RequestChannel> + '_ {
        self.queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(channel, _)| *channel)
    }

    pub fn queue(&self, channel: RequestChannel) -> Option<&RequestQueue> {
        self.queues.get(&channel)
    }

    fn queue_mut(&mut self, channel: RequestChannel) -> &mut RequestQueue {
        self.queues
            .entry(channel)
            .or_insert_with(|| RequestQueue::new(channel))
    }

    /// Queued ids in persistence order: channel, then tier from most urgent,
    /// then queue order.
    pub fn record_ids(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.queues.values().flat_map(|queue| {
            Priority::ALL
                .into_iter()
                .rev()
                .flat_map(move |tier| queue.tier(tier))
        })
    }

    /// Appends a record to the tail of its channel and tier.
    pub fn insert(&mut self, id: RequestId, arena: &mut RequestArena) -> Result<(), LogisticsError> {
        let record = arena
            .get_mut(id)
            .ok_or(LogisticsError::UnknownRequest(id))?;
        if record.owner.is_some() {
            return Err(LogisticsError::AlreadyQueued(id));
        }

        let tier = record.priority;
        let channel = record.channel();
        record.owner = Some(QueueRef {
            partition: self.partition,
            tier,
        });
        self.queue_mut(channel).push_back(tier, id);
        Ok(())
    }

    /// Re-queues a restored record at the tail of the tier its `owner` names
    pub(crate) fn reattach(&mut self, id: RequestId, arena: &RequestArena) -> Result<(), LogisticsError> {
        let record = arena.get(id).ok_or(LogisticsError::UnknownRequest(id))?;
        let owner = match record.owner {
            Some(owner) if owner.partition == self.partition => owner,
            _ => return Err(LogisticsError::CorruptSnapshot),
        };
        self.queue_mut(record.channel()).push_back(owner.tier, id);
        Ok(())
    }

    /// Hands out the best request of a channel and promises one unit to it.
    ///
    /// Higher tiers always win; a steady stream of urgent requests starves
    /// lower tiers.
    pub fn serve(&mut self, channel: RequestChannel, arena: &mut RequestArena) -> Option<RequestId> {
        self.serve_where(channel, arena, |_| true)
    }

    /// Like [`Self::serve`], but skips records that fail `accept` for now
    pub fn serve_where(
        &mut self,
        channel: RequestChannel,
        arena: &mut RequestArena,
        accept: impl Fn(&RequestRecord) -> bool,
    ) -> Option<RequestId> {
        let queue = self.queues.get_mut(&channel)?;

        for tier in Priority::serving_order() {
            if let Some(id) = queue.serve_best_where(tier, arena, &accept) {
                if let Some(record) = arena.get_mut(id) {
                    record.in_delivery += 1;
                }
                debug!(
                    "Partition {:?} served request {} on {:?} ({:?})",
                    self.partition, id, channel, tier
                );
                return Some(id);
            }
        }
        None
    }

    /// Detaches a record from its queue without destroying it
    pub fn withdraw(&mut self, id: RequestId, arena: &mut RequestArena) -> Result<(), LogisticsError> {
        let record = arena
            .get_mut(id)
            .ok_or(LogisticsError::UnknownRequest(id))?;
        let owner = match record.owner {
            Some(owner) if owner.partition == self.partition => owner,
            _ => return Err(LogisticsError::NotQueuedHere(id, self.partition)),
        };
        let channel = record.channel();
        record.owner = None;

        if let Some(queue) = self.queues.get_mut(&channel) {
            queue.remove(owner.tier, id);
        }
        Ok(())
    }

    /// Moves a queued record to another tier, at the tail
    pub fn reprioritize(
        &mut self,
        id: RequestId,
        tier: Priority,
        arena: &mut RequestArena,
    ) -> Result<(), LogisticsError> {
        self.withdraw(id, arena)?;
        if let Some(record) = arena.get_mut(id) {
            record.priority = tier;
        }
        self.insert(id, arena)
    }

    /// Moves every record located at one of `positions` into `target`.
    /// Used when the territory at those positions becomes a new partition.
    pub fn transfer_by_position(
        &mut self,
        positions: &HashSet<TilePos>,
        target: &mut PartitionRequestManager,
        arena: &mut RequestArena,
    ) -> usize {
        assert_ne!(
            self.partition, target.partition,
            "can't transfer requests into the same partition"
        );

        let target_partition = target.partition;
        self.queues
            .values_mut()
            .map(|queue| {
                let target_queue = target.queue_mut(queue.channel());
                queue.transfer_by_position(positions, target_queue, target_partition, arena)
            })
            .sum()
    }

    /// Appends all queues to `target`; this manager is empty afterwards.
    pub fn merge_all_into(&mut self, target: &mut PartitionRequestManager, arena: &mut RequestArena) {
        assert_ne!(
            self.partition, target.partition,
            "can't merge a partition into itself"
        );

        let target_partition = target.partition;
        for queue in self.queues.values_mut() {
            let target_queue = target.queue_mut(queue.channel());
            queue.merge_into(target_queue, target_partition, arena);
        }
        self.queues.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::BuildingType;
    use crate::goods::Material;
    use crate::logistics::request::{NewRequest, RequestKind};
    use crate::units::UnitType;

    fn material(material: Material, x: u32, tier: Priority) -> RequestRecord {
        RequestRecord::new(
            Entity::PLACEHOLDER,
            NewRequest::new(
                TilePos { x, y: 0 },
                RequestKind::Material {
                    material,
                    building: BuildingType::Castle,
                },
                2,
            )
            .with_priority(tier),
        )
    }

    fn insert(
        manager: &mut PartitionRequestManager,
        arena: &mut RequestArena,
        record: RequestRecord,
    ) -> RequestId {
        let id = arena.insert(record);
        manager.insert(id, arena).unwrap();
        id
    }

    const PLANK: RequestChannel = RequestChannel::Material {
        material: Material::Plank,
        building: BuildingType::Castle,
    };

    #[test]
    fn serve_prefers_higher_tier_and_marks_delivery() {
        let mut arena = RequestArena::default();
        let mut manager = PartitionRequestManager::new(PartitionId(1));
        let low = insert(&mut manager, &mut arena, material(Material::Plank, 1, Priority::Low));
        let high = insert(&mut manager, &mut arena, material(Material::Plank, 2, Priority::High));

        assert_eq!(manager.serve(PLANK, &mut arena), Some(high));
        assert_eq!(arena.get(high).unwrap().in_delivery(), 1);
        assert_eq!(manager.serve(PLANK, &mut arena), Some(high));
        // High is fully covered now, low gets its turn
        assert_eq!(manager.serve(PLANK, &mut arena), Some(low));
    }

    #[test]
    fn stopped_requests_are_never_served() {
        let mut arena = RequestArena::default();
        let mut manager = PartitionRequestManager::new(PartitionId(1));
        let parked = insert(&mut manager, &mut arena, material(Material::Plank, 1, Priority::Stop));

        assert_eq!(manager.serve(PLANK, &mut arena), None);

        manager.reprioritize(parked, Priority::Low, &mut arena).unwrap();
        assert_eq!(manager.serve(PLANK, &mut arena), Some(parked));
    }

    #[test]
    fn channels_are_independent() {
        let mut arena = RequestArena::default();
        let mut manager = PartitionRequestManager::new(PartitionId(1));
        insert(&mut manager, &mut arena, material(Material::Stone, 1, Priority::High));

        assert_eq!(manager.serve(PLANK, &mut arena), None);
        assert_eq!(
            manager.channels().collect::<Vec<_>>(),
            vec![RequestChannel::Material {
                material: Material::Stone,
                building: BuildingType::Castle,
            }]
        );
    }

    #[test]
    fn reprioritize_moves_to_tail_of_new_tier() {
        let mut arena = RequestArena::default();
        let mut manager = PartitionRequestManager::new(PartitionId(1));
        let a = insert(&mut manager, &mut arena, material(Material::Plank, 1, Priority::Normal));
        let b = insert(&mut manager, &mut arena, material(Material::Plank, 2, Priority::High));

        manager.reprioritize(a, Priority::High, &mut arena).unwrap();

        let queue = manager.queue(PLANK).unwrap();
        assert_eq!(queue.tier(Priority::High).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(queue.tier_len(Priority::Normal), 0);
        assert_eq!(
            arena.get(a).unwrap().owner(),
            Some(QueueRef {
                partition: PartitionId(1),
                tier: Priority::High
            })
        );
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut arena = RequestArena::default();
        let mut manager = PartitionRequestManager::new(PartitionId(1));
        let a = insert(&mut manager, &mut arena, material(Material::Plank, 1, Priority::Normal));

        assert_eq!(
            manager.insert(a, &mut arena),
            Err(LogisticsError::AlreadyQueued(a))
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn withdraw_from_foreign_partition_fails() {
        let mut arena = RequestArena::default();
        let mut home = PartitionRequestManager::new(PartitionId(1));
        let mut other = PartitionRequestManager::new(PartitionId(2));
        let a = insert(&mut home, &mut arena, material(Material::Plank, 1, Priority::Normal));

        assert_eq!(
            other.withdraw(a, &mut arena),
            Err(LogisticsError::NotQueuedHere(a, PartitionId(2)))
        );
        assert!(home.withdraw(a, &mut arena).is_ok());
        assert!(home.is_empty());
        assert!(!arena.get(a).unwrap().is_queued());
    }

    #[test]
    fn transfer_creates_missing_queues_in_target() {
        let mut arena = RequestArena::default();
        let mut source = PartitionRequestManager::new(PartitionId(1));
        let mut target = PartitionRequestManager::new(PartitionId(2));
        let creation = insert(
            &mut source,
            &mut arena,
            RequestRecord::new(
                Entity::PLACEHOLDER,
                NewRequest::new(
                    TilePos { x: 5, y: 5 },
                    RequestKind::WorkerCreation {
                        unit: UnitType::Bricklayer,
                    },
                    1,
                ),
            ),
        );
        let stays = insert(&mut source, &mut arena, material(Material::Plank, 1, Priority::Normal));

        let moved = source.transfer_by_position(
            &HashSet::from([TilePos { x: 5, y: 5 }]),
            &mut target,
            &mut arena,
        );

        assert_eq!(moved, 1);
        assert_eq!(target.record_ids().collect::<Vec<_>>(), vec![creation]);
        assert_eq!(source.record_ids().collect::<Vec<_>>(), vec![stays]);
        assert_eq!(target.serve(RequestChannel::WorkerCreation, &mut arena), Some(creation));
    }

    #[test]
    fn merge_appends_after_existing_records() {
        let mut arena = RequestArena::default();
        let mut absorbed = PartitionRequestManager::new(PartitionId(1));
        let mut survivor = PartitionRequestManager::new(PartitionId(2));
        let s1 = insert(&mut survivor, &mut arena, material(Material::Plank, 1, Priority::Normal));
        let a1 = insert(&mut absorbed, &mut arena, material(Material::Plank, 2, Priority::Normal));
        let a2 = insert(&mut absorbed, &mut arena, material(Material::Plank, 3, Priority::Normal));

        absorbed.merge_all_into(&mut survivor, &mut arena);

        assert!(absorbed.is_empty());
        assert_eq!(
            survivor
                .queue(PLANK)
                .unwrap()
                .tier(Priority::Normal)
                .collect::<Vec<_>>(),
            vec![s1, a1, a2]
        );
        assert_eq!(
            arena.get(a2).unwrap().owner().map(|owner| owner.partition),
            Some(PartitionId(2))
        );
    }

    #[test]
    #[should_panic(expected = "same partition")]
    fn transfer_into_itself_panics() {
        let mut arena = RequestArena::default();
        let mut a = PartitionRequestManager::new(PartitionId(1));
        let mut b = PartitionRequestManager::new(PartitionId(1));
        a.transfer_by_position(&HashSet::new(), &mut b, &mut arena);
    }
}
