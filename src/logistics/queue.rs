use bevy_ecs_tilemap::prelude::TilePos;
use std::collections::{HashSet, VecDeque};

use super::arena::{RequestArena, RequestId};
use super::partitions::PartitionId;
use super::priority::Priority;
use super::request::{QueueRef, RequestChannel, RequestRecord};
use crate::tile_pos::split_off_where;

/// Per-tier FIFO lists of requests for one request channel.
///
/// Records are served from the front; rotation moves them to the back so that
/// peers of equal priority take turns.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    channel: RequestChannel,
    tiers: [VecDeque<RequestId>; Priority::COUNT],
}

impl RequestQueue {
    pub fn new(channel: RequestChannel) -> Self {
        Self {
            channel,
            tiers: Default::default(),
        }
    }

    pub fn channel(&self) -> RequestChannel {
        self.channel
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(VecDeque::is_empty)
    }

    pub fn tier_len(&self, tier: Priority) -> usize {
        self.tiers[tier.ordinal()].len()
    }

    /// Ids queued in a tier, front first
    pub fn tier(&self, tier: Priority) -> impl Iterator<Item = RequestId> + '_ {
        self.tiers[tier.ordinal()].iter().copied()
    }

    pub(crate) fn push_back(&mut self, tier: Priority, id: RequestId) {
        self.tiers[tier.ordinal()].push_back(id);
    }

    pub(crate) fn remove(&mut self, tier: Priority, id: RequestId) -> bool {
        let queue = &mut self.tiers[tier.ordinal()];
        match queue.iter().position(|queued| *queued == id) {
            Some(index) => {
                queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Picks the next request of `tier` that can take another unit.
    pub fn serve_best(&mut self, tier: Priority, arena: &mut RequestArena) -> Option<RequestId> {
        self.serve_best_where(tier, arena, |_| true)
    }

    /// Picks the next request of `tier` that can take another unit and passes
    /// `accept`.
    ///
    /// Exhausted records are dropped from the queue on the way; records that
    /// cannot take more right now, or are not accepted, are rotated to the
    /// back. The scan covers each record present at its start at most once.
    pub fn serve_best_where(
        &mut self,
        tier: Priority,
        arena: &mut RequestArena,
        accept: impl Fn(&RequestRecord) -> bool,
    ) -> Option<RequestId> {
        let queue = &mut self.tiers[tier.ordinal()];
        let mut unexamined = queue.len();

        while unexamined > 0 {
            let id = *queue.front()?;
            unexamined -= 1;

            let Some(record) = arena.get_mut(id) else {
                queue.pop_front();
                continue;
            };

            if record.is_exhausted() {
                record.owner = None;
                queue.pop_front();
            } else if !record.can_take_more() || !accept(record) {
                queue.rotate_left(1);
            } else {
                if record.round_robin {
                    queue.rotate_left(1);
                }
                return Some(id);
            }
        }

        None
    }

    /// Moves every record located at one of `positions` to the same tier of
    /// `target`, keeping the relative order in both queues.
    pub fn transfer_by_position(
        &mut self,
        positions: &HashSet<TilePos>,
        target: &mut RequestQueue,
        target_partition: PartitionId,
        arena: &mut RequestArena,
    ) -> usize {
        assert_eq!(
            self.channel, target.channel,
            "can't move requests between queues of different channels"
        );

        let mut moved = 0;
        for tier in Priority::ALL {
            let mut taken = VecDeque::new();
            split_off_where(&mut self.tiers[tier.ordinal()], &mut taken, |id| {
                arena
                    .get(*id)
                    .is_some_and(|record| positions.contains(&record.position))
            });

            for id in &taken {
                if let Some(record) = arena.get_mut(*id) {
                    record.owner = Some(QueueRef {
                        partition: target_partition,
                        tier,
                    });
                }
            }
            moved += taken.len();
            target.tiers[tier.ordinal()].append(&mut taken);
        }
        moved
    }

    /// Appends every tier of this queue to the same tier of `target`.
    /// This queue is empty afterwards.
    pub fn merge_into(
        &mut self,
        target: &mut RequestQueue,
        target_partition: PartitionId,
        arena: &mut RequestArena,
    ) {
        assert_eq!(
            self.channel, target.channel,
            "can't merge queues of different channels"
        );

        for tier in Priority::ALL {
            let queue = &mut self.tiers[tier.ordinal()];
            for id in queue.iter() {
                if let Some(record) = arena.get_mut(*id) {
                    record.owner = Some(QueueRef {
                        partition: target_partition,
                        tier,
                    });
                }
            }
            target.tiers[tier.ordinal()].append(queue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;
    use crate::buildings::BuildingType;
    use crate::goods::Material;
    use crate::logistics::request::{NewRequest, RequestKind};

    const CHANNEL: RequestChannel = RequestChannel::Material {
        material: Material::Plank,
        building: BuildingType::Sawmill,
    };

    fn enqueue(
        queue: &mut RequestQueue,
        arena: &mut RequestArena,
        x: u32,
        quantity: u32,
        round_robin: bool,
    ) -> RequestId {
        let request = NewRequest::new(
            TilePos { x, y: 0 },
            RequestKind::Material {
                material: Material::Plank,
                building: BuildingType::Sawmill,
            },
            quantity,
        )
        .with_round_robin(round_robin);
        let id = arena.insert(RequestRecord::new(Entity::PLACEHOLDER, request));
        queue.push_back(Priority::Normal, id);
        arena.get_mut(id).unwrap().owner = Some(QueueRef {
            partition: PartitionId(0),
            tier: Priority::Normal,
        });
        id
    }

    fn order(queue: &RequestQueue) -> Vec<RequestId> {
        queue.tier(Priority::Normal).collect()
    }

    #[test]
    fn empty_tier_serves_nothing() {
        let mut queue = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        assert_eq!(queue.serve_best(Priority::High, &mut arena), None);
    }

    #[test]
    fn round_robin_rotates_before_returning() {
        let mut queue = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        let a = enqueue(&mut queue, &mut arena, 1, 3, true);
        let b = enqueue(&mut queue, &mut arena, 2, 3, true);

        assert_eq!(queue.serve_best(Priority::Normal, &mut arena), Some(a));
        assert_eq!(order(&queue), vec![b, a]);
    }

    #[test]
    fn non_rotating_request_stays_in_front() {
        let mut queue = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        let a = enqueue(&mut queue, &mut arena, 1, 3, false);
        let b = enqueue(&mut queue, &mut arena, 2, 3, false);

        assert_eq!(queue.serve_best(Priority::Normal, &mut arena), Some(a));
        assert_eq!(queue.serve_best(Priority::Normal, &mut arena), Some(a));
        assert_eq!(order(&queue), vec![a, b]);
    }

    #[test]
    fn exhausted_records_are_detached_without_ending_the_pass() {
        let mut queue = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        let done = enqueue(&mut queue, &mut arena, 1, 1, true);
        let covered = enqueue(&mut queue, &mut arena, 2, 1, true);
        let open = enqueue(&mut queue, &mut arena, 3, 1, true);

        arena.get_mut(done).unwrap().still_needed = 0;
        arena.get_mut(covered).unwrap().in_delivery = 1;

        assert_eq!(queue.serve_best(Priority::Normal, &mut arena), Some(open));
        assert_eq!(order(&queue), vec![covered, open]);
        assert_eq!(arena.get(done).unwrap().owner(), None);
    }

    #[test]
    fn full_pass_without_candidates_terminates() {
        let mut queue = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        let a = enqueue(&mut queue, &mut arena, 1, 1, true);
        let b = enqueue(&mut queue, &mut arena, 2, 1, false);
        arena.get_mut(a).unwrap().in_delivery = 1;
        arena.get_mut(b).unwrap().in_delivery = 1;

        assert_eq!(queue.serve_best(Priority::Normal, &mut arena), None);
        // One full rotation leaves the original order intact
        assert_eq!(order(&queue), vec![a, b]);
    }

    #[test]
    fn rejected_records_rotate_behind_the_accepted_one() {
        let mut queue = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        let waiting = enqueue(&mut queue, &mut arena, 1, 2, false);
        let ready = enqueue(&mut queue, &mut arena, 2, 2, false);

        let served = queue.serve_best_where(Priority::Normal, &mut arena, |record| {
            record.position.x == 2
        });

        assert_eq!(served, Some(ready));
        assert_eq!(order(&queue), vec![ready, waiting]);
        assert_eq!(
            queue.serve_best_where(Priority::Normal, &mut arena, |_| false),
            None
        );
    }

    #[test]
    fn cap_limits_parallel_deliveries() {
        let mut queue = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        let a = enqueue(&mut queue, &mut arena, 1, 5, true);
        arena.get_mut(a).unwrap().in_delivery_cap = 2;
        arena.get_mut(a).unwrap().in_delivery = 2;

        assert_eq!(queue.serve_best(Priority::Normal, &mut arena), None);
    }

    #[test]
    fn transfer_moves_matching_positions_in_order() {
        let mut source = RequestQueue::new(CHANNEL);
        let mut target = RequestQueue::new(CHANNEL);
        let mut arena = RequestArena::default();
        let a = enqueue(&mut source, &mut arena, 1, 1, true);
        let b = enqueue(&mut source, &mut arena, 2, 1, true);
        let c = enqueue(&mut source, &mut arena, 1, 1, true);

        let positions = HashSet::from([TilePos { x: 1, y: 0 }]);
        let moved = source.transfer_by_position(&positions, &mut target, PartitionId(7), &mut arena);

        assert_eq!(moved, 2);
        assert_eq!(order(&source), vec![b]);
        assert_eq!(order(&target), vec![a, c]);
        assert_eq!(
            arena.get(c).unwrap().owner().map(|owner| owner.partition),
            Some(PartitionId(7))
        );
    }

    #[test]
    #[should_panic(expected = "different channels")]
    fn merging_different_channels_panics() {
        let mut source = RequestQueue::new(CHANNEL);
        let mut target = RequestQueue::new(RequestChannel::Digger);
        let mut arena = RequestArena::default();
        source.merge_into(&mut target, PartitionId(1), &mut arena);
    }
}
