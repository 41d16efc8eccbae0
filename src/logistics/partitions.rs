use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::arena::{RequestArena, RequestId};
use super::error::LogisticsError;
use super::jobless::{JoblessRegistry, JoblessUnit};
use super::manager::PartitionRequestManager;
use super::offers::{MaterialOffer, OfferRegistry, Pickup};
use super::priority::Priority;
use super::request::{NewRequest, RequestChannel, RequestRecord};
use crate::goods::Material;
use crate::units::Capability;

/// Unique identifier for a partition
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Reflect, Serialize, Deserialize,
)]
pub struct PartitionId(pub u32);

/// A contiguous region of one player's territory with its own scheduler state
#[derive(Debug, Clone)]
pub struct Partition {
    pub id: PartitionId,
    pub player: u8,
    pub(crate) requests: PartitionRequestManager,
    pub(crate) jobless: JoblessRegistry,
    pub(crate) offers: OfferRegistry,
}

impl Partition {
    pub(crate) fn new(id: PartitionId, player: u8) -> Self {
        Self {
            id,
            player,
            requests: PartitionRequestManager::new(id),
            jobless: JoblessRegistry::default(),
            offers: OfferRegistry::default(),
        }
    }

    pub fn requests(&self) -> &PartitionRequestManager {
        &self.requests
    }

    pub fn jobless(&self) -> &JoblessRegistry {
        &self.jobless
    }

    pub fn offers(&self) -> &OfferRegistry {
        &self.offers
    }
}

/// A jobless unit matched to a request during dispatch.
///
/// `pickup` names the offer one unit of material was reserved from, for
/// requests that need material carried to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAssignment {
    pub partition: PartitionId,
    pub channel: RequestChannel,
    pub request: RequestId,
    pub unit: Entity,
    pub pickup: Option<Pickup>,
}

/// Records, jobless units and offers evicted because their territory was lost
#[derive(Debug, Default)]
pub struct ReleasedTerritory {
    pub requests: Vec<(RequestId, RequestRecord)>,
    pub jobless: Vec<JoblessUnit>,
    pub offers: Vec<MaterialOffer>,
}

/// Owner of every partition and every request record.
///
/// All scheduler mutation goes through this resource, so a split or merge
/// running inside one system is never observed half-done by another.
#[derive(Resource, Debug, Default)]
pub struct Partitions {
    pub(crate) records: RequestArena,
    pub(crate) partitions: BTreeMap<PartitionId, Partition>,
    pub(crate) unit_index: HashMap<Entity, PartitionId>,
    pub(crate) next_id: u32,
}

impl Partitions {
    pub fn create_partition(&mut self, player: u8) -> PartitionId {
        let id = PartitionId(self.next_id);
        self.next_id += 1;
        self.partitions.insert(id, Partition::new(id, player));
        info!("Created partition {:?} for player {}", id, player);
        id
    }

    pub fn get(&self, id: PartitionId) -> Option<&Partition> {
        self.partitions.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.partitions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn record(&self, id: RequestId) -> Option<&RequestRecord> {
        self.records.get(id)
    }

    /// Live records. Every live record is queued in exactly one partition.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Partition whose queue currently holds the record
    pub fn partition_of(&self, id: RequestId) -> Option<PartitionId> {
        self.records
            .get(id)
            .and_then(|record| record.owner)
            .map(|owner| owner.partition)
    }

    fn partition_mut(&mut self, id: PartitionId) -> Result<&mut Partition, LogisticsError> {
        self.partitions
            .get_mut(&id)
            .ok_or(LogisticsError::UnknownPartition(id))
    }

    // ------------------------------------------------------------------
    // Requester interface
    // ------------------------------------------------------------------

    pub fn insert_request(
        &mut self,
        partition: PartitionId,
        requester: Entity,
        request: NewRequest,
    ) -> Result<RequestId, LogisticsError> {
        let target = self
            .partitions
            .get_mut(&partition)
            .ok_or(LogisticsError::UnknownPartition(partition))?;
        if request.quantity == 0 {
            return Err(LogisticsError::EmptyRequest);
        }

        let id = self.records.insert(RequestRecord::new(requester, request));
        target.requests.insert(id, &mut self.records)?;
        debug!(
            "Request {} ({:?} x{}) queued in {:?}",
            id, request.kind, request.quantity, partition
        );
        Ok(id)
    }

    /// Withdraws and destroys a request. Units already on their way keep
    /// their promise; their reports for this id are rejected afterwards.
    pub fn cancel_request(&mut self, id: RequestId) -> Result<RequestRecord, LogisticsError> {
        self.remove_record(id)
    }

    /// Withdraws a record from its queue and frees its slot
    fn remove_record(&mut self, id: RequestId) -> Result<RequestRecord, LogisticsError> {
        let owner = self
            .records
            .get(id)
            .ok_or(LogisticsError::UnknownRequest(id))?
            .owner;

        if let Some(owner) = owner {
            let partition = self
                .partitions
                .get_mut(&owner.partition)
                .ok_or(LogisticsError::UnknownPartition(owner.partition))?;
            partition.requests.withdraw(id, &mut self.records)?;
        }
        self.records
            .remove(id)
            .ok_or(LogisticsError::UnknownRequest(id))
    }

    /// Cancels everything a destroyed building or unit had asked for
    pub fn cancel_requests_of(&mut self, requester: Entity) -> Vec<(RequestId, RequestRecord)> {
        let ids: Vec<RequestId> = self
            .records
            .iter()
            .filter(|(_, record)| record.requester == requester)
            .map(|(id, _)| id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.cancel_request(id).ok().map(|record| (id, record)))
            .collect()
    }

    pub fn reprioritize(&mut self, id: RequestId, tier: Priority) -> Result<(), LogisticsError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or(LogisticsError::UnknownRequest(id))?;
        let Some(owner) = record.owner else {
            record.priority = tier;
            return Ok(());
        };

        let partition = self
            .partitions
            .get_mut(&owner.partition)
            .ok_or(LogisticsError::UnknownPartition(owner.partition))?;
        partition.requests.reprioritize(id, tier, &mut self.records)
    }

    // ------------------------------------------------------------------
    // Matching interface
    // ------------------------------------------------------------------

    pub fn serve(&mut self, partition: PartitionId, channel: RequestChannel) -> Option<RequestId> {
        let target = self.partitions.get_mut(&partition)?;
        target.requests.serve(channel, &mut self.records)
    }

    /// Settles `quantity` units that arrived at the requester.
    ///
    /// Once nothing is left to deliver the record is withdrawn and destroyed;
    /// it is returned so the requester can be told.
    pub fn mark_delivered(
        &mut self,
        id: RequestId,
        quantity: u32,
    ) -> Result<Option<RequestRecord>, LogisticsError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or(LogisticsError::UnknownRequest(id))?;
        if quantity > record.in_delivery {
            return Err(LogisticsError::NotInDelivery {
                request: id,
                in_delivery: record.in_delivery,
                requested: quantity,
            });
        }

        record.in_delivery -= quantity;
        record.still_needed = record.still_needed.saturating_sub(quantity);
        if !record.is_exhausted() {
            return Ok(None);
        }

        let record = self.remove_record(id)?;
        debug!("Request {} of {:?} is satisfied", id, record.requester);
        Ok(Some(record))
    }

    /// Releases one promised unit so the request can be served again
    pub fn mark_failed(&mut self, id: RequestId) -> Result<(), LogisticsError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or(LogisticsError::UnknownRequest(id))?;
        if record.in_delivery == 0 {
            return Err(LogisticsError::NotInDelivery {
                request: id,
                in_delivery: 0,
                requested: 1,
            });
        }

        record.in_delivery -= 1;
        Ok(())
    }

    /// Matches jobless units to requests of one partition.
    ///
    /// Channels are visited in their fixed order and each match consumes one
    /// unit of the serving capability. Requests that need material are only
    /// served while the partition offers it, and each match reserves one unit
    /// from the offer closest to the requester. The result only depends on the
    /// scheduler state.
    pub fn dispatch(&mut self, partition: PartitionId, limit: usize) -> Vec<JobAssignment> {
        let mut assignments = Vec::new();
        let Some(target) = self.partitions.get_mut(&partition) else {
            return assignments;
        };

        let channels: Vec<RequestChannel> = target.requests.channels().collect();
        for channel in channels {
            let capability = channel.capability();
            while assignments.len() < limit && target.jobless.count(capability) > 0 {
                let offers = &target.offers;
                let Some(request) =
                    target
                        .requests
                        .serve_where(channel, &mut self.records, |record| {
                            record
                                .kind
                                .required_material()
                                .is_none_or(|material| offers.has(material))
                        })
                else {
                    break;
                };
                let Some((material, position)) = self
                    .records
                    .get(request)
                    .map(|record| (record.kind.required_material(), record.position))
                else {
                    break;
                };
                let pickup = match material {
                    Some(material) => {
                        match target.offers.take_closest(material, position) {
                            Some(pickup) => Some(pickup),
                            None => {
                                release_promise(&mut self.records, request);
                                break;
                            }
                        }
                    }
                    None => None,
                };
                let Some(jobless) = target.jobless.take_any(capability) else {
                    release_promise(&mut self.records, request);
                    if let Some(pickup) = pickup {
                        target.offers.add(pickup.position, pickup.material, 1);
                    }
                    break;
                };
                self.unit_index.remove(&jobless.unit);
                assignments.push(JobAssignment {
                    partition,
                    channel,
                    request,
                    unit: jobless.unit,
                    pickup,
                });
            }
        }
        assignments
    }

    // ------------------------------------------------------------------
    // Offers
    // ------------------------------------------------------------------

    /// Makes `amount` units of `material` at `position` available to bearers
    pub fn offer_material(
        &mut self,
        partition: PartitionId,
        position: TilePos,
        material: Material,
        amount: u32,
    ) -> Result<(), LogisticsError> {
        self.partition_mut(partition)?
            .offers
            .add(position, material, amount);
        Ok(())
    }

    /// Takes back up to `amount` offered units; returns how many were still there
    pub fn withdraw_offer(
        &mut self,
        partition: PartitionId,
        position: TilePos,
        material: Material,
        amount: u32,
    ) -> Result<u32, LogisticsError> {
        Ok(self
            .partition_mut(partition)?
            .offers
            .remove(position, material, amount))
    }

    // ------------------------------------------------------------------
    // Jobless units
    // ------------------------------------------------------------------

    pub fn add_jobless(
        &mut self,
        partition: PartitionId,
        jobless: JoblessUnit,
    ) -> Result<(), LogisticsError> {
        if self.unit_index.contains_key(&jobless.unit) {
            return Err(LogisticsError::AlreadyJobless(jobless.unit));
        }
        let target = self.partition_mut(partition)?;
        target.jobless.add(jobless);
        self.unit_index.insert(jobless.unit, partition);
        Ok(())
    }

    /// Removes a unit from whichever registry holds it. Unknown units are ignored.
    pub fn remove_jobless(&mut self, unit: Entity) -> Option<JoblessUnit> {
        let partition = self.unit_index.remove(&unit)?;
        self.partitions
            .get_mut(&partition)
            .and_then(|target| target.jobless.remove(unit))
    }

    pub fn take_jobless(
        &mut self,
        partition: PartitionId,
        capability: Capability,
    ) -> Option<JoblessUnit> {
        let jobless = self
            .partitions
            .get_mut(&partition)?
            .jobless
            .take_any(capability)?;
        self.unit_index.remove(&jobless.unit);
        Some(jobless)
    }

    pub fn jobless_partition(&self, unit: Entity) -> Option<PartitionId> {
        self.unit_index.get(&unit).copied()
    }

    // ------------------------------------------------------------------
    // Topology interface
    // ------------------------------------------------------------------

    /// Moves everything located at `moved` out of `source` into a new
    /// partition owned by the same player.
    pub fn split_partition(
        &mut self,
        source: PartitionId,
        moved: &HashSet<TilePos>,
    ) -> Result<PartitionId, LogisticsError> {
        let player = self
            .partitions
            .get(&source)
            .ok_or(LogisticsError::UnknownPartition(source))?
            .player;
        let created = self.create_partition(player);

        let (Some(mut old), Some(mut new)) = (
            self.partitions.remove(&source),
            self.partitions.remove(&created),
        ) else {
            return Err(LogisticsError::UnknownPartition(source));
        };

        let requests = old
            .requests
            .transfer_by_position(moved, &mut new.requests, &mut self.records);
        let units = old.jobless.transfer_by_position(moved, &mut new.jobless);
        for jobless in &units {
            self.unit_index.insert(jobless.unit, created);
        }
        let offers = old.offers.transfer_by_position(moved, &mut new.offers);

        info!(
            "Split {:?} into {:?}: moved {} requests, {} jobless units and {} offers",
            source,
            created,
            requests,
            units.len(),
            offers
        );
        self.partitions.insert(source, old);
        self.partitions.insert(created, new);
        Ok(created)
    }

    /// Merges `absorbed` into `survivor`; `absorbed` ceases to exist.
    pub fn merge_partitions(
        &mut self,
        survivor: PartitionId,
        absorbed: PartitionId,
    ) -> Result<PartitionId, LogisticsError> {
        if survivor == absorbed {
            return Err(LogisticsError::SelfMerge(survivor));
        }
        let survivor_player = self
            .partitions
            .get(&survivor)
            .ok_or(LogisticsError::UnknownPartition(survivor))?
            .player;
        let absorbed_player = self
            .partitions
            .get(&absorbed)
            .ok_or(LogisticsError::UnknownPartition(absorbed))?
            .player;
        if survivor_player != absorbed_player {
            return Err(LogisticsError::PlayerMismatch(survivor, absorbed));
        }

        let (Some(mut old), Some(target)) = (
            self.partitions.remove(&absorbed),
            self.partitions.get_mut(&survivor),
        ) else {
            return Err(LogisticsError::UnknownPartition(absorbed));
        };

        let requests = old.requests.len();
        let units = old.jobless.len();
        old.requests
            .merge_all_into(&mut target.requests, &mut self.records);
        for jobless in old.jobless.iter() {
            self.unit_index.insert(jobless.unit, survivor);
        }
        old.jobless.merge_into(&mut target.jobless);
        old.offers.merge_into(&mut target.offers);

        info!(
            "Merged {:?} into {:?}: moved {} requests and {} jobless units",
            absorbed, survivor, requests, units
        );
        Ok(survivor)
    }

    /// Drops territory that no longer belongs to any partition of the player.
    ///
    /// Requests located there are cancelled, jobless units are unregistered
    /// and offers are dropped. Callers notify the requesters so they can
    /// re-issue, and the units so they leave the map.
    pub fn release_territory(
        &mut self,
        partition: PartitionId,
        positions: &HashSet<TilePos>,
    ) -> Result<ReleasedTerritory, LogisticsError> {
        let source = self
            .partitions
            .get(&partition)
            .ok_or(LogisticsError::UnknownPartition(partition))?;

        let request_ids: Vec<RequestId> = source
            .requests
            .record_ids()
            .filter(|id| {
                self.records
                    .get(*id)
                    .is_some_and(|record| positions.contains(&record.position))
            })
            .collect();
        let units: Vec<Entity> = source
            .jobless
            .iter()
            .filter(|jobless| positions.contains(&jobless.position))
            .map(|jobless| jobless.unit)
            .collect();

        let mut released = ReleasedTerritory::default();
        for id in request_ids {
            released.requests.push((id, self.cancel_request(id)?));
        }
        for unit in units {
            released.jobless.extend(self.remove_jobless(unit));
        }
        released.offers = self.partition_mut(partition)?.offers.take_at(positions);

        if !released.requests.is_empty()
            || !released.jobless.is_empty()
            || !released.offers.is_empty()
        {
            warn!(
                "Partition {:?} lost territory: cancelled {} requests, dropped {} jobless units and {} offers",
                partition,
                released.requests.len(),
                released.jobless.len(),
                released.offers.len()
            );
        }
        Ok(released)
    }
}

/// Takes back a promise made by a serve that did not lead to an assignment
fn release_promise(records: &mut RequestArena, id: RequestId) {
    if let Some(record) = records.get_mut(id) {
        record.in_delivery = record.in_delivery.saturating_sub(1);
    }
}
