use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use std::collections::HashSet;

use super::jobless::JoblessUnit;
use super::partitions::{PartitionId, Partitions};
use super::rng::SimulationRng;
use super::LogisticsSettings;
use crate::messages::{
    CancelReason, CancelRequest, DeliveryOutcome, DeliveryReport, InsertRequest, JobAssigned,
    MergePartitions, OfferMaterial, PartitionSplit, PartitionsMerged, ReleaseTerritory,
    ReportJobless, ReprioritizeRequest, RequestCancelled, RequestInserted, RequestRejected,
    RequestSatisfied, RequesterRemoved, SplitPartition, WithdrawOffer, WorkerDisplaced,
    WorkerRemoved,
};

pub fn seed_simulation_rng(settings: Res<LogisticsSettings>, mut rng: ResMut<SimulationRng>) {
    rng.reseed(settings.seed);
    debug!("Simulation RNG seeded with {:#x}", settings.seed);
}

/// Splits, merges and territory losses, applied before any request of the
/// same tick touches the queues.
pub fn apply_topology_changes(
    mut partitions: ResMut<Partitions>,
    mut splits: MessageReader<SplitPartition>,
    mut merges: MessageReader<MergePartitions>,
    mut releases: MessageReader<ReleaseTerritory>,
    mut split_done: MessageWriter<PartitionSplit>,
    mut merged: MessageWriter<PartitionsMerged>,
    mut cancelled: MessageWriter<RequestCancelled>,
    mut displaced: MessageWriter<WorkerDisplaced>,
) {
    for split in splits.read() {
        let moved: HashSet<TilePos> = split.moved.iter().copied().collect();
        match partitions.split_partition(split.source, &moved) {
            Ok(created) => {
                split_done.write(PartitionSplit {
                    source: split.source,
                    created,
                    moved: split.moved.clone(),
                });
            }
            Err(err) => warn!("Ignoring split of {:?}: {}", split.source, err),
        }
    }

    for merge in merges.read() {
        match partitions.merge_partitions(merge.survivor, merge.absorbed) {
            Ok(survivor) => {
                merged.write(PartitionsMerged {
                    survivor,
                    absorbed: merge.absorbed,
                });
            }
            Err(err) => warn!(
                "Ignoring merge of {:?} into {:?}: {}",
                merge.absorbed, merge.survivor, err
            ),
        }
    }

    for release in releases.read() {
        let positions: HashSet<TilePos> = release.positions.iter().copied().collect();
        match partitions.release_territory(release.partition, &positions) {
            Ok(released) => {
                for (request, record) in released.requests {
                    cancelled.write(RequestCancelled {
                        requester: record.requester,
                        request,
                        reason: CancelReason::TerritoryLost,
                    });
                }
                for jobless in released.jobless {
                    displaced.write(WorkerDisplaced {
                        unit: jobless.unit,
                        partition: release.partition,
                        position: jobless.position,
                    });
                }
            }
            Err(err) => warn!("Ignoring territory loss of {:?}: {}", release.partition, err),
        }
    }
}

pub fn apply_request_commands(
    mut partitions: ResMut<Partitions>,
    mut inserts: MessageReader<InsertRequest>,
    mut cancels: MessageReader<CancelRequest>,
    mut reprioritizations: MessageReader<ReprioritizeRequest>,
    mut removed: MessageReader<RequesterRemoved>,
    mut inserted: MessageWriter<RequestInserted>,
    mut rejected: MessageWriter<RequestRejected>,
    mut cancelled: MessageWriter<RequestCancelled>,
) {
    for insert in inserts.read() {
        match partitions.insert_request(insert.partition, insert.requester, insert.request) {
            Ok(request) => {
                inserted.write(RequestInserted {
                    requester: insert.requester,
                    partition: insert.partition,
                    request,
                });
            }
            Err(reason) => {
                warn!("Rejected request of {:?}: {}", insert.requester, reason);
                rejected.write(RequestRejected {
                    requester: insert.requester,
                    reason,
                });
            }
        }
    }

    for cancel in cancels.read() {
        match partitions.cancel_request(cancel.request) {
            Ok(record) => {
                cancelled.write(RequestCancelled {
                    requester: record.requester,
                    request: cancel.request,
                    reason: CancelReason::Withdrawn,
                });
            }
            Err(err) => warn!("Cannot cancel {}: {}", cancel.request, err),
        }
    }

    for change in reprioritizations.read() {
        if let Err(err) = partitions.reprioritize(change.request, change.priority) {
            warn!("Cannot reprioritize {}: {}", change.request, err);
        }
    }

    for gone in removed.read() {
        for (request, record) in partitions.cancel_requests_of(gone.requester) {
            cancelled.write(RequestCancelled {
                requester: record.requester,
                request,
                reason: CancelReason::Withdrawn,
            });
        }
    }
}

pub fn apply_offer_changes(
    mut partitions: ResMut<Partitions>,
    mut offered: MessageReader<OfferMaterial>,
    mut withdrawn: MessageReader<WithdrawOffer>,
) {
    for offer in offered.read() {
        if let Err(err) =
            partitions.offer_material(offer.partition, offer.position, offer.material, offer.amount)
        {
            warn!("Dropped offer of {} {}: {}", offer.amount, offer.material, err);
        }
    }

    for withdrawal in withdrawn.read() {
        match partitions.withdraw_offer(
            withdrawal.partition,
            withdrawal.position,
            withdrawal.material,
            withdrawal.amount,
        ) {
            Ok(taken) if taken < withdrawal.amount => debug!(
                "Only {} of {} {} were still offered at {:?}",
                taken, withdrawal.amount, withdrawal.material, withdrawal.position
            ),
            Ok(_) => {}
            Err(err) => warn!("Cannot withdraw offer: {}", err),
        }
    }
}

pub fn apply_delivery_reports(
    mut partitions: ResMut<Partitions>,
    mut reports: MessageReader<DeliveryReport>,
    mut satisfied: MessageWriter<RequestSatisfied>,
) {
    for report in reports.read() {
        let result = match report.outcome {
            DeliveryOutcome::Delivered(quantity) => {
                partitions.mark_delivered(report.request, quantity)
            }
            DeliveryOutcome::Failed => partitions.mark_failed(report.request).map(|()| None),
        };
        match result {
            Ok(Some(record)) => {
                satisfied.write(RequestSatisfied {
                    requester: record.requester,
                    request: report.request,
                });
            }
            Ok(None) => {}
            // Reports for cancelled requests arrive after the fact
            Err(err) => debug!("Dropped delivery report {:?}: {}", report, err),
        }
    }
}

pub fn apply_jobless_reports(
    mut partitions: ResMut<Partitions>,
    mut jobless: MessageReader<ReportJobless>,
    mut removed: MessageReader<WorkerRemoved>,
) {
    for removal in removed.read() {
        partitions.remove_jobless(removal.unit);
    }

    for report in jobless.read() {
        let unit = JoblessUnit {
            unit: report.unit,
            capability: report.capability,
            position: report.position,
        };
        if let Err(err) = partitions.add_jobless(report.partition, unit) {
            warn!("Cannot register jobless unit {:?}: {}", report.unit, err);
        }
    }
}

/// Matches idle units to requests, at most `max_assignments_per_tick` in total
pub fn dispatch_jobs(
    mut partitions: ResMut<Partitions>,
    settings: Res<LogisticsSettings>,
    mut assigned: MessageWriter<JobAssigned>,
) {
    let mut budget = settings.max_assignments_per_tick;
    let ids: Vec<PartitionId> = partitions.ids().collect();

    for partition in ids {
        if budget == 0 {
            break;
        }
        for assignment in partitions.dispatch(partition, budget) {
            budget -= 1;
            assigned.write(JobAssigned {
                unit: assignment.unit,
                partition: assignment.partition,
                channel: assignment.channel,
                request: assignment.request,
                pickup: assignment.pickup,
            });
        }
    }
}
