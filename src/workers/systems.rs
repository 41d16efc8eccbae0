use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use std::collections::HashSet;

use super::bearer::{BearerJob, BearerStrategy};
use super::digger::{DiggerJob, DiggerStrategy};
use super::grid::WorkSiteGrid;
use super::types::{DiggingSite, Worker};
use crate::logistics::{Partitions, Pickup, RequestKind, RequestRecord, SimulationRng};
use crate::messages::{
    DeliveryOutcome, DeliveryReport, JobAssigned, OfferMaterial, PartitionSplit,
    PartitionsMerged, ReportJobless, UnitConverted, WorkerDisplaced, WorkerKilled,
    WorkerRemoved,
};
use crate::units::{Capability, UnitType};

/// Keeps each worker's partition in step with splits and merges
pub fn follow_topology_changes(
    mut splits: MessageReader<PartitionSplit>,
    mut merges: MessageReader<PartitionsMerged>,
    mut workers: Query<&mut Worker>,
) {
    for split in splits.read() {
        let moved: HashSet<TilePos> = split.moved.iter().copied().collect();
        for mut worker in &mut workers {
            if worker.partition == split.source && moved.contains(&worker.position) {
                worker.partition = split.created;
            }
        }
    }

    for merge in merges.read() {
        for mut worker in &mut workers {
            if worker.partition == merge.absorbed {
                worker.partition = merge.survivor;
            }
        }
    }
}

/// Gives new workers their job strategy and registers them as idle
pub fn announce_new_workers(
    mut commands: Commands,
    mut grid: ResMut<WorkSiteGrid>,
    workers: Query<(Entity, &Worker), Added<Worker>>,
) {
    for (entity, worker) in &workers {
        equip(
            &mut commands.entity(entity),
            &mut grid,
            worker.unit_type,
            worker.position,
        );
    }
}

/// Inserts the strategy matching `unit_type` and announces the unit as idle.
/// Units without a jobless capability get no strategy.
fn equip(
    entity: &mut EntityCommands,
    grid: &mut WorkSiteGrid,
    unit_type: UnitType,
    position: TilePos,
) {
    let unit = entity.id();
    match unit_type.capability() {
        Some(Capability::Digger) => {
            let strategy = DiggerStrategy::new(unit, position);
            strategy.announce(grid);
            entity.insert(strategy);
        }
        Some(capability) => {
            let strategy = BearerStrategy::new(unit, capability, position);
            strategy.announce(grid);
            entity.insert(strategy);
        }
        None => {}
    }
}

pub fn accept_job_assignments(
    mut assignments: MessageReader<JobAssigned>,
    partitions: Res<Partitions>,
    mut workers: Query<(Option<&mut DiggerStrategy>, Option<&mut BearerStrategy>), With<Worker>>,
    mut reports: MessageWriter<DeliveryReport>,
    mut offers: MessageWriter<OfferMaterial>,
) {
    for assignment in assignments.read() {
        let accepted = match (
            partitions.record(assignment.request),
            workers.get_mut(assignment.unit),
        ) {
            (Some(record), Ok((digger, bearer))) => offer(assignment, record, digger, bearer),
            _ => false,
        };

        if !accepted {
            // Release the promise and the reserved material so both are
            // handed out again
            warn!(
                "Unit {:?} could not take request {}",
                assignment.unit, assignment.request
            );
            reports.write(DeliveryReport {
                request: assignment.request,
                outcome: DeliveryOutcome::Failed,
            });
            if let Some(Pickup { position, material }) = assignment.pickup {
                offers.write(OfferMaterial {
                    partition: assignment.partition,
                    position,
                    material,
                    amount: 1,
                });
            }
        }
    }
}

fn offer(
    assignment: &JobAssigned,
    record: &RequestRecord,
    digger: Option<Mut<DiggerStrategy>>,
    bearer: Option<Mut<BearerStrategy>>,
) -> bool {
    let request = assignment.request;
    match (record.kind, digger, bearer) {
        (RequestKind::Digger { building, .. }, Some(mut digger), _) => digger.set_job(DiggerJob {
            request,
            site: building,
        }),
        (RequestKind::Digger { .. }, None, _) => false,
        (RequestKind::Bricklayer { target, .. }, _, Some(mut bearer)) => {
            bearer.set_job(BearerJob::walk_to(request, target))
        }
        (kind, _, Some(mut bearer)) => bearer.set_job(BearerJob {
            request,
            pickup: assignment.pickup,
            drop: record.position,
            converts_to: kind.converts_to(),
        }),
        _ => false,
    }
}

/// Units left standing on lost territory have no partition to work for and
/// leave the map
pub fn evict_displaced_workers(
    mut displaced: MessageReader<WorkerDisplaced>,
    mut killed: MessageWriter<WorkerKilled>,
) {
    for event in displaced.read() {
        info!(
            "Worker {:?} at {:?} lost the territory of {:?}",
            event.unit, event.position, event.partition
        );
        killed.write(WorkerKilled { unit: event.unit });
    }
}

pub fn handle_killed_workers(
    mut killed: MessageReader<WorkerKilled>,
    mut grid: ResMut<WorkSiteGrid>,
    mut workers: Query<(Option<&mut DiggerStrategy>, Option<&mut BearerStrategy>), With<Worker>>,
    mut sites: Query<&mut DiggingSite>,
    mut reports: MessageWriter<DeliveryReport>,
) {
    for event in killed.read() {
        let Ok((digger, bearer)) = workers.get_mut(event.unit) else {
            continue;
        };

        let report = if let Some(mut digger) = digger {
            let site = digger.job().and_then(|job| sites.get_mut(job.site).ok());
            match site {
                Some(mut site) => digger.killed(&mut *grid, Some(&mut *site)),
                None => digger.killed(&mut *grid, None),
            }
        } else if let Some(mut bearer) = bearer {
            bearer.killed(&mut *grid)
        } else {
            None
        };

        info!("Worker {:?} was killed", event.unit);
        if let Some(report) = report {
            reports.write(report);
        }
    }
}

/// Stops sending diggers to sites whose footprint is fully leveled
pub fn close_finished_sites(grid: Res<WorkSiteGrid>, mut sites: Query<(Entity, &mut DiggingSite)>) {
    for (entity, mut site) in &mut sites {
        if site.active && site.is_level(&*grid) {
            site.active = false;
            info!("Construction site {:?} is level", entity);
        }
    }
}

/// Advances every working unit by one step
pub fn step_workers(
    mut grid: ResMut<WorkSiteGrid>,
    mut rng: ResMut<SimulationRng>,
    partitions: Res<Partitions>,
    mut diggers: Query<&mut DiggerStrategy>,
    mut bearers: Query<&mut BearerStrategy>,
    mut sites: Query<&mut DiggingSite>,
    mut reports: MessageWriter<DeliveryReport>,
) {
    for mut digger in &mut diggers {
        let report = match digger.job() {
            None => None,
            Some(job) if partitions.record(job.request).is_none() => digger.job_ended(&mut *grid),
            Some(job) => match sites.get_mut(job.site) {
                Ok(mut site) => digger.tick(&mut *grid, &mut *site, &mut rng),
                Err(_) => digger.job_ended(&mut *grid),
            },
        };
        if let Some(report) = report {
            reports.write(report);
        }
    }

    for mut bearer in &mut bearers {
        let report = match bearer.job() {
            None => None,
            Some(job) if partitions.record(job.request).is_none() => bearer.job_ended(&mut *grid),
            Some(_) => bearer.tick(&mut *grid),
        };
        if let Some(report) = report {
            reports.write(report);
        }
    }
}

/// Forwards what the strategies asked of the grid. Walks complete at once;
/// path timing belongs to the movement layer.
pub fn flush_grid_effects(
    mut commands: Commands,
    mut grid: ResMut<WorkSiteGrid>,
    mut workers: Query<(
        &mut Worker,
        Option<&mut DiggerStrategy>,
        Option<&mut BearerStrategy>,
    )>,
    mut jobless: MessageWriter<ReportJobless>,
    mut removed: MessageWriter<WorkerRemoved>,
    mut offers: MessageWriter<OfferMaterial>,
    mut converted: MessageWriter<UnitConverted>,
) {
    for (unit, target) in std::mem::take(&mut grid.walks) {
        let Ok((mut worker, digger, bearer)) = workers.get_mut(unit) else {
            continue;
        };
        worker.position = target;
        if let Some(mut digger) = digger {
            digger.moved_to(target);
        }
        if let Some(mut bearer) = bearer {
            bearer.moved_to(target);
        }
    }

    for (unit, duration) in grid.actions.drain(..) {
        debug!("Unit {:?} plays a {:.1}s action", unit, duration);
    }

    for (unit, into) in std::mem::take(&mut grid.conversions) {
        let Ok((mut worker, _, _)) = workers.get_mut(unit) else {
            continue;
        };
        let from = std::mem::replace(&mut worker.unit_type, into);
        let mut entity = commands.entity(unit);
        entity.remove::<(BearerStrategy, DiggerStrategy)>();
        equip(&mut entity, &mut grid, into, worker.position);

        info!("Unit {:?} became a {:?}", unit, into);
        converted.write(UnitConverted { unit, from, into });
    }

    for (unit, material, position) in std::mem::take(&mut grid.returned) {
        let Ok((worker, _, _)) = workers.get(unit) else {
            continue;
        };
        offers.write(OfferMaterial {
            partition: worker.partition,
            position,
            material,
            amount: 1,
        });
    }

    for (unit, capability, position) in std::mem::take(&mut grid.jobless) {
        let Ok((worker, _, _)) = workers.get(unit) else {
            continue;
        };
        jobless.write(ReportJobless {
            unit,
            partition: worker.partition,
            capability,
            position,
        });
    }

    for unit in std::mem::take(&mut grid.withdrawn) {
        removed.write(WorkerRemoved { unit });
    }
}
