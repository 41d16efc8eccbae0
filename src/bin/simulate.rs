//! Headless run of a small settlement: a tower waiting for stone from a
//! quarry pile, a construction site waiting for diggers, a tool shop that
//! trains one more digger, and a handful of idle workers.
//! Run with: cargo run --bin simulate

use std::collections::HashSet;

use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use settlers_logistics::buildings::BuildingType;
use settlers_logistics::goods::Material;
use settlers_logistics::logistics::{NewRequest, PartitionId, Partitions, Priority, RequestKind};
use settlers_logistics::messages::{
    DeliveryReport, InsertRequest, JobAssigned, OfferMaterial, RequestCancelled,
    RequestInserted, RequestSatisfied, SplitPartition, UnitConverted,
};
use settlers_logistics::tile_pos::TilePosExt;
use settlers_logistics::units::UnitType;
use settlers_logistics::workers::{DiggingSite, TileTerrain, WorkSiteGrid, Worker};

const TICKS: u32 = 60;
const SPLIT_AT_TICK: u32 = 40;
const SITE: TilePos = TilePos { x: 12, y: 8 };
const TOWER: TilePos = TilePos { x: 4, y: 4 };
const QUARRY: TilePos = TilePos { x: 1, y: 6 };
const TOOL_SHOP: TilePos = TilePos { x: 6, y: 1 };

fn main() {
    let mut app = settlers_logistics::app();

    app.init_resource::<Scenario>()
        .add_systems(Startup, setup_settlement)
        .add_systems(Last, (log_assignments, log_deliveries, log_request_changes));

    for tick in 0..TICKS {
        if tick == SPLIT_AT_TICK {
            split_off_site(&mut app);
        }
        app.update();
    }

    let scenario = app.world().resource::<Scenario>();
    let partitions = app.world().resource::<Partitions>();
    let grid = app.world().resource::<WorkSiteGrid>();
    info!(
        "Finished after {} ticks: {} assignments, {} deliveries, {} partitions, {} live requests, {} claimed tiles",
        TICKS,
        scenario.assignments,
        scenario.deliveries,
        partitions.len(),
        partitions.record_count(),
        grid.marked_count()
    );
}

#[derive(Resource, Default)]
struct Scenario {
    home: Option<PartitionId>,
    assignments: u32,
    deliveries: u32,
}

fn setup_settlement(
    mut commands: Commands,
    mut partitions: ResMut<Partitions>,
    mut grid: ResMut<WorkSiteGrid>,
    mut scenario: ResMut<Scenario>,
    mut requests: MessageWriter<InsertRequest>,
    mut offers: MessageWriter<OfferMaterial>,
) {
    let home = partitions.create_partition(0);
    scenario.home = Some(home);

    // Uneven ground under the construction site
    let site = DiggingSite::new(BuildingType::Sawmill, SITE, 3);
    for (index, offset) in BuildingType::Sawmill.protected_tiles().into_iter().enumerate() {
        if let Some(pos) = SITE.offset_by(offset) {
            let height = 1 + (index % 4) as u8;
            grid.set_terrain(
                pos,
                TileTerrain {
                    height,
                    flattened: height == 3,
                },
            );
        }
    }
    let site_entity = commands.spawn(site).id();

    let tower = commands.spawn_empty().id();
    requests.write(InsertRequest {
        partition: home,
        requester: tower,
        request: NewRequest::new(
            TOWER,
            RequestKind::Material {
                material: Material::Stone,
                building: BuildingType::Tower,
            },
            5,
        ),
    });
    requests.write(InsertRequest {
        partition: home,
        requester: site_entity,
        request: NewRequest::new(
            SITE,
            RequestKind::Digger {
                building: site_entity,
                building_type: BuildingType::Sawmill,
            },
            2,
        )
        .with_priority(Priority::High),
    });

    let shop = commands.spawn_empty().id();
    requests.write(InsertRequest {
        partition: home,
        requester: shop,
        request: NewRequest::new(
            TOOL_SHOP,
            RequestKind::WorkerCreation {
                unit: UnitType::Digger,
            },
            1,
        ),
    });
    offers.write(OfferMaterial {
        partition: home,
        position: QUARRY,
        material: Material::Stone,
        amount: 8,
    });
    offers.write(OfferMaterial {
        partition: home,
        position: TOOL_SHOP,
        material: Material::Pick,
        amount: 1,
    });

    for x in 0..3 {
        commands.spawn(Worker {
            unit_type: UnitType::Bearer,
            partition: home,
            position: TilePos { x, y: 0 },
        });
    }
    for x in 0..2 {
        commands.spawn(Worker {
            unit_type: UnitType::Digger,
            partition: home,
            position: TilePos { x: 10 + x, y: 10 },
        });
    }
}

/// Hands the construction site and everything around it to a new partition
fn split_off_site(app: &mut App) {
    let Some(home) = app.world().resource::<Scenario>().home else {
        return;
    };
    let moved: HashSet<TilePos> = BuildingType::Castle
        .protected_tiles()
        .into_iter()
        .filter_map(|offset| SITE.offset_by(offset))
        .collect();

    info!("Splitting {} tiles off {:?}", moved.len(), home);
    app.world_mut()
        .resource_mut::<Messages<SplitPartition>>()
        .write(SplitPartition {
            source: home,
            moved: moved.into_iter().collect(),
        });
}

fn log_assignments(mut assigned: MessageReader<JobAssigned>, mut scenario: ResMut<Scenario>) {
    for job in assigned.read() {
        scenario.assignments += 1;
        info!(
            "{:?} takes request {} on {:?}",
            job.unit, job.request, job.channel
        );
    }
}

fn log_deliveries(mut reports: MessageReader<DeliveryReport>, mut scenario: ResMut<Scenario>) {
    for report in reports.read() {
        scenario.deliveries += 1;
        info!("Request {} reported {:?}", report.request, report.outcome);
    }
}

fn log_request_changes(
    mut inserted: MessageReader<RequestInserted>,
    mut cancelled: MessageReader<RequestCancelled>,
    mut satisfied: MessageReader<RequestSatisfied>,
    mut converted: MessageReader<UnitConverted>,
) {
    for event in inserted.read() {
        info!("Request {} queued in {:?}", event.request, event.partition);
    }
    for event in cancelled.read() {
        info!("Request {} cancelled ({:?})", event.request, event.reason);
    }
    for event in satisfied.read() {
        info!("Request {} of {:?} is satisfied", event.request, event.requester);
    }
    for event in converted.read() {
        info!("{:?} turned from {:?} into {:?}", event.unit, event.from, event.into);
    }
}
