use std::collections::HashSet;
use std::hint::black_box;

use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use settlers_logistics::buildings::BuildingType;
use settlers_logistics::goods::Material;
use settlers_logistics::logistics::{
    JoblessUnit, NewRequest, PartitionId, Partitions, RequestKind,
};
use settlers_logistics::units::Capability;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 64;

/// A square territory with a request and a jobless bearer on every other tile,
/// and a plank stack on every remaining one
fn territory(world: &mut World) -> (Partitions, PartitionId) {
    let mut partitions = Partitions::default();
    let home = partitions.create_partition(0);

    for x in 0..WIDTH {
        for y in (x % 2..HEIGHT).step_by(2) {
            let position = TilePos { x, y };
            let requester = world.spawn_empty().id();
            partitions
                .insert_request(
                    home,
                    requester,
                    NewRequest::new(
                        position,
                        RequestKind::Material {
                            material: Material::Plank,
                            building: BuildingType::Sawmill,
                        },
                        2,
                    ),
                )
                .ok();
            let unit = world.spawn_empty().id();
            partitions
                .add_jobless(
                    home,
                    JoblessUnit {
                        unit,
                        capability: Capability::Bearer,
                        position,
                    },
                )
                .ok();
            if y + 1 < HEIGHT {
                partitions
                    .offer_material(home, TilePos { x, y: y + 1 }, Material::Plank, 1)
                    .ok();
            }
        }
    }

    (partitions, home)
}

fn benchmark_split_and_merge(c: &mut Criterion) {
    let mut world = World::new();
    let (partitions, home) = territory(&mut world);
    let snapshot = partitions.snapshot();
    let east_half: HashSet<TilePos> = (WIDTH / 2..WIDTH)
        .flat_map(|x| (0..HEIGHT).map(move |y| TilePos { x, y }))
        .collect();

    c.bench_function("split_half_of_4096_tiles", |b| {
        b.iter_batched(
            || Partitions::restore(&snapshot).unwrap_or_default(),
            |mut partitions| black_box(partitions.split_partition(home, &east_half).ok()),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("split_then_merge_back", |b| {
        b.iter_batched(
            || Partitions::restore(&snapshot).unwrap_or_default(),
            |mut partitions| {
                if let Ok(created) = partitions.split_partition(home, &east_half) {
                    black_box(partitions.merge_partitions(home, created).ok());
                }
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, benchmark_split_and_merge);
criterion_main!(benches);
