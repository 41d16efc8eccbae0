#![allow(dead_code)]

use std::path::Path;

use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use settlers_logistics::LogisticsPlugins;
use settlers_logistics::logistics::{PartitionId, Partitions};
use settlers_logistics::save::{
    LoadCompleted, LoadLogisticsRequest, SaveCompleted, SaveLogisticsRequest,
};
use settlers_logistics::units::UnitType;
use settlers_logistics::workers::Worker;

/// Upper bound of frames to wait for moonshine to finish a save or load
const MAX_IO_FRAMES: usize = 20;

/// Collects every message of one type that went through the app
#[derive(Resource)]
pub struct Recorded<M: Message>(pub Vec<M>);

impl<M: Message> Default for Recorded<M> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

fn record<M: Message + Clone>(mut reader: MessageReader<M>, mut recorded: ResMut<Recorded<M>>) {
    recorded.0.extend(reader.read().cloned());
}

/// Headless app with the scheduler, the workers and the save pipeline.
/// Startup has already run.
pub fn create_logistics_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(LogisticsPlugins);
    app.update();
    app
}

/// Starts recording messages of type `M` at the end of every frame
pub fn record_messages<M: Message + Clone>(app: &mut App) {
    app.init_resource::<Recorded<M>>()
        .add_systems(Last, record::<M>);
}

pub fn recorded<M: Message + Clone>(app: &App) -> Vec<M> {
    app.world().resource::<Recorded<M>>().0.clone()
}

pub fn send<M: Message>(app: &mut App, message: M) {
    app.world_mut().resource_mut::<Messages<M>>().write(message);
}

pub fn create_partition(app: &mut App, player: u8) -> PartitionId {
    app.world_mut()
        .resource_mut::<Partitions>()
        .create_partition(player)
}

pub fn spawn_worker(
    app: &mut App,
    unit_type: UnitType,
    partition: PartitionId,
    position: TilePos,
) -> Entity {
    app.world_mut()
        .spawn(Worker {
            unit_type,
            partition,
            position,
        })
        .id()
}

pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

/// Saves the scheduler to `path`, returns whether the save finished in time
pub fn save_to(app: &mut App, path: &Path) -> bool {
    record_messages::<SaveCompleted>(app);
    send(
        app,
        SaveLogisticsRequest {
            path: Some(path.to_path_buf()),
        },
    );
    wait_for::<SaveCompleted>(app)
}

/// Loads the scheduler from `path`, returns whether the load finished in time
pub fn load_from(app: &mut App, path: &Path) -> bool {
    record_messages::<LoadCompleted>(app);
    send(
        app,
        LoadLogisticsRequest {
            path: Some(path.to_path_buf()),
        },
    );
    wait_for::<LoadCompleted>(app)
}

fn wait_for<M: Message + Clone>(app: &mut App) -> bool {
    for _ in 0..MAX_IO_FRAMES {
        app.update();
        if !recorded::<M>(app).is_empty() {
            return true;
        }
    }
    false
}
