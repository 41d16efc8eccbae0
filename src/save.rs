use std::path::PathBuf;

use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use moonshine_save::prelude::*;

use crate::constants::DEFAULT_SAVE_PATH;
use crate::goods::Material;
use crate::logistics::{
    JoblessUnit, LogisticsSettings, LogisticsSnapshot, MaterialOffer, PartitionId,
    PartitionSnapshot, Partitions, RequestArena, RequestId,
};
use crate::units::Capability;

/// Plugin that wires the moonshine save/load pipeline into the scheduler.
///
/// The scheduler is written as a [`LogisticsSnapshot`] resource and rebuilt
/// from it after a load. Entity references inside the snapshot are stored as
/// they are; requesters and units must keep their ids across the round trip.
pub struct LogisticsSavePlugin;

/// Default save settings (currently only the fallback save path).
#[derive(Resource, Reflect, Clone)]
#[reflect(Resource)]
pub struct SaveSettings {
    /// Default filesystem path used when requests do not provide one.
    pub default_path: PathBuf,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            default_path: PathBuf::from(DEFAULT_SAVE_PATH),
        }
    }
}

/// Request to write the scheduler state to disk.
#[derive(Message, Clone)]
pub struct SaveLogisticsRequest {
    pub path: Option<PathBuf>,
}

/// Request to load scheduler state from disk.
#[derive(Message, Clone)]
pub struct LoadLogisticsRequest {
    pub path: Option<PathBuf>,
}

#[derive(Message, Clone)]
pub struct SaveCompleted {
    pub path: PathBuf,
}

#[derive(Message, Clone)]
pub struct LoadCompleted {
    pub path: PathBuf,
}

#[derive(Resource, Default)]
struct PendingSave {
    path: Option<PathBuf>,
}

#[derive(Resource, Default)]
struct PendingLoad {
    path: Option<PathBuf>,
}

impl Plugin for LogisticsSavePlugin {
    fn build(&self, app: &mut App) {
        register_reflect_types(app);

        app.init_resource::<SaveSettings>()
            .init_resource::<PendingSave>()
            .init_resource::<PendingLoad>()
            .add_message::<SaveLogisticsRequest>()
            .add_message::<LoadLogisticsRequest>()
            .add_message::<SaveCompleted>()
            .add_message::<LoadCompleted>()
            .add_observer(save_on_default_event)
            .add_observer(load_on_default_event)
            .add_observer(emit_save_completion)
            .add_observer(emit_load_completion)
            .add_observer(rebuild_partitions_after_load)
            .add_systems(Update, (process_save_requests, process_load_requests));
    }
}

fn register_reflect_types(app: &mut App) {
    app.register_type::<TilePos>()
        .register_type::<Material>()
        .register_type::<Capability>()
        .register_type::<PartitionId>()
        .register_type::<RequestId>()
        .register_type::<Vec<RequestId>>()
        .register_type::<RequestArena>()
        .register_type::<JoblessUnit>()
        .register_type::<Vec<JoblessUnit>>()
        .register_type::<MaterialOffer>()
        .register_type::<Vec<MaterialOffer>>()
        .register_type::<PartitionSnapshot>()
        .register_type::<Vec<PartitionSnapshot>>()
        .register_type::<LogisticsSnapshot>()
        .register_type::<LogisticsSettings>();
}

fn process_save_requests(
    mut commands: Commands,
    mut requests: MessageReader<SaveLogisticsRequest>,
    settings: Res<SaveSettings>,
    partitions: Res<Partitions>,
    mut pending: ResMut<PendingSave>,
) {
    for request in requests.read() {
        let path = request
            .path
            .clone()
            .unwrap_or_else(|| settings.default_path.clone());

        commands.insert_resource(partitions.snapshot());
        let event = SaveWorld::default_into_file(path.clone())
            .include_resource::<LogisticsSnapshot>()
            .include_resource::<LogisticsSettings>();

        commands.trigger_save(event);
        pending.path = Some(path);
    }
}

fn process_load_requests(
    mut commands: Commands,
    mut requests: MessageReader<LoadLogisticsRequest>,
    settings: Res<SaveSettings>,
    mut pending: ResMut<PendingLoad>,
) {
    for request in requests.read() {
        let path = request
            .path
            .clone()
            .unwrap_or_else(|| settings.default_path.clone());

        commands.trigger_load(LoadWorld::default_from_file(path.clone()));
        pending.path = Some(path);
    }
}

fn emit_save_completion(
    _: On<Saved>,
    mut pending: ResMut<PendingSave>,
    mut completed: MessageWriter<SaveCompleted>,
) {
    if let Some(path) = pending.path.take() {
        info!("Saved logistics state to {}", path.display());
        completed.write(SaveCompleted { path });
    }
}

fn emit_load_completion(
    _: On<Loaded>,
    mut pending: ResMut<PendingLoad>,
    mut completed: MessageWriter<LoadCompleted>,
) {
    if let Some(path) = pending.path.take() {
        completed.write(LoadCompleted { path });
    }
}

fn rebuild_partitions_after_load(
    _: On<Loaded>,
    mut commands: Commands,
    snapshot: Option<Res<LogisticsSnapshot>>,
) {
    let Some(snapshot) = snapshot else {
        warn!("Loaded save carries no logistics snapshot");
        return;
    };

    match Partitions::restore(&snapshot) {
        Ok(partitions) => commands.insert_resource(partitions),
        Err(err) => warn!("Keeping current logistics state: {}", err),
    }
}
