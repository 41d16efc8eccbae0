//! Settlers Logistics - partition-scoped material and labor distribution
//!
//! Requesters queue demands against the partition they stand in, jobless units
//! report themselves to the same partition, and each tick the scheduler pairs
//! them up. Worker strategies then carry out the jobs and report back.

use bevy::app::PluginGroup;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use crate::logistics::LogisticsPlugin;
use crate::save::LogisticsSavePlugin;
use crate::workers::WorkerPlugin;

pub mod buildings;
pub mod constants;
pub mod goods;
pub mod logistics;
pub mod messages;
pub mod save;
pub mod tile_pos;
pub mod units;
pub mod workers;

/// Scheduler, worker strategies and persistence (headless-compatible)
pub struct LogisticsPlugins;

impl PluginGroup for LogisticsPlugins {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(LogisticsPlugin)
            .add(WorkerPlugin)
            .add(LogisticsSavePlugin)
    }
}

/// Headless app running the scheduler on a fixed loop
pub fn app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(LogisticsPlugins);
    app
}

#[cfg(test)]
pub mod test_utils;
