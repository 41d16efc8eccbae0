use bevy::prelude::*;

use crate::logistics::LogisticsSet;
use crate::messages::{UnitConverted, WorkerKilled};

pub mod bearer;
pub mod digger;
pub mod grid;
pub mod state;
pub mod systems;
pub mod types;


pub use bearer::{BearerJob, BearerStrategy};
pub use digger::{DiggerJob, DiggerStrategy};
pub use grid::{DiggerRequester, StrategyGrid, TileTerrain, WorkSiteGrid};
pub use state::{JobEffect, JobEvent, JobState, Transition, transition};
pub use types::{DiggingSite, Worker};

/// Worker systems run after the scheduler so that assignments made this tick
/// are picked up immediately.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct WorkerSet;

/// Executes scheduler jobs. Requires [`crate::logistics::LogisticsPlugin`],
/// which owns the shared messages.
pub struct WorkerPlugin;

impl Plugin for WorkerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Worker>()
            .register_type::<DiggingSite>()
            .register_type::<DiggerStrategy>()
            .register_type::<BearerStrategy>()
            .init_resource::<WorkSiteGrid>()
            .add_message::<WorkerKilled>()
            .add_message::<UnitConverted>();

        app.configure_sets(Update, WorkerSet.after(LogisticsSet));
        app.add_systems(
            Update,
            (
                systems::follow_topology_changes,
                systems::announce_new_workers,
                systems::accept_job_assignments,
                systems::evict_displaced_workers,
                systems::handle_killed_workers,
                systems::close_finished_sites,
                systems::step_workers,
                systems::flush_grid_effects,
            )
                .chain()
                .in_set(WorkerSet),
        );
    }
}
