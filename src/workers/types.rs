use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;

use super::grid::{DiggerRequester, StrategyGrid};
use crate::buildings::BuildingType;
use crate::logistics::PartitionId;
use crate::tile_pos::{Locatable, TilePosExt};
use crate::units::UnitType;

/// A movable unit that takes jobs from the scheduler
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Worker {
    pub unit_type: UnitType,
    pub partition: PartitionId,
    pub position: TilePos,
}

/// Construction site that asked for diggers
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct DiggingSite {
    pub building_type: BuildingType,
    pub position: TilePos,
    pub target_height: u8,
    pub active: bool,
    pub failures: u32,
}

impl DiggingSite {
    pub fn new(building_type: BuildingType, position: TilePos, target_height: u8) -> Self {
        Self {
            building_type,
            position,
            target_height,
            active: true,
            failures: 0,
        }
    }

    /// Whether every footprint tile is at the target height and flattened
    pub fn is_level(&self, grid: &dyn StrategyGrid) -> bool {
        self.building_type
            .protected_tiles()
            .into_iter()
            .filter_map(|offset| self.position.offset_by(offset))
            .all(|pos| grid.height_at(pos) == self.target_height && grid.is_flattened(pos))
    }
}

impl Locatable for DiggingSite {
    fn position(&self) -> TilePos {
        self.position
    }
}

impl DiggerRequester for DiggingSite {
    fn building_type(&self) -> BuildingType {
        self.building_type
    }

    fn target_height(&self) -> u8 {
        self.target_height
    }

    fn is_digger_request_active(&self) -> bool {
        self.active
    }

    fn digger_request_failed(&mut self) {
        self.failures += 1;
    }
}
