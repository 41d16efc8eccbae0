use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use std::collections::{HashMap, HashSet};

use crate::buildings::BuildingType;
use crate::goods::Material;
use crate::tile_pos::Locatable;
use crate::units::{Capability, UnitType};

/// What a job strategy may do to the world around it
pub trait StrategyGrid {
    /// Whether another unit already claimed the tile as its work target
    fn is_marked(&self, pos: TilePos) -> bool;
    fn set_marked(&mut self, pos: TilePos, marked: bool);

    fn height_at(&self, pos: TilePos) -> u8;
    fn is_flattened(&self, pos: TilePos) -> bool;
    /// Moves the terrain one step towards `height`, flattening it on arrival
    fn change_height_towards(&mut self, pos: TilePos, height: u8);

    /// Starts walking `unit` to `target`; false if no path exists
    fn go_to(&mut self, unit: Entity, target: TilePos) -> bool;
    fn play_action(&mut self, unit: Entity, duration: f32);

    fn report_jobless(&mut self, unit: Entity, capability: Capability, pos: TilePos);
    fn withdraw_jobless(&mut self, unit: Entity);

    /// Puts one unit of material a job did not deliver back on offer at `pos`
    fn return_material(&mut self, unit: Entity, material: Material, pos: TilePos);
    /// Turns the unit into `into`; it takes jobs of its new kind from now on
    fn convert_unit(&mut self, unit: Entity, into: UnitType);
}

/// A construction site waiting for its footprint to be leveled
pub trait DiggerRequester: Locatable {
    fn building_type(&self) -> BuildingType;
    fn target_height(&self) -> u8;
    fn is_digger_request_active(&self) -> bool;
    fn digger_request_failed(&mut self);
}

/// Terrain state of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct TileTerrain {
    pub height: u8,
    pub flattened: bool,
}

/// Headless [`StrategyGrid`]: terrain lives in maps and every side effect
/// that leaves the grid is queued for the worker systems to forward.
#[derive(Resource, Debug, Default)]
pub struct WorkSiteGrid {
    terrain: HashMap<TilePos, TileTerrain>,
    marked: HashSet<TilePos>,
    pub(crate) walks: Vec<(Entity, TilePos)>,
    pub(crate) actions: Vec<(Entity, f32)>,
    pub(crate) jobless: Vec<(Entity, Capability, TilePos)>,
    pub(crate) withdrawn: Vec<Entity>,
    pub(crate) returned: Vec<(Entity, Material, TilePos)>,
    pub(crate) conversions: Vec<(Entity, UnitType)>,
    blocked: HashSet<TilePos>,
}

impl WorkSiteGrid {
    pub fn set_terrain(&mut self, pos: TilePos, terrain: TileTerrain) {
        self.terrain.insert(pos, terrain);
    }

    pub fn terrain(&self, pos: TilePos) -> TileTerrain {
        self.terrain.get(&pos).copied().unwrap_or_default()
    }

    /// Makes `pos` unreachable, so walks towards it abort
    pub fn block(&mut self, pos: TilePos) {
        self.blocked.insert(pos);
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }
}

impl StrategyGrid for WorkSiteGrid {
    fn is_marked(&self, pos: TilePos) -> bool {
        self.marked.contains(&pos)
    }

    fn set_marked(&mut self, pos: TilePos, marked: bool) {
        if marked {
            self.marked.insert(pos);
        } else {
            self.marked.remove(&pos);
        }
    }

    fn height_at(&self, pos: TilePos) -> u8 {
        self.terrain(pos).height
    }

    fn is_flattened(&self, pos: TilePos) -> bool {
        self.terrain(pos).flattened
    }

    fn change_height_towards(&mut self, pos: TilePos, height: u8) {
        let tile = self.terrain.entry(pos).or_default();
        match tile.height.cmp(&height) {
            std::cmp::Ordering::Less => tile.height += 1,
            std::cmp::Ordering::Greater => tile.height -= 1,
            std::cmp::Ordering::Equal => {}
        }
        if tile.height == height {
            tile.flattened = true;
        }
    }

    fn go_to(&mut self, unit: Entity, target: TilePos) -> bool {
        if self.blocked.contains(&target) {
            return false;
        }
        self.walks.push((unit, target));
        true
    }

    fn play_action(&mut self, unit: Entity, duration: f32) {
        self.actions.push((unit, duration));
    }

    fn report_jobless(&mut self, unit: Entity, capability: Capability, pos: TilePos) {
        self.jobless.push((unit, capability, pos));
    }

    fn withdraw_jobless(&mut self, unit: Entity) {
        self.withdrawn.push(unit);
    }

    fn return_material(&mut self, unit: Entity, material: Material, pos: TilePos) {
        self.returned.push((unit, material, pos));
    }

    fn convert_unit(&mut self, unit: Entity, into: UnitType) {
        self.conversions.push((unit, into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digging_walks_height_one_step_and_flattens_on_target() {
        let mut grid = WorkSiteGrid::default();
        let pos = TilePos { x: 2, y: 2 };
        grid.set_terrain(
            pos,
            TileTerrain {
                height: 5,
                flattened: false,
            },
        );

        grid.change_height_towards(pos, 3);
        assert_eq!(grid.height_at(pos), 4);
        assert!(!grid.is_flattened(pos));

        grid.change_height_towards(pos, 3);
        assert_eq!(grid.height_at(pos), 3);
        assert!(grid.is_flattened(pos));
    }

    #[test]
    fn blocked_targets_cannot_be_reached() {
        let mut world = World::new();
        let unit = world.spawn_empty().id();
        let mut grid = WorkSiteGrid::default();
        grid.block(TilePos { x: 1, y: 1 });

        assert!(!grid.go_to(unit, TilePos { x: 1, y: 1 }));
        assert!(grid.go_to(unit, TilePos { x: 1, y: 2 }));
        assert_eq!(grid.walks, vec![(unit, TilePos { x: 1, y: 2 })]);
    }
}
