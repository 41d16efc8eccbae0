use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::tile_pos::{Locatable, split_off_where};
use crate::units::Capability;

/// An idle unit waiting to be matched to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct JoblessUnit {
    pub unit: Entity,
    pub capability: Capability,
    pub position: TilePos,
}

impl Locatable for JoblessUnit {
    fn position(&self) -> TilePos {
        self.position
    }
}

/// Idle units of one partition, grouped by capability in arrival order
#[derive(Debug, Clone, Default)]
pub struct JoblessRegistry {
    by_capability: BTreeMap<Capability, VecDeque<JoblessUnit>>,
}

impl JoblessRegistry {
    /// Registers an idle unit; returns false if it is already registered
    pub fn add(&mut self, jobless: JoblessUnit) -> bool {
        if self.contains(jobless.unit) {
            return false;
        }
        self.by_capability
            .entry(jobless.capability)
            .or_default()
            .push_back(jobless);
        true
    }

    /// Removes a unit if present. Removing an unknown unit is a no-op.
    pub fn remove(&mut self, unit: Entity) -> Option<JoblessUnit> {
        for pool in self.by_capability.values_mut() {
            if let Some(index) = pool.iter().position(|jobless| jobless.unit == unit) {
                return pool.remove(index);
            }
        }
        None
    }

    /// Takes the longest-waiting unit of a capability
    pub fn take_any(&mut self, capability: Capability) -> Option<JoblessUnit> {
        self.by_capability.get_mut(&capability)?.pop_front()
    }

    pub fn contains(&self, unit: Entity) -> bool {
        self.iter().any(|jobless| jobless.unit == unit)
    }

    pub fn count(&self, capability: Capability) -> usize {
        self.by_capability.get(&capability).map_or(0, VecDeque::len)
    }

    pub fn len(&self) -> usize {
        self.by_capability.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_capability.values().all(VecDeque::is_empty)
    }

    /// All units, by capability and then arrival order
    pub fn iter(&self) -> impl Iterator<Item = &JoblessUnit> {
        self.by_capability.values().flatten()
    }

    /// Moves units standing at one of `positions` into `target`
    pub fn transfer_by_position(
        &mut self,
        positions: &HashSet<TilePos>,
        target: &mut JoblessRegistry,
    ) -> Vec<JoblessUnit> {
        let mut moved = Vec::new();
        for (capability, pool) in self.by_capability.iter_mut() {
            let target_pool = target.by_capability.entry(*capability).or_default();
            let start = target_pool.len();
            split_off_where(pool, target_pool, |jobless| {
                positions.contains(&jobless.position())
            });
            moved.extend(target_pool.iter().skip(start).copied());
        }
        moved
    }

    /// Appends every unit to `target`; this registry is empty afterwards
    pub fn merge_into(&mut self, target: &mut JoblessRegistry) {
        for (capability, mut pool) in std::mem::take(&mut self.by_capability) {
            target
                .by_capability
                .entry(capability)
                .or_default()
                .append(&mut pool);
        }
    }
}
