use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use std::collections::{BTreeMap, HashSet};

use crate::goods::Material;
use crate::tile_pos::{Locatable, TilePosExt};

/// A stack of material lying on a tile, ready to be picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct MaterialOffer {
    pub position: TilePos,
    pub material: Material,
    pub amount: u32,
}

impl Locatable for MaterialOffer {
    fn position(&self) -> TilePos {
        self.position
    }
}

/// Where a bearer collects the unit of material it was promised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct Pickup {
    pub position: TilePos,
    pub material: Material,
}

/// Offered material of one partition.
///
/// Stacks are grouped by material and kept in the order they first appeared,
/// so the closest-stack search breaks ties the same way on every client.
#[derive(Debug, Clone, Default)]
pub struct OfferRegistry {
    by_material: BTreeMap<Material, Vec<MaterialOffer>>,
}

impl OfferRegistry {
    /// Adds `amount` to the stack at `position`, creating it if needed
    pub fn add(&mut self, position: TilePos, material: Material, amount: u32) {
        if amount == 0 {
            return;
        }
        let stacks = self.by_material.entry(material).or_default();
        match stacks.iter_mut().find(|offer| offer.position == position) {
            Some(offer) => offer.amount += amount,
            None => stacks.push(MaterialOffer {
                position,
                material,
                amount,
            }),
        }
    }

    /// Takes up to `amount` from the stack at `position` and returns how much
    /// was actually there.
    pub fn remove(&mut self, position: TilePos, material: Material, amount: u32) -> u32 {
        let Some(stacks) = self.by_material.get_mut(&material) else {
            return 0;
        };
        let Some(index) = stacks.iter().position(|offer| offer.position == position) else {
            return 0;
        };

        let taken = amount.min(stacks[index].amount);
        stacks[index].amount -= taken;
        if stacks[index].amount == 0 {
            stacks.remove(index);
        }
        taken
    }

    /// Reserves one unit from the stack closest to `to`
    pub fn take_closest(&mut self, material: Material, to: TilePos) -> Option<Pickup> {
        let position = self
            .by_material
            .get(&material)?
            .iter()
            .min_by_key(|offer| offer.position.distance_to(&to))?
            .position;
        self.remove(position, material, 1);
        Some(Pickup { position, material })
    }

    pub fn has(&self, material: Material) -> bool {
        self.by_material
            .get(&material)
            .is_some_and(|stacks| !stacks.is_empty())
    }

    /// Total amount of a material over all stacks
    pub fn available(&self, material: Material) -> u32 {
        self.by_material
            .get(&material)
            .map_or(0, |stacks| stacks.iter().map(|offer| offer.amount).sum())
    }

    /// Number of stacks
    pub fn len(&self) -> usize {
        self.by_material.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_material.values().all(Vec::is_empty)
    }

    /// All stacks, by material and then arrival order
    pub fn iter(&self) -> impl Iterator<Item = &MaterialOffer> {
        self.by_material.values().flatten()
    }

    /// Removes and returns every stack lying at one of `positions`
    pub fn take_at(&mut self, positions: &HashSet<TilePos>) -> Vec<MaterialOffer> {
        let mut taken = Vec::new();
        for stacks in self.by_material.values_mut() {
            stacks.retain(|offer| {
                let moves = positions.contains(&offer.position());
                if moves {
                    taken.push(*offer);
                }
                !moves
            });
        }
        taken
    }

    /// Moves stacks lying at one of `positions` into `target`
    pub fn transfer_by_position(
        &mut self,
        positions: &HashSet<TilePos>,
        target: &mut OfferRegistry,
    ) -> usize {
        let moved = self.take_at(positions);
        for offer in &moved {
            target.add(offer.position, offer.material, offer.amount);
        }
        moved.len()
    }

    /// Appends every stack to `target`; this registry is empty afterwards
    pub fn merge_into(&mut self, target: &mut OfferRegistry) {
        for offer in std::mem::take(&mut self.by_material).into_values().flatten() {
            target.add(offer.position, offer.material, offer.amount);
        }
    }
}
