use bevy::prelude::*;
use hexx::Hex;
use serde::{Deserialize, Serialize};

use crate::constants::{LARGE_BUILDING_RADIUS, SMALL_BUILDING_RADIUS};
use crate::goods::Material;

/// Building types that raise requests against their partition
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Reflect, Serialize, Deserialize,
)]
pub enum BuildingType {
    Lumberjack,
    Sawmill,
    Stonecutter,
    Farm,
    Mill,
    Bakery,
    Smith,
    ToolSmith,
    WeaponSmith,
    Barrack,
    Tower,
    Castle,
    StockYard,
}

impl BuildingType {
    /// Whether the building occupies the large footprint
    pub fn is_large(self) -> bool {
        matches!(
            self,
            BuildingType::Farm | BuildingType::Barrack | BuildingType::Castle
        )
    }

    /// Whether the building turns bearers into soldiers
    pub fn is_barrack(self) -> bool {
        self == BuildingType::Barrack
    }

    /// Offsets (relative to the building position) that must be levelled
    /// before construction can start and that no other building may cover.
    pub fn protected_tiles(self) -> Vec<Hex> {
        let radius = if self.is_large() {
            LARGE_BUILDING_RADIUS
        } else {
            SMALL_BUILDING_RADIUS
        };
        Hex::ZERO.range(radius).collect()
    }

    /// Construction materials required to erect the building
    pub fn construction_costs(self) -> Vec<(Material, u32)> {
        match self {
            BuildingType::Lumberjack | BuildingType::Stonecutter => {
                vec![(Material::Plank, 3), (Material::Stone, 1)]
            }
            BuildingType::Sawmill | BuildingType::Mill | BuildingType::Bakery => {
                vec![(Material::Plank, 3), (Material::Stone, 3)]
            }
            BuildingType::Farm | BuildingType::Smith => {
                vec![(Material::Plank, 4), (Material::Stone, 3)]
            }
            BuildingType::ToolSmith | BuildingType::WeaponSmith => {
                vec![(Material::Plank, 4), (Material::Stone, 4)]
            }
            BuildingType::Barrack | BuildingType::StockYard => {
                vec![(Material::Plank, 5), (Material::Stone, 5)]
            }
            BuildingType::Tower => vec![(Material::Plank, 2), (Material::Stone, 5)],
            BuildingType::Castle => vec![(Material::Plank, 6), (Material::Stone, 10)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_tiles_include_the_building_position() {
        for building in [BuildingType::Lumberjack, BuildingType::Castle] {
            assert!(building.protected_tiles().contains(&Hex::ZERO));
        }
    }

    #[test]
    fn large_buildings_protect_more_tiles() {
        // Hex ranges hold 1 + 3r(r + 1) tiles
        assert_eq!(BuildingType::Sawmill.protected_tiles().len(), 7);
        assert_eq!(BuildingType::Farm.protected_tiles().len(), 19);
    }

    #[test]
    fn every_building_needs_construction_material() {
        let costs = BuildingType::Tower.construction_costs();
        assert!(costs.iter().all(|(m, _)| m.is_construction_material()));
        assert_eq!(costs.iter().map(|(_, qty)| qty).sum::<u32>(), 7);
    }
}
