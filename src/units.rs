use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::goods::Material;

/// Kind of movable unit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Reflect, Serialize, Deserialize,
)]
pub enum UnitType {
    Bearer,
    Digger,
    Bricklayer,
    Lumberjack,
    Sawmiller,
    Stonecutter,
    Farmer,
    Miller,
    Baker,
    Smith,
    Swordsman,
    Bowman,
    Pikeman,
}

impl UnitType {
    /// The item a bearer must pick up to become this unit, if any
    pub fn required_item(self) -> Option<Material> {
        match self {
            UnitType::Bearer => None,
            UnitType::Digger => Some(Material::Pick),
            UnitType::Bricklayer => Some(Material::Hammer),
            UnitType::Lumberjack => Some(Material::Axe),
            UnitType::Sawmiller => Some(Material::Saw),
            UnitType::Stonecutter => Some(Material::Pick),
            UnitType::Farmer => Some(Material::Scythe),
            UnitType::Miller | UnitType::Baker => None,
            UnitType::Smith => Some(Material::Hammer),
            UnitType::Swordsman => Some(Material::Sword),
            UnitType::Bowman => Some(Material::Bow),
            UnitType::Pikeman => Some(Material::Spear),
        }
    }

    pub fn is_soldier(self) -> bool {
        matches!(
            self,
            UnitType::Swordsman | UnitType::Bowman | UnitType::Pikeman
        )
    }

    /// The jobless pool this unit registers in while idle.
    /// Specialists working inside a building never register as jobless.
    pub fn capability(self) -> Option<Capability> {
        match self {
            UnitType::Bearer => Some(Capability::Bearer),
            UnitType::Digger => Some(Capability::Digger),
            UnitType::Bricklayer => Some(Capability::Bricklayer),
            _ => None,
        }
    }
}

/// What an idle unit can be matched to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Reflect, Serialize, Deserialize,
)]
pub enum Capability {
    /// Carries materials, and converts into workers or soldiers on request
    Bearer,
    /// Levels construction sites
    Digger,
    /// Erects buildings
    Bricklayer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soldiers_need_weapons() {
        for unit in [UnitType::Swordsman, UnitType::Bowman, UnitType::Pikeman] {
            assert!(unit.is_soldier());
            assert!(unit.required_item().is_some_and(Material::is_weapon));
        }
    }

    #[test]
    fn only_generic_workers_register_as_jobless() {
        assert_eq!(UnitType::Bearer.capability(), Some(Capability::Bearer));
        assert_eq!(UnitType::Digger.capability(), Some(Capability::Digger));
        assert_eq!(UnitType::Baker.capability(), None);
        assert_eq!(UnitType::Swordsman.capability(), None);
    }
}
