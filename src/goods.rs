use bevy::prelude::*;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Materials carried by bearers between stocks and requesting buildings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Reflect, Serialize, Deserialize,
)]
pub enum Material {
    // Construction materials
    Plank,
    Stone,
    Trunk,

    // Raw resources
    Coal,
    Iron,
    Gold,
    Crop,
    Fish,
    Pig,
    Water,

    // Processed goods
    IronBar,
    GoldBar,
    Flour,
    Bread,
    Meat,

    // Tools (picked up when a bearer becomes a specialist)
    Hammer,
    Axe,
    Pick,
    Saw,
    Scythe,
    FishingRod,

    // Weapons (picked up when a bearer becomes a soldier)
    Sword,
    Bow,
    Spear,
}

impl Material {
    /// Returns true if this material is used to erect buildings
    pub fn is_construction_material(self) -> bool {
        matches!(self, Material::Plank | Material::Stone)
    }

    /// Returns true if this is a tool that turns a bearer into a specialist
    pub fn is_tool(self) -> bool {
        matches!(
            self,
            Material::Hammer
                | Material::Axe
                | Material::Pick
                | Material::Saw
                | Material::Scythe
                | Material::FishingRod
        )
    }

    /// Returns true if this is a weapon that turns a bearer into a soldier
    pub fn is_weapon(self) -> bool {
        matches!(self, Material::Sword | Material::Bow | Material::Spear)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Material::Plank => write!(f, "Plank"),
            Material::Stone => write!(f, "Stone"),
            Material::Trunk => write!(f, "Trunk"),
            Material::Coal => write!(f, "Coal"),
            Material::Iron => write!(f, "Iron"),
            Material::Gold => write!(f, "Gold"),
            Material::Crop => write!(f, "Crop"),
            Material::Fish => write!(f, "Fish"),
            Material::Pig => write!(f, "Pig"),
            Material::Water => write!(f, "Water"),
            Material::IronBar => write!(f, "Iron Bar"),
            Material::GoldBar => write!(f, "Gold Bar"),
            Material::Flour => write!(f, "Flour"),
            Material::Bread => write!(f, "Bread"),
            Material::Meat => write!(f, "Meat"),
            Material::Hammer => write!(f, "Hammer"),
            Material::Axe => write!(f, "Axe"),
            Material::Pick => write!(f, "Pick"),
            Material::Saw => write!(f, "Saw"),
            Material::Scythe => write!(f, "Scythe"),
            Material::FishingRod => write!(f, "Fishing Rod"),
            Material::Sword => write!(f, "Sword"),
            Material::Bow => write!(f, "Bow"),
            Material::Spear => write!(f, "Spear"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(Material::Plank.to_string(), "Plank");
        assert_eq!(Material::IronBar.to_string(), "Iron Bar");
        assert_eq!(Material::FishingRod.to_string(), "Fishing Rod");
    }

    #[test]
    fn tool_and_weapon_classification() {
        assert!(Material::Hammer.is_tool());
        assert!(!Material::Sword.is_tool());
        assert!(Material::Bow.is_weapon());
        assert!(!Material::Plank.is_weapon());
        assert!(Material::Stone.is_construction_material());
        assert!(!Material::Trunk.is_construction_material());
    }
}
