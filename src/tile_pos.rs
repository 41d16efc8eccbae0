use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use hexx::Hex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Anything that sits on a single tile of the map.
///
/// Request records and jobless units implement this so that territory
/// changes can sort them into partitions without knowing their concrete kind.
pub trait Locatable {
    fn position(&self) -> TilePos;
}

pub trait TilePosExt {
    fn to_hex(&self) -> Hex;

    /// Tile reached by applying a hex offset, or `None` when it leaves the map
    fn offset_by(&self, offset: Hex) -> Option<TilePos>;

    /// Hex distance between two tiles
    fn distance_to(&self, other: &TilePos) -> u32;
}

impl TilePosExt for TilePos {
    fn to_hex(&self) -> Hex {
        Hex::new(self.x as i32, self.y as i32)
    }

    fn offset_by(&self, offset: Hex) -> Option<TilePos> {
        (self.to_hex() + offset).to_tile_pos()
    }

    fn distance_to(&self, other: &TilePos) -> u32 {
        self.to_hex().unsigned_distance_to(other.to_hex())
    }
}

pub trait HexExt {
    fn to_tile_pos(&self) -> Option<TilePos>;
}

impl HexExt for Hex {
    fn to_tile_pos(&self) -> Option<TilePos> {
        if self.x >= 0 && self.y >= 0 {
            Some(TilePos {
                x: self.x as u32,
                y: self.y as u32,
            })
        } else {
            None
        }
    }
}

/// Serde adapter for [`TilePos`] fields, stored as an `(x, y)` pair.
///
/// Use with `#[serde(with = "crate::tile_pos::tile_pos_serde")]`.
pub mod tile_pos_serde {
    use bevy_ecs_tilemap::prelude::TilePos;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(pos: &TilePos, serializer: S) -> Result<S::Ok, S::Error> {
        (pos.x, pos.y).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TilePos, D::Error> {
        let (x, y) = <(u32, u32)>::deserialize(deserializer)?;
        Ok(TilePos { x, y })
    }
}

/// Relative facing used by bricklayers standing next to a construction site
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize,
)]
pub enum Facing {
    #[default]
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

/// Moves every element whose position satisfies `moves` out of `source` and
/// appends it to `target`, keeping the relative order on both sides.
pub fn split_off_where<T>(
    source: &mut VecDeque<T>,
    target: &mut VecDeque<T>,
    mut moves: impl FnMut(&T) -> bool,
) -> usize {
    let mut kept = VecDeque::with_capacity(source.len());
    let mut moved = 0;
    for item in source.drain(..) {
        if moves(&item) {
            target.push_back(item);
            moved += 1;
        } else {
            kept.push_back(item);
        }
    }
    *source = kept;
    moved
}
