use bevy::prelude::*;
use bevy_ecs_tilemap::prelude::TilePos;
use serde::{Deserialize, Serialize};

use super::partitions::PartitionId;
use super::priority::Priority;
use crate::buildings::BuildingType;
use crate::goods::Material;
use crate::tile_pos::{Facing, Locatable, tile_pos_serde};
use crate::units::{Capability, UnitType};

/// What a requester is asking its partition for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum RequestKind {
    /// Deliver a material to a building
    Material {
        material: Material,
        building: BuildingType,
    },
    /// Send a bricklayer to stand at `target` facing the construction site
    Bricklayer {
        building: Entity,
        #[serde(with = "tile_pos_serde")]
        target: TilePos,
        facing: Facing,
    },
    /// Send diggers to level the footprint of a building
    Digger {
        building: Entity,
        building_type: BuildingType,
    },
    /// Turn a bearer into a specialist worker at the requesting position
    WorkerCreation { unit: UnitType },
    /// Turn a bearer into a soldier at a barrack door
    SoldierCreation { barrack: Entity, unit: UnitType },
}

impl RequestKind {
    pub fn channel(&self) -> RequestChannel {
        match self {
            RequestKind::Material { material, building } => RequestChannel::Material {
                material: *material,
                building: *building,
            },
            RequestKind::Bricklayer { .. } => RequestChannel::Bricklayer,
            RequestKind::Digger { .. } => RequestChannel::Digger,
            RequestKind::WorkerCreation { .. } => RequestChannel::WorkerCreation,
            RequestKind::SoldierCreation { .. } => RequestChannel::SoldierCreation,
        }
    }

    /// Material requests spread deliveries over their peers; labor and
    /// creation requests keep their place until satisfied.
    pub fn default_round_robin(&self) -> bool {
        matches!(self, RequestKind::Material { .. })
    }

    /// Material a bearer has to pick up from an offer before serving this
    pub fn required_material(&self) -> Option<Material> {
        match self {
            RequestKind::Material { material, .. } => Some(*material),
            RequestKind::WorkerCreation { unit } | RequestKind::SoldierCreation { unit, .. } => {
                unit.required_item()
            }
            RequestKind::Bricklayer { .. } | RequestKind::Digger { .. } => None,
        }
    }

    /// Unit type the serving bearer becomes once it reaches the requester
    pub fn converts_to(&self) -> Option<UnitType> {
        match self {
            RequestKind::WorkerCreation { unit } | RequestKind::SoldierCreation { unit, .. } => {
                Some(*unit)
            }
            _ => None,
        }
    }
}

/// Key of a request queue inside a partition.
///
/// Material queues are kept apart per receiving building type, so requests of
/// one building type only take turns among themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Reflect)]
pub enum RequestChannel {
    Material {
        material: Material,
        building: BuildingType,
    },
    Bricklayer,
    Digger,
    WorkerCreation,
    SoldierCreation,
}

impl RequestChannel {
    /// Which jobless pool serves this channel
    pub fn capability(self) -> Capability {
        match self {
            RequestChannel::Material { .. }
            | RequestChannel::WorkerCreation
            | RequestChannel::SoldierCreation => Capability::Bearer,
            RequestChannel::Bricklayer => Capability::Bricklayer,
            RequestChannel::Digger => Capability::Digger,
        }
    }
}

/// Non-owning handle to the queue currently holding a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub struct QueueRef {
    pub partition: PartitionId,
    pub tier: Priority,
}

/// Parameters of a request as issued by a building or unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct NewRequest {
    pub position: TilePos,
    pub kind: RequestKind,
    pub priority: Priority,
    pub quantity: u32,
    pub in_delivery_cap: u32,
    pub round_robin: bool,
}

impl NewRequest {
    /// Request with the kind's default rotation and no cap beyond the quantity
    pub fn new(position: TilePos, kind: RequestKind, quantity: u32) -> Self {
        Self {
            position,
            kind,
            priority: Priority::default(),
            quantity,
            in_delivery_cap: quantity,
            round_robin: kind.default_round_robin(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_in_delivery_cap(mut self, cap: u32) -> Self {
        self.in_delivery_cap = cap;
        self
    }

    pub fn with_round_robin(mut self, round_robin: bool) -> Self {
        self.round_robin = round_robin;
        self
    }
}

/// A single outstanding ask.
///
/// `still_needed` counts everything not yet delivered, including the part
/// that is in delivery, so `in_delivery <= still_needed` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct RequestRecord {
    pub requester: Entity,
    #[serde(with = "tile_pos_serde")]
    pub position: TilePos,
    pub kind: RequestKind,
    pub(crate) priority: Priority,
    pub(crate) still_needed: u32,
    pub(crate) in_delivery: u32,
    pub in_delivery_cap: u32,
    pub round_robin: bool,
    pub(crate) owner: Option<QueueRef>,
}

impl RequestRecord {
    pub fn new(requester: Entity, request: NewRequest) -> Self {
        Self {
            requester,
            position: request.position,
            kind: request.kind,
            priority: request.priority,
            still_needed: request.quantity,
            in_delivery: 0,
            in_delivery_cap: request.in_delivery_cap,
            round_robin: request.round_robin,
            owner: None,
        }
    }

    pub fn channel(&self) -> RequestChannel {
        self.kind.channel()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn still_needed(&self) -> u32 {
        self.still_needed
    }

    pub fn in_delivery(&self) -> u32 {
        self.in_delivery
    }

    pub fn owner(&self) -> Option<QueueRef> {
        self.owner
    }

    pub fn is_queued(&self) -> bool {
        self.owner.is_some()
    }

    /// Nothing left to deliver
    pub fn is_exhausted(&self) -> bool {
        self.still_needed == 0
    }

    /// Whether another unit may be promised to this record right now
    pub fn can_take_more(&self) -> bool {
        self.still_needed > self.in_delivery && self.in_delivery < self.in_delivery_cap
    }
}

impl Locatable for RequestRecord {
    fn position(&self) -> TilePos {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plank_request(quantity: u32) -> NewRequest {
        NewRequest::new(
            TilePos { x: 3, y: 3 },
            RequestKind::Material {
                material: Material::Plank,
                building: BuildingType::Sawmill,
            },
            quantity,
        )
    }

    #[test]
    fn material_requests_rotate_by_default() {
        let request = plank_request(4);
        assert!(request.round_robin);
        assert_eq!(request.in_delivery_cap, 4);
        assert_eq!(request.priority, Priority::Normal);

        let creation = NewRequest::new(
            TilePos { x: 0, y: 0 },
            RequestKind::WorkerCreation {
                unit: UnitType::Digger,
            },
            1,
        );
        assert!(!creation.round_robin);
    }

    #[test]
    fn capacity_checks() {
        let mut record = RequestRecord::new(
            Entity::PLACEHOLDER,
            plank_request(2).with_in_delivery_cap(1),
        );
        assert!(record.can_take_more());

        record.in_delivery = 1;
        assert!(!record.can_take_more(), "cap of one reached");

        record.in_delivery_cap = 3;
        record.in_delivery = 2;
        assert!(!record.can_take_more(), "everything needed is on its way");

        record.still_needed = 0;
        record.in_delivery = 0;
        assert!(record.is_exhausted());
    }

    #[test]
    fn material_channels_are_keyed_by_building() {
        let kind = |building| RequestKind::Material {
            material: Material::Plank,
            building,
        };
        assert_ne!(
            kind(BuildingType::Sawmill).channel(),
            kind(BuildingType::Tower).channel()
        );
        assert_eq!(
            kind(BuildingType::Tower).channel(),
            RequestChannel::Material {
                material: Material::Plank,
                building: BuildingType::Tower,
            }
        );
    }

    #[test]
    fn creation_requests_need_the_tool_of_their_unit() {
        let digger = RequestKind::WorkerCreation {
            unit: UnitType::Digger,
        };
        assert_eq!(digger.required_material(), Some(Material::Pick));
        assert_eq!(digger.converts_to(), Some(UnitType::Digger));

        let baker = RequestKind::WorkerCreation {
            unit: UnitType::Baker,
        };
        assert_eq!(baker.required_material(), None);

        let stone = RequestKind::Material {
            material: Material::Stone,
            building: BuildingType::Tower,
        };
        assert_eq!(stone.required_material(), Some(Material::Stone));
        assert_eq!(stone.converts_to(), None);
    }

    #[test]
    fn channels_map_to_capabilities() {
        assert_eq!(
            RequestChannel::Material {
                material: Material::Stone,
                building: BuildingType::Tower,
            }
            .capability(),
            Capability::Bearer
        );
        assert_eq!(RequestChannel::Digger.capability(), Capability::Digger);
        assert_eq!(
            RequestChannel::Bricklayer.capability(),
            Capability::Bricklayer
        );
        assert_eq!(
            RequestChannel::SoldierCreation.capability(),
            Capability::Bearer
        );
    }
}
