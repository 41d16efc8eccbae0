use bevy::prelude::*;

use bevy_ecs_tilemap::prelude::TilePos;

use crate::goods::Material;
use crate::logistics::{LogisticsError, NewRequest, PartitionId, Priority, RequestId};

/// A building or unit asks its partition for material or labor
#[derive(Message, Debug, Clone, Copy)]
pub struct InsertRequest {
    pub partition: PartitionId,
    pub requester: Entity,
    pub request: NewRequest,
}

/// Sent once an [`InsertRequest`] was queued; the id addresses it from now on
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestInserted {
    pub requester: Entity,
    pub partition: PartitionId,
    pub request: RequestId,
}

/// Sent when an [`InsertRequest`] could not be queued
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRejected {
    pub requester: Entity,
    pub reason: LogisticsError,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct CancelRequest {
    pub request: RequestId,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct ReprioritizeRequest {
    pub request: RequestId,
    pub priority: Priority,
}

/// The requester was destroyed; all of its requests go with it
#[derive(Message, Debug, Clone, Copy)]
pub struct RequesterRemoved {
    pub requester: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Cancelled on behalf of the requester
    Withdrawn,
    /// The request's position left the player's territory
    TerritoryLost,
}

/// Notifies a requester that one of its requests no longer exists
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCancelled {
    pub requester: Entity,
    pub request: RequestId,
    pub reason: CancelReason,
}

/// The last promised unit arrived; the request is gone
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSatisfied {
    pub requester: Entity,
    pub request: RequestId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered(u32),
    /// The carrier gave up; one promised unit becomes available again
    Failed,
}

/// Sent by carriers and workers when a promised unit reached its requester
/// or will never reach it.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub request: RequestId,
    pub outcome: DeliveryOutcome,
}

/// Material became available for pickup, for example from a stock yard or a
/// bearer that dropped its load
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferMaterial {
    pub partition: PartitionId,
    pub position: TilePos,
    pub material: Material,
    pub amount: u32,
}

/// Offered material was used up or taken away by something else
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOffer {
    pub partition: PartitionId,
    pub position: TilePos,
    pub material: Material,
    pub amount: u32,
}
