use bevy::prelude::Entity;
use thiserror::Error;

use super::arena::RequestId;
use super::partitions::PartitionId;

/// Caller errors surfaced by the scheduler.
///
/// "Nothing available" is never an error; it is reported as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LogisticsError {
    #[error("partition {0:?} does not exist")]
    UnknownPartition(PartitionId),
    #[error("a request must ask for at least one unit")]
    EmptyRequest,
    #[error("request {0} does not exist")]
    UnknownRequest(RequestId),
    #[error("request {0} is already queued")]
    AlreadyQueued(RequestId),
    #[error("request {0} is not queued in partition {1:?}")]
    NotQueuedHere(RequestId, PartitionId),
    #[error("request {request} has {in_delivery} in delivery, cannot settle {requested}")]
    NotInDelivery {
        request: RequestId,
        in_delivery: u32,
        requested: u32,
    },
    #[error("partition {0:?} cannot be merged with itself")]
    SelfMerge(PartitionId),
    #[error("partitions {0:?} and {1:?} belong to different players")]
    PlayerMismatch(PartitionId, PartitionId),
    #[error("unit {0:?} is already registered as jobless")]
    AlreadyJobless(Entity),
    #[error("snapshot layout is inconsistent")]
    CorruptSnapshot,
}
