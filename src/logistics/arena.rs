use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use slotmap::{Key, SlotMap, new_key_type};
use std::fmt;

use super::request::RequestRecord;

new_key_type! {
    /// Opaque, stable identifier for a request record.
    ///
    /// The slot version guards against a stale id addressing a slot that has
    /// since been reused by another request.
    #[derive(Reflect)]
    #[reflect(opaque, Clone, Debug, Hash, PartialEq, Serialize, Deserialize)]
    pub struct RequestId;
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:?}", self.data())
    }
}

/// Owner of every live request record, across all partitions.
///
/// Queues only hold [`RequestId`]s, so moving a record between partitions
/// never moves the record itself. The serialized form keeps every slot
/// version, so ids resolve to the same records after a reload.
#[derive(Debug, Clone, Default, Reflect, Serialize, Deserialize)]
#[reflect(opaque, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestArena {
    records: SlotMap<RequestId, RequestRecord>,
}

impl RequestArena {
    pub fn insert(&mut self, record: RequestRecord) -> RequestId {
        self.records.insert(record)
    }

    pub fn get(&self, id: RequestId) -> Option<&RequestRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: RequestId) -> Option<&mut RequestRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.records.contains_key(id)
    }

    /// Destroys a record; its id never resolves again
    pub fn remove(&mut self, id: RequestId) -> Option<RequestRecord> {
        self.records.remove(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Live records in slot order
    pub fn iter(&self) -> impl Iterator<Item = (RequestId, &RequestRecord)> {
        self.records.iter()
    }
}

/// Two arenas are equal when the same ids resolve to equal records
impl PartialEq for RequestArena {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(id, record)| other.get(id) == Some(record))
    }
}
