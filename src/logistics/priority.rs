use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Player-assignable urgency of a request.
///
/// Tiers are compared only through [`Priority::ordinal`]. `Stop` parks a
/// request: it keeps its place in the queue but is never served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum Priority {
    Stop,
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub const COUNT: usize = 4;

    /// All tiers, lowest urgency first
    pub const ALL: [Priority; Priority::COUNT] =
        [Priority::Stop, Priority::Low, Priority::Normal, Priority::High];

    pub const fn ordinal(self) -> usize {
        match self {
            Priority::Stop => 0,
            Priority::Low => 1,
            Priority::Normal => 2,
            Priority::High => 3,
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    /// Whether requests in this tier may be handed out at all
    pub fn is_served(self) -> bool {
        self != Priority::Stop
    }

    /// Servable tiers, most urgent first
    pub fn serving_order() -> impl Iterator<Item = Priority> {
        Self::ALL.into_iter().rev().filter(|tier| tier.is_served())
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
