//! Scheduler constants and default configuration values
//!
//! This module centralizes the magic numbers used by the logistics core.

// ============================================================================
// DISPATCH CONSTANTS
// ============================================================================

/// Upper bound on job assignments handed out in a single tick, shared by all
/// partitions in id order
pub const MAX_ASSIGNMENTS_PER_TICK: usize = 64;

/// Seed used for the simulation random stream when none is configured
pub const DEFAULT_RNG_SEED: u64 = 0x5e77_1e25;

// ============================================================================
// SITE WORK CONSTANTS
// ============================================================================

/// Duration (in action units) of one digging animation
pub const DIG_ACTION_DURATION: f32 = 1.0;

/// Duration (in action units) of a bearer dropping its load
pub const DROP_ACTION_DURATION: f32 = 0.5;

/// Radius (in hex rings) of the protected area around a small building
pub const SMALL_BUILDING_RADIUS: u32 = 1;

/// Radius (in hex rings) of the protected area around a large building
pub const LARGE_BUILDING_RADIUS: u32 = 2;

// ============================================================================
// PERSISTENCE
// ============================================================================

/// Default path used by the save plugin when a request does not name one
pub const DEFAULT_SAVE_PATH: &str = "saves/logistics.ron";
