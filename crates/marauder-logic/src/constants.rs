//! Simulation constants: map dimensions, movement tuning, footstep timing.
//!
//! These are the compile-time defaults. [`crate::config::SimConfig`] starts
//! from them and lets a caller override any of them at load time.

/// Edge length of one grid cell, in world units.
pub const CELL_SIZE: f32 = 20.0;

/// Width of the built-in world, in world units.
pub const WORLD_WIDTH: f32 = 800.0;
/// Height of the built-in world, in world units.
pub const WORLD_HEIGHT: f32 = 600.0;

/// Distance a character covers in one tick.
pub const STEP_DISTANCE: f32 = 1.5;

/// Displacements at or below this are treated as "did not move".
pub const MOVE_EPSILON: f32 = 0.01;

/// Minimum real time between two footsteps of the same character.
pub const FOOTSTEP_SPACING_MS: f64 = 300.0;
/// Real time a footstep takes to fade out completely.
pub const FOOTSTEP_FADE_MS: f64 = 2000.0;
/// Left/right splay applied to the footprint rotation, in degrees.
pub const FOOTSTEP_SPLAY_DEG: f32 = 5.0;
/// Upper bound on live footsteps kept in a trail.
pub const MAX_FOOTSTEPS: usize = 512;

/// Simulated hours that pass per real second.
pub const TIME_SCALE: f32 = 0.05;
/// Hour of day the simulation starts at.
pub const START_HOUR: f32 = 8.0;

/// Radius around a room centre that wandering stays within.
pub const WANDER_RADIUS: f32 = 40.0;

/// Consecutive motionless ticks on a path before the path is dropped.
pub const STUCK_TICKS: u32 = 30;

/// Default capacity of the navigator's path cache.
pub const PATH_CACHE_CAPACITY: usize = 256;

/// A* cost of a cardinal step (1.0 scaled by 10).
pub const CARDINAL_COST: u32 = 10;
/// A* cost of a diagonal step (1.4 scaled by 10).
pub const DIAGONAL_COST: u32 = 14;

pub mod hours {
    pub const NIGHT_START: f32 = 22.0;
    pub const MORNING_START: f32 = 6.0;
    pub const NOON_START: f32 = 10.0;
    pub const AFTERNOON_START: f32 = 14.0;
    pub const EVENING_START: f32 = 18.0;
    pub const DAY_LENGTH: f32 = 24.0;
}

pub mod room_ids {
    pub const GRYFFINDOR_TOWER: &str = "gryffindor_tower";
    pub const GREAT_HALL: &str = "great_hall";
    pub const LIBRARY: &str = "library";
    pub const HEADMASTERS_OFFICE: &str = "headmasters_office";
    pub const COURTYARD: &str = "courtyard";
    pub const SLYTHERIN_DUNGEON: &str = "slytherin_dungeon";
    pub const POTIONS_CLASSROOM: &str = "potions_classroom";
    pub const HOSPITAL_WING: &str = "hospital_wing";
}
