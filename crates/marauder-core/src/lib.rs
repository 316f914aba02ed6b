//! Marauder Core - Map Simulation Engine
//!
//! Runs the characters of the Marauder map through their day. Navigation and
//! behaviour live in `marauder_logic`; this crate owns the mutable state and
//! drives it forward one tick at a time.
//!
//! # Architecture
//!
//! Characters are `hecs` entities carrying a [`Character`] component:
//! - **Engine**: owns the world, the simulated clock, the path cache and the
//!   footstep trail
//! - **Systems**: read every character from pre-tick state, then commit all
//!   updates as one batch
//! - **Frames**: renderer-facing snapshots of one instant
//!
//! # Example
//!
//! ```rust,no_run
//! use marauder_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default(), MapLayout::castle())?;
//! engine.spawn_cast(&default_cast());
//!
//! loop {
//!     engine.tick(16.0); // ~60 FPS
//!     let _frame = engine.frame();
//! }
//! # Ok::<(), marauder_core::engine::EngineError>(())
//! ```
//!
//! [`Character`]: marauder_logic::movement::Character

pub mod engine;
pub mod frame;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::engine::{EngineError, SimulationEngine, TickSummary};
    pub use crate::frame::{CharacterView, Frame};
    pub use marauder_logic::config::SimConfig;
    pub use marauder_logic::layout::{default_cast, CastMember, MapLayout};
    pub use marauder_logic::movement::Character;
    pub use marauder_logic::schedule::{Archetype, MovementMode};
}
