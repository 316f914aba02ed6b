//! Pure simulation logic for the Marauder map.
//!
//! This crate contains all navigation and behaviour logic that is independent
//! of any ECS, renderer, or frame loop. Functions take plain data and return
//! results, making them unit-testable and reusable by the engine crate, the
//! headless harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`clock`] | Simulated time-of-day accumulator driven by real elapsed time |
//! | [`config`] | Tunable simulation parameters, JSON loading and validation |
//! | [`constants`] | Default cell size, step distance, footstep timing, costs |
//! | [`footsteps`] | Footstep records, fade/opacity, the pruned trail |
//! | [`geometry`] | World positions, room rectangles, layout validation |
//! | [`grid`] | Walkability grid built from rooms, door cells |
//! | [`layout`] | Built-in castle map and default cast |
//! | [`movement`] | Per-character tick: walk, wander, sleep, footstep emission |
//! | [`pathfinding`] | 8-connected A* over the grid, cached navigator |
//! | [`schedule`] | Time-blocks, archetypes, schedule tables and resolution |

pub mod clock;
pub mod config;
pub mod constants;
pub mod footsteps;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod movement;
pub mod pathfinding;
pub mod schedule;
