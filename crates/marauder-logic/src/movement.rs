//! Per-character movement tick.
//!
//! Each tick a character looks up its schedule entry for the current hour,
//! then moves at most one step toward wherever that entry sends it:
//!
//! - **Walk**: follow an A* path to a random point inside the room, then stop.
//! - **Wander**: walk to the room, then roam near its centre.
//! - **Sleep**: walk to the room, then settle at its centre.
//!
//! Movement never fails. A missing room or a failed path search leaves the
//! character where it is, and the next tick tries again.
//!
//! [`advance_character`] is a pure step: it reads the old character and
//! returns a new one, so callers can compute every character's update from
//! the same pre-tick state and commit them together.

use log::{debug, trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{Tuning, WanderPolicy};
use crate::constants::MOVE_EPSILON;
use crate::footsteps::{footstep_rotation, Footstep};
use crate::geometry::{Room, RoomIndex, WorldPos};
use crate::grid::Grid;
use crate::pathfinding::Navigator;
use crate::schedule::{resolve, Archetype, MovementMode};

/// A character on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    pub archetype: Archetype,
    pub position: WorldPos,
    /// Where the character is currently heading.
    pub target: WorldPos,
    pub mode: MovementMode,
    /// Room id of the active schedule entry.
    pub target_room: Option<String>,
    pub path: Vec<WorldPos>,
    /// Next waypoint to reach. The path is exhausted once this reaches
    /// `path.len()`.
    pub path_index: usize,
    pub wander_target: Option<WorldPos>,
    /// Cadence anchor of the last footstep. Lags the footstep's own
    /// timestamp by the part of a tick that overshot the spacing.
    pub last_footstep_ms: Option<f64>,
    pub last_foot_left: bool,
    /// Consecutive ticks spent on a path without moving.
    pub stuck_ticks: u32,
}

impl Character {
    pub fn new(id: u32, name: impl Into<String>, archetype: Archetype, position: WorldPos) -> Self {
        Self {
            id,
            name: name.into(),
            archetype,
            position,
            target: position,
            mode: MovementMode::Walk,
            target_room: None,
            path: Vec::new(),
            path_index: 0,
            wander_target: None,
            last_footstep_ms: None,
            last_foot_left: false,
            stuck_ticks: 0,
        }
    }

    pub fn has_path(&self) -> bool {
        self.path_index < self.path.len()
    }

    /// Waypoints not yet reached.
    pub fn remaining_path(&self) -> &[WorldPos] {
        self.path.get(self.path_index..).unwrap_or(&[])
    }

    /// The room the character is standing in, if any.
    pub fn current_room<'a>(&self, rooms: &'a RoomIndex) -> Option<&'a Room> {
        rooms.room_at(self.position)
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
    }
}

/// Read-only inputs shared by every character in a tick.
#[derive(Debug, Clone, Copy)]
pub struct TickEnv<'a> {
    pub rooms: &'a RoomIndex,
    /// Simulated hour in [0, 24).
    pub time_of_day: f32,
    /// Real milliseconds since start; footstep timestamps use this.
    pub now_ms: f64,
    pub tuning: Tuning,
}

/// Result of one character tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub character: Character,
    pub footstep: Option<Footstep>,
}

impl Advance {
    pub fn moved(&self, before: &Character) -> bool {
        self.character.position.distance(&before.position) > MOVE_EPSILON
    }
}

/// Move from `from` toward `to` by exactly `step`, or land on `to` when it
/// is within `step`. Never overshoots.
pub fn step_toward(from: WorldPos, to: WorldPos, step: f32) -> WorldPos {
    let distance = from.distance(&to);
    if distance <= step {
        return to;
    }
    from + (to - from) * (step / distance)
}

/// Advance one character by one tick.
pub fn advance_character(
    character: &Character,
    env: &TickEnv<'_>,
    nav: &mut Navigator,
    rng: &mut impl Rng,
) -> Advance {
    let before = character.position;
    let mut next = character.clone();

    let entry = resolve(character.archetype, env.time_of_day);
    next.mode = entry.mode;

    let room_changed = next.target_room.as_deref() != Some(entry.room);
    if room_changed {
        debug!(
            "{} ({}) now heading to {} [{:?}]",
            next.name, next.id, entry.room, entry.mode
        );
        next.target_room = Some(entry.room.to_string());
        next.clear_path();
        next.wander_target = None;
        next.stuck_ticks = 0;
    }

    match env.rooms.get(entry.room) {
        Some(room) => match entry.mode {
            MovementMode::Walk => walk(&mut next, room, env, nav, rng),
            MovementMode::Wander => wander(&mut next, room, env, nav, rng),
            MovementMode::Sleep => sleep(&mut next, room, env, nav, rng),
        },
        None => {
            if room_changed {
                warn!(
                    "{} ({}) is scheduled into unknown room '{}', holding position",
                    next.name, next.id, entry.room
                );
            }
        }
    }

    let moved = next.position.distance(&before) > MOVE_EPSILON;
    update_stuck(&mut next, moved, env.tuning.stuck_ticks);
    let footstep = if moved {
        emit_footstep(&mut next, before, env)
    } else {
        None
    };

    Advance {
        character: next,
        footstep,
    }
}

fn walk(c: &mut Character, room: &Room, env: &TickEnv<'_>, nav: &mut Navigator, rng: &mut impl Rng) {
    if !c.has_path() {
        if room.contains(c.position) {
            c.clear_path();
            return;
        }
        let goal = room.random_point(rng, env.tuning.cell_size);
        if !request_path(c, goal, nav) {
            return;
        }
    }
    follow_path(c, room, env, nav);
}

fn follow_path(c: &mut Character, room: &Room, env: &TickEnv<'_>, nav: &mut Navigator) {
    let Some(&waypoint) = c.path.get(c.path_index) else {
        return;
    };
    c.position = step_toward(c.position, waypoint, env.tuning.step_distance);
    if c.position.distance(&waypoint) > MOVE_EPSILON {
        return;
    }

    c.path_index += 1;
    if c.has_path() {
        return;
    }
    c.clear_path();
    if !room.contains(c.position) {
        // The path ended on the wrong side of a wall cell; aim for the middle.
        request_path(c, room.center(), nav);
    }
}

/// Still walking in (or outside entirely): finish the walk first, so the
/// straight-line moves below start from an interior cell and never clip a
/// wall beside the door.
fn should_walk_in(c: &Character, room: &Room) -> bool {
    c.has_path() || !room.contains(c.position)
}

fn wander(c: &mut Character, room: &Room, env: &TickEnv<'_>, nav: &mut Navigator, rng: &mut impl Rng) {
    if should_walk_in(c, room) {
        walk(c, room, env, nav, rng);
        return;
    }
    c.clear_path();

    let tuning = &env.tuning;
    let target = match (tuning.wander_policy, c.wander_target) {
        (WanderPolicy::Persistent, Some(t)) => t,
        _ => wander_point(room, tuning.wander_radius, tuning.cell_size, rng),
    };
    c.target = target;
    c.position = step_toward(c.position, target, tuning.step_distance);
    c.wander_target = if c.position.distance(&target) <= MOVE_EPSILON {
        None
    } else {
        Some(target)
    };
}

fn sleep(c: &mut Character, room: &Room, env: &TickEnv<'_>, nav: &mut Navigator, rng: &mut impl Rng) {
    if should_walk_in(c, room) {
        walk(c, room, env, nav, rng);
        return;
    }
    c.clear_path();
    c.wander_target = None;
    let center = room.center();
    c.target = center;
    c.position = step_toward(c.position, center, env.tuning.step_distance);
}

/// Uniform point in a disc around the room centre, kept one cell clear of
/// the walls.
fn wander_point(room: &Room, radius: f32, margin: f32, rng: &mut impl Rng) -> WorldPos {
    let center = room.center();
    if radius <= 0.0 {
        return center;
    }
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = radius * rng.gen::<f32>().sqrt();
    let point = center + WorldPos::new(angle.cos(), angle.sin()) * r;
    room.clamp_inside(point, margin)
}

/// Replace the character's path with a fresh route to `goal`. On failure the
/// path is left empty and the character holds.
fn request_path(c: &mut Character, goal: WorldPos, nav: &mut Navigator) -> bool {
    let start = walkable_anchor(nav.grid(), c.position);
    let end = walkable_anchor(nav.grid(), goal);
    match nav.route(start, end) {
        Ok(path) => {
            trace!("{} ({}) routed {} waypoints", c.name, c.id, path.len());
            c.path = path;
            c.path_index = 0;
            c.target = goal;
            true
        }
        Err(e) => {
            debug!("{} ({}) cannot route to ({:.1}, {:.1}): {e}", c.name, c.id, goal.x, goal.y);
            c.clear_path();
            false
        }
    }
}

/// `pos` itself when its cell is walkable, otherwise the centre of the
/// nearest walkable cell. Characters pushed into a wall can still leave.
fn walkable_anchor(grid: &Grid, pos: WorldPos) -> WorldPos {
    let cell = grid.cell_of(pos);
    if grid.is_walkable(cell) {
        return pos;
    }
    match grid.nearest_walkable(cell) {
        Some(open) => grid.cell_center(open),
        None => pos,
    }
}

fn update_stuck(c: &mut Character, moved: bool, limit: u32) {
    if moved || !c.has_path() {
        c.stuck_ticks = 0;
        return;
    }
    c.stuck_ticks += 1;
    if limit > 0 && c.stuck_ticks >= limit {
        debug!(
            "{} ({}) stuck for {} ticks, dropping path",
            c.name, c.id, c.stuck_ticks
        );
        c.clear_path();
        c.stuck_ticks = 0;
    }
}

fn emit_footstep(c: &mut Character, before: WorldPos, env: &TickEnv<'_>) -> Option<Footstep> {
    let spacing = env.tuning.footstep_spacing_ms;
    let anchor = match c.last_footstep_ms {
        Some(last) if env.now_ms - last <= spacing => return None,
        // Carry the overshoot forward so long walks keep the cadence.
        // After a pause the cadence restarts from now.
        Some(last) if env.now_ms - (last + spacing) < spacing => last + spacing,
        _ => env.now_ms,
    };
    let left = !c.last_foot_left;
    let delta = c.position - before;
    c.last_foot_left = left;
    c.last_footstep_ms = Some(anchor);
    trace!("footstep {} ({}) left={left}", c.name, c.id);
    Some(Footstep {
        character_id: c.id,
        position: before,
        left,
        rotation_deg: footstep_rotation(delta.x, delta.y, left),
        created_ms: env.now_ms,
    })
}
