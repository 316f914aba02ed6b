//! World-space geometry: positions, room rectangles, and layout validation.
//!
//! Validation functions take plain room data and return every problem found
//! rather than stopping at the first one.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::{Add, Mul, Sub};

/// 2D position in world units (pixels of the rendered map).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }
}

impl Add for WorldPos {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for WorldPos {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for WorldPos {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// A rectangular room on the map. Position is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> WorldPos {
        WorldPos::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Closed-rectangle containment: points on the edge count as inside.
    pub fn contains(&self, pos: WorldPos) -> bool {
        pos.x >= self.x && pos.x <= self.max_x() && pos.y >= self.y && pos.y <= self.max_y()
    }

    /// Clamp a point into the room shrunk by `margin` on every side.
    /// Falls back to the centre on an axis where the margin eats the room.
    pub fn clamp_inside(&self, pos: WorldPos, margin: f32) -> WorldPos {
        let center = self.center();
        let x = if self.width > 2.0 * margin {
            pos.x.clamp(self.x + margin, self.max_x() - margin)
        } else {
            center.x
        };
        let y = if self.height > 2.0 * margin {
            pos.y.clamp(self.y + margin, self.max_y() - margin)
        } else {
            center.y
        };
        WorldPos::new(x, y)
    }

    /// Uniform random point inside the room shrunk by `margin` on every side.
    pub fn random_point(&self, rng: &mut impl Rng, margin: f32) -> WorldPos {
        let center = self.center();
        let x = if self.width > 2.0 * margin {
            rng.gen_range(self.x + margin..self.max_x() - margin)
        } else {
            center.x
        };
        let y = if self.height > 2.0 * margin {
            rng.gen_range(self.y + margin..self.max_y() - margin)
        } else {
            center.y
        };
        WorldPos::new(x, y)
    }
}

/// Rooms indexed by id, keeping declaration order for iteration.
#[derive(Debug, Clone, Default)]
pub struct RoomIndex {
    rooms: Vec<Room>,
    by_id: HashMap<String, usize>,
}

impl RoomIndex {
    pub fn new(rooms: Vec<Room>) -> Self {
        let by_id = rooms
            .iter()
            .enumerate()
            .map(|(idx, room)| (room.id.clone(), idx))
            .collect();
        Self { rooms, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.by_id.get(id).map(|&idx| &self.rooms[idx])
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// First room (in declaration order) containing `pos`.
    pub fn room_at(&self, pos: WorldPos) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    pub fn as_slice(&self) -> &[Room] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// A layout validation problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Validation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

// ── Per-room checks ─────────────────────────────────────────────────────

/// Rooms must have positive width and height.
pub fn check_room_dimensions(rooms: &[Room]) -> Vec<ValidationError> {
    rooms
        .iter()
        .filter(|r| !(r.width > 0.0 && r.height > 0.0))
        .map(|r| ValidationError {
            category: "room_geometry",
            severity: Severity::Error,
            message: format!(
                "Room '{}' has non-positive dimensions: {}×{}",
                r.id, r.width, r.height
            ),
        })
        .collect()
}

/// Rooms poking outside the world are clamped by the grid builder, which is
/// legal but usually a typo in the layout.
pub fn check_rooms_within_world(
    rooms: &[Room],
    world_width: f32,
    world_height: f32,
) -> Vec<ValidationError> {
    rooms
        .iter()
        .filter(|r| r.x < 0.0 || r.y < 0.0 || r.max_x() > world_width || r.max_y() > world_height)
        .map(|r| ValidationError {
            category: "room_geometry",
            severity: Severity::Warning,
            message: format!(
                "Room '{}' extends outside world: ({:.1},{:.1})→({:.1},{:.1}) vs {}×{}",
                r.id,
                r.x,
                r.y,
                r.max_x(),
                r.max_y(),
                world_width,
                world_height
            ),
        })
        .collect()
}

/// Room ids must be unique; schedules look rooms up by id.
pub fn check_duplicate_room_ids(rooms: &[Room]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();
    for r in rooms {
        if !seen.insert(r.id.as_str()) {
            errors.push(ValidationError {
                category: "room_identity",
                severity: Severity::Error,
                message: format!("Room id '{}' is declared more than once", r.id),
            });
        }
    }
    errors
}

// ── Pairwise checks ─────────────────────────────────────────────────────

/// Overlapping rooms share wall cells, which can seal doors. Touching edges
/// are allowed.
pub fn check_room_overlaps(rooms: &[Room]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            let a = &rooms[i];
            let b = &rooms[j];
            let overlap_x = a.max_x() > b.x && b.max_x() > a.x;
            let overlap_y = a.max_y() > b.y && b.max_y() > a.y;
            if overlap_x && overlap_y {
                errors.push(ValidationError {
                    category: "room_overlap",
                    severity: Severity::Warning,
                    message: format!("Rooms '{}' and '{}' overlap", a.id, b.id),
                });
            }
        }
    }
    errors
}

/// Run every layout check.
pub fn validate_layout(rooms: &[Room], world_width: f32, world_height: f32) -> Vec<ValidationError> {
    let mut errors = check_room_dimensions(rooms);
    errors.extend(check_rooms_within_world(rooms, world_width, world_height));
    errors.extend(check_duplicate_room_ids(rooms));
    errors.extend(check_room_overlaps(rooms));
    errors
}
