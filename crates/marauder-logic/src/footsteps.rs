//! Footprints left behind by moving characters, and the trail that fades
//! them out.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::{FOOTSTEP_FADE_MS, FOOTSTEP_SPLAY_DEG, MAX_FOOTSTEPS};
use crate::geometry::WorldPos;

/// A single footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footstep {
    pub character_id: u32,
    pub position: WorldPos,
    pub left: bool,
    /// Sprite rotation in degrees; 0 points the toes up the screen.
    pub rotation_deg: f32,
    pub created_ms: f64,
}

impl Footstep {
    /// 1.0 when fresh, falling linearly to 0.0 at `fade_ms`.
    pub fn opacity(&self, now_ms: f64, fade_ms: f64) -> f32 {
        if fade_ms <= 0.0 {
            return 0.0;
        }
        let age = (now_ms - self.created_ms).max(0.0);
        (1.0 - age / fade_ms).clamp(0.0, 1.0) as f32
    }

    pub fn is_expired(&self, now_ms: f64, fade_ms: f64) -> bool {
        now_ms - self.created_ms > fade_ms
    }
}

/// Footprint rotation for a step along `(dx, dy)`.
///
/// The heading angle is turned by 90° so the sprite faces the direction of
/// travel, then splayed outward: left prints −5°, right prints +5°.
pub fn footstep_rotation(dx: f32, dy: f32, left: bool) -> f32 {
    let heading = dy.atan2(dx).to_degrees() + 90.0;
    if left {
        heading - FOOTSTEP_SPLAY_DEG
    } else {
        heading + FOOTSTEP_SPLAY_DEG
    }
}

/// Renderer-facing view of a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibleFootstep {
    pub x: f32,
    pub y: f32,
    pub left: bool,
    pub rotation_deg: f32,
    pub opacity: f32,
}

/// Live footprints, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootstepTrail {
    steps: VecDeque<Footstep>,
    fade_ms: f64,
    capacity: usize,
}

impl FootstepTrail {
    pub fn new(fade_ms: f64, capacity: usize) -> Self {
        Self {
            steps: VecDeque::new(),
            fade_ms,
            capacity,
        }
    }

    /// Append a footprint, dropping the oldest ones beyond capacity.
    pub fn push(&mut self, step: Footstep) {
        self.steps.push_back(step);
        while self.steps.len() > self.capacity {
            self.steps.pop_front();
        }
    }

    /// Drop every footprint older than the fade duration. Returns how many
    /// were removed.
    pub fn prune(&mut self, now_ms: f64) -> usize {
        let before = self.steps.len();
        let fade_ms = self.fade_ms;
        self.steps.retain(|s| !s.is_expired(now_ms, fade_ms));
        before - self.steps.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Footstep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn fade_ms(&self) -> f64 {
        self.fade_ms
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn visible(&self, now_ms: f64) -> Vec<VisibleFootstep> {
        self.steps
            .iter()
            .map(|s| VisibleFootstep {
                x: s.position.x,
                y: s.position.y,
                left: s.left,
                rotation_deg: s.rotation_deg,
                opacity: s.opacity(now_ms, self.fade_ms),
            })
            .collect()
    }
}

impl Default for FootstepTrail {
    fn default() -> Self {
        Self::new(FOOTSTEP_FADE_MS, MAX_FOOTSTEPS)
    }
}
