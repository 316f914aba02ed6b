//! Simulated clock, advanced by real elapsed time.

use serde::{Deserialize, Serialize};

use crate::constants::hours::DAY_LENGTH;
use crate::schedule::TimeBlock;

/// Real elapsed milliseconds plus the simulated hour of day they map to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Real milliseconds since the simulation started. Doubles as the
    /// timestamp source for footstep timing.
    pub elapsed_ms: f64,
    /// Simulated hour in [0, 24).
    pub time_of_day: f32,
    /// Simulated hours per real second.
    pub time_scale: f32,
    /// Completed simulated days.
    pub day: u32,
}

impl SimClock {
    pub fn new(start_hour: f32, time_scale: f32) -> Self {
        Self {
            elapsed_ms: 0.0,
            time_of_day: start_hour.rem_euclid(DAY_LENGTH),
            time_scale: time_scale.max(0.0),
            day: 0,
        }
    }

    /// Advance by `delta_ms` of real time. Negative and non-finite deltas
    /// are ignored, as is any delta too large to keep the hour finite.
    pub fn advance(&mut self, delta_ms: f64) {
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            return;
        }
        let hours = self.time_of_day + (delta_ms / 1000.0) as f32 * self.time_scale;
        if !hours.is_finite() {
            return;
        }
        self.elapsed_ms += delta_ms;
        self.day = self.day.saturating_add((hours / DAY_LENGTH).floor() as u32);
        self.time_of_day = hours.rem_euclid(DAY_LENGTH);
    }

    pub fn set_time_of_day(&mut self, hour: f32) {
        self.time_of_day = hour.rem_euclid(DAY_LENGTH);
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn block(&self) -> TimeBlock {
        TimeBlock::from_hour(self.time_of_day)
    }

    pub fn day(&self) -> u32 {
        self.day
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(
            crate::constants::START_HOUR,
            crate::constants::TIME_SCALE,
        )
    }
}
