//! Tunable simulation parameters.
//!
//! `SimConfig` starts from the defaults in [`crate::constants`]. Any field
//! may be omitted from a JSON document; missing fields keep their default.
//! Validation collects every problem instead of stopping at the first one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// How a wandering character picks its next point inside the room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WanderPolicy {
    /// Keep walking toward one point until it is reached, then pick another.
    #[default]
    Persistent,
    /// Pick a fresh point every tick. Produces a restless shuffle.
    Jitter,
}

/// Runtime configuration for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world_width: f32,
    pub world_height: f32,
    pub cell_size: f32,
    /// World units moved per tick.
    pub step_distance: f32,
    pub footstep_spacing_ms: f64,
    pub footstep_fade_ms: f64,
    pub max_footsteps: usize,
    /// Simulated hours per real second.
    pub time_scale: f32,
    pub start_hour: f32,
    pub wander_radius: f32,
    pub wander_policy: WanderPolicy,
    /// Motionless ticks on a path before the path is dropped. 0 disables.
    pub stuck_ticks: u32,
    pub path_cache_capacity: usize,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            cell_size: CELL_SIZE,
            step_distance: STEP_DISTANCE,
            footstep_spacing_ms: FOOTSTEP_SPACING_MS,
            footstep_fade_ms: FOOTSTEP_FADE_MS,
            max_footsteps: MAX_FOOTSTEPS,
            time_scale: TIME_SCALE,
            start_hour: START_HOUR,
            wander_radius: WANDER_RADIUS,
            wander_policy: WanderPolicy::default(),
            stuck_ticks: STUCK_TICKS,
            path_cache_capacity: PATH_CACHE_CAPACITY,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Movement parameters handed to the per-character tick.
    pub fn tuning(&self) -> Tuning {
        Tuning {
            cell_size: self.cell_size,
            step_distance: self.step_distance,
            footstep_spacing_ms: self.footstep_spacing_ms,
            wander_radius: self.wander_radius,
            wander_policy: self.wander_policy,
            stuck_ticks: self.stuck_ticks,
        }
    }
}

/// The subset of [`SimConfig`] the movement controller reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub cell_size: f32,
    pub step_distance: f32,
    pub footstep_spacing_ms: f64,
    pub wander_radius: f32,
    pub wander_policy: WanderPolicy,
    pub stuck_ticks: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        SimConfig::default().tuning()
    }
}

/// A configuration value outside its accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("world size must be positive, got {0}×{1}")]
    WorldSize(f32, f32),
    #[error("cell size must be positive, got {0}")]
    CellSize(f32),
    #[error("cell size {cell} is larger than the world ({width}×{height})")]
    CellLargerThanWorld { cell: f32, width: f32, height: f32 },
    #[error("step distance must be positive, got {0}")]
    StepDistance(f32),
    #[error("step distance {step} must not exceed cell size {cell}")]
    StepExceedsCell { step: f32, cell: f32 },
    #[error("footstep spacing must be positive, got {0} ms")]
    FootstepSpacing(f64),
    #[error("footstep fade must be positive, got {0} ms")]
    FootstepFade(f64),
    #[error("max footsteps must be at least 1")]
    MaxFootsteps,
    #[error("time scale must be finite and non-negative, got {0}")]
    TimeScale(f32),
    #[error("start hour must be in [0, 24), got {0}")]
    StartHour(f32),
    #[error("wander radius must be non-negative, got {0}")]
    WanderRadius(f32),
}

/// False for zero, negatives and NaN.
fn positive<T: PartialOrd + Default>(value: T) -> bool {
    value > T::default()
}

/// Check every field. An empty list means the config is usable.
pub fn validate_config(config: &SimConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !(positive(config.world_width) && positive(config.world_height)) {
        errors.push(ConfigError::WorldSize(config.world_width, config.world_height));
    }
    if !positive(config.cell_size) {
        errors.push(ConfigError::CellSize(config.cell_size));
    } else if config.cell_size > config.world_width || config.cell_size > config.world_height {
        errors.push(ConfigError::CellLargerThanWorld {
            cell: config.cell_size,
            width: config.world_width,
            height: config.world_height,
        });
    }
    if !positive(config.step_distance) {
        errors.push(ConfigError::StepDistance(config.step_distance));
    } else if config.cell_size > 0.0 && config.step_distance > config.cell_size {
        errors.push(ConfigError::StepExceedsCell {
            step: config.step_distance,
            cell: config.cell_size,
        });
    }
    if !positive(config.footstep_spacing_ms) {
        errors.push(ConfigError::FootstepSpacing(config.footstep_spacing_ms));
    }
    if !positive(config.footstep_fade_ms) {
        errors.push(ConfigError::FootstepFade(config.footstep_fade_ms));
    }
    if config.max_footsteps == 0 {
        errors.push(ConfigError::MaxFootsteps);
    }
    if !(config.time_scale.is_finite() && config.time_scale >= 0.0) {
        errors.push(ConfigError::TimeScale(config.time_scale));
    }
    if !(0.0..hours::DAY_LENGTH).contains(&config.start_hour) {
        errors.push(ConfigError::StartHour(config.start_hour));
    }
    if config.wander_radius.is_nan() || config.wander_radius < 0.0 {
        errors.push(ConfigError::WanderRadius(config.wander_radius));
    }

    errors
}

/// Failure to turn a JSON document into a usable [`SimConfig`].
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config has {} invalid field(s): {}", .0.len(), join_errors(.0))]
    Invalid(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse and validate a JSON config.
pub fn load_config(json: &str) -> Result<SimConfig, LoadConfigError> {
    let config: SimConfig = serde_json::from_str(json)?;
    let errors = validate_config(&config);
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(LoadConfigError::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(validate_config(&SimConfig::default()).is_empty());
    }

    #[test]
    fn defaults_mirror_constants() {
        let config = SimConfig::default();
        assert_eq!(config.cell_size, CELL_SIZE);
        assert_eq!(config.step_distance, STEP_DISTANCE);
        assert_eq!(config.footstep_spacing_ms, FOOTSTEP_SPACING_MS);
        assert_eq!(config.wander_policy, WanderPolicy::Persistent);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn empty_json_gives_defaults() {
        let config = load_config("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = load_config(r#"{"cell_size": 10.0, "wander_policy": "jitter", "seed": 7}"#).unwrap();
        assert_eq!(config.cell_size, 10.0);
        assert_eq!(config.wander_policy, WanderPolicy::Jitter);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.world_width, WORLD_WIDTH);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(load_config("{cell_size"), Err(LoadConfigError::Parse(_))));
    }

    #[test]
    fn collects_all_errors() {
        let config = SimConfig {
            cell_size: 0.0,
            step_distance: -1.0,
            max_footsteps: 0,
            start_hour: 24.0,
            ..SimConfig::default()
        };
        let errors = validate_config(&config);
        assert!(errors.contains(&ConfigError::CellSize(0.0)));
        assert!(errors.contains(&ConfigError::StepDistance(-1.0)));
        assert!(errors.contains(&ConfigError::MaxFootsteps));
        assert!(errors.contains(&ConfigError::StartHour(24.0)));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn step_larger_than_cell() {
        let config = SimConfig {
            step_distance: 25.0,
            ..SimConfig::default()
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::StepExceedsCell { step: 25.0, cell: 20.0 }]
        );
    }

    #[test]
    fn nan_values_rejected() {
        let config = SimConfig {
            time_scale: f32::NAN,
            wander_radius: f32::NAN,
            ..SimConfig::default()
        };
        assert_eq!(validate_config(&config).len(), 2);
    }

    #[test]
    fn invalid_json_reports_every_field() {
        match load_config(r#"{"footstep_fade_ms": 0.0, "time_scale": -1.0}"#) {
            Err(LoadConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn tuning_copies_movement_fields() {
        let config = SimConfig {
            step_distance: 2.0,
            wander_policy: WanderPolicy::Jitter,
            ..SimConfig::default()
        };
        let tuning = config.tuning();
        assert_eq!(tuning.step_distance, 2.0);
        assert_eq!(tuning.wander_policy, WanderPolicy::Jitter);
        assert_eq!(tuning.cell_size, config.cell_size);
    }
}
