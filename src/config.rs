//! Simulation settings
//!
//! Loaded from JSON; every field falls back to its default, so a config file
//! only needs the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{AppearanceOptions, GravityState, PhysicsParams, Polarity, TileKind};

/// Tunable simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Physics ===
    /// Gravity acceleration (pixels/tick²)
    pub gravity: f32,
    /// Clamp on vertical speed (pixels/tick)
    pub max_fall_speed: f32,
    pub jump_speed: f32,
    pub spring_speed: f32,
    /// Primary body walk speed (pixels/tick)
    pub walk_speed: i32,

    // === Gravity line ===
    /// Rows the beam moves per button press
    pub button_beam_delta: f32,
    pub initial_beam_row: f32,
    pub initial_polarity: Polarity,

    // === Appearance ===
    /// Columns past the first/last room read as transparent
    pub open_level_edges: bool,
    /// Solid kind used for the faded fill behind transparent cells
    pub background: TileKind,
    pub background_alpha: f32,

    // === Followers ===
    /// Horizontal gap followers keep from the primary body (pixels)
    pub follower_distance: i32,
    /// Follower walk speed (pixels/tick)
    pub follower_speed: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,
            jump_speed: JUMP_SPEED,
            spring_speed: SPRING_SPEED,
            walk_speed: WALK_SPEED,

            button_beam_delta: BUTTON_BEAM_DELTA,
            initial_beam_row: SCREEN_TILE_SIZE.1 as f32 / 2.0,
            initial_polarity: Polarity::Positive,

            open_level_edges: false,
            background: TileKind::Brick,
            background_alpha: BACKGROUND_ALPHA,

            follower_distance: 20,
            follower_speed: 1,
        }
    }
}

impl SimConfig {
    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Check ranges the collision resolver depends on.
    ///
    /// A single tick may move a body less than half its size on either axis;
    /// past that its centre tile can land inside the blocking row or column
    /// and the 3-cell scan misses it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let half_body = BODY_SIZE / 2;
        let invalid = |name, reason: String| Err(ConfigError::InvalidValue { name, reason });

        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return invalid("gravity", format!("{} must be positive", self.gravity));
        }
        if !(self.max_fall_speed.is_finite() && self.max_fall_speed > 0.0)
            || self.max_fall_speed.ceil() as i32 >= half_body
        {
            return invalid(
                "max_fall_speed",
                format!("{} must be in (0, {})", self.max_fall_speed, half_body - 1),
            );
        }
        for (name, speed) in [
            ("jump_speed", self.jump_speed),
            ("spring_speed", self.spring_speed),
        ] {
            if !(speed.is_finite() && speed >= 0.0) {
                return invalid(name, format!("{speed} must be non-negative"));
            }
        }
        for (name, speed) in [
            ("walk_speed", self.walk_speed),
            ("follower_speed", self.follower_speed),
        ] {
            if !(0..half_body).contains(&speed) {
                return invalid(name, format!("{speed} must be in [0, {half_body})"));
            }
        }
        if self.follower_distance < 0 {
            return invalid(
                "follower_distance",
                format!("{} must be non-negative", self.follower_distance),
            );
        }
        if !self.button_beam_delta.is_finite() || !self.initial_beam_row.is_finite() {
            return invalid("initial_beam_row", "beam values must be finite".into());
        }
        if !(0.0..=1.0).contains(&self.background_alpha) {
            return invalid(
                "background_alpha",
                format!("{} must be in [0, 1]", self.background_alpha),
            );
        }
        self.appearance().validate()
    }

    pub fn physics(&self) -> PhysicsParams {
        PhysicsParams {
            gravity: self.gravity,
            max_vertical_speed: self.max_fall_speed,
        }
    }

    pub fn appearance(&self) -> AppearanceOptions {
        AppearanceOptions {
            background: self.background,
            background_alpha: self.background_alpha,
            open_level_edges: self.open_level_edges,
        }
    }

    pub fn initial_gravity(&self) -> GravityState {
        GravityState::new(self.initial_polarity, self.initial_beam_row)
    }
}
