//! Data-driven gameplay constants
//!
//! Every number the simulation reads lives here so that arena size, speeds
//! and timings can be swapped without touching the step code. Defaults come
//! from [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;

/// Gameplay configuration supplied when a game is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub scene_width: f32,
    pub scene_height: f32,
    /// Reserved UI strip, excluded from tank and bullet movement
    pub top_bar_height: f32,
    pub wall_spacing: f32,
    pub wall_thickness: f32,
    pub wall_count_min: u32,
    pub wall_count_range: u32,
    pub max_spawn_attempts: u32,

    // === Tanks ===
    pub tank_radius: f32,
    pub tank_width: f32,
    pub tank_height: f32,
    /// Units per frame (not scaled by dt)
    pub tank_speed: f32,
    /// Radians per frame (not scaled by dt)
    pub rotate_speed: f32,
    pub fire_interval: f32,
    pub shots_per_fire: u32,
    pub wall_buffer: f32,

    // === Bullets ===
    pub bullet_radius: f32,
    /// Units per second
    pub bullet_speed: f32,
    pub bullet_lifetime: f32,
    pub bullet_muzzle_offset: f32,
    pub bullet_hit_grace: f32,
    pub bullet_fade_window: f32,

    // === Timing ===
    pub explosion_duration: f32,
    pub round_end_delay: f32,
    pub max_frame_dt: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            scene_width: SCENE_WIDTH,
            scene_height: SCENE_HEIGHT,
            top_bar_height: TOP_BAR_HEIGHT,
            wall_spacing: WALL_SPACING,
            wall_thickness: WALL_THICKNESS,
            wall_count_min: WALL_COUNT_MIN,
            wall_count_range: WALL_COUNT_RANGE,
            max_spawn_attempts: MAX_SPAWN_ATTEMPTS,

            tank_radius: TANK_RADIUS,
            tank_width: TANK_WIDTH,
            tank_height: TANK_HEIGHT,
            tank_speed: TANK_SPEED,
            rotate_speed: ROTATE_SPEED,
            fire_interval: FIRE_INTERVAL,
            shots_per_fire: SHOTS_PER_FIRE,
            wall_buffer: WALL_BUFFER,

            bullet_radius: BULLET_RADIUS,
            bullet_speed: BULLET_SPEED,
            bullet_lifetime: BULLET_LIFETIME,
            bullet_muzzle_offset: BULLET_MUZZLE_OFFSET,
            bullet_hit_grace: BULLET_HIT_GRACE,
            bullet_fade_window: BULLET_FADE_WINDOW,

            explosion_duration: EXPLOSION_DURATION,
            round_end_delay: ROUND_END_DELAY,
            max_frame_dt: MAX_FRAME_DT,
        }
    }
}

impl Tuning {
    /// Tuning for a custom arena size, everything else default
    pub fn with_scene(width: f32, height: f32) -> Self {
        Self {
            scene_width: width,
            scene_height: height,
            ..Self::default()
        }
    }

    /// Parse tuning from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of whole wall tiles across the arena
    pub fn x_tiles(&self) -> u32 {
        (self.scene_width / self.wall_spacing).floor().max(0.0) as u32
    }

    /// Number of whole wall tiles below the top bar
    pub fn y_tiles(&self) -> u32 {
        ((self.scene_height - self.top_bar_height) / self.wall_spacing)
            .floor()
            .max(0.0) as u32
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), GameError> {
        fn positive(field: &'static str, value: f32) -> Result<(), GameError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(GameError::InvalidTuning {
                    field,
                    reason: "must be a positive number",
                })
            }
        }

        positive("scene_width", self.scene_width)?;
        positive("scene_height", self.scene_height)?;
        positive("wall_spacing", self.wall_spacing)?;
        positive("wall_thickness", self.wall_thickness)?;
        positive("tank_radius", self.tank_radius)?;
        positive("tank_width", self.tank_width)?;
        positive("tank_height", self.tank_height)?;
        positive("bullet_radius", self.bullet_radius)?;
        positive("bullet_speed", self.bullet_speed)?;
        positive("bullet_lifetime", self.bullet_lifetime)?;
        positive("bullet_fade_window", self.bullet_fade_window)?;
        positive("max_frame_dt", self.max_frame_dt)?;

        if !(self.top_bar_height >= 0.0 && self.top_bar_height < self.scene_height) {
            return Err(GameError::InvalidTuning {
                field: "top_bar_height",
                reason: "must fit inside the scene",
            });
        }
        if self.x_tiles() == 0 || self.y_tiles() == 0 {
            return Err(GameError::InvalidTuning {
                field: "wall_spacing",
                reason: "arena must be at least one tile wide and tall",
            });
        }
        if self.max_spawn_attempts == 0 {
            return Err(GameError::InvalidTuning {
                field: "max_spawn_attempts",
                reason: "must allow at least one attempt",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.x_tiles(), 10);
        assert_eq!(tuning.y_tiles(), 8);
    }

    #[test]
    fn test_from_json_partial() {
        let tuning = Tuning::from_json(r#"{ "bullet_speed": 250.0 }"#).unwrap();
        assert_eq!(tuning.bullet_speed, 250.0);
        assert_eq!(tuning.tank_radius, TANK_RADIUS);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = Tuning::from_json(r#"{ "wall_spacing": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidTuning {
                field: "wall_spacing",
                ..
            }
        ));

        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, GameError::Parse(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let tuning = Tuning::with_scene(800.0, 480.0);
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }
}
