//! Ballistic - a two-player tank arena with ricocheting bullets
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, rounds)
//! - `tuning`: Data-driven gameplay constants
//! - `settings`: Player preferences and key bindings
//! - `platform`: Browser input abstraction
//! - `renderer` / `audio`: Canvas 2D drawing and Web Audio effects (wasm only)

pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod renderer;

pub use error::GameError;
pub use settings::{KeyBindings, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    use std::f32::consts::PI;

    /// Arena dimensions in pixels
    pub const SCENE_WIDTH: f32 = 600.0;
    pub const SCENE_HEIGHT: f32 = 600.0;
    /// Height of the UI strip at the top, excluded from play
    pub const TOP_BAR_HEIGHT: f32 = 64.0;

    /// Wall grid spacing and thickness
    pub const WALL_SPACING: f32 = 60.0;
    pub const WALL_THICKNESS: f32 = 5.0;
    /// Walls per round: round(random * RANGE + MIN)
    pub const WALL_COUNT_MIN: u32 = 50;
    pub const WALL_COUNT_RANGE: u32 = 30;
    /// Give up on spawn placement after this many candidates per tank
    pub const MAX_SPAWN_ATTEMPTS: u32 = 1000;

    /// Tank defaults
    pub const TANK_RADIUS: f32 = 15.0;
    pub const TANK_WIDTH: f32 = 30.0;
    pub const TANK_HEIGHT: f32 = 30.0;
    /// Units per frame
    pub const TANK_SPEED: f32 = 2.0;
    /// Radians per frame
    pub const ROTATE_SPEED: f32 = PI / 72.0;
    /// Seconds between shots
    pub const FIRE_INTERVAL: f32 = 0.3;
    pub const SHOTS_PER_FIRE: u32 = 1;
    /// Tank bounding boxes are shrunk by this much when tested against walls
    pub const WALL_BUFFER: f32 = 3.0;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 2.45;
    pub const BULLET_SPEED: f32 = 400.0;
    pub const BULLET_LIFETIME: f32 = 8.0;
    /// Bullets spawn this far ahead of the tank centre
    pub const BULLET_MUZZLE_OFFSET: f32 = 8.0;
    /// A bullet cannot hit anything until it is this old
    pub const BULLET_HIT_GRACE: f32 = 0.05;
    /// Bullets fade from white to red over this many seconds
    pub const BULLET_FADE_WINDOW: f32 = 10.0;

    /// Explosion animation: 16 frames at 1/7 frame per 60 Hz tick
    pub const EXPLOSION_DURATION: f32 = 16.0 * 7.0 / 60.0;

    /// Seconds between a tank dying and the next round
    pub const ROUND_END_DELAY: f32 = 2.0;
    /// Largest step the simulation will take in one frame
    pub const MAX_FRAME_DT: f32 = 1.0 / 12.0;
}

/// Linear interpolation between `start` and `end`
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start * (1.0 - t) + t * end
}

/// Cosine interpolation, eases in and out of both ends
#[inline]
pub fn cosine_interpolate(y1: f32, y2: f32, t: f32) -> f32 {
    let t2 = (1.0 - (t * std::f32::consts::PI).cos()) / 2.0;
    y1 * (1.0 - t2) + y2 * t2
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f32::clamp` this never panics: when `min > max` the lower bound is
/// checked first, so anything below `min` returns `min` and anything else
/// above `max` returns `max`.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Displace `pos` by `distance` along `rotation` (negative moves backward)
#[inline]
pub fn move_along(pos: Vec2, rotation: f32, distance: f32) -> Vec2 {
    Vec2::new(
        pos.x + distance * rotation.cos(),
        pos.y + distance * rotation.sin(),
    )
}

/// Unit vector pointing along `rotation`
#[inline]
pub fn heading(rotation: f32) -> Vec2 {
    Vec2::new(rotation.cos(), rotation.sin())
}
