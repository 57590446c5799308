//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the
//! browser: the front end feeds it a frame delta plus held controls and
//! reads back entities and drained events.
//! - Randomness comes only from the seeded layout source
//! - Entities are stored in spawn order and updated in that order

pub mod arena;
pub mod collision;
pub mod round;
pub mod state;
pub mod tick;

pub use arena::{ArenaLayout, LayoutSource, generate_layout};
pub use collision::{Circle, Rect, circle_collision, rects_intersect};
pub use state::{
    Bullet, Explosion, ExplosionKind, GameEvent, GameState, Player, RoundPhase, SoundEffect, Tank,
    Wall, WallKind,
};
pub use tick::{Action, TickInput, effective_dt, tick};
