//! Random arena generation
//!
//! Each round gets a fresh set of grid-snapped wall segments and two tank
//! spawn points that are not inside a wall and not on top of each other.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::Wall;
use crate::error::GameError;
use crate::tuning::Tuning;

/// Walls and spawn points for one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaLayout {
    pub walls: Vec<Wall>,
    /// Spawn for player one, then player two
    pub spawns: [Vec2; 2],
}

impl ArenaLayout {
    /// A layout with no walls
    pub fn open(spawn1: Vec2, spawn2: Vec2) -> Self {
        Self {
            walls: Vec::new(),
            spawns: [spawn1, spawn2],
        }
    }

    /// Rotation for each tank so it faces the other one
    pub fn facing_angles(&self) -> [f32; 2] {
        let [a, b] = self.spawns;
        let ab = b - a;
        let ba = a - b;
        [ab.y.atan2(ab.x), ba.y.atan2(ba.x)]
    }
}

/// Where round layouts come from
#[derive(Debug, Clone)]
pub enum LayoutSource {
    /// Fresh random arena every round
    Random(Pcg32),
    /// The same arena every round
    Fixed(ArenaLayout),
}

impl LayoutSource {
    pub fn seeded(seed: u64) -> Self {
        Self::Random(Pcg32::seed_from_u64(seed))
    }

    /// Produce the layout for the next round
    pub fn next_layout(&mut self, tuning: &Tuning) -> Result<ArenaLayout, GameError> {
        match self {
            Self::Random(rng) => generate_layout(rng, tuning),
            Self::Fixed(layout) => Ok(layout.clone()),
        }
    }
}

/// Generate walls and spawn points for one round
pub fn generate_layout<R: Rng + ?Sized>(
    rng: &mut R,
    tuning: &Tuning,
) -> Result<ArenaLayout, GameError> {
    let walls = generate_walls(rng, tuning);
    let spawns = find_spawns(rng, tuning, &walls)?;
    log::info!(
        "Generated arena: {} walls, spawns at ({}, {}) and ({}, {})",
        walls.len(),
        spawns[0].x,
        spawns[0].y,
        spawns[1].x,
        spawns[1].y
    );
    Ok(ArenaLayout { walls, spawns })
}

/// Scatter `round(random * range + min)` wall segments over the tile grid
pub fn generate_walls<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning) -> Vec<Wall> {
    let count = (rng.random::<f32>() * tuning.wall_count_range as f32
        + tuning.wall_count_min as f32)
        .round() as usize;

    let x_tiles = tuning.x_tiles().max(1);
    let y_tiles = tuning.y_tiles().max(1);
    let spacing = tuning.wall_spacing;

    (0..count)
        .map(|_| {
            // Coin flip first, then position, one tile in from the edge
            let horizontal = rng.random_bool(0.5);
            let top_left = Vec2::new(
                (rng.random_range(0..x_tiles) + 1) as f32 * spacing,
                (rng.random_range(0..y_tiles) + 1) as f32 * spacing,
            );
            if horizontal {
                Wall::horizontal(top_left, spacing, tuning.wall_thickness)
            } else {
                Wall::vertical(top_left, spacing, tuning.wall_thickness)
            }
        })
        .collect()
}

/// Pick a tile-centred spawn point below the top row
fn spawn_candidate<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning) -> Vec2 {
    let half = tuning.wall_spacing / 2.0;
    let col = rng.random_range(0..tuning.x_tiles().max(1));
    let row = rng.random_range(0..tuning.y_tiles().max(1)) + 1;
    Vec2::new(
        half + col as f32 * tuning.wall_spacing,
        half + row as f32 * tuning.wall_spacing,
    )
}

fn spawn_blocked(pos: Vec2, other: Vec2, walls: &[Wall]) -> bool {
    pos == other || walls.iter().any(|w| w.rect.contains_point_strict(pos))
}

/// Resample spawn points until both are clear, giving up after
/// `max_spawn_attempts` candidates per tank
pub fn find_spawns<R: Rng + ?Sized>(
    rng: &mut R,
    tuning: &Tuning,
    walls: &[Wall],
) -> Result<[Vec2; 2], GameError> {
    let mut spawns = [spawn_candidate(rng, tuning), spawn_candidate(rng, tuning)];

    for i in 0..2 {
        let other = spawns[1 - i];
        let mut attempts = 1;
        while spawn_blocked(spawns[i], other, walls) {
            if attempts >= tuning.max_spawn_attempts {
                log::error!("Spawn search for tank {} gave up after {attempts} attempts", i + 1);
                return Err(GameError::LayoutGeneration { attempts });
            }
            spawns[i] = spawn_candidate(rng, tuning);
            attempts += 1;
        }
    }

    Ok(spawns)
}
