//! Game state and core simulation types
//!
//! Entities are plain data. The renderer reads them every frame and never
//! writes back; everything that changes them lives in `tick` and `round`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::{ArenaLayout, LayoutSource};
use super::collision::{Circle, Rect, rotated_bounds};
use crate::tuning::Tuning;
use crate::{heading, move_along};

/// One of the two local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::One => "Player 1",
            Player::Two => "Player 2",
        }
    }
}

/// Current phase of the round loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Title screen, nothing spawned yet
    NotStarted,
    /// Tanks are on the field
    Playing,
    /// Tearing down the finished round before the next one starts
    Ending,
}

/// Sound effects the front end is asked to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// A tank fired
    Shoot,
    /// A tank was destroyed or a bullet burnt out
    Fireball,
    /// Start button
    ButtonPush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionKind {
    TankDestroyed,
    BulletExpired,
}

/// Things that happened during a step, drained by the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundEffect),
    ExplosionSpawned { position: Vec2, kind: ExplosionKind },
    BulletFired { id: u32, owner: Player },
    Scored { player: Player, score: u32 },
    RoundStarted { round: u32 },
    RoundEnded { round: u32, survivor: Option<Player> },
}

/// A player's tank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub player: Player,
    pub position: Vec2,
    /// Facing angle in radians (0 = +x, screen y grows downward)
    pub rotation: f32,
    pub alive: bool,
    pub radius: f32,
    /// Sprite size, used for clamping and wall bounds
    pub width: f32,
    pub height: f32,
    /// Seconds since this tank last fired
    pub fire_timer: f32,
}

impl Tank {
    /// Spawn a tank ready to fire
    pub fn new(player: Player, position: Vec2, rotation: f32, tuning: &Tuning) -> Self {
        Self {
            player,
            position,
            rotation,
            alive: true,
            radius: tuning.tank_radius,
            width: tuning.tank_width,
            height: tuning.tank_height,
            fire_timer: tuning.fire_interval,
        }
    }

    /// Drive along the current facing (negative reverses)
    pub fn advance(&mut self, distance: f32) {
        self.position = move_along(self.position, self.rotation, distance);
    }

    /// Turn to face `target`
    pub fn face(&mut self, target: Vec2) {
        let d = target - self.position;
        self.rotation = d.y.atan2(d.x);
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.position, self.radius)
    }

    /// Axis-aligned bounds of the rotated sprite
    pub fn bounds(&self) -> Rect {
        rotated_bounds(self.position, self.width, self.height, self.rotation)
    }

    pub fn can_fire(&self, fire_interval: f32) -> bool {
        self.alive && self.fire_timer >= fire_interval
    }
}

/// A ricocheting projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub owner: Player,
    pub position: Vec2,
    /// Unit direction; only ever changed by `reflect_x` / `reflect_y`
    pub forward: Vec2,
    /// Units per second
    pub speed: f32,
    pub radius: f32,
    /// Seconds since fired
    pub timer: f32,
    pub alive: bool,
    /// Green/blue channel of the display colour, fades 255 -> 0
    pub shade: u8,
}

impl Bullet {
    /// The drawn square is 5x5, offset so it sits slightly above centre
    const BOX_SIZE: f32 = 5.0;
    const BOX_OFFSET: Vec2 = Vec2::new(-2.0, -3.0);

    /// Fire a bullet from `origin` along `rotation`, starting just ahead of the muzzle
    pub fn fire(id: u32, owner: Player, origin: Vec2, rotation: f32, tuning: &Tuning) -> Self {
        let forward = heading(rotation);
        Self {
            id,
            owner,
            position: origin + forward * tuning.bullet_muzzle_offset,
            forward,
            speed: tuning.bullet_speed,
            radius: tuning.bullet_radius,
            timer: 0.0,
            alive: true,
            shade: u8::MAX,
        }
    }

    pub fn reflect_x(&mut self) {
        self.forward.x = -self.forward.x;
    }

    pub fn reflect_y(&mut self) {
        self.forward.y = -self.forward.y;
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.position, self.radius)
    }

    /// The drawn square, used for wall contact
    pub fn bounds(&self) -> Rect {
        let min = self.position + Self::BOX_OFFSET;
        Rect::new(min.x, min.y, Self::BOX_SIZE, Self::BOX_SIZE)
    }

    /// Recompute the fade channel from the bullet's age
    pub fn update_shade(&mut self, fade_window: f32) {
        let value = crate::lerp(255.0, 0.0, self.timer / fade_window);
        self.shade = crate::clamp(value.round(), 0.0, 255.0) as u8;
    }

    /// Display colour as 0xRRGGBB: full red, fading green and blue
    pub fn color(&self) -> u32 {
        let g = self.shade as u32;
        0xFF_0000 | (g << 8) | g
    }
}

/// Wall orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallKind {
    Vertical,
    Horizontal,
}

/// An immovable wall segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub kind: WallKind,
    pub rect: Rect,
}

impl Wall {
    /// Thin wall running down from `top_left`, one tile long plus its thickness
    pub fn vertical(top_left: Vec2, spacing: f32, thickness: f32) -> Self {
        Self {
            kind: WallKind::Vertical,
            rect: Rect::new(top_left.x, top_left.y, thickness, spacing + thickness),
        }
    }

    /// Thin wall running right from `top_left`
    pub fn horizontal(top_left: Vec2, spacing: f32, thickness: f32) -> Self {
        Self {
            kind: WallKind::Horizontal,
            rect: Rect::new(top_left.x, top_left.y, spacing + thickness, thickness),
        }
    }
}

/// A running explosion animation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub position: Vec2,
    pub kind: ExplosionKind,
    pub age: f32,
    pub duration: f32,
}

impl Explosion {
    pub fn new(position: Vec2, kind: ExplosionKind, duration: f32) -> Self {
        Self {
            position,
            kind,
            age: 0.0,
            duration,
        }
    }

    /// Animation progress in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.age / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn finished(&self) -> bool {
        self.age >= self.duration
    }
}

/// Complete game state: the current round plus match-long scores
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub phase: RoundPhase,
    /// Short-circuits the whole step while set
    pub paused: bool,
    /// Indexed by `Player::index`; never decreases during a match
    pub scores: [u32; 2],
    /// Rounds started so far
    pub round: u32,
    /// Tanks of the current round (empty between rounds)
    pub tanks: Vec<Tank>,
    pub bullets: Vec<Bullet>,
    pub walls: Vec<Wall>,
    pub explosions: Vec<Explosion>,
    /// Seconds since a tank died this round
    pub end_delay: f32,
    /// Where each round's walls and spawns come from
    pub layout: LayoutSource,
    /// Events since the last `drain_events`
    pub events: Vec<GameEvent>,
    next_bullet_id: u32,
}

impl GameState {
    /// New game with randomly generated arenas
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self::with_layout_source(tuning, LayoutSource::seeded(seed))
    }

    /// New game that replays the same arena every round
    pub fn with_layout(tuning: Tuning, layout: ArenaLayout) -> Self {
        Self::with_layout_source(tuning, LayoutSource::Fixed(layout))
    }

    pub fn with_layout_source(tuning: Tuning, layout: LayoutSource) -> Self {
        Self {
            tuning,
            phase: RoundPhase::NotStarted,
            paused: true,
            scores: [0; 2],
            round: 0,
            tanks: Vec::new(),
            bullets: Vec::new(),
            walls: Vec::new(),
            explosions: Vec::new(),
            end_delay: 0.0,
            layout,
            events: Vec::new(),
            next_bullet_id: 1,
        }
    }

    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.index()]
    }

    pub fn tank(&self, player: Player) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.player == player)
    }

    pub fn tank_mut(&mut self, player: Player) -> Option<&mut Tank> {
        self.tanks.iter_mut().find(|t| t.player == player)
    }

    /// True once any tank of the current round has been destroyed
    pub fn any_tank_dead(&self) -> bool {
        self.tanks.iter().any(|t| !t.alive)
    }

    /// Allocate a new bullet ID
    pub fn next_bullet_id(&mut self) -> u32 {
        let id = self.next_bullet_id;
        self.next_bullet_id = self.next_bullet_id.wrapping_add(1);
        id
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.opponent(), Player::One);
        assert_eq!(Player::Two.index(), 1);
    }

    #[test]
    fn test_bullet_spawns_ahead_of_muzzle() {
        let tuning = Tuning::default();
        let b = Bullet::fire(1, Player::One, Vec2::new(100.0, 100.0), FRAC_PI_2, &tuning);
        assert!((b.position - Vec2::new(100.0, 108.0)).length() < 1e-4);
        assert!((b.forward.length() - 1.0).abs() < 1e-6);
        assert_eq!(b.color(), 0xFFFFFF);
    }

    #[test]
    fn test_bullet_fades_toward_red() {
        let tuning = Tuning::default();
        let mut b = Bullet::fire(1, Player::One, Vec2::ZERO, 0.0, &tuning);

        b.timer = 5.0;
        b.update_shade(tuning.bullet_fade_window);
        assert_eq!(b.shade, 128);
        assert_eq!(b.color(), 0xFF8080);

        b.timer = 8.0;
        b.update_shade(tuning.bullet_fade_window);
        assert_eq!(b.shade, 51);

        b.timer = 12.0;
        b.update_shade(tuning.bullet_fade_window);
        assert_eq!(b.shade, 0);
        assert_eq!(b.color(), 0xFF0000);
    }

    #[test]
    fn test_bullet_bounds_match_drawn_square() {
        let tuning = Tuning::default();
        let mut b = Bullet::fire(1, Player::One, Vec2::ZERO, 0.0, &tuning);
        b.position = Vec2::new(50.0, 50.0);
        let r = b.bounds();
        assert_eq!(r, Rect::new(48.0, 47.0, 5.0, 5.0));
    }

    #[test]
    fn test_tank_face_and_advance() {
        let tuning = Tuning::default();
        let mut tank = Tank::new(Player::One, Vec2::new(0.0, 0.0), 0.0, &tuning);
        tank.face(Vec2::new(0.0, 10.0));
        assert!((tank.rotation - FRAC_PI_2).abs() < 1e-6);

        tank.advance(-2.0);
        assert!((tank.position - Vec2::new(0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn test_wall_shapes() {
        let v = Wall::vertical(Vec2::new(60.0, 120.0), 60.0, 5.0);
        assert_eq!(v.rect, Rect::new(60.0, 120.0, 5.0, 65.0));
        let h = Wall::horizontal(Vec2::new(60.0, 120.0), 60.0, 5.0);
        assert_eq!(h.rect, Rect::new(60.0, 120.0, 65.0, 5.0));
    }

    #[test]
    fn test_explosion_progress() {
        let mut e = Explosion::new(Vec2::ZERO, ExplosionKind::TankDestroyed, 2.0);
        assert_eq!(e.progress(), 0.0);
        e.age = 1.0;
        assert!((e.progress() - 0.5).abs() < 1e-6);
        assert!(!e.finished());
        e.age = 2.0;
        assert!(e.finished());
    }

    #[test]
    fn test_drain_events_empties_queue() {
        let mut state = GameState::new(Tuning::default(), 1);
        state.push_event(GameEvent::Sound(SoundEffect::Shoot));
        assert_eq!(state.drain_events().len(), 1);
        assert!(state.events.is_empty());
    }

    proptest! {
        #[test]
        fn reflection_preserves_unit_forward(
            angle in -10f32..10.0,
            flips in proptest::collection::vec(any::<bool>(), 0..64),
        ) {
            let tuning = Tuning::default();
            let mut b = Bullet::fire(1, Player::One, Vec2::ZERO, angle, &tuning);
            for flip_x in flips {
                if flip_x { b.reflect_x() } else { b.reflect_y() }
                prop_assert!((b.forward.length() - 1.0).abs() < 1e-5);
            }
        }
    }
}
