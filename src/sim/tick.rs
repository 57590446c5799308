//! Per-frame simulation step
//!
//! Core game loop that advances one round by one rendered frame. The order
//! of the phases matters: wall correction reverts to the position the tank
//! had before input was applied, and bullets are aged before they move.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{circle_collision, rects_intersect};
use super::state::{
    Bullet, Explosion, ExplosionKind, GameEvent, GameState, Player, RoundPhase, SoundEffect, Wall,
};
use crate::clamp;
use crate::error::GameError;
use crate::tuning::Tuning;

/// Logical controls, independent of the physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Forward,
    Backward,
    RotateLeft,
    RotateRight,
    Fire,
}

/// Input snapshot for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Controls currently held down
    pub pressed: BTreeSet<(Player, Action)>,
    /// Pause toggle (one-shot)
    pub toggle_pause: bool,
}

impl TickInput {
    /// Input with a single control held
    pub fn holding(player: Player, action: Action) -> Self {
        let mut input = Self::default();
        input.press(player, action);
        input
    }

    pub fn press(&mut self, player: Player, action: Action) {
        self.pressed.insert((player, action));
    }

    pub fn release(&mut self, player: Player, action: Action) {
        self.pressed.remove(&(player, action));
    }

    pub fn is_pressed(&self, player: Player, action: Action) -> bool {
        self.pressed.contains(&(player, action))
    }
}

/// Frame delta actually simulated: never negative, never above `max_dt`
pub fn effective_dt(frame_dt: f32, max_dt: f32) -> f32 {
    if frame_dt.is_nan() {
        return 0.0;
    }
    frame_dt.clamp(0.0, max_dt)
}

/// Advance the game by one rendered frame.
///
/// Errors only when a round ends and the next arena cannot be generated.
pub fn tick(state: &mut GameState, input: &TickInput, frame_dt: f32) -> Result<(), GameError> {
    if input.toggle_pause {
        state.toggle_pause();
    }

    // Don't tick if paused or between rounds
    if state.paused || state.phase != RoundPhase::Playing {
        return Ok(());
    }

    let dt = effective_dt(frame_dt, state.tuning.max_frame_dt);
    let previous: Vec<Vec2> = state.tanks.iter().map(|t| t.position).collect();

    apply_input(state, input);
    clamp_tanks(state);
    age_bullets(state, dt);
    move_bullets(state, dt);
    resolve_tank_walls(state, &previous);

    // Clean up dead bullets and finished explosions
    state.bullets.retain(|b| b.alive);
    for explosion in &mut state.explosions {
        explosion.age += dt;
    }
    state.explosions.retain(|e| !e.finished());

    if state.any_tank_dead() {
        state.end_delay += dt;
        if state.end_delay > state.tuning.round_end_delay {
            return state.end_round();
        }
    }

    for tank in &mut state.tanks {
        tank.fire_timer += dt;
    }

    Ok(())
}

/// Map held controls to movement, rotation and firing
fn apply_input(state: &mut GameState, input: &TickInput) {
    let tuning = &state.tuning;
    let mut shots = Vec::new();

    for tank in state.tanks.iter_mut().filter(|t| t.alive) {
        let p = tank.player;
        if input.is_pressed(p, Action::Forward) {
            tank.advance(tuning.tank_speed);
        }
        if input.is_pressed(p, Action::Backward) {
            tank.advance(-tuning.tank_speed);
        }
        if input.is_pressed(p, Action::RotateLeft) {
            tank.rotation -= tuning.rotate_speed;
        }
        if input.is_pressed(p, Action::RotateRight) {
            tank.rotation += tuning.rotate_speed;
        }
        if input.is_pressed(p, Action::Fire) && tank.can_fire(tuning.fire_interval) {
            shots.push((p, tank.position, tank.rotation));
            tank.fire_timer = 0.0;
        }
    }

    for (owner, origin, rotation) in shots {
        fire(state, owner, origin, rotation);
    }
}

fn fire(state: &mut GameState, owner: Player, origin: Vec2, rotation: f32) {
    for _ in 0..state.tuning.shots_per_fire {
        let id = state.next_bullet_id();
        let bullet = Bullet::fire(id, owner, origin, rotation, &state.tuning);
        state.bullets.push(bullet);
        state.push_event(GameEvent::BulletFired { id, owner });
    }
    state.push_event(GameEvent::Sound(SoundEffect::Shoot));
}

/// Keep every tank inside the field, below the top bar
fn clamp_tanks(state: &mut GameState) {
    let t = &state.tuning;
    for tank in &mut state.tanks {
        let hw = tank.width / 2.0;
        let hh = tank.height / 2.0;
        tank.position.x = clamp(tank.position.x, hw, t.scene_width - hw);
        tank.position.y = clamp(tank.position.y, hh + t.top_bar_height, t.scene_height - hh);
    }
}

/// Age bullets, expire old ones and update their fade colour
fn age_bullets(state: &mut GameState, dt: f32) {
    let lifetime = state.tuning.bullet_lifetime;
    let fade_window = state.tuning.bullet_fade_window;
    let mut expired = Vec::new();

    for bullet in state.bullets.iter_mut().filter(|b| b.alive) {
        bullet.timer += dt;
        if bullet.timer > lifetime {
            bullet.alive = false;
            expired.push(bullet.position);
        }
        bullet.update_shade(fade_window);
    }

    for position in expired {
        log::debug!("Bullet expired at ({:.1}, {:.1})", position.x, position.y);
        state.push_event(GameEvent::Sound(SoundEffect::Fireball));
        spawn_explosion(state, position, ExplosionKind::BulletExpired);
    }
}

/// Move every live bullet, then check it against the live tanks
fn move_bullets(state: &mut GameState, dt: f32) {
    let grace = state.tuning.bullet_hit_grace;
    let mut kills = Vec::new();

    for bullet in state.bullets.iter_mut().filter(|b| b.alive) {
        move_bullet(bullet, &state.walls, &state.tuning, dt);

        if bullet.timer < grace {
            continue;
        }
        for tank in state.tanks.iter_mut().filter(|t| t.alive) {
            if circle_collision(tank.circle(), bullet.circle()) {
                tank.alive = false;
                bullet.alive = false;
                kills.push((tank.player, tank.position, bullet.owner));
                break;
            }
        }
    }

    for (victim, position, shooter) in kills {
        log::debug!(
            "{} destroyed by {}'s bullet",
            victim.name(),
            shooter.name()
        );
        state.push_event(GameEvent::Sound(SoundEffect::Fireball));
        spawn_explosion(state, position, ExplosionKind::TankDestroyed);
        state.award_point(victim.opponent());
    }
}

/// Integrate one bullet, reflecting off the arena bounds and walls.
///
/// Axes are handled separately: move along X and fix up X contacts, then
/// the same for Y. Any contact on an axis flips it once and re-applies its
/// step, however many walls the bullet touches.
pub fn move_bullet(bullet: &mut Bullet, walls: &[Wall], tuning: &Tuning, dt: f32) {
    let step = bullet.speed * dt;

    bullet.position.x += bullet.forward.x * step;
    let out_x = bullet.position.x <= bullet.radius
        || bullet.position.x >= tuning.scene_width - bullet.radius;
    if out_x || touches_wall(bullet, walls) {
        bullet.reflect_x();
        bullet.position.x += bullet.forward.x * step;
    }

    bullet.position.y += bullet.forward.y * step;
    let out_y = bullet.position.y <= bullet.radius + tuning.top_bar_height
        || bullet.position.y >= tuning.scene_height - bullet.radius;
    if out_y || touches_wall(bullet, walls) {
        bullet.reflect_y();
        bullet.position.y += bullet.forward.y * step;
    }
}

fn touches_wall(bullet: &Bullet, walls: &[Wall]) -> bool {
    let bounds = bullet.bounds();
    walls
        .iter()
        .any(|wall| rects_intersect(&bounds, &wall.rect, 0.0))
}

/// Push tanks off walls, or undo their move if that does not free them.
///
/// Walls are visited in order and a revert applies immediately, so with
/// several overlapping walls the result depends on wall order.
fn resolve_tank_walls(state: &mut GameState, previous: &[Vec2]) {
    let buffer = state.tuning.wall_buffer;
    let nudge = state.tuning.tank_speed * 2.0;

    for wall in &state.walls {
        for (tank, prev) in state.tanks.iter_mut().zip(previous) {
            if !tank.alive {
                continue;
            }
            if rects_intersect(&wall.rect, &tank.bounds(), buffer) {
                tank.advance(nudge);
                if rects_intersect(&wall.rect, &tank.bounds(), buffer) {
                    tank.position = *prev;
                }
            }
        }
    }
}

fn spawn_explosion(state: &mut GameState, position: Vec2, kind: ExplosionKind) {
    let duration = state.tuning.explosion_duration;
    state.explosions.push(Explosion::new(position, kind, duration));
    state.push_event(GameEvent::ExplosionSpawned { position, kind });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::ArenaLayout;
    use proptest::prelude::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn started(layout: ArenaLayout) -> GameState {
        let mut state = GameState::with_layout(Tuning::default(), layout);
        state.start_game().unwrap();
        state.drain_events();
        state
    }

    /// Tanks 300 apart on an open field, facing each other along +x / -x
    fn duel() -> GameState {
        started(ArenaLayout::open(Vec2::new(150.0, 300.0), Vec2::new(450.0, 300.0)))
    }

    /// A bullet that sits still on top of `target`
    fn parked_bullet(state: &mut GameState, owner: Player, target: Player, timer: f32) {
        let pos = state.tank(target).unwrap().position;
        let id = state.next_bullet_id();
        let mut bullet = Bullet::fire(id, owner, pos, 0.0, &state.tuning);
        bullet.position = pos;
        bullet.speed = 0.0;
        bullet.timer = timer;
        state.bullets.push(bullet);
    }

    #[test]
    fn test_tick_before_start_is_noop() {
        let mut state = GameState::with_layout(
            Tuning::default(),
            ArenaLayout::open(Vec2::new(90.0, 90.0), Vec2::new(210.0, 90.0)),
        );
        tick(&mut state, &TickInput::holding(Player::One, Action::Fire), FRAME).unwrap();
        assert!(state.bullets.is_empty());
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_large_frames_are_capped() {
        let mut state = duel();
        tick(&mut state, &TickInput::holding(Player::One, Action::Fire), FRAME).unwrap();
        let x0 = state.bullets[0].position.x;

        tick(&mut state, &TickInput::default(), 1.0).unwrap();
        let moved = state.bullets[0].position.x - x0;
        assert!((moved - 400.0 / 12.0).abs() < 1e-3, "moved {moved}");
        assert!((state.bullets[0].timer - (FRAME + 1.0 / 12.0)).abs() < 1e-5);
    }

    #[test]
    fn test_movement_and_rotation_input() {
        let mut state = duel();
        let mut input = TickInput::holding(Player::One, Action::Forward);
        input.press(Player::Two, Action::RotateRight);
        tick(&mut state, &input, FRAME).unwrap();

        let t1 = state.tank(Player::One).unwrap();
        assert!((t1.position - Vec2::new(152.0, 300.0)).length() < 1e-4);
        let t2 = state.tank(Player::Two).unwrap();
        let expected = std::f32::consts::PI + std::f32::consts::PI / 72.0;
        assert!((t2.rotation - expected).abs() < 1e-5);

        tick(&mut state, &TickInput::holding(Player::One, Action::Backward), FRAME).unwrap();
        let t1 = state.tank(Player::One).unwrap();
        assert!((t1.position - Vec2::new(150.0, 300.0)).length() < 1e-4);
    }

    #[test]
    fn test_dead_tank_ignores_input() {
        let mut state = duel();
        state.tank_mut(Player::One).unwrap().alive = false;
        let mut input = TickInput::holding(Player::One, Action::Forward);
        input.press(Player::One, Action::Fire);
        tick(&mut state, &input, FRAME).unwrap();

        assert_eq!(state.tank(Player::One).unwrap().position, Vec2::new(150.0, 300.0));
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_tanks_clamped_below_top_bar() {
        let mut state = duel();
        state.tank_mut(Player::One).unwrap().position = Vec2::new(5.0, 20.0);
        state.tank_mut(Player::Two).unwrap().position = Vec2::new(900.0, 900.0);
        tick(&mut state, &TickInput::default(), FRAME).unwrap();

        assert_eq!(state.tank(Player::One).unwrap().position, Vec2::new(15.0, 79.0));
        assert_eq!(state.tank(Player::Two).unwrap().position, Vec2::new(585.0, 585.0));
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut state = duel();
        let input = TickInput::holding(Player::One, Action::Fire);
        for _ in 0..30 {
            tick(&mut state, &input, FRAME).unwrap();
        }
        // one shot at t=0 and one after 0.3s
        assert_eq!(state.bullets.len(), 2);
        assert!(state.bullets.iter().all(|b| b.owner == Player::One));

        let events = state.drain_events();
        let shots = events
            .iter()
            .filter(|e| **e == GameEvent::Sound(SoundEffect::Shoot))
            .count();
        assert_eq!(shots, 2);
    }

    #[test]
    fn test_shot_across_open_field_kills_opponent() {
        let mut state = duel();
        tick(&mut state, &TickInput::holding(Player::One, Action::Fire), FRAME).unwrap();
        assert_eq!(state.bullets.len(), 1);

        // distance 300 minus radii 17.45, minus 8 muzzle offset, at 400/s
        let mut frames = 1;
        while state.tank(Player::Two).unwrap().alive && frames < 120 {
            tick(&mut state, &TickInput::default(), FRAME).unwrap();
            frames += 1;
        }

        let travelled = state.tank(Player::Two).unwrap().position.x - 150.0 - 8.0 - 17.45;
        let expected_frames = (travelled / (400.0 * FRAME)).ceil() as i32;
        assert!((frames - expected_frames).abs() <= 1, "frames {frames}");

        assert!(state.tank(Player::One).unwrap().alive);
        assert!(!state.tank(Player::Two).unwrap().alive);
        assert_eq!(state.score(Player::One), 1);
        assert_eq!(state.score(Player::Two), 0);
        assert!(state.bullets.is_empty());
        assert_eq!(state.explosions.len(), 1);
        assert_eq!(state.explosions[0].kind, ExplosionKind::TankDestroyed);
    }

    #[test]
    fn test_hit_grace_period() {
        let mut state = duel();
        parked_bullet(&mut state, Player::One, Player::Two, 0.0);

        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), 0.01).unwrap();
        }
        assert!(state.tank(Player::Two).unwrap().alive);
        assert!(state.bullets[0].timer < 0.05);

        for _ in 0..3 {
            tick(&mut state, &TickInput::default(), 0.01).unwrap();
        }
        assert!(!state.tank(Player::Two).unwrap().alive);
    }

    #[test]
    fn test_killing_tank_one_scores_once_for_player_two() {
        let mut state = duel();
        parked_bullet(&mut state, Player::Two, Player::One, 1.0);
        parked_bullet(&mut state, Player::Two, Player::One, 1.0);

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), FRAME).unwrap();
        }
        assert!(!state.tank(Player::One).unwrap().alive);
        assert_eq!(state.score(Player::Two), 1);
        assert_eq!(state.score(Player::One), 0);

        let scored: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Scored { .. }))
            .collect();
        assert_eq!(
            scored,
            vec![GameEvent::Scored {
                player: Player::Two,
                score: 1
            }]
        );
        // the second bullet never found a live target
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_bullet_reflects_off_right_edge() {
        let tuning = Tuning::default();
        let mut bullet = Bullet::fire(1, Player::One, Vec2::ZERO, 0.0, &tuning);
        bullet.position = Vec2::new(300.0, 300.0);

        let limit = tuning.scene_width - bullet.radius;
        let step = bullet.speed * FRAME;
        let mut flipped = false;
        for _ in 0..60 {
            let before = bullet.position.x;
            move_bullet(&mut bullet, &[], &tuning, FRAME);
            if bullet.forward.x < 0.0 {
                assert!(before + step >= limit);
                assert!(before < limit);
                assert!((bullet.position.x - before).abs() < 1e-3);
                flipped = true;
                break;
            }
            assert!(bullet.position.x < limit);
        }
        assert!(flipped);

        let x = bullet.position.x;
        move_bullet(&mut bullet, &[], &tuning, FRAME);
        assert!(bullet.position.x < x);
        assert!((bullet.forward.x + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bullet_reflects_off_top_bar() {
        let tuning = Tuning::default();
        let mut bullet = Bullet::fire(1, Player::One, Vec2::ZERO, -std::f32::consts::FRAC_PI_2, &tuning);
        bullet.position = Vec2::new(300.0, 70.0);

        move_bullet(&mut bullet, &[], &tuning, FRAME);
        assert!(bullet.forward.y > 0.0);
        assert!(bullet.position.y >= 64.0);
    }

    #[test]
    fn test_bullet_reflects_off_wall() {
        let tuning = Tuning::default();
        let wall = Wall::vertical(Vec2::new(300.0, 240.0), 60.0, 5.0);
        let mut bullet = Bullet::fire(1, Player::One, Vec2::ZERO, 0.0, &tuning);
        bullet.position = Vec2::new(292.0, 270.0);

        move_bullet(&mut bullet, std::slice::from_ref(&wall), &tuning, FRAME);
        assert!(bullet.forward.x < 0.0);
        // step back to where it started
        assert!((bullet.position.x - 292.0).abs() < 1e-3);
        assert_eq!(bullet.forward.y, 0.0);
    }

    #[test]
    fn test_stacked_walls_reflect_once() {
        let tuning = Tuning::default();
        let wall = Wall::vertical(Vec2::new(300.0, 240.0), 60.0, 5.0);
        let mut bullet = Bullet::fire(1, Player::One, Vec2::ZERO, 0.0, &tuning);
        bullet.position = Vec2::new(299.0, 270.0);

        move_bullet(&mut bullet, &[wall.clone(), wall], &tuning, FRAME);
        assert_eq!(bullet.forward.x, -1.0);
        assert!((bullet.position.x - 299.0).abs() < 1e-3);
    }

    #[test]
    fn test_wall_behind_tank_nudges_forward() {
        let mut layout = ArenaLayout::open(Vec2::new(150.0, 300.0), Vec2::new(450.0, 300.0));
        layout.walls.push(Wall::vertical(Vec2::new(136.0, 270.0), 60.0, 5.0));
        let mut state = started(layout);

        tick(&mut state, &TickInput::default(), FRAME).unwrap();
        let pos = state.tank(Player::One).unwrap().position;
        assert!((pos - Vec2::new(154.0, 300.0)).length() < 1e-4);
    }

    #[test]
    fn test_wall_ahead_of_tank_blocks_movement() {
        let mut layout = ArenaLayout::open(Vec2::new(150.0, 300.0), Vec2::new(450.0, 300.0));
        layout.walls.push(Wall::vertical(Vec2::new(160.0, 270.0), 60.0, 5.0));
        let mut state = started(layout);

        tick(&mut state, &TickInput::holding(Player::One, Action::Forward), FRAME).unwrap();
        let pos = state.tank(Player::One).unwrap().position;
        assert!((pos - Vec2::new(150.0, 300.0)).length() < 1e-4);

        // reversing clears the wall
        tick(&mut state, &TickInput::holding(Player::One, Action::Backward), FRAME).unwrap();
        let pos = state.tank(Player::One).unwrap().position;
        assert!((pos - Vec2::new(148.0, 300.0)).length() < 1e-4);
    }

    #[test]
    fn test_bullet_expires_with_explosion() {
        let mut state = duel();
        tick(&mut state, &TickInput::holding(Player::One, Action::Fire), FRAME).unwrap();
        state.bullets[0].timer = 7.99;
        state.drain_events();

        tick(&mut state, &TickInput::default(), 0.02).unwrap();
        assert!(state.bullets.is_empty());
        assert_eq!(state.explosions.len(), 1);
        assert_eq!(state.explosions[0].kind, ExplosionKind::BulletExpired);

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Sound(SoundEffect::Fireball)));
        assert!(state.tanks.iter().all(|t| t.alive));
    }

    #[test]
    fn test_explosions_finish() {
        let mut state = duel();
        state
            .explosions
            .push(Explosion::new(Vec2::new(300.0, 300.0), ExplosionKind::BulletExpired, 0.5));

        for _ in 0..5 {
            tick(&mut state, &TickInput::default(), 0.08).unwrap();
        }
        assert_eq!(state.explosions.len(), 1);
        for _ in 0..2 {
            tick(&mut state, &TickInput::default(), 0.08).unwrap();
        }
        assert!(state.explosions.is_empty());
    }

    #[test]
    fn test_round_restarts_after_delay() {
        let mut state = duel();
        parked_bullet(&mut state, Player::One, Player::Two, 1.0);
        tick(&mut state, &TickInput::default(), FRAME).unwrap();
        assert_eq!(state.score(Player::One), 1);
        assert!(state.end_delay > 0.0);

        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), 1.0 / 12.0).unwrap();
        }
        assert_eq!(state.round, 1);

        for _ in 0..6 {
            tick(&mut state, &TickInput::default(), 1.0 / 12.0).unwrap();
        }
        assert_eq!(state.round, 2);
        assert_eq!(state.phase, RoundPhase::Playing);
        assert!(state.tanks.iter().all(|t| t.alive));
        assert_eq!(state.score(Player::One), 1);
        assert_eq!(state.end_delay, 0.0);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut state = duel();
        tick(&mut state, &TickInput::holding(Player::One, Action::Fire), FRAME).unwrap();
        let before = state.bullets[0].position;

        let pause = TickInput {
            toggle_pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, FRAME).unwrap();
        assert!(state.paused);
        tick(&mut state, &TickInput::default(), FRAME).unwrap();
        assert_eq!(state.bullets[0].position, before);

        tick(&mut state, &pause, FRAME).unwrap();
        assert!(!state.paused);
        assert!(state.bullets[0].position.x > before.x);
    }

    #[test]
    fn test_random_rounds_run_without_panicking() {
        let mut state = GameState::new(Tuning::default(), 2024);
        state.start_game().unwrap();

        let mut input = TickInput::default();
        for p in Player::BOTH {
            input.press(p, Action::Forward);
            input.press(p, Action::RotateLeft);
            input.press(p, Action::Fire);
        }
        for _ in 0..2000 {
            tick(&mut state, &input, FRAME).unwrap();
            for tank in &state.tanks {
                assert!(tank.position.y > 64.0);
            }
        }
        assert!(state.round >= 1);
    }

    proptest! {
        #[test]
        fn overlapping_walls_bounce_like_one(copies in 1usize..5, x in 290.0f32..305.0) {
            let tuning = Tuning::default();
            let wall = Wall::vertical(Vec2::new(300.0, 240.0), 60.0, 5.0);
            let mut single = Bullet::fire(1, Player::One, Vec2::ZERO, 0.0, &tuning);
            single.position = Vec2::new(x, 270.0);
            let mut stacked = single.clone();

            move_bullet(&mut single, &[wall.clone()], &tuning, FRAME);
            move_bullet(&mut stacked, &vec![wall; copies], &tuning, FRAME);
            prop_assert_eq!(stacked.forward, single.forward);
            prop_assert_eq!(stacked.position, single.position);
        }

        #[test]
        fn effective_dt_caps_long_frames(frame_dt in (1.0f32 / 12.0)..1000.0) {
            prop_assert_eq!(effective_dt(frame_dt, 1.0 / 12.0), 1.0 / 12.0);
        }

        #[test]
        fn effective_dt_passes_short_frames(frame_dt in 0.0f32..(1.0 / 12.0)) {
            prop_assert_eq!(effective_dt(frame_dt, 1.0 / 12.0), frame_dt);
        }
    }
}
