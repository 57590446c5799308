//! Round lifecycle
//!
//! `NotStarted -> Playing -> Ending -> Playing -> ...`. There is no terminal
//! state: a finished round is torn down and the next one starts straight
//! away with the scores carried over.

use super::state::{GameEvent, GameState, Player, RoundPhase, SoundEffect, Tank};
use crate::error::GameError;

impl GameState {
    /// Leave the title screen and start the first round
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.phase != RoundPhase::NotStarted {
            return Ok(());
        }
        self.push_event(GameEvent::Sound(SoundEffect::ButtonPush));
        self.start_round()
    }

    /// Build a fresh arena and put both tanks on it.
    ///
    /// If no layout can be generated the game stays paused in `NotStarted`
    /// and the error is returned.
    pub fn start_round(&mut self) -> Result<(), GameError> {
        let layout = match self.layout.next_layout(&self.tuning) {
            Ok(layout) => layout,
            Err(err) => {
                log::error!("Round start aborted: {err}");
                self.teardown_round();
                self.phase = RoundPhase::NotStarted;
                return Err(err);
            }
        };

        let angles = layout.facing_angles();
        self.tanks = Player::BOTH
            .iter()
            .map(|&p| Tank::new(p, layout.spawns[p.index()], angles[p.index()], &self.tuning))
            .collect();
        self.walls = layout.walls;
        self.bullets.clear();
        self.explosions.clear();
        self.end_delay = 0.0;
        self.round += 1;
        self.phase = RoundPhase::Playing;
        self.paused = false;

        log::info!(
            "Round {} started ({} walls), score {}-{}",
            self.round,
            self.walls.len(),
            self.scores[0],
            self.scores[1]
        );
        self.push_event(GameEvent::RoundStarted { round: self.round });
        Ok(())
    }

    /// Remove everything the round owns. Safe to call repeatedly.
    pub fn teardown_round(&mut self) {
        self.paused = true;
        self.end_delay = 0.0;
        self.bullets.clear();
        self.explosions.clear();
        self.tanks.clear();
        self.walls.clear();
    }

    /// Finish the current round and immediately start the next one
    pub fn end_round(&mut self) -> Result<(), GameError> {
        self.phase = RoundPhase::Ending;
        let survivor = self.tanks.iter().find(|t| t.alive).map(|t| t.player);
        log::info!(
            "Round {} over, survivor: {}",
            self.round,
            survivor.map_or("none", Player::name)
        );
        self.push_event(GameEvent::RoundEnded {
            round: self.round,
            survivor,
        });

        self.teardown_round();
        self.start_round()
    }

    /// Credit a kill to `player`
    pub fn award_point(&mut self, player: Player) {
        let score = &mut self.scores[player.index()];
        *score += 1;
        let score = *score;
        log::debug!("{} scores, now {score}", player.name());
        self.push_event(GameEvent::Scored { player, score });
    }

    /// Zero both scores for a new match
    pub fn reset_scores(&mut self) {
        self.scores = [0; 2];
    }

    /// Abandon a paused match and go back to the title screen.
    ///
    /// Returns false and leaves the state alone unless a round is paused.
    pub fn new_match(&mut self) -> bool {
        if self.phase != RoundPhase::Playing || !self.paused {
            return false;
        }
        log::info!(
            "Match abandoned after {} rounds at {}-{}",
            self.round,
            self.scores[0],
            self.scores[1]
        );
        self.teardown_round();
        self.reset_scores();
        self.round = 0;
        self.phase = RoundPhase::NotStarted;
        true
    }

    /// Pause or resume a round in progress
    pub fn toggle_pause(&mut self) {
        if self.phase == RoundPhase::Playing {
            self.paused = !self.paused;
            log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
        }
    }
}
