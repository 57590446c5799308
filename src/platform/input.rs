//! Keyboard state
//!
//! Browser key events arrive between frames. `KeyState` remembers which
//! controls are held and turns that into one `TickInput` per frame.

use std::collections::BTreeSet;

use crate::settings::KeyBindings;
use crate::sim::{Action, Player, TickInput};

/// What a key press meant to the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    /// Bound to a tank control
    Control(Player, Action),
    /// Pause toggle requested
    Pause,
    /// Start the match (title screen only)
    Start,
    /// Abandon the match (only honoured while paused)
    NewMatch,
    Ignored,
}

/// Held controls plus one-shot requests, fed by DOM key events
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: BTreeSet<(Player, Action)>,
    pause_requested: bool,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a `keydown` with the event's `code`
    pub fn key_down(&mut self, code: &str, bindings: &KeyBindings) -> KeyResponse {
        if let Some((player, action)) = bindings.action_for(code) {
            self.held.insert((player, action));
            return KeyResponse::Control(player, action);
        }
        match code {
            "Escape" => {
                self.pause_requested = true;
                KeyResponse::Pause
            }
            "Enter" | "Space" => KeyResponse::Start,
            "KeyR" => KeyResponse::NewMatch,
            _ => KeyResponse::Ignored,
        }
    }

    /// Handle a `keyup`
    pub fn key_up(&mut self, code: &str, bindings: &KeyBindings) {
        if let Some(control) = bindings.action_for(code) {
            self.held.remove(&control);
        }
    }

    /// Ask for a pause toggle on the next frame (window blur, tab hidden)
    pub fn request_pause(&mut self) {
        self.pause_requested = true;
    }

    /// Drop every held key, e.g. when focus is lost and keyups will never arrive
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    /// Input for this frame. Consumes the pending pause request.
    pub fn snapshot(&mut self) -> TickInput {
        TickInput {
            pressed: self.held.clone(),
            toggle_pause: std::mem::take(&mut self.pause_requested),
        }
    }
}
