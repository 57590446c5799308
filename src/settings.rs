//! Game settings and preferences
//!
//! Persisted in LocalStorage, separate from gameplay tuning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::sim::{Action, Player};

/// Physical key (DOM `KeyboardEvent.code`) to logical control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    map: BTreeMap<String, (Player, Action)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self {
            map: BTreeMap::new(),
        };
        // Player 1: arrows, M fires
        bindings.bind("ArrowUp", Player::One, Action::Forward);
        bindings.bind("ArrowDown", Player::One, Action::Backward);
        bindings.bind("ArrowLeft", Player::One, Action::RotateLeft);
        bindings.bind("ArrowRight", Player::One, Action::RotateRight);
        bindings.bind("KeyM", Player::One, Action::Fire);
        // Player 2: WASD, Q fires
        bindings.bind("KeyW", Player::Two, Action::Forward);
        bindings.bind("KeyS", Player::Two, Action::Backward);
        bindings.bind("KeyA", Player::Two, Action::RotateLeft);
        bindings.bind("KeyD", Player::Two, Action::RotateRight);
        bindings.bind("KeyQ", Player::Two, Action::Fire);
        bindings
    }
}

impl KeyBindings {
    /// Bind `code` to a control, replacing whatever it did before.
    ///
    /// A control can have several keys; rebinding does not remove the others.
    pub fn bind(&mut self, code: &str, player: Player, action: Action) {
        self.map.insert(code.to_string(), (player, action));
    }

    pub fn action_for(&self, code: &str) -> Option<(Player, Action)> {
        self.map.get(code).copied()
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Toggled by the music button
    pub muted: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Behaviour ===
    /// Pause when the window loses focus or the tab is hidden
    pub auto_pause: bool,

    // === Controls ===
    pub key_bindings: KeyBindings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            show_fps: false,
            auto_pause: true,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "ballistic_settings";

    /// Volume actually applied to effects, 0 when muted
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    pub fn from_json(json: &str) -> Result<Self, GameError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(err) => log::warn!("Ignoring stored settings: {err}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Settings saved");
                }
                Err(err) => log::warn!("Settings not saved: {err}"),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No settings storage on native, key {}", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
