//! Error types surfaced by the simulation and its configuration.
//!
//! The per-frame step itself never fails. Errors only come out of round
//! setup (layout generation) and out of loading tuning/settings data.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// No valid spawn point was found within the retry cap.
    LayoutGeneration {
        /// Candidates sampled before giving up.
        attempts: u32,
    },

    /// A tuning value is outside the range the simulation can handle.
    InvalidTuning {
        field: &'static str,
        reason: &'static str,
    },

    /// Tuning or settings JSON could not be decoded.
    Parse(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayoutGeneration { attempts } => {
                write!(f, "no valid tank spawn found after {attempts} attempts")
            }
            Self::InvalidTuning { field, reason } => {
                write!(f, "invalid tuning value `{field}`: {reason}")
            }
            Self::Parse(msg) => write!(f, "failed to parse config: {msg}"),
        }
    }
}

impl std::error::Error for GameError {}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
