//! Platform abstraction layer
//!
//! Turns browser events into simulation input:
//! - Keyboard state and key bindings
//! - Pause requests from focus/visibility changes

pub mod input;

pub use input::{KeyResponse, KeyState};
