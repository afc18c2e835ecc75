//! Core module - settings and shared error types
//!
//! # Resources
//!
//! - [`CoreSettings`] - suggestion toggle, search settle delay, swipe-to-undo
//!   thresholds and board orientation
//! - [`SwipeThresholds`] - gesture recognition limits
//!
//! Settings are stored as JSON by [`settings_persistence`]; failures to load
//! fall back to defaults so a broken file never blocks a game.

pub mod error;
pub mod resources;
pub mod settings_persistence;

// Re-export commonly used items
pub use error::{CoreError, CoreResult};
pub use resources::*;
pub use settings_persistence::{
    load_settings, load_settings_from, save_settings, save_settings_to, settings_path,
};
