//! UI module - presentation helpers
//!
//! Pure functions and small value types the presentation layer calls to turn
//! controller state into something drawable. Nothing here touches the engine.
//!
//! - **eval_bar**: evaluation-to-bar scaling, axis ticks and labels

pub mod eval_bar;

// Re-export commonly used items
pub use eval_bar::*;
