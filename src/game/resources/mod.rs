//! Game state owned by the board controller
//!
//! # Resource Categories
//!
//! ## Player Interaction
//! - [`SelectionState`] - Idle / selected square / pending promotion
//! - [`promotion`] - Pawn promotion detection and picker choices
//!
//! ## Game History
//! - [`EvaluationHistory`] - Per-move evaluations with quality tags
//! - [`CapturedPieces`] - Material tracking and advantage calculation
//!
//! All of these are plain values. The controller rebuilds or updates them
//! after each engine command; nothing here talks to the engine directly.

pub mod captured;
pub mod history;
pub mod promotion;
pub mod selection;

// Re-export all resources for convenience
pub use captured::*;
pub use history::*;
pub use promotion::*;
pub use selection::*;
