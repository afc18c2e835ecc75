//! Best-move suggestions
//!
//! A background coordinator ranks the legal moves of the current position by
//! a one-ply probe (make, evaluate, undo) and publishes the best one. It runs
//! as its own tokio task and never blocks board interaction.
//!
//! # Architecture
//!
//! - [`PositionFeed`]: controller to coordinator, latest position snapshot
//! - [`SuggestionSwitch`]: enables or disables suggestions
//! - [`BestMoveCoordinator`]: debounces changes and runs [`search_pass`]
//! - [`Suggestion`]: coordinator to presentation, best move and progress flag
//!
//! # Integration
//!
//! The controller and the coordinator share the engine. Both hold the same
//! [`crate::engine::EngineLease`]; the controller publishes each refreshed
//! position while still holding it, which is how a probe learns that its
//! pass has gone stale.
//!
//! ```rust,ignore
//! let (coordinator, suggestions) = BestMoveCoordinator::new(
//!     engine.clone(),
//!     lease.clone(),
//!     controller.position_feed().subscribe(),
//!     switch.subscribe(),
//!     settings.settle_delay(),
//! );
//! coordinator.spawn();
//! ```

pub mod cancel;
pub mod feed;
pub mod search;

// Re-export for convenience
pub use cancel::CancelToken;
pub use feed::{PositionFeed, PositionReceiver, PositionSnapshot, Suggestion, SuggestionSwitch};
pub use search::{best_of, search_pass, BestMoveCoordinator, EvaluatedMove, PassOutcome};
