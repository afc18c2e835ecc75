//! Chess game logic module - interaction, history and suggestions
//!
//! Everything between the user's gestures and the rules engine. The engine
//! owns the rules and the authoritative position; this module owns what the
//! user is doing with it.
//!
//! # Module Organization
//!
//! - `controller` - [`BoardController`], the selection/move/undo state machine
//! - `resources` - Selection, captured pieces, evaluation history, promotion rule
//! - `ai` - Best-move coordinator running one-ply probes in the background
//! - `events` - Observer notifications (move made, status changed, game ended)
//!
//! # Wiring
//!
//! ```rust,ignore
//! let engine: Arc<dyn ChessEngine> = Arc::new(EngineHandle::spawn(backend));
//! let lease = EngineLease::new();
//! let mut controller = BoardController::new(engine.clone(), lease.clone(), settings);
//! controller.refresh().await;
//!
//! let switch = SuggestionSwitch::new(settings.suggestions_enabled);
//! let (coordinator, suggestions) = BestMoveCoordinator::new(
//!     engine,
//!     lease,
//!     controller.position_feed().subscribe(),
//!     switch.subscribe(),
//!     settings.settle_delay(),
//! );
//! coordinator.spawn();
//! ```

pub mod ai;
pub mod controller;
pub mod events;
pub mod resources;

// Re-export the controller (main entry point)
pub use controller::{ActionOutcome, BoardController};
pub use events::{GameEvent, GameObserver};
