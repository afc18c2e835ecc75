//! Rules engine seam
//!
//! The chess rules (legal move generation, check/mate/draw detection, FEN
//! parsing and static evaluation) live in an external, stateful engine. This
//! module describes the narrow asynchronous command interface the interaction
//! core talks to, plus two concrete pieces of plumbing:
//!
//! - [`channel::EngineHandle`] - a [`ChessEngine`] that forwards commands over a
//!   tokio channel to a single engine task owning an [`channel::EngineBackend`]
//! - [`scripted::ScriptedBackend`] - a deterministic in-memory backend with a
//!   scripted move table, used by tests and headless demos
//!
//! # Shared State
//!
//! The engine's internal game state is the one shared mutable resource in the
//! system. Commands are answered strictly in arrival order; callers that need
//! several commands to run back-to-back (a move followed by its refresh, or a
//! search probe's make/evaluate/undo) hold an [`EngineLease`] while issuing them.

pub mod channel;
pub mod error;
pub mod fen;
pub mod scripted;
pub mod types;

pub use channel::{EngineBackend, EngineCommand, EngineHandle, EngineReply};
pub use error::{EngineError, EngineResult};
pub use scripted::{CommandLog, ScriptedBackend};
pub use types::{
    Board, CastlingRights, Color, GameStatus, Move, MoveAnalysis, MoveCategory, PieceKind,
    Position, Square,
};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Asynchronous command interface of the rules engine
///
/// Every method suspends the caller until the engine answers. Evaluations are
/// always centipawns from White's perspective.
#[async_trait]
pub trait ChessEngine: Send + Sync {
    /// Reset to the standard starting position
    async fn new_game(&self) -> EngineResult<()>;

    /// Replace the current game with the position described by `fen`
    async fn load_fen(&self, fen: &str) -> EngineResult<Position>;

    async fn board_state(&self) -> EngineResult<Position>;

    async fn game_status(&self) -> EngineResult<GameStatus>;

    async fn legal_moves(&self) -> EngineResult<Vec<Move>>;

    async fn legal_moves_for_square(&self, square: Square) -> EngineResult<Vec<Move>>;

    /// Apply a move; fails with [`EngineError::IllegalMove`] if it is not legal
    async fn make_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> EngineResult<GameStatus>;

    /// Take back the last move; fails with [`EngineError::NoHistory`] at the root
    async fn undo_move(&self) -> EngineResult<GameStatus>;

    async fn fen(&self) -> EngineResult<String>;

    async fn evaluate_position(&self) -> EngineResult<i32>;

    async fn analyze_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> EngineResult<MoveAnalysis>;

    async fn analyze_all_legal_moves(&self) -> EngineResult<Vec<MoveAnalysis>>;
}

/// Cooperative exclusive access to the engine's mutable game state
///
/// Only one logical actor may hold the engine "dirty" at a time. The user's
/// move sequence and each search probe acquire the lease for the duration of
/// their command group. tokio's mutex is fair, so a waiting user move is served
/// before the search's next probe.
#[derive(Clone, Default)]
pub struct EngineLease {
    inner: Arc<Mutex<()>>,
}

impl EngineLease {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}
