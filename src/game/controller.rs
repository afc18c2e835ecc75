//! Board interaction controller
//!
//! The controller turns taps, promotion choices and gestures into engine
//! commands, and is the only component that moves or undoes on the user's
//! behalf. It caches what the presentation layer reads: position, status,
//! selection, captured pieces, evaluation and its quality history.
//!
//! # Selection Machine
//!
//! | State               | Tap on                          | Next state              |
//! |---------------------|---------------------------------|-------------------------|
//! | Idle                | own piece                       | SquareSelected          |
//! | Idle                | anything else                   | Idle                    |
//! | SquareSelected      | the origin again                | Idle                    |
//! | SquareSelected      | destination, pawn to last rank  | AwaitingPromotion       |
//! | SquareSelected      | other destination               | move applied, Idle      |
//! | SquareSelected      | another own piece               | SquareSelected (new)    |
//! | SquareSelected      | any other square                | Idle                    |
//! | AwaitingPromotion   | (taps ignored)                  | choose or cancel        |
//!
//! Taps are ignored once the game is over.
//!
//! # Engine Access
//!
//! Each action holds the [`EngineLease`] for its whole command group (for a
//! move: `make_move`, `get_board_state`, `evaluate_position`) so no search
//! probe can interleave. The refreshed position is published on the
//! [`PositionFeed`] before the lease is released.
//!
//! # Errors
//!
//! Actions never return `Err`. A failed engine command clears the selection,
//! keeps the last good position and status, stores a message in
//! [`BoardController::last_error`] and notifies observers. The action returns
//! [`ActionOutcome::Failed`].
//!
//! If the engine accepted a move or undo but the snapshot that follows could
//! not be read, the feed is invalidated before the lease is released and the
//! cache is marked stale. The next tap or undo refreshes first.

use crate::core::CoreSettings;
use crate::engine::{
    ChessEngine, EngineError, EngineLease, GameStatus, Move, MoveAnalysis, PieceKind, Position,
    Square,
};
use crate::game::ai::PositionFeed;
use crate::game::events::GameObserver;
use crate::game::resources::{
    requires_promotion, CapturedPieces, EvaluationHistory, MoveQuality, SelectionState,
};
use crate::input::{PointerSample, SwipeDetector};
use crate::ui::EvalBar;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a controller action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Nothing changed
    Ignored,
    /// A piece was selected; `destinations` legal targets are highlighted
    Selected { origin: Square, destinations: usize },
    /// The selection (or pending promotion) was dropped
    Deselected,
    /// Waiting for the promotion piece
    PromotionPending { origin: Square, destination: Square },
    /// The engine accepted a move
    MoveApplied {
        mv: Move,
        status: GameStatus,
        /// `None` when the evaluation was unavailable
        quality: Option<MoveQuality>,
    },
    /// The engine took back the last move
    Undone { status: GameStatus },
    /// A new game or position was loaded
    Reset { status: GameStatus },
    /// An engine command failed
    Failed { error: EngineError },
}

/// State machine between the user and the rules engine
pub struct BoardController {
    engine: Arc<dyn ChessEngine>,
    lease: EngineLease,
    feed: PositionFeed,
    settings: CoreSettings,
    position: Position,
    status: GameStatus,
    selection: SelectionState,
    captured: CapturedPieces,
    history: EvaluationHistory,
    last_move: Option<Move>,
    evaluation: Option<i32>,
    last_error: Option<String>,
    /// Engine position moved past the cached one
    stale: bool,
    swipe: SwipeDetector,
    observers: Vec<Arc<dyn GameObserver>>,
}

impl BoardController {
    /// Build a controller over `engine`
    ///
    /// The cached position starts at the standard setup; call
    /// [`refresh`](Self::refresh) to load whatever the engine holds.
    pub fn new(engine: Arc<dyn ChessEngine>, lease: EngineLease, settings: CoreSettings) -> Self {
        let position = Position::default();
        Self {
            engine,
            lease,
            feed: PositionFeed::new(),
            swipe: SwipeDetector::new(settings.swipe),
            settings,
            captured: CapturedPieces::from_board(&position.board),
            position,
            status: GameStatus::InProgress,
            selection: SelectionState::Idle,
            history: EvaluationHistory::new(),
            last_move: None,
            evaluation: None,
            last_error: None,
            stale: false,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn GameObserver>) {
        self.observers.push(observer);
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn captured(&self) -> &CapturedPieces {
        &self.captured
    }

    pub fn history(&self) -> &EvaluationHistory {
        &self.history
    }

    /// Last applied move, for the highlight; cleared by undo and new game
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// Latest evaluation, `None` while indeterminate
    pub fn evaluation(&self) -> Option<i32> {
        self.evaluation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CoreSettings) {
        self.swipe.set_thresholds(settings.swipe);
        self.settings = settings;
    }

    /// Feed the search coordinator subscribes to
    pub fn position_feed(&self) -> &PositionFeed {
        &self.feed
    }

    /// True while the cached snapshot lags behind the engine
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn eval_bar(&self) -> EvalBar {
        EvalBar::new(self.settings.board_flipped)
    }

    /// Pull position, status and evaluation from the engine
    pub async fn refresh(&mut self) -> ActionOutcome {
        let lease = self.lease.clone();
        let guard = lease.acquire().await;
        let snapshot = self.fetch_snapshot().await;
        let (position, status) = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                drop(guard);
                return self.fail(e);
            }
        };
        let evaluation = self.evaluate().await;
        self.feed.publish(position.clone());
        drop(guard);

        let previous = self.status;
        self.install(position, status);
        self.evaluation = evaluation;
        self.notify_status(previous);
        ActionOutcome::Reset { status }
    }

    /// Handle a tap on `square`
    pub async fn tap(&mut self, square: Square) -> ActionOutcome {
        if let Some(failed) = self.resync().await {
            return failed;
        }
        if self.status.is_terminal() {
            debug!("[INPUT] Tap on {} ignored, game is over", square);
            return ActionOutcome::Ignored;
        }

        match self.selection.clone() {
            SelectionState::AwaitingPromotion { .. } => {
                debug!("[INPUT] Tap on {} ignored, promotion pending", square);
                ActionOutcome::Ignored
            }
            SelectionState::Idle => {
                if self.position.is_own_piece(square) {
                    self.select(square).await
                } else {
                    ActionOutcome::Ignored
                }
            }
            SelectionState::SquareSelected {
                origin,
                destinations,
                ..
            } => {
                if square == origin {
                    debug!("[INPUT] Deselected {}", origin);
                    self.selection.clear();
                    ActionOutcome::Deselected
                } else if destinations.contains(&square) {
                    if requires_promotion(&self.position, origin, square) {
                        debug!("[INPUT] Promotion pending {} -> {}", origin, square);
                        self.selection = SelectionState::AwaitingPromotion {
                            origin,
                            destination: square,
                        };
                        ActionOutcome::PromotionPending {
                            origin,
                            destination: square,
                        }
                    } else {
                        self.apply_move(origin, square, None).await
                    }
                } else if self.position.is_own_piece(square) {
                    self.select(square).await
                } else {
                    debug!("[INPUT] Tap on {} cleared the selection", square);
                    self.selection.clear();
                    ActionOutcome::Deselected
                }
            }
        }
    }

    /// Complete a pending promotion with `piece`
    pub async fn choose_promotion(&mut self, piece: PieceKind) -> ActionOutcome {
        let SelectionState::AwaitingPromotion {
            origin,
            destination,
        } = self.selection
        else {
            return ActionOutcome::Ignored;
        };

        if piece.promotion_name().is_none() {
            warn!("[INPUT] {:?} is not a promotion piece", piece);
            return ActionOutcome::Ignored;
        }

        self.apply_move(origin, destination, Some(piece)).await
    }

    /// Close the promotion picker without moving
    pub fn cancel_promotion(&mut self) -> ActionOutcome {
        if self.selection.is_awaiting_promotion() {
            debug!("[INPUT] Promotion cancelled");
            self.selection.clear();
            ActionOutcome::Deselected
        } else {
            ActionOutcome::Ignored
        }
    }

    /// Take back the last move
    pub async fn undo(&mut self) -> ActionOutcome {
        if let Some(failed) = self.resync().await {
            self.selection.clear();
            return failed;
        }
        let lease = self.lease.clone();
        let guard = lease.acquire().await;
        let status = match self.engine.undo_move().await {
            Ok(status) => status,
            Err(e) => {
                drop(guard);
                self.selection.clear();
                return self.fail(e);
            }
        };
        let position = match self.engine.board_state().await {
            Ok(position) => position,
            Err(e) => {
                self.mark_stale();
                drop(guard);
                self.selection.clear();
                self.last_move = None;
                return self.fail(e);
            }
        };
        let evaluation = self.evaluate().await;
        self.feed.publish(position.clone());
        drop(guard);

        let previous = self.status;
        self.install(position, status);
        self.selection.clear();
        self.last_move = None;
        self.evaluation = evaluation;
        self.history.rebase(evaluation);
        self.last_error = None;
        info!("[UNDO] Move taken back, {:?}", status);
        self.notify_status(previous);
        ActionOutcome::Undone { status }
    }

    /// Start of a possible swipe gesture
    pub fn pointer_down(&mut self, sample: PointerSample) {
        if self.settings.swipe_undo_enabled {
            self.swipe.pointer_down(sample);
        }
    }

    /// End of a possible swipe gesture; a qualifying swipe undoes one move
    pub async fn pointer_up(&mut self, sample: PointerSample) -> ActionOutcome {
        if !self.settings.swipe_undo_enabled || !self.swipe.pointer_up(sample) {
            return ActionOutcome::Ignored;
        }
        self.selection.clear();
        self.undo().await
    }

    /// Reset the engine to the starting position
    pub async fn new_game(&mut self) -> ActionOutcome {
        let lease = self.lease.clone();
        let guard = lease.acquire().await;
        let snapshot = match self.engine.new_game().await {
            Ok(()) => self.fetch_snapshot().await,
            Err(e) => Err(e),
        };
        self.finish_reset(guard, snapshot).await
    }

    /// Replace the game with the position described by `fen`
    ///
    /// A malformed FEN leaves the current game untouched.
    pub async fn load_fen(&mut self, fen: &str) -> ActionOutcome {
        let lease = self.lease.clone();
        let guard = lease.acquire().await;
        let snapshot = match self.engine.load_fen(fen).await {
            Ok(position) => self
                .engine
                .game_status()
                .await
                .map(|status| (position, status)),
            Err(e) => Err(e),
        };
        self.finish_reset(guard, snapshot).await
    }

    /// Capture/check markers for the highlighted destinations
    ///
    /// Empty when nothing is selected or the engine cannot analyze.
    pub async fn destination_hints(&self) -> Vec<MoveAnalysis> {
        let SelectionState::SquareSelected { origin, moves, .. } = &self.selection else {
            return Vec::new();
        };

        let _lease = self.lease.acquire().await;
        let mut hints = Vec::with_capacity(moves.len());
        for mv in moves {
            match self.engine.analyze_move(*origin, mv.to, mv.promotion).await {
                Ok(analysis) => hints.push(analysis),
                Err(e) => {
                    warn!("[ENGINE] Destination hints unavailable: {}", e);
                    return Vec::new();
                }
            }
        }
        hints
    }

    async fn select(&mut self, square: Square) -> ActionOutcome {
        let lease = self.lease.clone();
        let guard = lease.acquire().await;
        let result = self.engine.legal_moves_for_square(square).await;
        drop(guard);

        match result {
            Ok(moves) => {
                let selection = SelectionState::selected(square, moves);
                let destinations = selection.destinations().map_or(0, |d| d.len());
                debug!(
                    "[INPUT] Selected {} with {} destinations",
                    square, destinations
                );
                self.selection = selection;
                ActionOutcome::Selected {
                    origin: square,
                    destinations,
                }
            }
            Err(e) => {
                self.selection.clear();
                self.fail(e)
            }
        }
    }

    async fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> ActionOutcome {
        let mover = self.position.side_to_move;
        let move_number = self.position.fullmove_number;
        let mv = match promotion {
            Some(piece) => Move::new(from, to).with_promotion(piece),
            None => Move::new(from, to),
        };
        debug!("[MOVE] Requesting {}", mv.to_uci());

        let lease = self.lease.clone();
        let guard = lease.acquire().await;
        let status = match self.engine.make_move(from, to, promotion).await {
            Ok(status) => status,
            Err(e) => {
                drop(guard);
                self.selection.clear();
                return self.fail(e);
            }
        };
        let position = match self.engine.board_state().await {
            Ok(position) => position,
            Err(e) => {
                self.mark_stale();
                drop(guard);
                self.selection.clear();
                self.last_move = Some(mv);
                return self.fail(e);
            }
        };
        let evaluation = self.evaluate().await;
        self.feed.publish(position.clone());
        drop(guard);

        let previous = self.status;
        self.install(position, status);
        self.selection.clear();
        self.last_move = Some(mv);
        self.evaluation = evaluation;
        self.last_error = None;

        let quality = evaluation.map(|score| {
            self.history
                .record_move(score, move_number, mover.is_white(), Some(mv.to_uci()))
        });

        info!(
            "[MOVE] {:?} played {} ({:?}, quality {:?})",
            mover,
            mv.to_uci(),
            status,
            quality
        );

        for observer in &self.observers {
            observer.on_move_made(&mv, status);
        }
        self.notify_status(previous);

        ActionOutcome::MoveApplied {
            mv,
            status,
            quality,
        }
    }

    async fn finish_reset(
        &mut self,
        guard: tokio::sync::MutexGuard<'_, ()>,
        snapshot: Result<(Position, GameStatus), EngineError>,
    ) -> ActionOutcome {
        let (position, status) = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                drop(guard);
                return self.fail(e);
            }
        };
        let evaluation = self.evaluate().await;
        self.feed.publish(position.clone());
        drop(guard);

        let previous = self.status;
        self.install(position, status);
        self.selection.clear();
        self.history.reset();
        self.last_move = None;
        self.evaluation = evaluation;
        self.last_error = None;
        info!("[MOVE] New game loaded, {:?}", status);
        self.notify_status(previous);
        ActionOutcome::Reset { status }
    }

    async fn fetch_snapshot(&self) -> Result<(Position, GameStatus), EngineError> {
        let position = self.engine.board_state().await?;
        let status = self.engine.game_status().await?;
        Ok((position, status))
    }

    async fn evaluate(&self) -> Option<i32> {
        match self.engine.evaluate_position().await {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("[ENGINE] Evaluation unavailable: {}", e);
                None
            }
        }
    }

    /// Refresh first if an earlier action left the cache behind the engine
    async fn resync(&mut self) -> Option<ActionOutcome> {
        if !self.stale {
            return None;
        }
        info!("[ENGINE] Cached position is stale, refreshing");
        match self.refresh().await {
            failed @ ActionOutcome::Failed { .. } => Some(failed),
            _ => {
                self.history.rebase(self.evaluation);
                None
            }
        }
    }

    /// The engine moved but its new position could not be read
    ///
    /// Must be called while the lease is held.
    fn mark_stale(&mut self) {
        let generation = self.feed.invalidate();
        warn!(
            "[ENGINE] Snapshot unavailable after a position change (generation {})",
            generation
        );
        self.stale = true;
    }

    fn install(&mut self, position: Position, status: GameStatus) {
        self.stale = false;
        self.captured = CapturedPieces::from_board(&position.board);
        self.position = position;
        self.status = status;
    }

    fn notify_status(&self, previous: GameStatus) {
        if self.status == previous {
            return;
        }
        for observer in &self.observers {
            observer.on_status_changed(self.status);
        }
        if self.status.is_terminal() {
            info!("[MOVE] Game over: {:?}", self.status);
            for observer in &self.observers {
                observer.on_game_ended(self.status);
            }
        }
    }

    fn fail(&mut self, error: EngineError) -> ActionOutcome {
        warn!("[ENGINE] Command failed: {}", error);
        let message = error.to_string();
        for observer in &self.observers {
            observer.on_error(&message);
        }
        self.last_error = Some(message);
        ActionOutcome::Failed { error }
    }
}
