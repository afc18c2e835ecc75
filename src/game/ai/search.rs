//! One-ply best-move search over the shared engine
//!
//! The engine has no "evaluate this child" command, so a pass probes each
//! legal move by applying it, evaluating the result and undoing it again.
//! The engine's position is shared with the board controller, which makes
//! every probe a small critical section.
//!
//! # Probe Protocol
//!
//! For each candidate, in enumeration order:
//!
//! 1. Acquire the [`EngineLease`]
//! 2. Stop if the pass was cancelled or the position feed moved on
//! 3. `make_move`, `evaluate_position`, then `undo_move` unconditionally
//! 4. Release the lease
//!
//! Cancellation is only observed at step 2 or between make and evaluate, so
//! an applied probe move is always undone before the pass returns.
//!
//! # Perspective
//!
//! Evaluations are White-relative. They are negated once per pass when Black
//! is to move in the searched position, so the maximum is always the best
//! move for the side to move. Ties go to the first candidate enumerated.
//!
//! # Coordinator
//!
//! [`BestMoveCoordinator`] runs passes reactively: a position change or a
//! toggle of the enabled flag cancels the pass in flight, waits for a settle
//! delay (restarted by every further change), then searches the newest
//! position.

use super::cancel::CancelToken;
use super::feed::{PositionReceiver, PositionSnapshot, Suggestion};
use crate::engine::{ChessEngine, Color, EngineLease, EngineResult, Move};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A legal move with its evaluation from the mover's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedMove {
    pub mv: Move,
    pub evaluation: i32,
}

/// How a pass ended without an engine failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every candidate was probed; `None` means no legal moves
    Finished(Option<EvaluatedMove>),
    /// Stopped early; the engine is back on the searched position
    Cancelled,
}

fn is_stale(token: &CancelToken, feed: &PositionReceiver, generation: u64) -> bool {
    token.is_cancelled() || feed.borrow().generation != generation
}

/// Pick the best candidate, first maximum wins
pub fn best_of(candidates: &[EvaluatedMove]) -> Option<EvaluatedMove> {
    let mut best: Option<EvaluatedMove> = None;
    for candidate in candidates {
        match best {
            Some(b) if candidate.evaluation <= b.evaluation => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

/// Run one search pass over `snapshot`
///
/// The engine must be on `snapshot`'s position when the first lease is
/// acquired; the generation check guarantees that for positions published
/// through the feed. An engine failure aborts the pass. If the failure hits
/// after a probe move was applied, the undo is still attempted first.
pub async fn search_pass(
    engine: &dyn ChessEngine,
    lease: &EngineLease,
    snapshot: &PositionSnapshot,
    feed: &PositionReceiver,
    token: &CancelToken,
) -> EngineResult<PassOutcome> {
    let Some(position) = snapshot.position.as_ref() else {
        return Ok(PassOutcome::Finished(None));
    };
    let generation = snapshot.generation;
    let sign = if position.side_to_move == Color::Black {
        -1
    } else {
        1
    };

    let candidates = {
        let _lease = lease.acquire().await;
        if is_stale(token, feed, generation) {
            return Ok(PassOutcome::Cancelled);
        }
        engine.legal_moves().await?
    };

    if candidates.is_empty() {
        debug!("[SEARCH] No legal moves, nothing to suggest");
        return Ok(PassOutcome::Finished(None));
    }

    let mut evaluated = Vec::with_capacity(candidates.len());
    for mv in candidates {
        let _lease = lease.acquire().await;
        if is_stale(token, feed, generation) {
            debug!(
                "[SEARCH] Pass cancelled after {} of its probes",
                evaluated.len()
            );
            return Ok(PassOutcome::Cancelled);
        }

        engine.make_move(mv.from, mv.to, mv.promotion).await?;

        let evaluation = if token.is_cancelled() {
            None
        } else {
            Some(engine.evaluate_position().await)
        };

        if let Err(e) = engine.undo_move().await {
            warn!("[SEARCH] Failed to undo probe {}: {}", mv.to_uci(), e);
            return Err(e);
        }

        match evaluation {
            None => return Ok(PassOutcome::Cancelled),
            Some(result) => evaluated.push(EvaluatedMove {
                mv,
                evaluation: result?.saturating_mul(sign),
            }),
        }
    }

    Ok(PassOutcome::Finished(best_of(&evaluated)))
}

enum Wake {
    Ready,
    Interrupted,
    Closed,
}

/// Reactive driver of [`search_pass`]
pub struct BestMoveCoordinator {
    engine: Arc<dyn ChessEngine>,
    lease: EngineLease,
    feed: PositionReceiver,
    switch: watch::Receiver<bool>,
    settle: Duration,
    out: watch::Sender<Suggestion>,
}

impl BestMoveCoordinator {
    /// Build a coordinator and the receiver its suggestions are published on
    pub fn new(
        engine: Arc<dyn ChessEngine>,
        lease: EngineLease,
        feed: PositionReceiver,
        switch: watch::Receiver<bool>,
        settle: Duration,
    ) -> (Self, watch::Receiver<Suggestion>) {
        let (out, suggestions) = watch::channel(Suggestion::default());
        let coordinator = Self {
            engine,
            lease,
            feed,
            switch,
            settle,
            out,
        };
        (coordinator, suggestions)
    }

    /// Run on the current tokio runtime until the feed or switch closes
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        debug!("[SEARCH] Coordinator started");
        let mut pending = true;

        loop {
            let enabled = *self.switch.borrow_and_update();
            if !enabled || !pending {
                if !enabled {
                    self.publish(Suggestion::default());
                }
                tokio::select! {
                    changed = self.feed.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        self.publish(Suggestion::default());
                    }
                    changed = self.switch.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                pending = true;
                continue;
            }

            match self.settle().await {
                Wake::Ready => {}
                Wake::Interrupted => continue,
                Wake::Closed => break,
            }

            let snapshot = self.feed.borrow_and_update().clone();
            pending = false;
            if snapshot.position.is_none() {
                continue;
            }

            match self.run_pass(&snapshot).await {
                Wake::Ready => {}
                Wake::Interrupted => pending = true,
                Wake::Closed => break,
            }
        }

        debug!("[SEARCH] Coordinator stopped");
    }

    fn publish(&self, suggestion: Suggestion) {
        self.out.send_if_modified(|current| {
            if *current == suggestion {
                false
            } else {
                *current = suggestion;
                true
            }
        });
    }

    /// Wait out the settle delay, restarting it on every position change
    async fn settle(&mut self) -> Wake {
        let sleep = tokio::time::sleep(self.settle);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Wake::Ready,
                changed = self.feed.changed() => {
                    if changed.is_err() {
                        return Wake::Closed;
                    }
                    self.publish(Suggestion::default());
                    sleep.as_mut().reset(Instant::now() + self.settle);
                }
                changed = self.switch.changed() => {
                    if changed.is_err() {
                        return Wake::Closed;
                    }
                    if !*self.switch.borrow() {
                        return Wake::Interrupted;
                    }
                }
            }
        }
    }

    /// Search one snapshot, cancelling on any change but always letting the
    /// pass finish its undo
    async fn run_pass(&mut self, snapshot: &PositionSnapshot) -> Wake {
        let token = CancelToken::new();
        let probe_feed = self.feed.clone();
        let started = Instant::now();
        let mut wake = Wake::Ready;

        self.publish(Suggestion::calculating());
        debug!("[SEARCH] Pass started (generation {})", snapshot.generation);

        let result = {
            let pass = search_pass(
                self.engine.as_ref(),
                &self.lease,
                snapshot,
                &probe_feed,
                &token,
            );
            tokio::pin!(pass);

            loop {
                tokio::select! {
                    result = &mut pass => break result,
                    changed = self.feed.changed(), if matches!(wake, Wake::Ready) => {
                        token.cancel();
                        wake = if changed.is_err() { Wake::Closed } else { Wake::Interrupted };
                    }
                    changed = self.switch.changed(), if matches!(wake, Wake::Ready) => {
                        if changed.is_err() {
                            token.cancel();
                            wake = Wake::Closed;
                        } else if !*self.switch.borrow() {
                            token.cancel();
                            wake = Wake::Interrupted;
                        }
                    }
                }
            }
        };

        match (result, wake) {
            (_, Wake::Closed) => Wake::Closed,
            (Ok(PassOutcome::Cancelled), _) | (_, Wake::Interrupted) => {
                debug!("[SEARCH] Pass cancelled");
                self.publish(Suggestion::default());
                Wake::Interrupted
            }
            (Ok(PassOutcome::Finished(best)), Wake::Ready) => {
                match &best {
                    Some(best) => info!(
                        "[SEARCH] Best move {} ({:+}) in {:?}",
                        best.mv.to_uci(),
                        best.evaluation,
                        started.elapsed()
                    ),
                    None => info!("[SEARCH] No move to suggest"),
                }
                self.publish(Suggestion::finished(best));
                Wake::Ready
            }
            (Err(e), Wake::Ready) => {
                warn!("[SEARCH] Pass aborted: {}", e);
                self.publish(Suggestion::failed(e.to_string()));
                Wake::Ready
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fen::STARTING_FEN;
    use crate::engine::{
        EngineError, EngineHandle, GameStatus, MoveAnalysis, PieceKind, Position, ScriptedBackend,
        Square,
    };
    use crate::game::ai::feed::{PositionFeed, SuggestionSwitch};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CAPTURE_FEN: &str = "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1";
    const BLACK_FEN: &str = "4k3/8/8/3p4/4P3/8/8/4K3 b - - 0 1";

    fn snapshot_of(feed: &PositionFeed, engine_position: Position) -> PositionSnapshot {
        feed.publish(engine_position);
        feed.subscribe().borrow().clone()
    }

    /// Runs `hook` once `after` evaluations have been answered
    struct HookAfter {
        inner: EngineHandle,
        hook: Box<dyn Fn() + Send + Sync>,
        after: usize,
        evaluations: AtomicUsize,
    }

    impl HookAfter {
        fn new(inner: EngineHandle, after: usize, hook: impl Fn() + Send + Sync + 'static) -> Self {
            Self {
                inner,
                hook: Box::new(hook),
                after,
                evaluations: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChessEngine for HookAfter {
        async fn new_game(&self) -> EngineResult<()> {
            self.inner.new_game().await
        }
        async fn load_fen(&self, fen: &str) -> EngineResult<Position> {
            self.inner.load_fen(fen).await
        }
        async fn board_state(&self) -> EngineResult<Position> {
            self.inner.board_state().await
        }
        async fn game_status(&self) -> EngineResult<GameStatus> {
            self.inner.game_status().await
        }
        async fn legal_moves(&self) -> EngineResult<Vec<Move>> {
            self.inner.legal_moves().await
        }
        async fn legal_moves_for_square(&self, square: Square) -> EngineResult<Vec<Move>> {
            self.inner.legal_moves_for_square(square).await
        }
        async fn make_move(
            &self,
            from: Square,
            to: Square,
            promotion: Option<PieceKind>,
        ) -> EngineResult<GameStatus> {
            self.inner.make_move(from, to, promotion).await
        }
        async fn undo_move(&self) -> EngineResult<GameStatus> {
            self.inner.undo_move().await
        }
        async fn fen(&self) -> EngineResult<String> {
            self.inner.fen().await
        }
        async fn evaluate_position(&self) -> EngineResult<i32> {
            let score = self.inner.evaluate_position().await;
            if self.evaluations.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
                (self.hook)();
            }
            score
        }
        async fn analyze_move(
            &self,
            from: Square,
            to: Square,
            promotion: Option<PieceKind>,
        ) -> EngineResult<MoveAnalysis> {
            self.inner.analyze_move(from, to, promotion).await
        }
        async fn analyze_all_legal_moves(&self) -> EngineResult<Vec<MoveAnalysis>> {
            self.inner.analyze_all_legal_moves().await
        }
    }

    #[test]
    fn test_best_of_first_maximum_wins() {
        //! Ties resolve to the earliest candidate
        let mv = |uci| Move::from_uci(uci).unwrap();
        let candidates = [
            EvaluatedMove { mv: mv("a2a3"), evaluation: 10 },
            EvaluatedMove { mv: mv("b2b3"), evaluation: 40 },
            EvaluatedMove { mv: mv("c2c3"), evaluation: 40 },
        ];
        assert_eq!(best_of(&candidates).unwrap().mv, mv("b2b3"));
        assert_eq!(best_of(&[]), None);
    }

    #[tokio::test]
    async fn test_pass_finds_capture_and_restores_position() {
        //! The capture wins and the engine ends where it started
        let backend = ScriptedBackend::from_fen(CAPTURE_FEN)
            .unwrap()
            .with_uci_moves(CAPTURE_FEN, &["e4e5", "e4d5", "e1d1"])
            .unwrap();
        let log = backend.log();
        let engine = EngineHandle::spawn(backend);
        let lease = EngineLease::new();
        let feed = PositionFeed::new();
        let before = engine.board_state().await.unwrap();
        let snapshot = snapshot_of(&feed, before.clone());

        let outcome = search_pass(&engine, &lease, &snapshot, &feed.subscribe(), &CancelToken::new())
            .await
            .unwrap();

        let PassOutcome::Finished(Some(best)) = outcome else {
            panic!("expected a best move, got {outcome:?}");
        };
        assert_eq!(best.mv.to_uci(), "e4d5");
        assert_eq!(best.evaluation, 100);
        assert_eq!(engine.board_state().await.unwrap(), before);
        assert_eq!(log.count("make_move"), 3);
        assert_eq!(log.count("undo_move"), 3);
    }

    #[tokio::test]
    async fn test_black_to_move_negates() {
        //! With Black to move the capture is still the best move
        let backend = ScriptedBackend::from_fen(BLACK_FEN)
            .unwrap()
            .with_uci_moves(BLACK_FEN, &["d5d4", "d5e4", "e8d8"])
            .unwrap();
        let engine = EngineHandle::spawn(backend);
        let lease = EngineLease::new();
        let feed = PositionFeed::new();
        let snapshot = snapshot_of(&feed, engine.board_state().await.unwrap());

        let outcome = search_pass(&engine, &lease, &snapshot, &feed.subscribe(), &CancelToken::new())
            .await
            .unwrap();

        let PassOutcome::Finished(Some(best)) = outcome else {
            panic!("expected a best move, got {outcome:?}");
        };
        assert_eq!(best.mv.to_uci(), "d5e4");
        // White-relative material after the capture is -100
        assert_eq!(best.evaluation, 100);
    }

    #[tokio::test]
    async fn test_ties_pick_first_enumerated() {
        //! Equal evaluations keep the first candidate
        let backend = ScriptedBackend::new()
            .with_uci_moves(STARTING_FEN, &["g1f3", "e2e4", "d2d4"])
            .unwrap();
        let engine = EngineHandle::spawn(backend);
        let lease = EngineLease::new();
        let feed = PositionFeed::new();
        let snapshot = snapshot_of(&feed, Position::default());

        let outcome = search_pass(&engine, &lease, &snapshot, &feed.subscribe(), &CancelToken::new())
            .await
            .unwrap();
        let PassOutcome::Finished(Some(best)) = outcome else {
            panic!("expected a best move, got {outcome:?}");
        };
        assert_eq!(best.mv.to_uci(), "g1f3");
    }

    #[tokio::test]
    async fn test_no_legal_moves_is_no_suggestion() {
        //! A position without moves finishes with nothing to suggest
        let engine = EngineHandle::spawn(ScriptedBackend::new());
        let lease = EngineLease::new();
        let feed = PositionFeed::new();
        let snapshot = snapshot_of(&feed, Position::default());

        let outcome = search_pass(&engine, &lease, &snapshot, &feed.subscribe(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, PassOutcome::Finished(None));
    }

    #[tokio::test]
    async fn test_cancel_mid_pass_undoes_probe() {
        //! Cancellation during a probe still undoes it, then stops
        let backend = ScriptedBackend::from_fen(CAPTURE_FEN)
            .unwrap()
            .with_uci_moves(CAPTURE_FEN, &["e4e5", "e4d5", "e1d1"])
            .unwrap();
        let log = backend.log();
        let token = CancelToken::new();
        let trigger = token.clone();
        let engine = HookAfter::new(EngineHandle::spawn(backend), 1, move || trigger.cancel());
        let lease = EngineLease::new();
        let feed = PositionFeed::new();
        let before = engine.board_state().await.unwrap();
        let snapshot = snapshot_of(&feed, before.clone());

        let outcome = search_pass(&engine, &lease, &snapshot, &feed.subscribe(), &token)
            .await
            .unwrap();

        assert_eq!(outcome, PassOutcome::Cancelled);
        assert_eq!(log.count("make_move"), 1);
        assert_eq!(log.count("undo_move"), 1);
        assert_eq!(engine.board_state().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_stale_generation_cancels() {
        //! A newer snapshot on the feed stops the pass before probing
        let backend = ScriptedBackend::new()
            .with_uci_moves(STARTING_FEN, &["e2e4"])
            .unwrap();
        let log = backend.log();
        let engine = EngineHandle::spawn(backend);
        let lease = EngineLease::new();
        let feed = PositionFeed::new();
        let snapshot = snapshot_of(&feed, Position::default());
        feed.publish(Position::default());

        let outcome = search_pass(&engine, &lease, &snapshot, &feed.subscribe(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, PassOutcome::Cancelled);
        assert_eq!(log.count("get_legal_moves"), 0);
    }

    #[tokio::test]
    async fn test_evaluation_failure_still_undoes() {
        //! An engine failure aborts the pass after restoring the position
        let backend = ScriptedBackend::new()
            .with_uci_moves(STARTING_FEN, &["e2e4", "d2d4"])
            .unwrap();
        let log = backend.log();
        log.fail("evaluate_position", EngineError::unavailable("evaluator crashed"));
        let engine = EngineHandle::spawn(backend);
        let lease = EngineLease::new();
        let feed = PositionFeed::new();
        let snapshot = snapshot_of(&feed, Position::default());

        let result =
            search_pass(&engine, &lease, &snapshot, &feed.subscribe(), &CancelToken::new()).await;

        assert!(matches!(result, Err(EngineError::EngineUnavailable { .. })));
        assert_eq!(log.count("make_move"), 1);
        assert_eq!(log.count("undo_move"), 1);
        assert_eq!(engine.board_state().await.unwrap(), Position::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_restarts_on_change() {
        //! Each change restarts the settle delay; only the last one is searched
        let backend = ScriptedBackend::new()
            .with_uci_moves(STARTING_FEN, &["e2e4"])
            .unwrap();
        let log = backend.log();
        let engine: Arc<dyn ChessEngine> = Arc::new(EngineHandle::spawn(backend));
        let feed = PositionFeed::new();
        let switch = SuggestionSwitch::new(true);
        feed.publish(Position::default());

        let (coordinator, mut suggestions) = BestMoveCoordinator::new(
            engine,
            EngineLease::new(),
            feed.subscribe(),
            switch.subscribe(),
            Duration::from_millis(500),
        );
        let start = Instant::now();
        let _task = coordinator.spawn();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(log.count("get_legal_moves"), 0);
        feed.publish(Position::default());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(log.count("get_legal_moves"), 0);

        let suggestion = suggestions
            .wait_for(|s| s.best.is_some())
            .await
            .unwrap()
            .clone();
        assert!(start.elapsed() >= Duration::from_millis(800));
        assert_eq!(suggestion.best.unwrap().mv.to_uci(), "e2e4");
        assert!(!suggestion.is_calculating);
        assert_eq!(log.count("get_legal_moves"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_switch_never_searches() {
        //! Nothing is probed while suggestions are off
        let backend = ScriptedBackend::new()
            .with_uci_moves(STARTING_FEN, &["e2e4"])
            .unwrap();
        let log = backend.log();
        let engine: Arc<dyn ChessEngine> = Arc::new(EngineHandle::spawn(backend));
        let feed = PositionFeed::new();
        let switch = SuggestionSwitch::new(false);
        feed.publish(Position::default());

        let (coordinator, suggestions) = BestMoveCoordinator::new(
            engine,
            EngineLease::new(),
            feed.subscribe(),
            switch.subscribe(),
            Duration::from_millis(500),
        );
        let _task = coordinator.spawn();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(log.count("get_legal_moves"), 0);
        assert_eq!(*suggestions.borrow(), Suggestion::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_off_mid_pass_cancels() {
        //! Disabling during a pass stops it cleanly; enabling again waits out the settle delay
        let backend = ScriptedBackend::new()
            .with_uci_moves(STARTING_FEN, &["e2e4", "d2d4", "g1f3"])
            .unwrap();
        let log = backend.log();
        let switch = Arc::new(SuggestionSwitch::new(true));
        let flip = switch.clone();
        let engine: Arc<dyn ChessEngine> = Arc::new(HookAfter::new(
            EngineHandle::spawn(backend),
            1,
            move || flip.set(false),
        ));
        let feed = PositionFeed::new();
        feed.publish(Position::default());

        let (coordinator, mut suggestions) = BestMoveCoordinator::new(
            engine.clone(),
            EngineLease::new(),
            feed.subscribe(),
            switch.subscribe(),
            Duration::from_millis(500),
        );
        let _task = coordinator.spawn();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!switch.is_enabled());
        assert_eq!(log.count("get_legal_moves"), 1);
        assert!(log.count("make_move") < 3, "pass ran to completion");
        assert_eq!(log.count("make_move"), log.count("undo_move"));
        assert_eq!(engine.board_state().await.unwrap(), Position::default());
        assert_eq!(*suggestions.borrow_and_update(), Suggestion::default());

        let enabled_at = Instant::now();
        switch.set(true);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(log.count("get_legal_moves"), 1);

        let suggestion = suggestions
            .wait_for(|s| s.best.is_some())
            .await
            .unwrap()
            .clone();
        assert!(enabled_at.elapsed() >= Duration::from_millis(500));
        assert_eq!(suggestion.best.unwrap().mv.to_uci(), "e2e4");
        assert_eq!(log.count("get_legal_moves"), 2);
        assert_eq!(log.count("make_move"), log.count("undo_move"));
    }
}
