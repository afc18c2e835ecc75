//! Command-channel client for the rules engine
//!
//! Commands are serializable messages sent over a tokio `mpsc` channel to a
//! single engine task. The task owns an [`EngineBackend`] and answers each
//! command over a `oneshot` reply channel, one at a time and in arrival order.
//!
//! A closed command channel or a dropped reply surfaces as
//! [`EngineError::EngineUnavailable`]. No timeouts are applied: a hung backend
//! stalls only the callers waiting on it.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{GameStatus, Move, MoveAnalysis, PieceKind, Position, Square};
use crate::engine::ChessEngine;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// Queue depth of the command channel
const COMMAND_BUFFER: usize = 32;

/// Commands understood by the engine
///
/// Squares travel in algebraic notation and promotion pieces by name, the
/// same shape the engine's IPC layer accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum EngineCommand {
    NewGame,
    LoadFen {
        fen: String,
    },
    GetBoardState,
    GetGameStatus,
    GetLegalMoves,
    GetLegalMovesForSquare {
        square: String,
    },
    MakeMove {
        from: String,
        to: String,
        promotion: Option<String>,
    },
    UndoMove,
    GetFen,
    EvaluatePosition,
    AnalyzeMove {
        from: String,
        to: String,
        promotion: Option<String>,
    },
    AnalyzeAllLegalMoves,
}

impl EngineCommand {
    fn make_move(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        EngineCommand::MakeMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            promotion: promotion_name(promotion),
        }
    }

    fn analyze_move(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        EngineCommand::AnalyzeMove {
            from: from.to_algebraic(),
            to: to.to_algebraic(),
            promotion: promotion_name(promotion),
        }
    }

    /// Short name used in logs and command logs
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::NewGame => "new_game",
            EngineCommand::LoadFen { .. } => "load_fen",
            EngineCommand::GetBoardState => "get_board_state",
            EngineCommand::GetGameStatus => "get_game_status",
            EngineCommand::GetLegalMoves => "get_legal_moves",
            EngineCommand::GetLegalMovesForSquare { .. } => "get_legal_moves_for_square",
            EngineCommand::MakeMove { .. } => "make_move",
            EngineCommand::UndoMove => "undo_move",
            EngineCommand::GetFen => "get_fen",
            EngineCommand::EvaluatePosition => "evaluate_position",
            EngineCommand::AnalyzeMove { .. } => "analyze_move",
            EngineCommand::AnalyzeAllLegalMoves => "analyze_all_legal_moves",
        }
    }
}

fn promotion_name(promotion: Option<PieceKind>) -> Option<String> {
    promotion
        .and_then(PieceKind::promotion_name)
        .map(str::to_string)
}

/// Successful engine answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", content = "data", rename_all = "snake_case")]
pub enum EngineReply {
    Done,
    Position(Position),
    Status(GameStatus),
    Moves(Vec<Move>),
    Fen(String),
    Evaluation(i32),
    Analysis(MoveAnalysis),
    Analyses(Vec<MoveAnalysis>),
}

/// Whatever actually executes commands on the far side of the channel
pub trait EngineBackend: Send + 'static {
    fn execute(&mut self, command: EngineCommand) -> EngineResult<EngineReply>;
}

struct Envelope {
    command: EngineCommand,
    reply: oneshot::Sender<EngineResult<EngineReply>>,
}

/// Cloneable client for an engine task
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Envelope>,
}

impl EngineHandle {
    /// Spawn the engine task on the current tokio runtime
    pub fn spawn<B: EngineBackend>(mut backend: B) -> Self {
        let (tx, mut rx) = mpsc::channel::<Envelope>(COMMAND_BUFFER);

        tokio::spawn(async move {
            debug!("[ENGINE] Engine task started");
            while let Some(Envelope { command, reply }) = rx.recv().await {
                trace!("[ENGINE] <- {}", command.name());
                let result = backend.execute(command);
                if reply.send(result).is_err() {
                    trace!("[ENGINE] Caller went away before the reply");
                }
            }
            debug!("[ENGINE] Command channel closed, engine task exiting");
        });

        Self { tx }
    }

    async fn call(&self, command: EngineCommand) -> EngineResult<EngineReply> {
        let name = command.name();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(Envelope {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| {
                warn!("[ENGINE] {} failed: command channel closed", name);
                EngineError::unavailable("command channel closed")
            })?;

        reply_rx.await.map_err(|_| {
            warn!("[ENGINE] {} failed: reply dropped", name);
            EngineError::unavailable("engine dropped the reply")
        })?
    }
}

fn unexpected(command: &str, reply: EngineReply) -> EngineError {
    EngineError::unavailable(format!("unexpected reply to {command}: {reply:?}"))
}

#[async_trait]
impl ChessEngine for EngineHandle {
    async fn new_game(&self) -> EngineResult<()> {
        match self.call(EngineCommand::NewGame).await? {
            EngineReply::Done => Ok(()),
            other => Err(unexpected("new_game", other)),
        }
    }

    async fn load_fen(&self, fen: &str) -> EngineResult<Position> {
        let command = EngineCommand::LoadFen {
            fen: fen.to_string(),
        };
        match self.call(command).await? {
            EngineReply::Position(position) => Ok(position),
            other => Err(unexpected("load_fen", other)),
        }
    }

    async fn board_state(&self) -> EngineResult<Position> {
        match self.call(EngineCommand::GetBoardState).await? {
            EngineReply::Position(position) => Ok(position),
            other => Err(unexpected("get_board_state", other)),
        }
    }

    async fn game_status(&self) -> EngineResult<GameStatus> {
        match self.call(EngineCommand::GetGameStatus).await? {
            EngineReply::Status(status) => Ok(status),
            other => Err(unexpected("get_game_status", other)),
        }
    }

    async fn legal_moves(&self) -> EngineResult<Vec<Move>> {
        match self.call(EngineCommand::GetLegalMoves).await? {
            EngineReply::Moves(moves) => Ok(moves),
            other => Err(unexpected("get_legal_moves", other)),
        }
    }

    async fn legal_moves_for_square(&self, square: Square) -> EngineResult<Vec<Move>> {
        let command = EngineCommand::GetLegalMovesForSquare {
            square: square.to_algebraic(),
        };
        match self.call(command).await? {
            EngineReply::Moves(moves) => Ok(moves),
            other => Err(unexpected("get_legal_moves_for_square", other)),
        }
    }

    async fn make_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> EngineResult<GameStatus> {
        match self
            .call(EngineCommand::make_move(from, to, promotion))
            .await?
        {
            EngineReply::Status(status) => Ok(status),
            other => Err(unexpected("make_move", other)),
        }
    }

    async fn undo_move(&self) -> EngineResult<GameStatus> {
        match self.call(EngineCommand::UndoMove).await? {
            EngineReply::Status(status) => Ok(status),
            other => Err(unexpected("undo_move", other)),
        }
    }

    async fn fen(&self) -> EngineResult<String> {
        match self.call(EngineCommand::GetFen).await? {
            EngineReply::Fen(fen) => Ok(fen),
            other => Err(unexpected("get_fen", other)),
        }
    }

    async fn evaluate_position(&self) -> EngineResult<i32> {
        match self.call(EngineCommand::EvaluatePosition).await? {
            EngineReply::Evaluation(score) => Ok(score),
            other => Err(unexpected("evaluate_position", other)),
        }
    }

    async fn analyze_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> EngineResult<MoveAnalysis> {
        match self
            .call(EngineCommand::analyze_move(from, to, promotion))
            .await?
        {
            EngineReply::Analysis(analysis) => Ok(analysis),
            other => Err(unexpected("analyze_move", other)),
        }
    }

    async fn analyze_all_legal_moves(&self) -> EngineResult<Vec<MoveAnalysis>> {
        match self.call(EngineCommand::AnalyzeAllLegalMoves).await? {
            EngineReply::Analyses(analyses) => Ok(analyses),
            other => Err(unexpected("analyze_all_legal_moves", other)),
        }
    }
}
