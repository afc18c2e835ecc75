//! Deterministic in-memory engine backend
//!
//! `ScriptedBackend` stands in for the real rules engine in tests and headless
//! demos. It does not know the rules of chess: the legal moves, statuses and
//! (optionally) evaluations of each position are scripted up front, keyed by
//! the position's piece placement and side to move. What it does do is keep a
//! real position snapshot, apply scripted moves to it (including promotion,
//! en-passant removal and the castling rook hop), and maintain an undo stack,
//! so callers observe the same command semantics as with the real engine.
//!
//! Every command received is appended to a shared [`CommandLog`], which tests
//! use to count calls and to inject failures.

use crate::engine::channel::{EngineBackend, EngineCommand, EngineReply};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::fen::{parse_fen, placement, to_fen};
use crate::engine::types::{
    Color, GameStatus, Move, MoveAnalysis, MoveCategory, PieceKind, Position, Square,
};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Centipawn value used for material evaluation and capture analysis
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}

/// Material balance from White's perspective
pub fn material_balance(position: &Position) -> i32 {
    position
        .board
        .pieces()
        .map(|(_, kind, color)| match color {
            Color::White => piece_value(kind),
            Color::Black => -piece_value(kind),
        })
        .sum()
}

#[derive(Default)]
struct LogState {
    commands: Vec<EngineCommand>,
    failures: HashMap<&'static str, EngineError>,
}

/// Shared record of the commands a [`ScriptedBackend`] has received
///
/// Also carries failure injection: a command name registered with
/// [`CommandLog::fail`] is answered with the given error until healed.
#[derive(Clone, Default)]
pub struct CommandLog {
    inner: Arc<Mutex<LogState>>,
}

impl CommandLog {
    pub fn commands(&self) -> Vec<EngineCommand> {
        self.inner.lock().commands.clone()
    }

    /// Number of received commands with the given name (e.g. `"make_move"`)
    pub fn count(&self, name: &str) -> usize {
        self.inner
            .lock()
            .commands
            .iter()
            .filter(|c| c.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.inner.lock().commands.clear();
    }

    pub fn fail(&self, name: &'static str, error: EngineError) {
        self.inner.lock().failures.insert(name, error);
    }

    pub fn heal(&self, name: &str) {
        self.inner.lock().failures.remove(name);
    }

    fn record(&self, command: &EngineCommand) -> Option<EngineError> {
        let mut state = self.inner.lock();
        state.commands.push(command.clone());
        state.failures.get(command.name()).cloned()
    }
}

#[derive(Default)]
struct Script {
    moves: HashMap<String, Vec<Move>>,
    statuses: HashMap<String, GameStatus>,
    evaluations: HashMap<String, i32>,
}

/// In-memory [`EngineBackend`] driven by a scripted move table
pub struct ScriptedBackend {
    position: Position,
    status: GameStatus,
    undo_stack: Vec<(Position, GameStatus)>,
    script: Script,
    log: CommandLog,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Script key: piece placement plus side to move
fn key_of(position: &Position) -> String {
    let side = if position.side_to_move.is_white() { "w" } else { "b" };
    format!("{} {}", placement(&position.board), side)
}

fn key_of_fen(fen: &str) -> EngineResult<String> {
    parse_fen(fen).map(|position| key_of(&position))
}

impl ScriptedBackend {
    /// Backend sitting on the standard starting position with nothing scripted
    pub fn new() -> Self {
        Self {
            position: Position::default(),
            status: GameStatus::InProgress,
            undo_stack: Vec::new(),
            script: Script::default(),
            log: CommandLog::default(),
        }
    }

    /// Backend sitting on an arbitrary position
    pub fn from_fen(fen: &str) -> EngineResult<Self> {
        let mut backend = Self::new();
        backend.position = parse_fen(fen)?;
        Ok(backend)
    }

    /// Script the legal moves of the position described by `fen`
    pub fn with_moves(mut self, fen: &str, moves: Vec<Move>) -> EngineResult<Self> {
        self.script.moves.insert(key_of_fen(fen)?, moves);
        Ok(self)
    }

    /// Script legal moves given in long algebraic notation
    pub fn with_uci_moves(self, fen: &str, moves: &[&str]) -> EngineResult<Self> {
        let moves = moves
            .iter()
            .map(|uci| Move::from_uci(uci))
            .collect::<EngineResult<Vec<_>>>()?;
        self.with_moves(fen, moves)
    }

    /// Script the status reported once the position described by `fen` is reached
    pub fn with_status(mut self, fen: &str, status: GameStatus) -> EngineResult<Self> {
        let key = key_of_fen(fen)?;
        if key == key_of(&self.position) {
            self.status = status;
        }
        self.script.statuses.insert(key, status);
        Ok(self)
    }

    /// Override the material evaluation of one position
    pub fn with_evaluation(mut self, fen: &str, score: i32) -> EngineResult<Self> {
        self.script.evaluations.insert(key_of_fen(fen)?, score);
        Ok(self)
    }

    /// Handle to the command log, valid after the backend is moved into a task
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    fn status_of(&self, position: &Position) -> GameStatus {
        self.script
            .statuses
            .get(&key_of(position))
            .copied()
            .unwrap_or(GameStatus::InProgress)
    }

    fn legal_moves(&self) -> Vec<Move> {
        self.script
            .moves
            .get(&key_of(&self.position))
            .cloned()
            .unwrap_or_default()
    }

    fn find_legal(
        &self,
        from: &str,
        to: &str,
        promotion: Option<&str>,
    ) -> EngineResult<Move> {
        let from_sq = Square::from_algebraic(from)?;
        let to_sq = Square::from_algebraic(to)?;
        let promotion_kind = promotion.map(PieceKind::from_promotion_name).transpose()?;

        self.legal_moves()
            .into_iter()
            .find(|m| m.from == from_sq && m.to == to_sq && m.promotion == promotion_kind)
            .ok_or_else(|| {
                EngineError::illegal_move(format!(
                    "{from} to {to}{}",
                    promotion
                        .map(|p| format!(" (promotion: {p})"))
                        .unwrap_or_default()
                ))
            })
    }

    fn evaluate(&self, position: &Position) -> i32 {
        self.script
            .evaluations
            .get(&key_of(position))
            .copied()
            .unwrap_or_else(|| material_balance(position))
    }

    fn analyze(&self, mv: &Move) -> EngineResult<MoveAnalysis> {
        let captured_piece = if mv.is_en_passant {
            Some(PieceKind::Pawn)
        } else {
            self.position.board.get(mv.to).map(|(kind, _)| kind)
        };
        let after = apply_move(&self.position, mv)?;
        let is_check = matches!(
            self.status_of(&after),
            GameStatus::Check | GameStatus::Checkmate { .. }
        );
        let is_capture = captured_piece.is_some();

        Ok(MoveAnalysis {
            move_data: *mv,
            is_capture,
            is_check,
            captured_piece,
            category: MoveCategory::classify(mv, is_capture, is_check),
            material_change: captured_piece.map_or(0, piece_value),
        })
    }
}

impl EngineBackend for ScriptedBackend {
    fn execute(&mut self, command: EngineCommand) -> EngineResult<EngineReply> {
        if let Some(error) = self.log.record(&command) {
            return Err(error);
        }

        match command {
            EngineCommand::NewGame => {
                self.position = Position::default();
                self.status = self.status_of(&self.position);
                self.undo_stack.clear();
                Ok(EngineReply::Done)
            }
            EngineCommand::LoadFen { fen } => {
                self.position = parse_fen(&fen)?;
                self.status = self.status_of(&self.position);
                self.undo_stack.clear();
                Ok(EngineReply::Position(self.position.clone()))
            }
            EngineCommand::GetBoardState => Ok(EngineReply::Position(self.position.clone())),
            EngineCommand::GetGameStatus => Ok(EngineReply::Status(self.status)),
            EngineCommand::GetLegalMoves => Ok(EngineReply::Moves(self.legal_moves())),
            EngineCommand::GetLegalMovesForSquare { square } => {
                let square = Square::from_algebraic(&square)?;
                let moves = self
                    .legal_moves()
                    .into_iter()
                    .filter(|m| m.from == square)
                    .collect();
                Ok(EngineReply::Moves(moves))
            }
            EngineCommand::MakeMove {
                from,
                to,
                promotion,
            } => {
                let mv = self.find_legal(&from, &to, promotion.as_deref())?;
                let next = apply_move(&self.position, &mv)?;
                let previous = std::mem::replace(&mut self.position, next);
                self.undo_stack.push((previous, self.status));
                self.status = self.status_of(&self.position);
                Ok(EngineReply::Status(self.status))
            }
            EngineCommand::UndoMove => {
                let (position, status) = self.undo_stack.pop().ok_or(EngineError::NoHistory)?;
                self.position = position;
                self.status = status;
                Ok(EngineReply::Status(self.status))
            }
            EngineCommand::GetFen => Ok(EngineReply::Fen(to_fen(&self.position))),
            EngineCommand::EvaluatePosition => {
                Ok(EngineReply::Evaluation(self.evaluate(&self.position)))
            }
            EngineCommand::AnalyzeMove {
                from,
                to,
                promotion,
            } => {
                let mv = self.find_legal(&from, &to, promotion.as_deref())?;
                Ok(EngineReply::Analysis(self.analyze(&mv)?))
            }
            EngineCommand::AnalyzeAllLegalMoves => {
                let analyses = self
                    .legal_moves()
                    .iter()
                    .map(|mv| self.analyze(mv))
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(EngineReply::Analyses(analyses))
            }
        }
    }
}

/// Relocate pieces for `mv` and update the bookkeeping fields
fn apply_move(position: &Position, mv: &Move) -> EngineResult<Position> {
    let (kind, color) = position
        .board
        .get(mv.from)
        .ok_or_else(|| EngineError::illegal_move(format!("no piece on {}", mv.from)))?;
    let mut next = position.clone();
    let captured = next.board.get(mv.to);

    next.board.set(mv.from, None);
    if mv.is_en_passant {
        if let Some(victim) = Square::from_rank_file(mv.from.rank(), mv.to.file()) {
            next.board.set(victim, None);
        }
    }
    if mv.is_castling {
        let rank = mv.from.rank();
        let (rook_from, rook_to) = if mv.to.file() > mv.from.file() { (7, 5) } else { (0, 3) };
        if let (Some(rf), Some(rt)) = (
            Square::from_rank_file(rank, rook_from),
            Square::from_rank_file(rank, rook_to),
        ) {
            let rook = next.board.get(rf);
            next.board.set(rf, None);
            next.board.set(rt, rook);
        }
    }
    next.board
        .set(mv.to, Some((mv.promotion.unwrap_or(kind), color)));

    let rights = &mut next.castling_rights;
    if kind == PieceKind::King {
        match color {
            Color::White => {
                rights.white_kingside = false;
                rights.white_queenside = false;
            }
            Color::Black => {
                rights.black_kingside = false;
                rights.black_queenside = false;
            }
        }
    }
    for corner in [mv.from, mv.to] {
        match corner.index() {
            0 => rights.white_queenside = false,
            7 => rights.white_kingside = false,
            56 => rights.black_queenside = false,
            63 => rights.black_kingside = false,
            _ => {}
        }
    }

    let double_push = kind == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2;
    next.en_passant_target = if double_push {
        Square::from_rank_file((mv.from.rank() + mv.to.rank()) / 2, mv.from.file())
    } else {
        None
    };

    if kind == PieceKind::Pawn || captured.is_some() || mv.is_en_passant {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock += 1;
    }
    if color == Color::Black {
        next.fullmove_number += 1;
    }
    next.side_to_move = color.opposite();

    let mut hasher = DefaultHasher::new();
    key_of(&next).hash(&mut hasher);
    next.position_history.push(hasher.finish());

    Ok(next)
}
