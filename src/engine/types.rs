//! Wire types shared with the rules engine
//!
//! Positions, moves and statuses are snapshots produced by the engine. The
//! interaction core only ever holds read-only copies of them, refreshed after
//! each command.
//!
//! # Coordinate System
//!
//! Squares are addressed internally by a zero-based index 0-63 where
//! `index = rank * 8 + file` (a1 = 0, h1 = 7, a8 = 56, h8 = 63). At the
//! boundary they are written in algebraic notation (`"e4"`).

use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Side to move / piece owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn is_white(self) -> bool {
        self == Color::White
    }
}

/// Piece kind without color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename = "Piece")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// All kinds in ascending material order
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Parse the promotion piece name accepted by the engine's move command
    ///
    /// Case-insensitive; only the four promotable kinds are accepted.
    pub fn from_promotion_name(name: &str) -> EngineResult<PieceKind> {
        match name.to_ascii_lowercase().as_str() {
            "queen" => Ok(PieceKind::Queen),
            "rook" => Ok(PieceKind::Rook),
            "bishop" => Ok(PieceKind::Bishop),
            "knight" => Ok(PieceKind::Knight),
            _ => Err(EngineError::invalid_input(format!(
                "invalid promotion piece: {name}; must be queen, rook, bishop or knight"
            ))),
        }
    }

    /// Name used when sending a promotion choice to the engine
    pub fn promotion_name(self) -> Option<&'static str> {
        match self {
            PieceKind::Queen => Some("queen"),
            PieceKind::Rook => Some("rook"),
            PieceKind::Bishop => Some("bishop"),
            PieceKind::Knight => Some("knight"),
            PieceKind::Pawn | PieceKind::King => None,
        }
    }

    /// Lowercase FEN letter
    pub fn fen_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_fen_char(c: char) -> Option<(PieceKind, Color)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some((kind, color))
    }
}

/// A board square, index 0-63
///
/// Deserializing checks the range, so a square read from an engine reply is
/// always safe to index a [`Board`] with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSquare")]
pub struct Square {
    index: u8,
}

/// Unchecked wire form of [`Square`]
#[derive(Deserialize)]
struct RawSquare {
    index: u8,
}

impl TryFrom<RawSquare> for Square {
    type Error = EngineError;

    fn try_from(raw: RawSquare) -> EngineResult<Square> {
        Square::new(raw.index).ok_or_else(|| {
            EngineError::invalid_input(format!("square index out of range: {}", raw.index))
        })
    }
}

impl Square {
    pub fn new(index: u8) -> Option<Square> {
        (index < 64).then_some(Square { index })
    }

    pub fn from_rank_file(rank: u8, file: u8) -> Option<Square> {
        (rank < 8 && file < 8).then(|| Square {
            index: rank * 8 + file,
        })
    }

    /// Parse algebraic notation (`"e4"`)
    pub fn from_algebraic(s: &str) -> EngineResult<Square> {
        let invalid = || EngineError::invalid_input(format!("invalid square: {s}"));
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };
        let file = match file {
            'a'..='h' => file as u8 - b'a',
            _ => return Err(invalid()),
        };
        let rank = match rank {
            '1'..='8' => rank as u8 - b'1',
            _ => return Err(invalid()),
        };
        Ok(Square {
            index: rank * 8 + file,
        })
    }

    pub fn to_algebraic(self) -> String {
        self.to_string()
    }

    pub fn index(self) -> u8 {
        self.index
    }

    pub fn file(self) -> u8 {
        self.index % 8
    }

    pub fn rank(self) -> u8 {
        self.index / 8
    }

    /// True for the first and last ranks, where pawns promote
    pub fn is_back_rank(self) -> bool {
        matches!(self.rank(), 0 | 7)
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(|index| Square { index })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{file}{rank}")
    }
}

/// 64-entry board map of optional (kind, color) pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<(PieceKind, Color)>; 64],
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.squares.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let squares: Vec<Option<(PieceKind, Color)>> = Vec::deserialize(deserializer)?;
        let squares: [Option<(PieceKind, Color)>; 64] =
            squares.try_into().map_err(|v: Vec<_>| {
                serde::de::Error::custom(format!("expected 64 squares, got {}", v.len()))
            })?;
        Ok(Board { squares })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Board {
            squares: [None; 64],
        }
    }

    pub fn initial() -> Self {
        const BACK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = Board::empty();
        for (file, kind) in BACK.iter().enumerate() {
            board.squares[file] = Some((*kind, Color::White));
            board.squares[8 + file] = Some((PieceKind::Pawn, Color::White));
            board.squares[48 + file] = Some((PieceKind::Pawn, Color::Black));
            board.squares[56 + file] = Some((*kind, Color::Black));
        }
        board
    }

    pub fn get(&self, square: Square) -> Option<(PieceKind, Color)> {
        self.squares[square.index() as usize]
    }

    pub fn set(&mut self, square: Square, piece: Option<(PieceKind, Color)>) {
        self.squares[square.index() as usize] = piece;
    }

    /// Occupied squares with their pieces, a1 first
    pub fn pieces(&self) -> impl Iterator<Item = (Square, PieceKind, Color)> + '_ {
        Square::all().filter_map(|sq| self.get(sq).map(|(kind, color)| (sq, kind, color)))
    }

    pub fn count(&self, kind: PieceKind, color: Color) -> u32 {
        self.pieces()
            .filter(|(_, k, c)| *k == kind && *c == color)
            .count() as u32
    }
}

/// Four independent castling flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }
}

/// Immutable position snapshot returned by the engine
///
/// `position_history` is the engine's repetition trail. Its values are
/// opaque hashes and are never used for arithmetic here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub board: Board,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    #[serde(default)]
    pub position_history: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            board: Board::initial(),
            side_to_move: Color::White,
            castling_rights: CastlingRights::all(),
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            position_history: Vec::new(),
        }
    }
}

impl Position {
    pub fn piece_at(&self, square: Square) -> Option<(PieceKind, Color)> {
        self.board.get(square)
    }

    /// True if `square` holds a piece belonging to the side to move
    pub fn is_own_piece(&self, square: Square) -> bool {
        matches!(self.board.get(square), Some((_, color)) if color == self.side_to_move)
    }
}

/// A move as enumerated by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub is_castling: bool,
    pub is_en_passant: bool,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
            is_castling: false,
            is_en_passant: false,
        }
    }

    pub fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// Parse long algebraic notation (`e2e4`, `e7e8q`)
    ///
    /// Castling and en-passant flags cannot be inferred from the text and are
    /// left unset.
    pub fn from_uci(uci: &str) -> EngineResult<Move> {
        let invalid = || EngineError::invalid_input(format!("invalid move: {uci}"));
        let (from, rest) = uci.split_at_checked(2).ok_or_else(invalid)?;
        let (to, promo) = rest.split_at_checked(2).ok_or_else(invalid)?;
        let mut mv = Move::new(Square::from_algebraic(from)?, Square::from_algebraic(to)?);
        match promo.chars().next() {
            None => {}
            Some(c) if promo.len() == 1 => {
                let kind = match c {
                    'q' => PieceKind::Queen,
                    'r' => PieceKind::Rook,
                    'b' => PieceKind::Bishop,
                    'n' => PieceKind::Knight,
                    _ => return Err(invalid()),
                };
                mv.promotion = Some(kind);
            }
            Some(_) => return Err(invalid()),
        }
        Ok(mv)
    }

    /// Long algebraic notation: `e2e4`, `e7e8q`
    pub fn to_uci(&self) -> String {
        let mut uci = format!("{}{}", self.from, self.to);
        if let Some(kind) = self.promotion {
            uci.push(kind.fen_char());
        }
        uci
    }
}

/// Game status reported after every command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate { winner: Color },
    Stalemate,
    DrawByFiftyMoveRule,
    DrawByInsufficientMaterial,
    DrawByRepetition,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            GameStatus::InProgress | GameStatus::Check => false,
            GameStatus::Checkmate { .. }
            | GameStatus::Stalemate
            | GameStatus::DrawByFiftyMoveRule
            | GameStatus::DrawByInsufficientMaterial
            | GameStatus::DrawByRepetition => true,
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameStatus::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }
}

/// Coarse move category reported by the engine's analysis command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MoveCategory {
    Quiet,
    Capture,
    Check,
    CheckCapture,
    Castle,
    Promotion,
    PromotionCapture,
    EnPassant,
}

impl MoveCategory {
    /// Special moves take precedence over capture/check combinations
    pub fn classify(mv: &Move, is_capture: bool, is_check: bool) -> MoveCategory {
        if mv.is_castling {
            return MoveCategory::Castle;
        }
        if mv.is_en_passant {
            return MoveCategory::EnPassant;
        }
        if mv.promotion.is_some() {
            return if is_capture {
                MoveCategory::PromotionCapture
            } else {
                MoveCategory::Promotion
            };
        }
        match (is_capture, is_check) {
            (true, true) => MoveCategory::CheckCapture,
            (true, false) => MoveCategory::Capture,
            (false, true) => MoveCategory::Check,
            (false, false) => MoveCategory::Quiet,
        }
    }
}

/// Per-move analysis returned by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAnalysis {
    pub move_data: Move,
    pub is_capture: bool,
    pub is_check: bool,
    pub captured_piece: Option<PieceKind>,
    pub category: MoveCategory,
    /// Material gained by the mover, in centipawns
    pub material_change: i32,
}
