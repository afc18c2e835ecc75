//! Captured pieces accounting
//!
//! Captures are not tracked move by move. After every position refresh the
//! tallies are rebuilt from scratch by comparing each side's piece counts with
//! its starting complement (8 pawns, 2 rooks, 2 knights, 2 bishops, 1 queen,
//! 1 king).
//!
//! # Promotion
//!
//! A promoted pawn shows up as a missing pawn plus a surplus piece (a second
//! queen, a third knight, ...). Every piece above its starting count is
//! treated as promoted material and offsets that side's missing pawns, so the
//! promoted pawn is not reported as captured. All differences floor at zero.
//!
//! # Material Values
//!
//! Pawn 1, Knight 3, Bishop 3, Rook 5, Queen 9, King 0.

use crate::engine::{Board, Color, PieceKind};

/// Starting count of each piece kind for one side
pub fn starting_count(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 8,
        PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook => 2,
        PieceKind::Queen | PieceKind::King => 1,
    }
}

/// Captured pieces for both sides
///
/// - `white_captured`: Black pieces that White has captured
/// - `black_captured`: White pieces that Black has captured
///
/// Each list is ordered by piece kind (pawns first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPieces {
    /// Pieces captured by white (black pieces taken)
    pub white_captured: Vec<PieceKind>,
    /// Pieces captured by black (white pieces taken)
    pub black_captured: Vec<PieceKind>,
}

impl CapturedPieces {
    /// Rebuild both tallies from a board
    pub fn from_board(board: &Board) -> Self {
        Self {
            white_captured: missing_pieces(board, Color::Black),
            black_captured: missing_pieces(board, Color::White),
        }
    }

    /// Pieces of `color` that the opponent has taken
    pub fn lost_by(&self, color: Color) -> &[PieceKind] {
        match color {
            Color::White => &self.black_captured,
            Color::Black => &self.white_captured,
        }
    }

    /// Material advantage in pawn units
    ///
    /// Positive if White is ahead, negative if Black is ahead.
    pub fn material_advantage(&self) -> i32 {
        let white_score: i32 = self.white_captured.iter().map(|p| piece_value(*p)).sum();
        let black_score: i32 = self.black_captured.iter().map(|p| piece_value(*p)).sum();
        white_score - black_score
    }

    /// Clear all captured pieces (for new game)
    pub fn clear(&mut self) {
        self.white_captured.clear();
        self.black_captured.clear();
    }
}

/// Pieces of `color` missing from the board, net of promotions
fn missing_pieces(board: &Board, color: Color) -> Vec<PieceKind> {
    let mut surplus = 0u32;
    let mut missing = Vec::new();

    for kind in PieceKind::ALL {
        let count = board.count(kind, color);
        let start = starting_count(kind);
        if kind != PieceKind::Pawn {
            surplus += count.saturating_sub(start);
        }
        missing.push((kind, start.saturating_sub(count)));
    }

    let mut captured = Vec::new();
    for (kind, count) in missing {
        let count = if kind == PieceKind::Pawn {
            count.saturating_sub(surplus)
        } else {
            count
        };
        captured.extend(std::iter::repeat(kind).take(count as usize));
    }
    captured
}

/// Get the pawn-unit value of a piece
///
/// King has value 0 as it cannot be captured (game ends in checkmate).
fn piece_value(piece_type: PieceKind) -> i32 {
    match piece_type {
        PieceKind::Pawn => 1,
        PieceKind::Knight => 3,
        PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 0,
    }
}
