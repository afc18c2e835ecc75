//! Pawn promotion detection
//!
//! A move needs a promotion choice if and only if the moving piece is a pawn
//! and it lands on the first or last rank.

use crate::engine::{PieceKind, Position, Square};

/// Pieces offered in the promotion picker, most common first
pub const PROMOTION_CHOICES: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// Check if a move of `piece_kind` to `destination` results in promotion
pub fn is_promotion_move(piece_kind: PieceKind, destination: Square) -> bool {
    piece_kind == PieceKind::Pawn && destination.is_back_rank()
}

/// Promotion check against a position snapshot
///
/// Returns `false` when `origin` is empty.
pub fn requires_promotion(position: &Position, origin: Square, destination: Square) -> bool {
    position
        .piece_at(origin)
        .is_some_and(|(kind, _)| is_promotion_move(kind, destination))
}
