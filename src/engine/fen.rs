//! FEN reading and writing for position snapshots
//!
//! Used by the in-memory backend to set up positions and by callers that want
//! a compact textual key for a snapshot. Only the six standard fields are
//! supported; the repetition trail is not encoded.

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{Board, CastlingRights, Color, PieceKind, Position, Square};

/// FEN of the standard starting position
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a position snapshot
///
/// The halfmove clock and fullmove number may be omitted and default to `0`
/// and `1`. Anything else that does not match the six-field layout is
/// rejected with [`EngineError::InvalidInput`].
pub fn parse_fen(fen: &str) -> EngineResult<Position> {
    let invalid = |reason: &str| EngineError::invalid_input(format!("invalid FEN ({reason}): {fen}"));

    let fields: Vec<&str> = fen.split_whitespace().collect();
    if !(4..=6).contains(&fields.len()) {
        return Err(invalid("expected 4 to 6 fields"));
    }

    let board = parse_placement(fields[0]).ok_or_else(|| invalid("bad piece placement"))?;

    let side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return Err(invalid("bad side to move")),
    };

    let mut castling_rights = CastlingRights::default();
    if fields[2] != "-" {
        for c in fields[2].chars() {
            match c {
                'K' => castling_rights.white_kingside = true,
                'Q' => castling_rights.white_queenside = true,
                'k' => castling_rights.black_kingside = true,
                'q' => castling_rights.black_queenside = true,
                _ => return Err(invalid("bad castling rights")),
            }
        }
    }

    let en_passant_target = match fields[3] {
        "-" => None,
        square => Some(Square::from_algebraic(square).map_err(|_| invalid("bad en passant square"))?),
    };

    let halfmove_clock = match fields.get(4) {
        Some(value) => value.parse().map_err(|_| invalid("bad halfmove clock"))?,
        None => 0,
    };
    let fullmove_number = match fields.get(5) {
        Some(value) => value.parse().map_err(|_| invalid("bad fullmove number"))?,
        None => 1,
    };

    Ok(Position {
        board,
        side_to_move,
        castling_rights,
        en_passant_target,
        halfmove_clock,
        fullmove_number,
        position_history: Vec::new(),
    })
}

fn parse_placement(placement: &str) -> Option<Board> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return None;
    }

    let mut board = Board::empty();
    // FEN lists rank 8 first
    for (row, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file = 0u8;
        for c in rank_text.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return None;
                }
                file += skip as u8;
            } else {
                let piece = PieceKind::from_fen_char(c)?;
                board.set(Square::from_rank_file(rank, file)?, Some(piece));
                file += 1;
            }
            if file > 8 {
                return None;
            }
        }
        if file != 8 {
            return None;
        }
    }
    Some(board)
}

/// Piece placement field only
pub fn placement(board: &Board) -> String {
    let mut out = String::with_capacity(64);
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            let piece = Square::from_rank_file(rank, file).and_then(|sq| board.get(sq));
            match piece {
                Some((kind, color)) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    let c = kind.fen_char();
                    out.push(if color.is_white() { c.to_ascii_uppercase() } else { c });
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
        if rank > 0 {
            out.push('/');
        }
    }
    out
}

/// Serialize a snapshot back to a six-field FEN string
pub fn to_fen(position: &Position) -> String {
    let side = if position.side_to_move.is_white() { "w" } else { "b" };

    let rights = position.castling_rights;
    let mut castling = String::new();
    for (flag, c) in [
        (rights.white_kingside, 'K'),
        (rights.white_queenside, 'Q'),
        (rights.black_kingside, 'k'),
        (rights.black_queenside, 'q'),
    ] {
        if flag {
            castling.push(c);
        }
    }
    if castling.is_empty() {
        castling.push('-');
    }

    let en_passant = position
        .en_passant_target
        .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic());

    format!(
        "{} {} {} {} {} {}",
        placement(&position.board),
        side,
        castling,
        en_passant,
        position.halfmove_clock,
        position.fullmove_number
    )
}
