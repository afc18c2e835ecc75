//! Selection state for the board interaction machine
//!
//! One tagged value replaces the usual cluster of optional fields (selected
//! square, candidate moves, pending promotion), so combinations such as "a
//! promotion is pending but nothing is selected" cannot be represented.

use crate::engine::{Move, Square};
use std::collections::BTreeSet;

/// Current selection, exactly one variant active at a time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    /// Nothing selected
    #[default]
    Idle,
    /// A piece of the side to move is selected
    SquareSelected {
        origin: Square,
        /// Legal destination squares fetched from the engine
        destinations: BTreeSet<Square>,
        /// Full legal moves from `origin`, kept for flag lookups
        moves: Vec<Move>,
    },
    /// A pawn move to the last rank waits for the promotion choice
    AwaitingPromotion { origin: Square, destination: Square },
}

impl SelectionState {
    /// Build a selection from the engine's per-square move list
    pub fn selected(origin: Square, moves: Vec<Move>) -> Self {
        let destinations = moves.iter().map(|m| m.to).collect();
        SelectionState::SquareSelected {
            origin,
            destinations,
            moves,
        }
    }

    pub fn clear(&mut self) {
        *self = SelectionState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SelectionState::Idle)
    }

    /// Selected origin square, also while a promotion is pending
    pub fn origin(&self) -> Option<Square> {
        match self {
            SelectionState::Idle => None,
            SelectionState::SquareSelected { origin, .. }
            | SelectionState::AwaitingPromotion { origin, .. } => Some(*origin),
        }
    }

    /// Squares to highlight as legal destinations
    pub fn destinations(&self) -> Option<&BTreeSet<Square>> {
        match self {
            SelectionState::SquareSelected { destinations, .. } => Some(destinations),
            _ => None,
        }
    }

    pub fn is_awaiting_promotion(&self) -> bool {
        matches!(self, SelectionState::AwaitingPromotion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn test_default_is_idle() {
        //! A fresh selection holds nothing
        let selection = SelectionState::default();
        assert!(selection.is_idle());
        assert_eq!(selection.origin(), None);
        assert_eq!(selection.destinations(), None);
    }

    #[test]
    fn test_selected_collects_destinations() {
        //! Destinations are the target squares of the supplied moves
        let moves = vec![
            Move::new(sq("e2"), sq("e3")),
            Move::new(sq("e2"), sq("e4")),
        ];
        let selection = SelectionState::selected(sq("e2"), moves);

        assert_eq!(selection.origin(), Some(sq("e2")));
        let destinations = selection.destinations().unwrap();
        assert!(destinations.contains(&sq("e3")));
        assert!(destinations.contains(&sq("e4")));
        assert_eq!(destinations.len(), 2);
    }

    #[test]
    fn test_promotion_keeps_origin() {
        //! Pending promotion still reports its origin but no highlights
        let mut selection = SelectionState::AwaitingPromotion {
            origin: sq("a7"),
            destination: sq("a8"),
        };
        assert!(selection.is_awaiting_promotion());
        assert_eq!(selection.origin(), Some(sq("a7")));
        assert_eq!(selection.destinations(), None);

        selection.clear();
        assert!(selection.is_idle());
    }
}
