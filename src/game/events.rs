//! Notifications raised by the board controller
//!
//! Observers are fire-and-forget: the controller calls them after a command
//! sequence has finished and ignores whatever they do. An observer that fails
//! must swallow its own failure.
//!
//! An unbounded tokio sender is itself an observer, forwarding every
//! notification as a [`GameEvent`].

use crate::engine::{GameStatus, Move};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    MoveMade { mv: Move, status: GameStatus },
    StatusChanged { status: GameStatus },
    GameEnded { status: GameStatus },
    Error { message: String },
}

/// Receives controller notifications
pub trait GameObserver: Send + Sync {
    fn on_move_made(&self, _mv: &Move, _status: GameStatus) {}

    fn on_status_changed(&self, _status: GameStatus) {}

    fn on_game_ended(&self, _status: GameStatus) {}

    fn on_error(&self, _message: &str) {}
}

impl GameObserver for UnboundedSender<GameEvent> {
    fn on_move_made(&self, mv: &Move, status: GameStatus) {
        let _ = self.send(GameEvent::MoveMade { mv: *mv, status });
    }

    fn on_status_changed(&self, status: GameStatus) {
        let _ = self.send(GameEvent::StatusChanged { status });
    }

    fn on_game_ended(&self, status: GameStatus) {
        let _ = self.send(GameEvent::GameEnded { status });
    }

    fn on_error(&self, message: &str) {
        let _ = self.send(GameEvent::Error {
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Square;
    use tokio::sync::mpsc;

    #[test]
    fn test_sender_forwards_events() {
        //! Each callback becomes one event, in call order
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mv = Move::new(
            Square::from_algebraic("e2").unwrap(),
            Square::from_algebraic("e4").unwrap(),
        );

        tx.on_move_made(&mv, GameStatus::InProgress);
        tx.on_game_ended(GameStatus::Stalemate);
        tx.on_error("boom");

        assert_eq!(
            rx.try_recv().unwrap(),
            GameEvent::MoveMade {
                mv,
                status: GameStatus::InProgress
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            GameEvent::GameEnded {
                status: GameStatus::Stalemate
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            GameEvent::Error {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        //! A dropped receiver never panics the sender side
        let (tx, rx) = mpsc::unbounded_channel::<GameEvent>();
        drop(rx);
        tx.on_status_changed(GameStatus::Check);
    }
}
