//! Error types for the engine command interface
//!
//! Every command sent to the rules engine can fail with one of these kinds.
//! The interaction layer catches them at the call site and turns them into
//! user-visible messages; nothing here is fatal to the process.

use thiserror::Error;

/// Errors that can occur while talking to the rules engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The requested move is not legal in the current position
    #[error("Illegal move: {message}")]
    IllegalMove { message: String },

    /// Undo was requested with no move on the engine's stack
    #[error("No move to undo")]
    NoHistory,

    /// Malformed FEN, square name or promotion piece
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The command channel to the engine is closed or the reply was dropped
    #[error("Engine unavailable: {message}")]
    EngineUnavailable { message: String },
}

impl EngineError {
    pub fn illegal_move(message: impl Into<String>) -> Self {
        EngineError::IllegalMove {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        EngineError::EngineUnavailable {
            message: message.into(),
        }
    }
}

/// Result type alias for engine commands
pub type EngineResult<T> = Result<T, EngineError>;
