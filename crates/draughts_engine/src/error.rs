//! Error types for the draughts engine
//!
//! Provides error types for move application, game state transitions and
//! board layout parsing.

use crate::types::{GameStatus, Move, Position};
use std::fmt;
use thiserror::Error;

/// Why a candidate hop was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMoveReason {
    /// The hop is not in the legal set for the side to move
    NotInLegalSet,
    /// The match is already decided
    GameOver,
    /// A capture chain is in progress and must continue from this square
    ContinuationRequired(Position),
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMoveReason::NotInLegalSet => write!(f, "not a legal move"),
            IllegalMoveReason::GameOver => write!(f, "the game is over"),
            IllegalMoveReason::ContinuationRequired(at) => {
                write!(f, "the capture must continue from {}", at)
            }
        }
    }
}

/// Errors that can occur in the draughts engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Candidate hop rejected; the game state is unchanged
    #[error("Illegal move {mv}: {reason}")]
    IllegalMove {
        mv: Move,
        reason: IllegalMoveReason,
    },

    /// Transition attempted on a decided game
    #[error("Game is already over ({status:?})")]
    GameOver { status: GameStatus },

    /// Board layout could not be parsed
    #[error("Invalid board layout: {message}")]
    InvalidLayout { message: String },
}

impl EngineError {
    pub fn is_illegal_move(&self) -> bool {
        matches!(self, EngineError::IllegalMove { .. })
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
