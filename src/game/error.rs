//! Error types for game module
//!
//! Provides the session-level error type covering local move rejection,
//! lifecycle violations and channel failures.

use crate::core::SessionPhase;
use draughts_engine::{EngineError, Side};

/// Errors that can occur while driving a peer session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The engine rejected a local action; the game is unchanged
    #[error("Move rejected: {0}")]
    IllegalMove(#[from] EngineError),

    /// A local move was attempted while the peer is to move
    #[error("Not your turn ({side} to move)")]
    NotYourTurn { side: Side },

    /// A game action was attempted outside of an active match
    #[error("No active match (session is {phase})")]
    NotInMatch { phase: SessionPhase },

    /// Accept/decline without a pending draw offer from the peer
    #[error("No draw offer to answer")]
    NoDrawOffer,

    /// The peer closed the channel
    #[error("Channel closed by peer")]
    ChannelClosed,

    /// The channel failed; framing or transport cannot recover
    #[error("Channel error: {message}")]
    ChannelError { message: String },

    /// The acceptor advertised a different room than the one being joined
    #[error("Room mismatch: expected {expected}, host is in {received}")]
    RoomMismatch { expected: String, received: String },

    /// The initiator could not open a channel
    #[error("Failed to connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The acceptor could not bind or accept
    #[error("Failed to listen on {addr}: {source}")]
    ListenFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Whether the error ends the session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::ChannelClosed
                | SessionError::ChannelError { .. }
                | SessionError::RoomMismatch { .. }
                | SessionError::ConnectFailed { .. }
                | SessionError::ListenFailed { .. }
        )
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
