//! Session lifecycle states
//!
//! # State Flow
//!
//! ```text
//! acceptor:   [InMatch] ───────────────→ [Closed]
//! initiator:  [AwaitingSync] → [InMatch] → [Closed]
//! ```
//!
//! `Closed` is final for a session; a new match needs a new connection.

use std::fmt;

/// Where a session is in its lifecycle
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum SessionPhase {
    /// Connected, waiting for the acceptor's `Sync`
    #[default]
    AwaitingSync,

    /// Both peers hold the same game; moves are exchanged
    InMatch,

    /// The channel closed or failed; the game was reset
    Closed,
}

impl SessionPhase {
    /// Whether local game actions are accepted
    pub fn is_playing(&self) -> bool {
        matches!(self, SessionPhase::InMatch)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionPhase::Closed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::AwaitingSync => "awaiting sync",
            SessionPhase::InMatch => "in match",
            SessionPhase::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}
