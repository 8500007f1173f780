use crate::game::resources::MoveRecord;
use chrono::{DateTime, Utc};
use draughts_engine::{GameSnapshot, Move};

/// Notifications published by a session to its subscribers
///
/// Raised for local actions and inbound peer messages alike.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Board, side to move, status or rules changed
    StateChanged(GameSnapshot),

    /// A hop was committed
    MoveApplied { record: MoveRecord, remote: bool },

    /// The peer offered a draw; answer with accept or decline
    DrawOffered,

    /// Our draw offer went out
    DrawOfferSent,

    /// We declined the peer's draw offer
    DrawDeclined,

    ChatReceived {
        sender: String,
        text: String,
        at: DateTime<Utc>,
    },

    /// Advisor hint, already checked against the legal set
    Suggestion { mv: Option<Move> },

    /// Advisor chat answer
    AdvisorReply { text: String },

    /// A local command was refused; nothing changed
    Rejected { reason: String },

    /// An inbound move did not fit the local game and was dropped
    Desync { mv: Move, reason: String },

    /// The channel is gone and the game was reset
    Disconnected { reason: String },
}
