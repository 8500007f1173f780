use draughts_engine::{GameSnapshot, GameStatus, Move};
use serde::{Deserialize, Serialize};

/// Full-state payload sent once by the accepting peer
///
/// The acceptor plays First, the initiator Second. The snapshot carries the
/// acceptor's rule set so both peers enumerate moves identically.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SyncPayload {
    pub snapshot: GameSnapshot,
    /// Display name of the sending player
    pub sender: String,
    /// Room code advertised by the acceptor
    pub room: String,
}

/// Messages exchanged between the two peers of a match
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum PeerMessage {
    /// Acceptor → initiator, once, right after the channel opens
    Sync(SyncPayload),

    /// One committed hop; the receiver applies it without echoing it back
    Move(Move),

    /// Result set directly on the receiver (resignation, draw, detected win)
    Status(GameStatus),

    /// Draw offer; the receiver may answer with `Status(Draw)`
    DrawRequest,

    // Bidirectional chat
    Chat {
        sender: String,
        text: String,
        timestamp: u64,
    },
}

impl PeerMessage {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMessage::Sync(_) => "Sync",
            PeerMessage::Move(_) => "Move",
            PeerMessage::Status(_) => "Status",
            PeerMessage::DrawRequest => "DrawRequest",
            PeerMessage::Chat { .. } => "Chat",
        }
    }
}
