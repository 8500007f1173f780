//! Peer-to-peer networking
//!
//! - `transport` - Framed TCP channel and the `PeerLink` seam
//! - `session` - Session controller owning the game for one participant
//! - `client` - Host/join helpers and the session loop

pub mod client;
pub mod session;
pub mod transport;

pub use client::{
    accept_stream, apply_command, generate_room_code, host, join, run_session, LocalCommand,
    NetSession,
};
pub use session::{DrawOffer, Session};
pub use transport::{spawn_link, ChannelEvent, LinkHandle, PeerLink};
