//! # Damalink
//!
//! Two-player draughts over a direct peer connection. The rules live in the
//! `draughts_engine` crate and the wire format in `shared`; this crate owns
//! the session that keeps both peers' games identical.
//!
//! - `core` - Settings and session lifecycle state
//! - `game` - Session errors, events, move history and the advisor
//! - `networking` - TCP channel, session controller and driver loop

pub mod core;
pub mod game;
pub mod networking;
