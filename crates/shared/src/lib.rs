//! Shared peer protocol
//!
//! Message types exchanged by two draughts peers and the binary frame codec
//! that carries them over a byte stream.

pub mod codec;
pub mod protocol;

pub use codec::{
    decode_message, encode_frame, frame_len, CodecError, FRAME_HEADER_LEN, MAX_FRAME_LEN,
};
pub use protocol::{PeerMessage, SyncPayload};
