//! Frame codec for [`PeerMessage`]
//!
//! Each frame is a 4-byte big-endian body length followed by a bincode body.
//! A body that fails to decode is reported as [`CodecError::Malformed`] and
//! can be dropped without losing framing; an oversized length header cannot
//! be recovered from and is reported as [`CodecError::FrameTooLarge`].

use crate::protocol::PeerMessage;
use bincode::Options;
use thiserror::Error;

/// Size of the length prefix in bytes
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest accepted frame body
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Errors raised while encoding or decoding frames
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Failed to encode message: {0}")]
    Encode(#[source] bincode::Error),

    #[error("Malformed message: {0}")]
    Malformed(#[source] bincode::Error),
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_FRAME_LEN as u64)
        .reject_trailing_bytes()
}

/// Encode a message as a complete frame (header + body)
pub fn encode_frame(message: &PeerMessage) -> Result<Vec<u8>, CodecError> {
    let body = options().serialize(message).map_err(CodecError::Encode)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_LEN,
        });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Body length announced by a frame header
pub fn frame_len(header: [u8; FRAME_HEADER_LEN]) -> Result<usize, CodecError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    Ok(len)
}

/// Decode a frame body
pub fn decode_message(body: &[u8]) -> Result<PeerMessage, CodecError> {
    options()
        .deserialize(body)
        .map_err(CodecError::Malformed)
}
