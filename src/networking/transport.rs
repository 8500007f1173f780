//! Peer channel over TCP
//!
//! A connected stream is split into a reader task and a writer task. The
//! reader turns frames into [`ChannelEvent`]s; the writer drains an unbounded
//! queue so that [`PeerLink::send`] never blocks the session.

use shared::codec::{decode_message, encode_frame, frame_len, CodecError, FRAME_HEADER_LEN};
use shared::PeerMessage;
use std::io::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outbound half of a peer channel
///
/// Fire-and-forget: there is no delivery acknowledgement. Failures surface
/// later as a [`ChannelEvent::Error`] or [`ChannelEvent::Closed`].
pub trait PeerLink {
    fn send(&self, message: PeerMessage);
}

/// Inbound channel notifications, in delivery order
#[derive(Debug)]
pub enum ChannelEvent {
    /// The channel is ready; always the first event
    Open,
    Message(PeerMessage),
    /// A frame arrived whose body is not a valid message
    Malformed(CodecError),
    /// The peer closed the connection
    Closed,
    /// Transport or framing failure; no further events follow
    Error(String),
}

/// [`PeerLink`] backed by the writer task's queue
#[derive(Debug, Clone)]
pub struct LinkHandle {
    outbound: mpsc::UnboundedSender<PeerMessage>,
}

impl LinkHandle {
    pub fn new(outbound: mpsc::UnboundedSender<PeerMessage>) -> Self {
        Self { outbound }
    }
}

impl PeerLink for LinkHandle {
    fn send(&self, message: PeerMessage) {
        let kind = message.kind();
        if self.outbound.send(message).is_err() {
            debug!("[NETWORK] Dropping {} on a closed link", kind);
        }
    }
}

/// Start reader and writer tasks for a connected stream
///
/// Must be called inside a tokio runtime.
pub fn spawn_link(stream: TcpStream) -> (LinkHandle, mpsc::UnboundedReceiver<ChannelEvent>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("[NETWORK] Could not disable Nagle: {}", e);
    }
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown peer".to_string());
    let (read_half, write_half) = stream.into_split();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let _ = event_tx.send(ChannelEvent::Open);
    info!("[NETWORK] Channel open with {}", peer);

    tokio::spawn(write_frames(write_half, outbound_rx, event_tx.clone()));
    tokio::spawn(read_frames(read_half, event_tx));

    (LinkHandle::new(outbound_tx), event_rx)
}

async fn read_frames(mut reader: OwnedReadHalf, events: mpsc::UnboundedSender<ChannelEvent>) {
    let mut header = [0u8; FRAME_HEADER_LEN];
    loop {
        match reader.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                info!("[NETWORK] Peer closed the channel");
                let _ = events.send(ChannelEvent::Closed);
                break;
            }
            Err(e) => {
                let _ = events.send(ChannelEvent::Error(e.to_string()));
                break;
            }
        }

        let len = match frame_len(header) {
            Ok(len) => len,
            Err(e) => {
                warn!("[NETWORK] {}", e);
                let _ = events.send(ChannelEvent::Error(e.to_string()));
                break;
            }
        };

        let mut body = vec![0u8; len];
        if let Err(e) = reader.read_exact(&mut body).await {
            let event = if e.kind() == ErrorKind::UnexpectedEof {
                ChannelEvent::Error("connection closed mid-frame".to_string())
            } else {
                ChannelEvent::Error(e.to_string())
            };
            let _ = events.send(event);
            break;
        }

        let event = match decode_message(&body) {
            Ok(message) => ChannelEvent::Message(message),
            Err(e) => ChannelEvent::Malformed(e),
        };
        if events.send(event).is_err() {
            debug!("[NETWORK] Session gone, reader stopping");
            break;
        }
    }
}

async fn write_frames(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<PeerMessage>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    while let Some(message) = outbound.recv().await {
        let frame = match encode_frame(&message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("[NETWORK] Not sending {}: {}", message.kind(), e);
                continue;
            }
        };
        if let Err(e) = writer.write_all(&frame).await {
            let _ = events.send(ChannelEvent::Error(e.to_string()));
            return;
        }
        debug!("[NETWORK] Sent {} ({} bytes)", message.kind(), frame.len());
    }

    let _ = writer.shutdown().await;
    debug!("[NETWORK] Writer stopped");
}
