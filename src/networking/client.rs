//! Session driver
//!
//! Opens the TCP channel (`host` / `join`) and runs the single session loop
//! that serializes channel events, local commands and advisor replies.

use crate::game::ai::{Advisor, AdvisorChat, Suggestion};
use crate::game::{SessionError, SessionResult};
use crate::networking::session::Session;
use crate::networking::transport::{spawn_link, ChannelEvent, LinkHandle};
use draughts_engine::{Position, RuleSet};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// Length of a room code
pub const ROOM_CODE_LEN: usize = 6;

/// Session bound to a live TCP channel
pub type NetSession = Session<LinkHandle>;

/// Inbound channel events for a [`NetSession`]
pub type ChannelEvents = mpsc::UnboundedReceiver<ChannelEvent>;

/// Actions requested by the local player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    Play { from: Position, to: Position },
    Resign,
    OfferDraw,
    AcceptDraw,
    DeclineDraw,
    Chat(String),
    /// Ask the advisor for a move
    Hint,
    /// Ask the advisor chat a question
    Ask(String),
    Quit,
}

enum AdvisorReply {
    Move(Option<Suggestion>),
    Text(String),
}

/// Random six-letter room code
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| rng.random_range(b'A'..=b'Z') as char)
        .collect()
}

/// Bind `addr` and wait for one peer; the caller plays First
pub async fn host(
    addr: SocketAddr,
    name: &str,
    rules: RuleSet,
    room: String,
) -> SessionResult<(NetSession, ChannelEvents)> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| SessionError::ListenFailed {
            addr: addr.to_string(),
            source,
        })?;
    let local = listener.local_addr().unwrap_or(addr);
    info!("[NETWORK] Hosting room {} on {}", room, local);

    let (stream, peer) = listener
        .accept()
        .await
        .map_err(|source| SessionError::ListenFailed {
            addr: local.to_string(),
            source,
        })?;
    info!("[NETWORK] Peer connected from {}", peer);

    Ok(accept_stream(stream, name, rules, room))
}

/// Wrap an accepted stream in an acceptor session
pub fn accept_stream(
    stream: TcpStream,
    name: &str,
    rules: RuleSet,
    room: String,
) -> (NetSession, ChannelEvents) {
    let (link, events) = spawn_link(stream);
    (Session::acceptor(link, name, rules, room), events)
}

/// Connect to a host; the caller plays Second
///
/// A failed connect leaves nothing behind.
pub async fn join(
    addr: &str,
    name: &str,
    expected_room: Option<String>,
) -> SessionResult<(NetSession, ChannelEvents)> {
    info!("[NETWORK] Connecting to {}", addr);
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| SessionError::ConnectFailed {
            addr: addr.to_string(),
            source,
        })?;

    let (link, events) = spawn_link(stream);
    Ok((Session::initiator(link, name, expected_room), events))
}

/// Drive a session until the channel closes or the player quits
///
/// Returns `Ok(())` on [`LocalCommand::Quit`] (or when the command sender is
/// dropped) and the fatal error when the channel goes away.
pub async fn run_session(
    mut session: NetSession,
    mut events: ChannelEvents,
    mut commands: mpsc::Receiver<LocalCommand>,
    advisor: Arc<dyn Advisor>,
    chat: AdvisorChat,
) -> SessionResult<()> {
    let chat = Arc::new(Mutex::new(chat));
    let (advice_tx, mut advice_rx) = mpsc::channel::<AdvisorReply>(8);

    loop {
        tokio::select! {
            event = events.recv() => {
                let event = event.unwrap_or(ChannelEvent::Closed);
                session.handle_event(event)?;
            }
            command = commands.recv() => {
                let command = match command {
                    Some(LocalCommand::Quit) | None => {
                        info!("[SESSION] Leaving session {}", session.id());
                        return Ok(());
                    }
                    Some(command) => command,
                };
                match command {
                    LocalCommand::Hint => {
                        let advisor = advisor.clone();
                        let board = *session.game().board();
                        let side = session.role();
                        let tx = advice_tx.clone();
                        tokio::spawn(async move {
                            let suggestion = advisor.suggest(&board, side).await;
                            let _ = tx.send(AdvisorReply::Move(suggestion)).await;
                        });
                    }
                    LocalCommand::Ask(question) => {
                        let chat = chat.clone();
                        let board = *session.game().board();
                        let side = session.game().side_to_move();
                        let tx = advice_tx.clone();
                        tokio::spawn(async move {
                            let answer = chat.lock().await.ask(&board, side, &question).await;
                            let _ = tx.send(AdvisorReply::Text(answer)).await;
                        });
                    }
                    other => {
                        if let Err(e) = apply_command(&mut session, other) {
                            warn!("[SESSION] {}", e);
                            session.notify_rejected(&e);
                        }
                    }
                }
            }
            Some(reply) = advice_rx.recv() => match reply {
                AdvisorReply::Move(suggestion) => {
                    session.offer_suggestion(suggestion);
                }
                AdvisorReply::Text(text) => session.relay_advisor_reply(text),
            },
        }
    }
}

/// Apply a game command to the session
pub fn apply_command<L>(session: &mut Session<L>, command: LocalCommand) -> SessionResult<()>
where
    L: crate::networking::transport::PeerLink,
{
    match command {
        LocalCommand::Play { from, to } => session.play(from, to).map(|_| ()),
        LocalCommand::Resign => session.resign().map(|_| ()),
        LocalCommand::OfferDraw => session.offer_draw(),
        LocalCommand::AcceptDraw => session.accept_draw(),
        LocalCommand::DeclineDraw => session.decline_draw(),
        LocalCommand::Chat(text) => session.send_chat(&text),
        LocalCommand::Hint | LocalCommand::Ask(_) | LocalCommand::Quit => Ok(()),
    }
}
