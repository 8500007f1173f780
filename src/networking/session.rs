//! Peer session controller
//!
//! A [`Session`] owns one participant's side of a match: the game, the link
//! to the peer and the bookkeeping around them. It is driven from a single
//! task; every local action and inbound message is processed to completion
//! before the next one, so the game is never mutated concurrently.
//!
//! # Roles
//!
//! The accepting peer plays [`Side::First`] and sends the one `Sync` that
//! establishes the common position. The initiating peer plays
//! [`Side::Second`] and stays in [`SessionPhase::AwaitingSync`] until it
//! arrives.
//!
//! # Inbound moves
//!
//! Peer hops go through the same validation as local ones. A hop that is out
//! of turn or not legal locally is reported as [`SessionEvent::Desync`] and
//! dropped; the match carries on.

use crate::core::SessionPhase;
use crate::game::ai::{vet_suggestion, Suggestion};
use crate::game::{MoveHistory, SessionError, SessionEvent, SessionResult};
use crate::networking::transport::{ChannelEvent, PeerLink};
use chrono::{DateTime, Utc};
use draughts_engine::api::{self, find_legal_move};
use draughts_engine::{
    EngineError, Game, GameSnapshot, GameStatus, IllegalMoveReason, Move, Position, RuleSet, Side,
};
use shared::{PeerMessage, SyncPayload};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 64;

/// Sender name used for system chat lines
pub const SYSTEM_SENDER: &str = "System";

/// Pending draw offer, if any
///
/// An offer lasts until it is answered or the next hop is committed by
/// either side; playing on lets it lapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawOffer {
    #[default]
    None,
    /// We offered and wait for the peer
    Sent,
    /// The peer offered and waits for us
    Received,
}

/// One participant's side of a match
pub struct Session<L: PeerLink> {
    id: Uuid,
    role: Side,
    local_name: String,
    opponent_name: Option<String>,
    room: Option<String>,
    expected_room: Option<String>,
    game: Game,
    history: MoveHistory,
    draw_offer: DrawOffer,
    phase: SessionPhase,
    link: L,
    events: broadcast::Sender<SessionEvent>,
}

impl<L: PeerLink> Session<L> {
    fn new(link: L, role: Side, local_name: String, rules: RuleSet) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            role,
            local_name,
            opponent_name: None,
            room: None,
            expected_room: None,
            game: api::new_game_with_rules(rules),
            history: MoveHistory::default(),
            draw_offer: DrawOffer::None,
            phase: SessionPhase::AwaitingSync,
            link,
            events,
        }
    }

    /// Session for the peer that accepted the connection (plays First)
    pub fn acceptor(link: L, local_name: impl Into<String>, rules: RuleSet, room: String) -> Self {
        let mut session = Self::new(link, Side::First, local_name.into(), rules);
        session.room = Some(room);
        session
    }

    /// Session for the peer that opened the connection (plays Second)
    ///
    /// With `expected_room`, a `Sync` advertising another room is refused.
    pub fn initiator(
        link: L,
        local_name: impl Into<String>,
        expected_room: Option<String>,
    ) -> Self {
        let mut session = Self::new(link, Side::Second, local_name.into(), RuleSet::default());
        session.expected_room = expected_room.map(|code| code.trim().to_ascii_uppercase());
        session
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Side {
        self.role
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn opponent_name(&self) -> Option<&str> {
        self.opponent_name.as_deref()
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn draw_offer(&self) -> DrawOffer {
        self.draw_offer
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Flat copy of the current game
    pub fn snapshot(&self) -> GameSnapshot {
        api::snapshot(&self.game)
    }

    /// Whether the local player may move now
    pub fn is_my_turn(&self) -> bool {
        self.phase.is_playing() && !self.game.is_over() && self.game.side_to_move() == self.role
    }

    /// Hops the local player may submit; empty while the peer is to move
    pub fn legal_moves(&self) -> Vec<Move> {
        if !self.is_my_turn() {
            return Vec::new();
        }
        api::legal_moves(&self.game)
    }

    /// Receiver of all future session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // Local actions
    // ========================================================================

    /// Send the initial `Sync` (acceptor only)
    pub fn start(&mut self) {
        if self.role != Side::First || self.phase != SessionPhase::AwaitingSync {
            debug!("[SESSION] start() ignored in phase {}", self.phase);
            return;
        }

        let payload = SyncPayload {
            snapshot: self.snapshot(),
            sender: self.local_name.clone(),
            room: self.room.clone().unwrap_or_default(),
        };
        self.link.send(PeerMessage::Sync(payload));
        self.phase = SessionPhase::InMatch;
        info!(
            "[SESSION] Match started in room {} as {} ({:?} capture)",
            self.room.as_deref().unwrap_or("-"),
            self.role,
            self.game.rules().capture
        );
        self.publish_state();
    }

    /// Commit a hop for the local player and mirror it to the peer
    pub fn submit_move(&mut self, mv: &Move) -> SessionResult<()> {
        self.ensure_my_turn()?;

        let outcome = api::apply_move(&mut self.game, mv)?;
        self.link.send(PeerMessage::Move(mv.clone()));
        info!("[SESSION] Played {}", mv);
        self.lapse_draw_offer();

        let record = self.history.record(self.role, mv.clone(), &outcome).clone();
        self.emit(SessionEvent::MoveApplied {
            record,
            remote: false,
        });

        if outcome.status.is_terminal() {
            info!("[SESSION] {}", outcome.status.message());
            self.link.send(PeerMessage::Status(outcome.status));
        }
        self.publish_state();
        Ok(())
    }

    /// Resolve `(from, to)` against the legal set and play it
    pub fn play(&mut self, from: Position, to: Position) -> SessionResult<Move> {
        self.ensure_my_turn()?;
        let mv = find_legal_move(&self.game, from, to).ok_or_else(|| {
            let reason = match self.game.continuation().square() {
                Some(at) if at != from => IllegalMoveReason::ContinuationRequired(at),
                _ => IllegalMoveReason::NotInLegalSet,
            };
            EngineError::IllegalMove {
                mv: Move::slide(from, to),
                reason,
            }
        })?;
        self.submit_move(&mv)?;
        Ok(mv)
    }

    /// Concede the match
    pub fn resign(&mut self) -> SessionResult<GameStatus> {
        self.ensure_playing()?;
        let status = api::resign(&mut self.game, self.role)?;
        self.draw_offer = DrawOffer::None;
        self.link.send(PeerMessage::Status(status));
        info!("[SESSION] Resigned: {}", status.message());
        self.publish_state();
        Ok(status)
    }

    /// Ask the peer for a draw
    pub fn offer_draw(&mut self) -> SessionResult<()> {
        self.ensure_playing()?;
        if self.game.is_over() {
            return Err(EngineError::GameOver {
                status: self.game.status(),
            }
            .into());
        }
        self.link.send(PeerMessage::DrawRequest);
        self.draw_offer = DrawOffer::Sent;
        info!("[SESSION] Draw offered");
        self.emit(SessionEvent::DrawOfferSent);
        Ok(())
    }

    /// Accept the peer's pending draw offer
    pub fn accept_draw(&mut self) -> SessionResult<()> {
        self.ensure_playing()?;
        if self.draw_offer != DrawOffer::Received {
            return Err(SessionError::NoDrawOffer);
        }
        let status = api::accept_draw(&mut self.game)?;
        self.draw_offer = DrawOffer::None;
        self.link.send(PeerMessage::Status(status));
        info!("[SESSION] Draw accepted");
        self.publish_state();
        Ok(())
    }

    /// Decline the peer's pending draw offer; the peer is not told
    pub fn decline_draw(&mut self) -> SessionResult<()> {
        if self.draw_offer != DrawOffer::Received {
            return Err(SessionError::NoDrawOffer);
        }
        self.draw_offer = DrawOffer::None;
        info!("[SESSION] Draw declined");
        self.emit(SessionEvent::DrawDeclined);
        Ok(())
    }

    pub fn send_chat(&mut self, text: &str) -> SessionResult<()> {
        if self.phase.is_closed() {
            return Err(SessionError::NotInMatch { phase: self.phase });
        }
        self.link.send(PeerMessage::Chat {
            sender: self.local_name.clone(),
            text: text.to_string(),
            timestamp: now_millis(),
        });
        Ok(())
    }

    /// Vet an advisor suggestion and publish the result
    pub fn offer_suggestion(&mut self, suggestion: Option<Suggestion>) -> Option<Move> {
        let mv = match suggestion {
            Some(s) if self.is_my_turn() => vet_suggestion(&self.game, s),
            _ => None,
        };
        self.emit(SessionEvent::Suggestion { mv: mv.clone() });
        mv
    }

    /// Publish an advisor chat answer
    pub fn relay_advisor_reply(&self, text: String) {
        self.emit(SessionEvent::AdvisorReply { text });
    }

    /// Publish a refused local command
    pub fn notify_rejected(&self, error: &SessionError) {
        self.emit(SessionEvent::Rejected {
            reason: error.to_string(),
        });
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Process one channel notification
    ///
    /// # Errors
    ///
    /// [`SessionError::ChannelClosed`] or [`SessionError::ChannelError`] once
    /// the channel is gone; the session is torn down before returning.
    pub fn handle_event(&mut self, event: ChannelEvent) -> SessionResult<()> {
        match event {
            ChannelEvent::Open => {
                if self.role == Side::First {
                    self.start();
                } else {
                    info!("[SESSION] Connected, waiting for host sync");
                }
                Ok(())
            }
            ChannelEvent::Message(message) => self.handle_message(message),
            ChannelEvent::Malformed(e) => {
                warn!("[SESSION] Dropping malformed message: {}", e);
                Ok(())
            }
            ChannelEvent::Closed => {
                self.teardown("peer closed the channel");
                Err(SessionError::ChannelClosed)
            }
            ChannelEvent::Error(message) => {
                self.teardown(&message);
                Err(SessionError::ChannelError { message })
            }
        }
    }

    /// Apply one peer message
    ///
    /// # Errors
    ///
    /// [`SessionError::RoomMismatch`] if the host advertises an unexpected
    /// room. Every other problem is logged and the message dropped.
    pub fn handle_message(&mut self, message: PeerMessage) -> SessionResult<()> {
        if self.phase.is_closed() {
            debug!("[SESSION] Ignoring {} after teardown", message.kind());
            return Ok(());
        }

        match message {
            PeerMessage::Sync(payload) => return self.apply_sync(payload),
            PeerMessage::Chat {
                sender,
                text,
                timestamp,
            } => {
                let at = DateTime::from_timestamp_millis(timestamp as i64).unwrap_or_else(Utc::now);
                self.emit(SessionEvent::ChatReceived { sender, text, at });
            }
            other if !self.phase.is_playing() => {
                warn!("[SESSION] Ignoring {} before sync", other.kind());
            }
            PeerMessage::Move(mv) => self.apply_remote_move(mv),
            PeerMessage::Status(status) => self.apply_remote_status(status),
            PeerMessage::DrawRequest => {
                if self.game.is_over() {
                    debug!("[SESSION] Ignoring draw offer on a finished game");
                } else {
                    info!("[SESSION] Opponent offers a draw");
                    self.draw_offer = DrawOffer::Received;
                    self.emit(SessionEvent::DrawOffered);
                }
            }
        }
        Ok(())
    }

    fn apply_sync(&mut self, payload: SyncPayload) -> SessionResult<()> {
        if self.role == Side::First || self.phase != SessionPhase::AwaitingSync {
            warn!("[SESSION] Ignoring unexpected sync from {}", payload.sender);
            return Ok(());
        }

        if let Some(expected) = &self.expected_room {
            if !expected.eq_ignore_ascii_case(&payload.room) {
                let err = SessionError::RoomMismatch {
                    expected: expected.clone(),
                    received: payload.room,
                };
                self.teardown(&err.to_string());
                return Err(err);
            }
        }

        api::load_snapshot(&mut self.game, &payload.snapshot);
        self.history.clear();
        self.draw_offer = DrawOffer::None;
        self.room = Some(payload.room);
        self.phase = SessionPhase::InMatch;
        info!(
            "[SESSION] Synced with {} in room {}; playing {}",
            payload.sender,
            self.room.as_deref().unwrap_or("-"),
            self.role
        );
        self.opponent_name = Some(payload.sender);

        self.link.send(PeerMessage::Chat {
            sender: SYSTEM_SENDER.to_string(),
            text: format!("{} joined!", self.local_name),
            timestamp: now_millis(),
        });
        self.publish_state();
        Ok(())
    }

    fn apply_remote_move(&mut self, mv: Move) {
        let peer = self.role.opponent();
        if self.game.side_to_move() != peer {
            self.report_desync(mv, format!("{} moved out of turn", peer));
            return;
        }

        match api::apply_move(&mut self.game, &mv) {
            Ok(outcome) => {
                debug!("[SESSION] Peer played {}", mv);
                self.lapse_draw_offer();
                let record = self.history.record(peer, mv, &outcome).clone();
                self.emit(SessionEvent::MoveApplied {
                    record,
                    remote: true,
                });
                if outcome.status.is_terminal() {
                    info!("[SESSION] {}", outcome.status.message());
                }
                self.publish_state();
            }
            Err(e) => self.report_desync(mv, e.to_string()),
        }
    }

    fn apply_remote_status(&mut self, status: GameStatus) {
        if api::force_status(&mut self.game, status) {
            info!("[SESSION] Peer reported: {}", status.message());
            self.draw_offer = DrawOffer::None;
            self.publish_state();
        } else if self.game.status() == status {
            debug!("[SESSION] Status {:?} already known", status);
        } else {
            warn!(
                "[SESSION] Ignoring status {:?}; game is already {:?}",
                status,
                self.game.status()
            );
        }
    }

    fn lapse_draw_offer(&mut self) {
        if self.draw_offer != DrawOffer::None {
            info!("[SESSION] Draw offer lapsed ({:?})", self.draw_offer);
            self.draw_offer = DrawOffer::None;
        }
    }

    fn report_desync(&mut self, mv: Move, reason: String) {
        warn!("[SESSION] Desync: dropping peer move {}: {}", mv, reason);
        self.emit(SessionEvent::Desync { mv, reason });
    }

    /// Return to the pre-match state after the channel is gone
    fn teardown(&mut self, reason: &str) {
        if self.phase.is_closed() {
            return;
        }
        warn!("[SESSION] Session {} closed: {}", self.id, reason);
        self.phase = SessionPhase::Closed;
        api::reset_game(&mut self.game);
        self.history.clear();
        self.draw_offer = DrawOffer::None;
        self.opponent_name = None;
        self.emit(SessionEvent::Disconnected {
            reason: reason.to_string(),
        });
    }

    fn ensure_playing(&self) -> SessionResult<()> {
        if !self.phase.is_playing() {
            return Err(SessionError::NotInMatch { phase: self.phase });
        }
        Ok(())
    }

    fn ensure_my_turn(&self) -> SessionResult<()> {
        self.ensure_playing()?;
        if self.game.is_over() {
            return Err(EngineError::GameOver {
                status: self.game.status(),
            }
            .into());
        }
        if self.game.side_to_move() != self.role {
            return Err(SessionError::NotYourTurn {
                side: self.game.side_to_move(),
            });
        }
        Ok(())
    }

    fn publish_state(&self) {
        self.emit(SessionEvent::StateChanged(self.snapshot()));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
