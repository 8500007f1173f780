//! Networking Tests
//!
//! Drives pairs of sessions against each other, first through an in-memory
//! link that still round-trips every message through the wire codec, then
//! over a real loopback TCP connection.

use async_trait::async_trait;
use damalink::core::SessionPhase;
use damalink::game::ai::{Advisor, AdvisorChat, AdvisorConfig, Suggestion};
use damalink::game::{SessionError, SessionEvent};
use damalink::networking::{
    accept_stream, apply_command, join, run_session, ChannelEvent, DrawOffer, LocalCommand,
    PeerLink, Session,
};
use draughts_engine::api::{new_game, new_game_from_position, snapshot};
use draughts_engine::{Board, GameStatus, Move, Piece, Position, RuleSet, Side};
use shared::codec::{decode_message, encode_frame, FRAME_HEADER_LEN};
use shared::{PeerMessage, SyncPayload};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Link that queues outbound messages for the test to deliver
#[derive(Clone, Default)]
struct MemoryLink {
    outbox: Arc<Mutex<Vec<PeerMessage>>>,
}

impl PeerLink for MemoryLink {
    fn send(&self, message: PeerMessage) {
        self.outbox.lock().expect("outbox lock").push(message);
    }
}

impl MemoryLink {
    fn drain(&self) -> Vec<PeerMessage> {
        std::mem::take(&mut *self.outbox.lock().expect("outbox lock"))
    }
}

fn p(row: i8, col: i8) -> Position {
    Position::new(row, col).expect("square on board")
}

/// Encode and decode as the TCP transport would
fn over_the_wire(message: PeerMessage) -> PeerMessage {
    let frame = encode_frame(&message).expect("Should encode");
    decode_message(&frame[FRAME_HEADER_LEN..]).expect("Should decode")
}

/// Deliver queued messages both ways until both links are quiet
fn pump(a: &mut Session<MemoryLink>, b: &mut Session<MemoryLink>) {
    loop {
        let from_a = a.link().drain();
        let from_b = b.link().drain();
        if from_a.is_empty() && from_b.is_empty() {
            break;
        }
        for message in from_a {
            b.handle_message(over_the_wire(message)).expect("b accepts message");
        }
        for message in from_b {
            a.handle_message(over_the_wire(message)).expect("a accepts message");
        }
    }
}

fn connected_pair(rules: RuleSet) -> (Session<MemoryLink>, Session<MemoryLink>) {
    let mut host = Session::acceptor(MemoryLink::default(), "Host", rules, "QWERTY".to_string());
    let mut guest = Session::initiator(MemoryLink::default(), "Guest", Some("qwerty".to_string()));
    host.handle_event(ChannelEvent::Open).expect("host opens");
    guest.handle_event(ChannelEvent::Open).expect("guest opens");
    pump(&mut host, &mut guest);
    (host, guest)
}

fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Sync and Convergence
// ============================================================================

#[test]
fn test_sync_establishes_common_match() {
    //! The acceptor plays First and sends its position, rules and name once;
    //! the initiator adopts them and announces itself in chat.
    let mut host = Session::acceptor(
        MemoryLink::default(),
        "Host",
        RuleSet::strict(),
        "QWERTY".to_string(),
    );
    let mut host_events = host.subscribe();
    let mut guest = Session::initiator(MemoryLink::default(), "Guest", None);
    assert_eq!(guest.phase(), SessionPhase::AwaitingSync);

    host.handle_event(ChannelEvent::Open).expect("host opens");
    guest.handle_event(ChannelEvent::Open).expect("guest opens");
    pump(&mut host, &mut guest);

    assert_eq!(host.role(), Side::First);
    assert_eq!(guest.role(), Side::Second);
    assert_eq!(host.phase(), SessionPhase::InMatch);
    assert_eq!(guest.phase(), SessionPhase::InMatch);
    assert_eq!(guest.snapshot(), host.snapshot());
    assert_eq!(guest.game().rules(), RuleSet::strict());
    assert_eq!(guest.opponent_name(), Some("Host"));
    assert_eq!(guest.room(), Some("QWERTY"));

    let joined = drain_events(&mut host_events).into_iter().any(|event| {
        matches!(event, SessionEvent::ChatReceived { ref sender, ref text, .. }
            if sender == "System" && text == "Guest joined!")
    });
    assert!(joined, "host should see the join announcement");
}

#[test]
fn test_moves_converge_bit_identically() {
    let (mut host, mut guest) = connected_pair(RuleSet::default());

    host.play(p(5, 2), p(4, 3)).expect("opening slide");
    pump(&mut host, &mut guest);
    guest.play(p(2, 1), p(3, 2)).expect("reply slide");
    pump(&mut host, &mut guest);

    let capture = host.play(p(4, 3), p(2, 1)).expect("capture");
    assert_eq!(capture.captured, vec![p(3, 2)]);
    pump(&mut host, &mut guest);

    guest.play(p(1, 2), p(3, 0)).expect("recapture");
    pump(&mut host, &mut guest);

    assert_eq!(host.game(), guest.game());
    assert_eq!(host.game().board().count(Side::First), 11);
    assert_eq!(host.game().board().count(Side::Second), 11);
    assert_eq!(host.history().moves(), guest.history().moves());
    assert_eq!(host.history().len(), 4);
    assert_eq!(host.game().side_to_move(), Side::First);
}

#[test]
fn test_each_chain_hop_is_sent_separately() {
    //! A double jump reaches the peer as two `Move` messages and the mover
    //! keeps the turn in between.
    let mut board = Board::empty();
    board.set(p(2, 1), Some(Piece::man(Side::Second)));
    board.set(p(3, 2), Some(Piece::man(Side::First)));
    board.set(p(5, 4), Some(Piece::man(Side::First)));
    board.set(p(7, 0), Some(Piece::man(Side::First)));
    let position = new_game_from_position(board, Side::Second, RuleSet::default());

    let mut guest = Session::initiator(MemoryLink::default(), "Guest", None);
    guest
        .handle_message(PeerMessage::Sync(SyncPayload {
            snapshot: snapshot(&position),
            sender: "Host".to_string(),
            room: "ABCDEF".to_string(),
        }))
        .expect("sync");
    guest.link().drain();

    guest.play(p(2, 1), p(4, 3)).expect("first hop");
    assert!(guest.is_my_turn(), "chain keeps the turn");
    assert_eq!(guest.game().continuation().square(), Some(p(4, 3)));
    let sent = guest.link().drain();
    assert_eq!(sent, vec![PeerMessage::Move(Move::jump(p(2, 1), p(4, 3), p(3, 2)))]);

    guest.play(p(4, 3), p(6, 5)).expect("second hop");
    assert!(!guest.is_my_turn());
    let sent = guest.link().drain();
    assert_eq!(sent, vec![PeerMessage::Move(Move::jump(p(4, 3), p(6, 5), p(5, 4)))]);
    assert_eq!(guest.history().moves()[0].turn, guest.history().moves()[1].turn);
}

// ============================================================================
// Local Rejection
// ============================================================================

#[test]
fn test_local_moves_out_of_turn_or_illegal_are_rejected() {
    let (mut host, mut guest) = connected_pair(RuleSet::default());

    let err = guest.play(p(2, 1), p(3, 2)).expect_err("guest moves second");
    assert!(matches!(err, SessionError::NotYourTurn { side: Side::First }));

    let before = host.snapshot();
    let err = host.play(p(5, 0), p(3, 2)).expect_err("not a legal hop");
    assert!(matches!(err, SessionError::IllegalMove(ref e) if e.is_illegal_move()));
    assert_eq!(host.snapshot(), before);
    assert!(host.link().drain().is_empty(), "rejected moves are not sent");

    pump(&mut host, &mut guest);
    assert_eq!(host.game(), guest.game());
}

#[test]
fn test_actions_before_sync_are_refused() {
    let mut guest = Session::initiator(MemoryLink::default(), "Guest", None);
    let err = guest.offer_draw().expect_err("no match yet");
    assert!(matches!(
        err,
        SessionError::NotInMatch {
            phase: SessionPhase::AwaitingSync
        }
    ));
    assert!(guest.legal_moves().is_empty());
}

// ============================================================================
// Draws and Resignation
// ============================================================================

#[test]
fn test_draw_offer_accepted_by_peer() {
    let (mut host, mut guest) = connected_pair(RuleSet::default());
    let mut guest_events = guest.subscribe();

    host.offer_draw().expect("offer");
    assert_eq!(host.draw_offer(), DrawOffer::Sent);
    pump(&mut host, &mut guest);

    assert_eq!(guest.draw_offer(), DrawOffer::Received);
    assert!(drain_events(&mut guest_events)
        .iter()
        .any(|e| matches!(e, SessionEvent::DrawOffered)));

    guest.accept_draw().expect("accept");
    pump(&mut host, &mut guest);

    assert_eq!(host.game().status(), GameStatus::Draw);
    assert_eq!(guest.game().status(), GameStatus::Draw);
    assert_eq!(host.draw_offer(), DrawOffer::None);
    assert!(host.legal_moves().is_empty());
}

#[test]
fn test_draw_offer_declined_keeps_game_running() {
    let (mut host, mut guest) = connected_pair(RuleSet::default());

    host.offer_draw().expect("offer");
    pump(&mut host, &mut guest);
    guest.decline_draw().expect("decline");
    pump(&mut host, &mut guest);

    assert_eq!(guest.draw_offer(), DrawOffer::None);
    assert_eq!(host.game().status(), GameStatus::InProgress);
    assert!(matches!(guest.accept_draw(), Err(SessionError::NoDrawOffer)));
    assert!(matches!(host.accept_draw(), Err(SessionError::NoDrawOffer)));
}

#[test]
fn test_unanswered_draw_offer_lapses_on_next_hop() {
    //! The guest offers while the host is to move. The host plays on, which
    //! clears the offer on both sides; a late accept is refused and the
    //! game keeps running.
    let (mut host, mut guest) = connected_pair(RuleSet::default());

    guest.offer_draw().expect("offer");
    pump(&mut host, &mut guest);
    assert_eq!(host.draw_offer(), DrawOffer::Received);

    host.play(p(5, 0), p(4, 1)).expect("host plays on");
    pump(&mut host, &mut guest);
    assert_eq!(host.draw_offer(), DrawOffer::None);
    assert_eq!(guest.draw_offer(), DrawOffer::None);

    guest.play(p(2, 1), p(3, 2)).expect("reply");
    pump(&mut host, &mut guest);
    host.play(p(5, 2), p(4, 3)).expect("another hop");
    pump(&mut host, &mut guest);

    assert!(matches!(host.accept_draw(), Err(SessionError::NoDrawOffer)));
    assert_eq!(host.game().status(), GameStatus::InProgress);
    assert_eq!(guest.game().status(), GameStatus::InProgress);

    // An offer made on your own turn lapses once you move
    guest.offer_draw().expect("offer");
    assert_eq!(guest.draw_offer(), DrawOffer::Sent);
    pump(&mut host, &mut guest);
    assert_eq!(host.draw_offer(), DrawOffer::Received);

    guest.play(p(2, 3), p(3, 4)).expect("guest plays on");
    pump(&mut host, &mut guest);
    assert_eq!(host.draw_offer(), DrawOffer::None);
    assert_eq!(guest.draw_offer(), DrawOffer::None);
    assert_eq!(host.game(), guest.game());
}

#[test]
fn test_resignation_reaches_peer_and_is_final() {
    let (mut host, mut guest) = connected_pair(RuleSet::default());

    let status = guest.resign().expect("resign");
    assert_eq!(status, GameStatus::FirstWins);
    pump(&mut host, &mut guest);
    assert_eq!(host.game().status(), GameStatus::FirstWins);

    let err = host.resign().expect_err("already decided");
    assert!(matches!(err, SessionError::IllegalMove(_)));

    // A conflicting report never overrides a decided game
    host.handle_message(PeerMessage::Status(GameStatus::SecondWins))
        .expect("ignored");
    assert_eq!(host.game().status(), GameStatus::FirstWins);
}

// ============================================================================
// Inbound Hardening
// ============================================================================

#[test]
fn test_peer_move_out_of_turn_is_desync() {
    let (mut host, _guest) = connected_pair(RuleSet::default());
    let mut events = host.subscribe();
    let before = host.snapshot();

    host.handle_message(PeerMessage::Move(Move::slide(p(2, 1), p(3, 2))))
        .expect("dropped, not fatal");

    assert_eq!(host.snapshot(), before);
    assert_eq!(host.phase(), SessionPhase::InMatch);
    assert!(drain_events(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::Desync { .. })));
}

#[test]
fn test_illegal_peer_move_is_desync() {
    let (mut host, _guest) = connected_pair(RuleSet::default());
    host.play(p(5, 0), p(4, 1)).expect("opening");
    let before = host.snapshot();
    let mut events = host.subscribe();

    let forged = Move::jump(p(2, 1), p(4, 3), p(3, 2));
    host.handle_message(PeerMessage::Move(forged.clone()))
        .expect("dropped, not fatal");

    assert_eq!(host.snapshot(), before);
    let desync = drain_events(&mut events).into_iter().find_map(|e| match e {
        SessionEvent::Desync { mv, .. } => Some(mv),
        _ => None,
    });
    assert_eq!(desync, Some(forged));
}

#[test]
fn test_malformed_frame_is_dropped() {
    let (mut host, _guest) = connected_pair(RuleSet::default());
    let malformed = decode_message(&[0xff, 0xff, 0xff, 0xff, 0x00]).expect_err("garbage");

    host.handle_event(ChannelEvent::Malformed(malformed))
        .expect("not fatal");
    assert_eq!(host.phase(), SessionPhase::InMatch);
}

#[test]
fn test_room_mismatch_ends_session() {
    let mut host = Session::acceptor(
        MemoryLink::default(),
        "Host",
        RuleSet::default(),
        "ABCDEF".to_string(),
    );
    let mut guest = Session::initiator(MemoryLink::default(), "Guest", Some("ZZZZZZ".to_string()));
    host.start();

    let sync = host.link().drain().remove(0);
    let err = guest.handle_message(sync).expect_err("wrong room");
    assert!(matches!(err, SessionError::RoomMismatch { .. }));
    assert!(err.is_fatal());
    assert_eq!(guest.phase(), SessionPhase::Closed);
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_channel_close_resets_to_pre_match_state() {
    let (mut host, _guest) = connected_pair(RuleSet::strict());
    let mut events = host.subscribe();
    host.play(p(5, 0), p(4, 1)).expect("opening");

    let err = host.handle_event(ChannelEvent::Closed).expect_err("fatal");
    assert!(matches!(err, SessionError::ChannelClosed));
    assert_eq!(host.phase(), SessionPhase::Closed);
    assert_eq!(host.game().board(), new_game().board());
    assert_eq!(host.game().status(), GameStatus::InProgress);
    assert!(host.history().is_empty());
    assert!(drain_events(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::Disconnected { .. })));

    let err = host.play(p(5, 2), p(4, 3)).expect_err("session closed");
    assert!(matches!(
        err,
        SessionError::NotInMatch {
            phase: SessionPhase::Closed
        }
    ));
}

#[test]
fn test_channel_error_is_fatal() {
    let (_host, mut guest) = connected_pair(RuleSet::default());
    let err = guest
        .handle_event(ChannelEvent::Error("connection reset".to_string()))
        .expect_err("fatal");
    assert!(matches!(err, SessionError::ChannelError { .. }));
    assert_eq!(guest.phase(), SessionPhase::Closed);
}

#[test]
fn test_apply_command_maps_to_session_actions() {
    let (mut host, mut guest) = connected_pair(RuleSet::default());

    let err = apply_command(&mut guest, LocalCommand::DeclineDraw).expect_err("nothing to decline");
    assert!(matches!(err, SessionError::NoDrawOffer));

    apply_command(&mut host, LocalCommand::OfferDraw).expect("offer");
    pump(&mut host, &mut guest);
    apply_command(&mut guest, LocalCommand::DeclineDraw).expect("decline");
    assert_eq!(guest.draw_offer(), DrawOffer::None);

    apply_command(&mut guest, LocalCommand::Chat("good luck".to_string())).expect("chat");
    let sent = guest.link().drain();
    assert!(matches!(
        sent.as_slice(),
        [PeerMessage::Chat { sender, text, .. }] if sender == "Guest" && text == "good luck"
    ));

    // Advisor requests and quitting are handled by the session loop
    apply_command(&mut host, LocalCommand::Hint).expect("no-op");
    apply_command(&mut host, LocalCommand::Quit).expect("no-op");
    assert!(host.link().drain().is_empty());

    apply_command(&mut host, LocalCommand::Play { from: p(5, 0), to: p(4, 1) }).expect("play");
    pump(&mut host, &mut guest);
    assert_eq!(host.game(), guest.game());
}

// ============================================================================
// TCP Loopback
// ============================================================================

/// Advisor whose answer never arrives
struct StalledAdvisor;

#[async_trait]
impl Advisor for StalledAdvisor {
    async fn suggest(&self, _board: &Board, _side: Side) -> Option<Suggestion> {
        std::future::pending().await
    }
}

/// Wait for the first session event matching `pred`
async fn wait_for_event(
    updates: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match updates.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event stream ended: {}", e),
            }
        }
    })
    .await
    .expect("event within timeout")
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event within timeout")
        .expect("channel still open")
}

#[tokio::test]
async fn test_tcp_sessions_sync_and_play() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        accept_stream(stream, "Host", RuleSet::default(), "LOOPBK".to_string())
    });
    let (mut guest, mut guest_events) = join(&addr.to_string(), "Guest", Some("LOOPBK".to_string()))
        .await
        .expect("connect");
    let (mut host, mut host_events) = accept.await.expect("accept task");

    // Open on both sides; the host sends Sync
    host.handle_event(next_event(&mut host_events).await).expect("host open");
    guest.handle_event(next_event(&mut guest_events).await).expect("guest open");
    guest.handle_event(next_event(&mut guest_events).await).expect("sync");
    assert_eq!(guest.phase(), SessionPhase::InMatch);

    // Join announcement
    host.handle_event(next_event(&mut host_events).await).expect("chat");

    host.play(p(5, 0), p(4, 1)).expect("opening");
    guest.handle_event(next_event(&mut guest_events).await).expect("move");
    assert_eq!(guest.game(), host.game());
    assert_eq!(guest.game().side_to_move(), Side::Second);

    // Dropping the host closes its writer; the guest sees the close
    drop(host);
    let err = guest
        .handle_event(next_event(&mut guest_events).await)
        .expect_err("peer gone");
    assert!(matches!(err, SessionError::ChannelClosed));
    assert_eq!(guest.phase(), SessionPhase::Closed);
}

#[tokio::test]
async fn test_join_unreachable_host_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let result = join(&addr.to_string(), "Guest", None).await;
    assert!(matches!(result, Err(SessionError::ConnectFailed { .. })));
}

#[tokio::test]
async fn test_session_loops_play_while_advisor_is_stalled() {
    //! Both participants run the real session loop over loopback TCP. The
    //! host asks for a hint that never comes back and then plays anyway; the
    //! guest must still receive the hop. Quitting ends the host loop cleanly
    //! and the guest loop with `ChannelClosed`.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        accept_stream(stream, "Host", RuleSet::default(), "LOOPBK".to_string())
    });
    let (guest, guest_events) = join(&addr.to_string(), "Guest", None)
        .await
        .expect("connect");
    let (host, host_events) = accept.await.expect("accept task");

    let mut host_updates = host.subscribe();
    let mut guest_updates = guest.subscribe();
    let (host_tx, host_rx) = mpsc::channel(8);
    let (_guest_tx, guest_rx) = mpsc::channel(8);
    let stalled: Arc<dyn Advisor> = Arc::new(StalledAdvisor);

    let host_loop = tokio::spawn(run_session(
        host,
        host_events,
        host_rx,
        stalled.clone(),
        AdvisorChat::new(&AdvisorConfig::default()),
    ));
    let guest_loop = tokio::spawn(run_session(
        guest,
        guest_events,
        guest_rx,
        stalled,
        AdvisorChat::new(&AdvisorConfig::default()),
    ));

    // Host is in the match once it has published the starting position
    wait_for_event(&mut host_updates, |e| matches!(e, SessionEvent::StateChanged(_))).await;
    wait_for_event(&mut guest_updates, |e| matches!(e, SessionEvent::StateChanged(_))).await;

    host_tx.send(LocalCommand::Hint).await.expect("hint");
    host_tx
        .send(LocalCommand::Play {
            from: p(5, 0),
            to: p(4, 1),
        })
        .await
        .expect("play");

    let event = wait_for_event(&mut guest_updates, |e| {
        matches!(e, SessionEvent::MoveApplied { remote: true, .. })
    })
    .await;
    match event {
        SessionEvent::MoveApplied { record, .. } => {
            assert_eq!(record.side, Side::First);
            assert_eq!(record.mv, Move::slide(p(5, 0), p(4, 1)));
        }
        other => panic!("unexpected event {:?}", other),
    }

    host_tx.send(LocalCommand::Quit).await.expect("quit");
    let host_result = tokio::time::timeout(Duration::from_secs(5), host_loop)
        .await
        .expect("host loop ends")
        .expect("host task");
    assert!(host_result.is_ok());

    let guest_result = tokio::time::timeout(Duration::from_secs(5), guest_loop)
        .await
        .expect("guest loop ends")
        .expect("guest task");
    assert!(matches!(guest_result, Err(SessionError::ChannelClosed)));
}
