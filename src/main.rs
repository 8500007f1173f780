use anyhow::Context;
use clap::{Parser, Subcommand};
use damalink::core::settings_persistence::{load_settings, save_settings};
use damalink::game::ai::{build_advisor, AdvisorChat};
use damalink::game::{MoveRecord, SessionError, SessionEvent};
use damalink::networking::{generate_room_code, host, join, run_session, LocalCommand};
use draughts_engine::api::{legal_moves, load_snapshot, new_game};
use draughts_engine::{Game, GameStatus, Position, Side};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "damalink", version, about = "Peer-to-peer draughts")]
struct Cli {
    /// Name shown to the opponent
    #[arg(long, global = true)]
    name: Option<String>,

    /// Disable hints and the chat assistant
    #[arg(long, global = true)]
    no_advisor: bool,

    /// Persist the effective settings before starting
    #[arg(long, global = true)]
    save: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Wait for an opponent (you play White)
    Host {
        /// Address to listen on, e.g. 0.0.0.0:7878
        #[arg(long)]
        listen: Option<String>,

        /// Force a capture whenever one is available
        #[arg(long)]
        strict_capture: bool,

        /// Use this room code instead of a random one
        #[arg(long)]
        room: Option<String>,
    },
    /// Connect to a host (you play Black)
    Join {
        /// Host address, e.g. 192.168.1.20:7878
        addr: String,

        /// Room code the host announced
        #[arg(long)]
        room: Option<String>,
    },
}

const HELP: &str = "\
commands:
  move R,C R,C   play a hop (e.g. move 5,0 4,1)
  moves          list your legal hops
  board          show the board
  history        show committed hops
  resign         concede
  draw           offer a draw
  accept         accept the opponent's draw offer
  decline        decline the opponent's draw offer
  say TEXT       chat with the opponent
  hint           ask the advisor for a move
  ask TEXT       ask the advisor a question
  quit           leave the match and exit";

const LOBBY_HELP: &str = "\
not connected; type one of:
  host [ROOM]       wait for an opponent
  join ADDR [ROOM]  connect to a host
  quit              exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(name) = cli.name {
        settings.player_name = name;
    }
    if let Mode::Host {
        listen,
        strict_capture,
        ..
    } = &cli.mode
    {
        if let Some(listen) = listen {
            settings.listen_addr = listen.clone();
        }
        settings.strict_capture |= *strict_capture;
    }
    if cli.no_advisor {
        settings.advisor.enabled = false;
    }
    settings.validate().context("invalid settings")?;
    if cli.save {
        let path = save_settings(&settings)?;
        println!("Settings saved to {}", path.display());
    }

    let advisor_config = settings.advisor.clone().with_env_key();
    let advisor = build_advisor(&advisor_config);
    let mut input = spawn_stdin_lines();
    let mut mode = cli.mode;

    loop {
        let connected = match mode {
            Mode::Host { room, .. } => {
                let room = room
                    .map(|code| code.trim().to_ascii_uppercase())
                    .unwrap_or_else(generate_room_code);
                println!("Room code: {}  (waiting for an opponent)", room);
                host(
                    settings.listen_socket()?,
                    &settings.player_name,
                    settings.rules(),
                    room,
                )
                .await
            }
            Mode::Join { addr, room } => join(&addr, &settings.player_name, room).await,
        };

        match connected {
            Ok((session, events)) => {
                let role = session.role();
                println!("You play {}. Type `help` for commands.", side_label(role));

                let (commands_tx, commands_rx) = mpsc::channel(16);
                let updates = session.subscribe();
                let chat = AdvisorChat::new(&advisor_config);
                let session_loop = run_session(session, events, commands_rx, advisor.clone(), chat);
                tokio::pin!(session_loop);

                let result = tokio::select! {
                    result = &mut session_loop => result,
                    () = console(role, updates, commands_tx, &mut input) => session_loop.await,
                };

                match result {
                    Ok(()) => return Ok(()),
                    Err(SessionError::ChannelClosed) => println!("Opponent left. Match over."),
                    Err(e) => println!("Match ended: {}", e),
                }
            }
            Err(e) => println!("{}", e),
        }

        match lobby(&mut input).await {
            Some(next) => mode = next,
            None => return Ok(()),
        }
    }
}

/// Forward stdin lines so the console and the lobby share one reader
fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Pre-connection prompt; `None` when the player exits
async fn lobby(input: &mut mpsc::Receiver<String>) -> Option<Mode> {
    println!("{}", LOBBY_HELP);
    loop {
        let line = input.recv().await?;
        let mut words = line.split_whitespace();
        match words.next() {
            None => continue,
            Some("host") => {
                return Some(Mode::Host {
                    listen: None,
                    strict_capture: false,
                    room: words.next().map(str::to_string),
                })
            }
            Some("join") => match words.next() {
                Some(addr) => {
                    return Some(Mode::Join {
                        addr: addr.to_string(),
                        room: words.next().map(str::to_string),
                    })
                }
                None => println!("usage: join ADDR [ROOM]"),
            },
            Some("quit") | Some("exit") => return None,
            Some(other) => println!("Unknown command `{}`. {}", other, LOBBY_HELP),
        }
    }
}

/// Result line from the local player's point of view
fn result_line(status: GameStatus, role: Side) -> String {
    match status.winner() {
        Some(side) if side == role => format!("{}. You win!", status.message()),
        Some(_) => format!("{}. You lose.", status.message()),
        None => status.message().to_string(),
    }
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::First => "White (W)",
        Side::Second => "Black (B)",
    }
}

/// Parse `R,C`
fn parse_square(token: &str) -> Option<Position> {
    let (row, col) = token.split_once(',')?;
    Position::new(row.trim().parse().ok()?, col.trim().parse().ok()?)
}

/// Terminal front end: prints session events and turns input into commands
async fn console(
    role: Side,
    mut updates: broadcast::Receiver<SessionEvent>,
    commands: mpsc::Sender<LocalCommand>,
    input: &mut mpsc::Receiver<String>,
) {
    let mut mirror: Game = new_game();
    let mut history: Vec<MoveRecord> = Vec::new();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(event) => show_event(&event, role, &mut mirror, &mut history),
                Err(broadcast::error::RecvError::Lagged(n)) => warn!("Console skipped {} events", n),
                Err(broadcast::error::RecvError::Closed) => break,
            },
            line = input.recv() => {
                let line = match line {
                    Some(line) => line,
                    None => {
                        let _ = commands.send(LocalCommand::Quit).await;
                        break;
                    }
                };
                let line = line.trim();
                let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
                let command = match word {
                    "" => continue,
                    "help" => { println!("{}", HELP); continue; }
                    "board" => { println!("{}", mirror.board()); continue; }
                    "moves" => {
                        if mirror.side_to_move() != role || mirror.is_over() {
                            println!("Not your turn.");
                        } else {
                            for mv in legal_moves(&mirror) {
                                println!("  {}", mv);
                            }
                        }
                        continue;
                    }
                    "history" => {
                        for record in &history {
                            println!("  {:>3}. {} {}{}", record.turn, record.side.letter(), record.mv,
                                if record.promoted { " (crowned)" } else { "" });
                        }
                        continue;
                    }
                    "move" | "m" => {
                        let mut squares = rest.split_whitespace().map(parse_square);
                        match (squares.next().flatten(), squares.next().flatten()) {
                            (Some(from), Some(to)) => LocalCommand::Play { from, to },
                            _ => { println!("usage: move R,C R,C"); continue; }
                        }
                    }
                    "resign" => LocalCommand::Resign,
                    "draw" => LocalCommand::OfferDraw,
                    "accept" => LocalCommand::AcceptDraw,
                    "decline" => LocalCommand::DeclineDraw,
                    "say" => LocalCommand::Chat(rest.to_string()),
                    "hint" => LocalCommand::Hint,
                    "ask" => LocalCommand::Ask(rest.to_string()),
                    "quit" | "exit" => LocalCommand::Quit,
                    other => { println!("Unknown command `{}`. Type `help`.", other); continue; }
                };
                let quitting = command == LocalCommand::Quit;
                if commands.send(command).await.is_err() || quitting {
                    break;
                }
            }
        }
    }
}

fn show_event(event: &SessionEvent, role: Side, mirror: &mut Game, history: &mut Vec<MoveRecord>) {
    match event {
        SessionEvent::StateChanged(snapshot) => {
            load_snapshot(mirror, snapshot);
            println!("{}", mirror.board());
            if mirror.is_over() {
                println!("{}", result_line(mirror.status(), role));
            } else if let Some(at) = mirror.continuation().square() {
                println!("{} must keep capturing from {}", mirror.side_to_move(), at);
            } else {
                println!("{} to move", mirror.side_to_move());
            }
        }
        SessionEvent::MoveApplied { record, remote } => {
            if *remote {
                println!("Opponent played {}", record.mv);
            }
            history.push(record.clone());
        }
        SessionEvent::DrawOffered => println!("Opponent offers a draw (accept / decline)"),
        SessionEvent::DrawOfferSent => println!("Draw offered"),
        SessionEvent::DrawDeclined => println!("Draw declined"),
        SessionEvent::ChatReceived { sender, text, at } => {
            println!("[{}] {}: {}", at.format("%H:%M"), sender, text)
        }
        SessionEvent::Suggestion { mv: Some(mv) } => println!("Advisor suggests {}", mv),
        SessionEvent::Suggestion { mv: None } => println!("No suggestion available"),
        SessionEvent::AdvisorReply { text } => println!("Dama Master: {}", text),
        SessionEvent::Rejected { reason } => println!("Rejected: {}", reason),
        SessionEvent::Desync { mv, reason } => {
            println!("Dropped opponent move {} ({})", mv, reason)
        }
        SessionEvent::Disconnected { reason } => {
            history.clear();
            println!("Disconnected: {}", reason);
        }
    }
}
