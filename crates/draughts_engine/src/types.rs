//! # Draughts Engine Core Types
//!
//! ## Overview
//!
//! Value types shared by the rule engine, the game state machine and the peer
//! protocol. Every type here is plain data: `Copy` where it is small, and
//! `Serialize`/`Deserialize` so that it can travel inside protocol messages
//! without a separate wire representation.
//!
//! ## Sides
//!
//! A match always has exactly two sides, identified structurally as
//! [`Side::First`] and [`Side::Second`]. The connection-accepting peer plays
//! First and moves first. For the advisory serialization First is written as
//! `W` and Second as `B`.
//!
//! ## Moves
//!
//! A [`Move`] is a single hop. A capturing move carries exactly one captured
//! square; a multi-jump turn is a sequence of such hops, each applied on its
//! own while the game holds a [`Continuation::Continuing`] cursor on the
//! landing square.
//!
//! ## The `Game` structure
//!
//! [`Game`] is the authoritative state owned by one participant. It is only
//! mutated through the functions in [`crate::api`], which validate every hop
//! against the rule engine before committing it.

use crate::board::Board;
use crate::constants::BOARD_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two match participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Moves first, starts on rows 5-7 and promotes on row 0
    First,
    /// Starts on rows 0-2 and promotes on row 7
    Second,
}

impl Side {
    /// The other side
    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Row step of a man's forward slide
    pub fn forward(self) -> i8 {
        match self {
            Side::First => -1,
            Side::Second => 1,
        }
    }

    /// Row on which a man of this side is promoted
    pub fn promotion_row(self) -> u8 {
        match self {
            Side::First => 0,
            Side::Second => (BOARD_SIZE - 1) as u8,
        }
    }

    /// Letter used by the advisory serialization
    pub fn letter(self) -> char {
        match self {
            Side::First => 'W',
            Side::Second => 'B',
        }
    }

    /// Parse an advisory side letter
    pub fn from_letter(letter: char) -> Option<Side> {
        match letter {
            'W' => Some(Side::First),
            'B' => Some(Side::Second),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => write!(f, "First"),
            Side::Second => write!(f, "Second"),
        }
    }
}

/// Piece rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Man,
    King,
}

/// A piece on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub owner: Side,
    pub rank: Rank,
}

impl Piece {
    pub fn man(owner: Side) -> Self {
        Self {
            owner,
            rank: Rank::Man,
        }
    }

    pub fn king(owner: Side) -> Self {
        Self {
            owner,
            rank: Rank::King,
        }
    }

    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }
}

/// A square coordinate
///
/// Values received from the wire are not trusted: use [`Position::is_valid`]
/// before indexing, or build positions with [`Position::new`], which rejects
/// anything outside the 8×8 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// Bound-checked constructor
    pub fn new(row: i8, col: i8) -> Option<Position> {
        if (0..BOARD_SIZE).contains(&row) && (0..BOARD_SIZE).contains(&col) {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.row < BOARD_SIZE as u8 && self.col < BOARD_SIZE as u8
    }

    /// Whether this is a playable (dark) square
    pub fn is_dark(&self) -> bool {
        (self.row as u16 + self.col as u16) % 2 == 1
    }

    /// The square offset by `(d_row, d_col)`, if it is still on the board
    #[inline]
    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Position> {
        Position::new(self.row as i8 + d_row, self.col as i8 + d_col)
    }

    /// All 64 squares in row-major order
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE as u8)
            .flat_map(|row| (0..BOARD_SIZE as u8).map(move |col| Position { row, col }))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// A single hop
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    /// Squares emptied by this hop. Empty for a slide.
    #[serde(default)]
    pub captured: Vec<Position>,
}

impl Move {
    pub fn slide(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            captured: Vec::new(),
        }
    }

    pub fn jump(from: Position, to: Position, captured: Position) -> Self {
        Self {
            from,
            to,
            captured: vec![captured],
        }
    }

    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    /// Equality with `captured` compared as a set
    pub fn same_as(&self, other: &Move) -> bool {
        if self.from != other.from || self.to != other.to {
            return false;
        }
        let mut mine = self.captured.clone();
        let mut theirs = other.captured.clone();
        mine.sort_unstable();
        mine.dedup();
        theirs.sort_unstable();
        theirs.dedup();
        mine == theirs
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)?;
        for square in &self.captured {
            write!(f, " x{}", square)?;
        }
        Ok(())
    }
}

/// Match status
///
/// ```text
/// InProgress → FirstWins / SecondWins / Draw
/// ```
///
/// All non-`InProgress` values are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    InProgress,
    FirstWins,
    SecondWins,
    Draw,
}

impl GameStatus {
    /// The win state for `side`
    pub fn win_for(side: Side) -> GameStatus {
        match side {
            Side::First => GameStatus::FirstWins,
            Side::Second => GameStatus::SecondWins,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != GameStatus::InProgress
    }

    pub fn winner(&self) -> Option<Side> {
        match self {
            GameStatus::FirstWins => Some(Side::First),
            GameStatus::SecondWins => Some(Side::Second),
            _ => None,
        }
    }

    /// Human-readable result line
    pub fn message(&self) -> &'static str {
        match self {
            GameStatus::InProgress => "Game in progress",
            GameStatus::FirstWins => "First wins",
            GameStatus::SecondWins => "Second wins",
            GameStatus::Draw => "Draw agreed",
        }
    }
}

/// Capture-chain cursor
///
/// While `Continuing`, the side to move must keep jumping with the piece on
/// the named square before the turn can pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Continuation {
    #[default]
    None,
    Continuing(Position),
}

impl Continuation {
    pub fn square(&self) -> Option<Position> {
        match self {
            Continuation::None => None,
            Continuation::Continuing(at) => Some(*at),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Continuation::Continuing(_))
    }
}

/// Whether a side may make a quiet move while a capture is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaptureRule {
    /// Quiet moves stay legal at turn start; only mid-chain continuation is forced
    #[default]
    Optional,
    /// If any capture exists at turn start, only captures are legal
    Mandatory,
}

/// Rule variations agreed for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub capture: CaptureRule,
}

impl RuleSet {
    pub fn strict() -> Self {
        Self {
            capture: CaptureRule::Mandatory,
        }
    }
}

/// Authoritative game state of one participant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Game {
    pub(crate) board: Board,
    pub(crate) side_to_move: Side,
    pub(crate) status: GameStatus,
    pub(crate) continuation: Continuation,
    pub(crate) rules: RuleSet,
}

impl Game {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn continuation(&self) -> Continuation {
        self.continuation
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Flat, serializable copy of a [`Game`]
///
/// This is the payload of the protocol's `Sync` message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: Board,
    pub side_to_move: Side,
    pub status: GameStatus,
    pub continuation: Continuation,
    pub rules: RuleSet,
}

/// What a committed hop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The moving man was crowned on this hop
    pub promoted: bool,
    /// Cursor after the hop; `Continuing` means the same side moves again
    pub continuation: Continuation,
    /// Status after terminal evaluation
    pub status: GameStatus,
}

impl MoveOutcome {
    pub fn turn_ended(&self) -> bool {
        !self.continuation.is_active()
    }
}
