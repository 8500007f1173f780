//! # Draughts Engine
//!
//! Pure rule engine and game state machine for two-player draughts on an 8×8
//! board. Nothing in this crate performs I/O; the networking layer drives it by
//! applying one hop at a time and mirroring the result to the peer.
//!
//! ## Module Organization
//!
//! - `types` - Sides, pieces, positions, moves, game status and the `Game` state
//! - `board` - The 8×8 board model and its advisory token serialization
//! - `move_gen` - Move generation for men and kings (the rule engine)
//! - `api` - Game lifecycle, move application and terminal evaluation
//! - `error` - Engine error types
//!
//! ## Example
//!
//! ```rust
//! use draughts_engine::api::{apply_move, find_legal_move, new_game};
//! use draughts_engine::types::{Position, Side};
//!
//! let mut game = new_game();
//! let from = Position::new(5, 0).unwrap();
//! let to = Position::new(4, 1).unwrap();
//! let mv = find_legal_move(&game, from, to).unwrap();
//! apply_move(&mut game, &mv).unwrap();
//! assert_eq!(game.side_to_move(), Side::Second);
//! ```

pub mod api;
pub mod board;
pub mod constants;
pub mod error;
pub mod move_gen;
pub mod types;

pub use board::Board;
pub use error::{EngineError, EngineResult, IllegalMoveReason};
pub use types::{
    CaptureRule, Continuation, Game, GameSnapshot, GameStatus, Move, MoveOutcome, Piece,
    Position, Rank, RuleSet, Side,
};
