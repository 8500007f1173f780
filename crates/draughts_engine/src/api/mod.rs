//! Public API for the draughts engine
//!
//! Provides the game state machine: lifecycle, move application and status
//! transitions. Every mutation validates against the rule engine first and
//! leaves the game untouched on failure.
//!
//! ## Module Organization
//!
//! - `game` - Game lifecycle (new_game, reset_game)
//! - `moves` - Move validation and application (legal_moves, apply_move)
//! - `state` - Status transitions and snapshots (resign, accept_draw, load_snapshot)

mod game;
mod moves;
mod state;


pub use game::{new_game, new_game_from_position, new_game_with_rules, reset_game};
pub use moves::{apply_move, find_legal_move, is_legal_move, legal_moves};
pub use state::{
    accept_draw, evaluate_status, force_status, load_snapshot, resign, snapshot,
};
