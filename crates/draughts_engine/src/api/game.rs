//! Game lifecycle management
//!
//! Functions for creating and resetting games.

use super::state::evaluate_status;
use crate::board::Board;
use crate::types::*;

/// Create a new game with the starting position and default rules
pub fn new_game() -> Game {
    new_game_with_rules(RuleSet::default())
}

/// Create a new game with the starting position under `rules`
pub fn new_game_with_rules(rules: RuleSet) -> Game {
    Game {
        board: Board::starting(),
        side_to_move: Side::First,
        status: GameStatus::InProgress,
        continuation: Continuation::None,
        rules,
    }
}

/// Create a game from an arbitrary position
///
/// The status is evaluated immediately, so a position where `side_to_move`
/// is already stuck starts out decided.
pub fn new_game_from_position(board: Board, side_to_move: Side, rules: RuleSet) -> Game {
    let mut game = Game {
        board,
        side_to_move,
        status: GameStatus::InProgress,
        continuation: Continuation::None,
        rules,
    };
    game.status = evaluate_status(&game);
    game
}

/// Reset the game to the starting position, keeping its rules
pub fn reset_game(game: &mut Game) {
    *game = new_game_with_rules(game.rules);
}
