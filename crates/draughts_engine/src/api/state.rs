//! Status transitions and snapshots
//!
//! Terminal evaluation, resignation, draw acceptance, and the flat snapshot
//! used to synchronize two peers.

use super::moves::candidate_moves;
use crate::error::{EngineError, EngineResult};
use crate::move_gen;
use crate::types::*;

/// Derive the status of a position
///
/// A side with no pieces loses; otherwise the side to move loses when it has
/// no legal hop. Pure: the stored status is not consulted.
pub fn evaluate_status(game: &Game) -> GameStatus {
    if game.board.count(Side::First) == 0 {
        return GameStatus::SecondWins;
    }
    if game.board.count(Side::Second) == 0 {
        return GameStatus::FirstWins;
    }

    let stuck = match game.continuation {
        Continuation::Continuing(_) => candidate_moves(game).is_empty(),
        Continuation::None => !move_gen::has_any_move(&game.board, game.side_to_move),
    };
    if stuck {
        GameStatus::win_for(game.side_to_move.opponent())
    } else {
        GameStatus::InProgress
    }
}

/// `side` concedes; the opponent wins
pub fn resign(game: &mut Game, side: Side) -> EngineResult<GameStatus> {
    ensure_in_progress(game)?;
    game.status = GameStatus::win_for(side.opponent());
    game.continuation = Continuation::None;
    Ok(game.status)
}

/// Both sides agreed to a draw
pub fn accept_draw(game: &mut Game) -> EngineResult<GameStatus> {
    ensure_in_progress(game)?;
    game.status = GameStatus::Draw;
    game.continuation = Continuation::None;
    Ok(game.status)
}

/// Apply a status reported by the peer
///
/// Bypasses terminal evaluation. Only an in-progress game can change; a
/// decided game keeps its result. Returns whether the status changed.
pub fn force_status(game: &mut Game, status: GameStatus) -> bool {
    if game.status.is_terminal() || !status.is_terminal() {
        return false;
    }
    game.status = status;
    game.continuation = Continuation::None;
    true
}

/// Flat copy of the game for the `Sync` message
pub fn snapshot(game: &Game) -> GameSnapshot {
    GameSnapshot {
        board: game.board,
        side_to_move: game.side_to_move,
        status: game.status,
        continuation: game.continuation,
        rules: game.rules,
    }
}

/// Overwrite the game with a peer's snapshot
///
/// A decided snapshot keeps its status; otherwise the status is re-derived
/// from the received position.
pub fn load_snapshot(game: &mut Game, snapshot: &GameSnapshot) {
    game.board = snapshot.board;
    game.side_to_move = snapshot.side_to_move;
    game.continuation = snapshot.continuation;
    game.rules = snapshot.rules;
    game.status = if snapshot.status.is_terminal() {
        snapshot.status
    } else {
        evaluate_status(game)
    };
}

fn ensure_in_progress(game: &Game) -> EngineResult<()> {
    if game.status.is_terminal() {
        return Err(EngineError::GameOver {
            status: game.status,
        });
    }
    Ok(())
}
