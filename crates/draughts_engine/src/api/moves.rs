//! Move validation and application
//!
//! Functions for querying the legal set and committing single hops.

use super::state::evaluate_status;
use crate::error::{EngineError, EngineResult, IllegalMoveReason};
use crate::move_gen;
use crate::types::*;

/// Legal hops for the side to move
///
/// While a capture chain is in progress, only jumps of the chained piece are
/// legal. A decided game has no legal moves.
pub fn legal_moves(game: &Game) -> Vec<Move> {
    if game.status.is_terminal() {
        return Vec::new();
    }
    candidate_moves(game)
}

/// Legal set ignoring the match status
pub(super) fn candidate_moves(game: &Game) -> Vec<Move> {
    match game.continuation {
        Continuation::Continuing(at) => {
            move_gen::continuation_moves(&game.board, at, game.side_to_move)
        }
        Continuation::None => move_gen::legal_moves(&game.board, game.side_to_move, game.rules),
    }
}

/// Resolve a `(from, to)` choice into the full legal hop
///
/// Returns `None` if no legal hop connects the two squares.
pub fn find_legal_move(game: &Game, from: Position, to: Position) -> Option<Move> {
    legal_moves(game)
        .into_iter()
        .find(|mv| mv.from == from && mv.to == to)
}

/// Check if a hop is in the current legal set
///
/// `captured` is compared as a set.
pub fn is_legal_move(game: &Game, mv: &Move) -> bool {
    legal_moves(game).iter().any(|legal| legal.same_as(mv))
}

/// Commit one validated hop
///
/// In order: relocate the piece, remove captured pieces, crown a man that
/// reached its promotion row, then either hold the turn for a forced
/// continuation or pass it to the opponent. Terminal evaluation runs after
/// every hop, including intermediate ones of a chain.
///
/// # Errors
///
/// [`EngineError::IllegalMove`] if the game is decided or the hop is not in
/// the legal set. The game is left unchanged.
///
/// # Examples
///
/// ```rust
/// use draughts_engine::api::{apply_move, new_game};
/// use draughts_engine::types::{Move, Position, Side};
///
/// let mut game = new_game();
/// let mv = Move::slide(Position::new(5, 0).unwrap(), Position::new(4, 1).unwrap());
/// let outcome = apply_move(&mut game, &mv).unwrap();
/// assert!(outcome.turn_ended());
/// assert_eq!(game.side_to_move(), Side::Second);
/// ```
pub fn apply_move(game: &mut Game, mv: &Move) -> EngineResult<MoveOutcome> {
    if game.status.is_terminal() {
        return Err(EngineError::IllegalMove {
            mv: mv.clone(),
            reason: IllegalMoveReason::GameOver,
        });
    }

    if !is_legal_move(game, mv) {
        let reason = match game.continuation {
            Continuation::Continuing(at) if mv.from != at => {
                IllegalMoveReason::ContinuationRequired(at)
            }
            _ => IllegalMoveReason::NotInLegalSet,
        };
        return Err(EngineError::IllegalMove {
            mv: mv.clone(),
            reason,
        });
    }

    let side = game.side_to_move;
    let Some(mut piece) = game.board.take(mv.from) else {
        return Err(EngineError::IllegalMove {
            mv: mv.clone(),
            reason: IllegalMoveReason::NotInLegalSet,
        });
    };

    for &square in &mv.captured {
        game.board.take(square);
    }

    let promoted = piece.rank == Rank::Man && mv.to.row == side.promotion_row();
    if promoted {
        piece.rank = Rank::King;
    }
    game.board.set(mv.to, Some(piece));

    let chain_continues =
        mv.is_capture() && !move_gen::continuation_moves(&game.board, mv.to, side).is_empty();
    if chain_continues {
        game.continuation = Continuation::Continuing(mv.to);
    } else {
        game.continuation = Continuation::None;
        game.side_to_move = side.opponent();
    }

    game.status = evaluate_status(game);

    Ok(MoveOutcome {
        promoted,
        continuation: game.continuation,
        status: game.status,
    })
}
