//! Move generation for men and kings
//!
//! Pure functions over a [`Board`]. Enumeration order is fixed (row-major
//! square scan, then [`DIAGONALS`](crate::constants::DIAGONALS) order) so that
//! both peers and any move suggester see identical sequences.
//!
//! Promotion is not evaluated here; it happens when the game state machine
//! commits a hop.

mod king;
mod man;


use crate::board::Board;
use crate::types::{CaptureRule, Move, Position, Rank, RuleSet, Side};

/// Moves for the piece on `pos`
///
/// Returns an empty list when `pos` is empty or holds a piece not owned by
/// `side`. With `jump_only` set, non-capturing moves are suppressed.
pub fn moves_for_piece(board: &Board, pos: Position, side: Side, jump_only: bool) -> Vec<Move> {
    let piece = match board.get(pos) {
        Some(piece) if piece.owner == side => piece,
        _ => return Vec::new(),
    };

    match piece.rank {
        Rank::Man => man::moves(board, pos, side, jump_only),
        Rank::King => king::moves(board, pos, side, jump_only),
    }
}

/// Jumps available to the piece on `pos` (forced-continuation candidates)
pub fn continuation_moves(board: &Board, pos: Position, side: Side) -> Vec<Move> {
    moves_for_piece(board, pos, side, true)
}

/// Every move of every piece owned by `side`, unfiltered
pub fn all_valid_moves(board: &Board, side: Side) -> Vec<Move> {
    board
        .pieces(side)
        .flat_map(|(pos, _)| moves_for_piece(board, pos, side, false))
        .collect()
}

/// Turn-start legal moves under `rules`
///
/// With [`CaptureRule::Mandatory`], quiet moves are dropped whenever at least
/// one capture exists.
pub fn legal_moves(board: &Board, side: Side, rules: RuleSet) -> Vec<Move> {
    let moves = all_valid_moves(board, side);
    match rules.capture {
        CaptureRule::Optional => moves,
        CaptureRule::Mandatory => {
            if moves.iter().any(Move::is_capture) {
                moves.into_iter().filter(Move::is_capture).collect()
            } else {
                moves
            }
        }
    }
}

/// Whether `side` has any move at all
pub fn has_any_move(board: &Board, side: Side) -> bool {
    board
        .pieces(side)
        .any(|(pos, _)| !moves_for_piece(board, pos, side, false).is_empty())
}

/// Whether `pos` holds a piece owned by the opponent of `side`
#[inline]
fn is_opponent(board: &Board, pos: Position, side: Side) -> bool {
    board
        .get(pos)
        .is_some_and(|piece| piece.owner != side)
}
