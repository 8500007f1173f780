//! Man move generation
//!
//! A man jumps in all four diagonal directions but slides only forward.

use super::is_opponent;
use crate::board::Board;
use crate::constants::{DIAGONALS, SLIDE_COLUMNS};
use crate::types::{Move, Position, Side};

/// Jumps first (in direction order), then forward slides
pub(super) fn moves(board: &Board, from: Position, side: Side, jump_only: bool) -> Vec<Move> {
    let mut moves = Vec::new();

    for &(d_row, d_col) in &DIAGONALS {
        // Landing must be on the board; the jumped square is then too.
        let Some(landing) = from.offset(d_row * 2, d_col * 2) else {
            continue;
        };
        let Some(over) = from.offset(d_row, d_col) else {
            continue;
        };

        if is_opponent(board, over, side) && board.is_empty(landing) {
            moves.push(Move::jump(from, landing, over));
        }
    }

    if !jump_only {
        let d_row = side.forward();
        for &d_col in &SLIDE_COLUMNS {
            if let Some(to) = from.offset(d_row, d_col) {
                if board.is_empty(to) {
                    moves.push(Move::slide(from, to));
                }
            }
        }
    }

    moves
}
