//! King move generation
//!
//! A king scans each diagonal outward. Empty squares before the first piece
//! are quiet destinations. If the first piece is an opponent's, every empty
//! square after it is a capturing destination until the next occupied square.
//! An own piece first ends the ray.

use super::is_opponent;
use crate::board::Board;
use crate::constants::DIAGONALS;
use crate::types::{Move, Position, Side};

pub(super) fn moves(board: &Board, from: Position, side: Side, jump_only: bool) -> Vec<Move> {
    let mut moves = Vec::new();

    for &(d_row, d_col) in &DIAGONALS {
        let mut jumped: Option<Position> = None;
        let mut current = from;

        while let Some(next) = current.offset(d_row, d_col) {
            current = next;

            if board.is_empty(next) {
                match jumped {
                    Some(over) => moves.push(Move::jump(from, next, over)),
                    None if !jump_only => moves.push(Move::slide(from, next)),
                    None => {}
                }
                continue;
            }

            // Occupied square
            if jumped.is_none() && is_opponent(board, next, side) {
                jumped = Some(next);
                continue;
            }
            break;
        }
    }

    moves
}
