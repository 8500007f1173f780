//! Board model and helper functions
//!
//! Provides the fixed 8×8 grid and the fundamental square operations used
//! throughout the engine:
//! - Square queries and updates
//! - Piece counting and row-major enumeration
//! - Token-grid serialization for the move advisor

use crate::constants::{BOARD_SIZE, EMPTY_TOKEN, KING_MARKER, STARTING_ROWS};
use crate::error::{EngineError, EngineResult};
use crate::types::{Piece, Position, Rank, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

const SIZE: usize = BOARD_SIZE as usize;

/// 8×8 grid of optional pieces
///
/// The model does not forbid writing to light squares; move generation only
/// ever targets dark squares, so reachable positions never use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Piece>; SIZE]; SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}

impl Board {
    /// Board with no pieces
    pub fn empty() -> Self {
        Self {
            squares: [[None; SIZE]; SIZE],
        }
    }

    /// Standard starting position
    ///
    /// Second's men fill the dark squares of rows 0-2, First's men the dark
    /// squares of rows 5-7.
    pub fn starting() -> Self {
        let mut board = Self::empty();
        for pos in Position::all().filter(Position::is_dark) {
            let row = pos.row as i8;
            if row < STARTING_ROWS {
                board.set(pos, Some(Piece::man(Side::Second)));
            } else if row >= BOARD_SIZE - STARTING_ROWS {
                board.set(pos, Some(Piece::man(Side::First)));
            }
        }
        board
    }

    /// Piece at `pos`, `None` for empty or off-board squares
    #[inline]
    pub fn get(&self, pos: Position) -> Option<Piece> {
        if !pos.is_valid() {
            return None;
        }
        self.squares[pos.row as usize][pos.col as usize]
    }

    /// Whether `pos` is on the board and unoccupied
    #[inline]
    pub fn is_empty(&self, pos: Position) -> bool {
        pos.is_valid() && self.squares[pos.row as usize][pos.col as usize].is_none()
    }

    /// Overwrite a square. Off-board writes are ignored.
    #[inline]
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        if pos.is_valid() {
            self.squares[pos.row as usize][pos.col as usize] = piece;
        }
    }

    /// Remove and return the piece at `pos`
    #[inline]
    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        if !pos.is_valid() {
            return None;
        }
        self.squares[pos.row as usize][pos.col as usize].take()
    }

    /// Pieces owned by `side`, in row-major order
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| {
            self.get(pos)
                .filter(|piece| piece.owner == side)
                .map(|piece| (pos, piece))
        })
    }

    /// Number of pieces owned by `side`
    pub fn count(&self, side: Side) -> usize {
        self.pieces(side).count()
    }

    /// Serialize as rows of per-cell tokens
    ///
    /// Each token is the owner's side letter plus `K` for a king, or `.` for an
    /// empty square: `[["." , "B", ...], ...]`.
    pub fn token_grid(&self) -> Vec<Vec<String>> {
        self.squares
            .iter()
            .map(|row| row.iter().map(|cell| cell_token(*cell)).collect())
            .collect()
    }

    /// Parse a token grid produced by [`Board::token_grid`]
    ///
    /// An empty string is accepted as an empty square, matching the compact
    /// layout tables where blank cells are written as `""`.
    pub fn from_token_grid<R, S>(grid: &[R]) -> EngineResult<Board>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        if grid.len() != SIZE {
            return Err(EngineError::InvalidLayout {
                message: format!("expected {} rows, found {}", SIZE, grid.len()),
            });
        }

        let mut board = Board::empty();
        for (row, cells) in grid.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != SIZE {
                return Err(EngineError::InvalidLayout {
                    message: format!("row {} has {} cells, expected {}", row, cells.len(), SIZE),
                });
            }
            for (col, token) in cells.iter().enumerate() {
                let piece = parse_token(token.as_ref()).ok_or_else(|| EngineError::InvalidLayout {
                    message: format!("unknown token '{}' at ({},{})", token.as_ref(), row, col),
                })?;
                board.squares[row][col] = piece;
            }
        }
        Ok(board)
    }
}

fn cell_token(cell: Option<Piece>) -> String {
    match cell {
        None => EMPTY_TOKEN.to_string(),
        Some(piece) => {
            let mut token = piece.owner.letter().to_string();
            if piece.rank == Rank::King {
                token.push(KING_MARKER);
            }
            token
        }
    }
}

/// `Some(None)` for an empty token, `None` for an unknown one
fn parse_token(token: &str) -> Option<Option<Piece>> {
    let token = token.trim();
    if token.is_empty() || token == EMPTY_TOKEN {
        return Some(None);
    }

    let mut chars = token.chars();
    let owner = chars.next().and_then(Side::from_letter)?;
    match (chars.next(), chars.next()) {
        (None, _) => Some(Some(Piece::man(owner))),
        (Some(KING_MARKER), None) => Some(Some(Piece::king(owner))),
        _ => None,
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..SIZE {
            write!(f, " {} ", col)?;
        }
        writeln!(f)?;
        for (row, cells) in self.squares.iter().enumerate() {
            write!(f, " {} ", row)?;
            for cell in cells {
                let glyph = match cell {
                    None => " . ".to_string(),
                    Some(piece) => format!("{:^3}", cell_token(Some(*piece))),
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
