//! Board geometry constants
//!
//! The board is indexed `(row, col)` with row 0 at the top. First's men start
//! on rows 5-7 and advance toward row 0; Second's men start on rows 0-2 and
//! advance toward row 7. Only dark squares (`(row + col)` odd) are used.

/// Number of rows and columns on the board
pub const BOARD_SIZE: i8 = 8;

/// Number of rows each side fills with men at the start of a match
pub const STARTING_ROWS: i8 = 3;

/// Diagonal unit directions in generation order.
///
/// Move enumeration must be reproducible on both peers, so every generator
/// walks the directions in exactly this order.
pub const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Column steps of a man's two forward slides, in generation order
pub const SLIDE_COLUMNS: [i8; 2] = [1, -1];

/// Token for an empty square in the advisory serialization
pub const EMPTY_TOKEN: &str = ".";

/// Suffix appended to a side letter for a king in the advisory serialization
pub const KING_MARKER: char = 'K';
