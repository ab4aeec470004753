//! Cursor positions
//!
//! A (row, col) pair with the wrapping rule shared by the virtual screen,
//! the in-memory console and the static line renderer: writing past the
//! last column moves to the start of the next row.

use serde::{Deserialize, Serialize};

/// A 0-indexed cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Row position (0-indexed)
    pub row: usize,
    /// Column position (0-indexed)
    pub col: usize,
}

impl Position {
    pub const ORIGIN: Position = Position { row: 0, col: 0 };

    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Advance by `len` columns, wrapping at `width`
    pub fn advance(self, len: usize, width: usize) -> Self {
        let col = self.col + len;
        if width == 0 {
            return Self { row: self.row, col };
        }
        Self {
            row: self.row + col / width,
            col: col % width,
        }
    }

    /// Start of the next row
    pub fn newline(self) -> Self {
        Self {
            row: self.row + 1,
            col: 0,
        }
    }

    /// Start of the current row
    pub fn carriage_return(self) -> Self {
        Self { row: self.row, col: 0 }
    }
}
