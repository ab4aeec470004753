//! In-memory console
//!
//! A grid of colored cells driven through [`ConsoleApi`]. Used to render
//! emulated output without a real terminal and to inspect the result.

use std::io;

use serde::Serialize;

use super::console::{ConsoleApi, EraseRange};
use crate::ansi::AnsiColor;
use crate::position::Position;

/// A single character cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub ch: char,
    pub fg: AnsiColor,
    pub bg: AnsiColor,
}

impl Cell {
    fn blank(fg: AnsiColor, bg: AnsiColor) -> Self {
        Self { ch: ' ', fg, bg }
    }
}

/// Console state held entirely in memory
#[derive(Debug, Clone)]
pub struct HeadlessConsole {
    cols: usize,
    rows: usize,
    grid: Vec<Vec<Cell>>,
    cursor: Position,
    cursor_visible: bool,
    fg: AnsiColor,
    bg: AnsiColor,
    default_fg: AnsiColor,
    default_bg: AnsiColor,
    /// Rows scrolled off the top since creation
    scrolled: usize,
}

const TAB_WIDTH: usize = 8;

impl HeadlessConsole {
    /// Create a console with the given dimensions (at least 1x1)
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let (default_fg, default_bg) = (AnsiColor::White, AnsiColor::Black);
        Self {
            cols,
            rows,
            grid: vec![vec![Cell::blank(default_fg, default_bg); cols]; rows],
            cursor: Position::ORIGIN,
            cursor_visible: true,
            fg: default_fg,
            bg: default_bg,
            default_fg,
            default_bg,
            scrolled: 0,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.grid.get(row).and_then(|r| r.get(col))
    }

    /// Text of one row with trailing blanks removed
    pub fn row_text(&self, row: usize) -> String {
        self.grid
            .get(row)
            .map(|cells| {
                let s: String = cells.iter().map(|c| c.ch).collect();
                s.trim_end().to_string()
            })
            .unwrap_or_default()
    }

    /// All rows, trailing blanks removed
    pub fn lines(&self) -> Vec<String> {
        (0..self.rows).map(|r| self.row_text(r)).collect()
    }

    /// Rows joined with newlines, with trailing empty rows removed
    pub fn contents(&self) -> String {
        let mut lines = self.lines();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn scrolled(&self) -> usize {
        self.scrolled
    }

    fn blank(&self) -> Cell {
        Cell::blank(self.fg, self.bg)
    }

    fn scroll_up(&mut self) {
        let blank = vec![self.blank(); self.cols];
        self.grid.remove(0);
        self.grid.push(blank);
        self.scrolled += 1;
    }

    fn line_feed(&mut self) {
        if self.cursor.row + 1 >= self.rows {
            self.scroll_up();
            self.cursor.row = self.rows - 1;
        } else {
            self.cursor.row += 1;
        }
        self.cursor.col = 0;
    }

    fn put_char(&mut self, ch: char) {
        let Position { row, col } = self.cursor;
        self.grid[row][col] = Cell {
            ch,
            fg: self.fg,
            bg: self.bg,
        };
        if col + 1 >= self.cols {
            self.line_feed();
        } else {
            self.cursor.col += 1;
        }
    }

    fn clear_cells(&mut self, row: usize, cols: std::ops::Range<usize>) {
        let blank = self.blank();
        if let Some(cells) = self.grid.get_mut(row) {
            let end = cols.end.min(cells.len());
            for cell in &mut cells[cols.start.min(end)..end] {
                *cell = blank;
            }
        }
    }
}

impl ConsoleApi for HeadlessConsole {
    fn foreground(&self) -> AnsiColor {
        self.fg
    }

    fn background(&self) -> AnsiColor {
        self.bg
    }

    fn set_foreground(&mut self, color: AnsiColor) {
        self.fg = color;
    }

    fn set_background(&mut self, color: AnsiColor) {
        self.bg = color;
    }

    fn default_colors(&self) -> (AnsiColor, AnsiColor) {
        (self.default_fg, self.default_bg)
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Position) {
        self.cursor = Position {
            row: pos.row.min(self.rows - 1),
            col: pos.col.min(self.cols - 1),
        };
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    fn size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn erase_in_display(&mut self, range: EraseRange) {
        let Position { row, col } = self.cursor;
        match range {
            EraseRange::ToEnd => {
                self.clear_cells(row, col..self.cols);
                for r in row + 1..self.rows {
                    self.clear_cells(r, 0..self.cols);
                }
            }
            EraseRange::ToCursor => {
                for r in 0..row {
                    self.clear_cells(r, 0..self.cols);
                }
                self.clear_cells(row, 0..col + 1);
            }
            EraseRange::All => {
                for r in 0..self.rows {
                    self.clear_cells(r, 0..self.cols);
                }
            }
        }
    }

    fn erase_in_line(&mut self, range: EraseRange) {
        let Position { row, col } = self.cursor;
        match range {
            EraseRange::ToEnd => self.clear_cells(row, col..self.cols),
            EraseRange::ToCursor => self.clear_cells(row, 0..col + 1),
            EraseRange::All => self.clear_cells(row, 0..self.cols),
        }
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        for ch in text.chars() {
            match ch {
                '\n' => self.line_feed(),
                '\r' => self.cursor.col = 0,
                '\t' => {
                    let next = (self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH;
                    self.cursor.col = next.min(self.cols - 1);
                }
                '\x08' => self.cursor.col = self.cursor.col.saturating_sub(1),
                c if c.is_control() => {}
                c => self.put_char(c),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
