//! Real console driven through crossterm
//!
//! Colors, cursor moves, erases and visibility go through crossterm
//! commands, which use the console API directly on terminals without
//! escape sequence support and plain sequences everywhere else.
//!
//! The cursor position is tracked here rather than queried. Until a full
//! clear lines the tracked position up with the screen, rows are moved
//! relative to where the cursor was when the console was created.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveDown, MoveTo, MoveToColumn, MoveUp, Show};
use crossterm::style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{Command, QueueableCommand};

use super::console::{ConsoleApi, EraseRange};
use crate::ansi::AnsiColor;
use crate::platform;
use crate::position::Position;

const DEFAULT_FG: AnsiColor = AnsiColor::White;
const DEFAULT_BG: AnsiColor = AnsiColor::Black;
const TAB_WIDTH: usize = 8;

/// crossterm color for one of the 16 palette entries
pub fn to_crossterm(color: AnsiColor) -> Color {
    match color {
        AnsiColor::Black => Color::Black,
        AnsiColor::Red => Color::DarkRed,
        AnsiColor::Green => Color::DarkGreen,
        AnsiColor::Yellow => Color::DarkYellow,
        AnsiColor::Blue => Color::DarkBlue,
        AnsiColor::Magenta => Color::DarkMagenta,
        AnsiColor::Cyan => Color::DarkCyan,
        AnsiColor::White => Color::Grey,
        AnsiColor::BrightBlack => Color::DarkGrey,
        AnsiColor::BrightRed => Color::Red,
        AnsiColor::BrightGreen => Color::Green,
        AnsiColor::BrightYellow => Color::Yellow,
        AnsiColor::BrightBlue => Color::Blue,
        AnsiColor::BrightMagenta => Color::Magenta,
        AnsiColor::BrightCyan => Color::Cyan,
        AnsiColor::BrightWhite => Color::White,
    }
}

fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Console backend for a real terminal.
///
/// The default colors stand for whatever the terminal's theme uses, so
/// setting the foreground to white or the background to black restores
/// the theme color instead of forcing the palette entry.
pub struct CrosstermConsole<W: Write> {
    writer: W,
    fg: AnsiColor,
    bg: AnsiColor,
    cursor: Position,
    size: (usize, usize),
    /// Tracked position matches the screen, so moves can be absolute
    anchored: bool,
    /// Follow a write into the last column with CR LF so the terminal
    /// wraps at once instead of deferring it
    eager_wrap: bool,
    /// First command failure, reported by the next write or flush
    error: Option<io::Error>,
}

impl CrosstermConsole<io::Stdout> {
    /// Console on stdout, sized from the real terminal
    pub fn stdout() -> Self {
        Self::new(io::stdout(), platform::terminal_size_or_default())
    }
}

impl<W: Write> CrosstermConsole<W> {
    pub fn new(writer: W, size: (usize, usize)) -> Self {
        Self {
            writer,
            fg: DEFAULT_FG,
            bg: DEFAULT_BG,
            cursor: Position::ORIGIN,
            size: (size.0.max(1), size.1.max(1)),
            anchored: false,
            // The legacy Windows console already wraps as soon as the
            // last column is written
            eager_wrap: cfg!(not(windows)),
            error: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn queue(&mut self, command: impl Command) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.queue(command) {
            tracing::warn!(error = %e, "console command failed");
            self.error = Some(e);
        }
    }

    fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn line_feed(&mut self) {
        self.cursor.row = (self.cursor.row + 1).min(self.size.1 - 1);
        self.cursor.col = 0;
    }

    fn color(color: AnsiColor, default: AnsiColor) -> Color {
        if color == default {
            Color::Reset
        } else {
            to_crossterm(color)
        }
    }
}

impl<W: Write> ConsoleApi for CrosstermConsole<W> {
    fn foreground(&self) -> AnsiColor {
        self.fg
    }

    fn background(&self) -> AnsiColor {
        self.bg
    }

    fn set_foreground(&mut self, color: AnsiColor) {
        self.fg = color;
        self.queue(SetForegroundColor(Self::color(color, DEFAULT_FG)));
    }

    fn set_background(&mut self, color: AnsiColor) {
        self.bg = color;
        self.queue(SetBackgroundColor(Self::color(color, DEFAULT_BG)));
    }

    fn default_colors(&self) -> (AnsiColor, AnsiColor) {
        (DEFAULT_FG, DEFAULT_BG)
    }

    fn reset_colors(&mut self) {
        self.fg = DEFAULT_FG;
        self.bg = DEFAULT_BG;
        self.queue(ResetColor);
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Position) {
        let (cols, rows) = self.size;
        let target = Position::new(pos.row.min(rows - 1), pos.col.min(cols - 1));

        if self.anchored {
            self.queue(MoveTo(cells(target.col), cells(target.row)));
        } else {
            if target.row < self.cursor.row {
                self.queue(MoveUp(cells(self.cursor.row - target.row)));
            } else if target.row > self.cursor.row {
                self.queue(MoveDown(cells(target.row - self.cursor.row)));
            }
            if target.col != self.cursor.col {
                self.queue(MoveToColumn(cells(target.col)));
            }
        }
        self.cursor = target;
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        if visible {
            self.queue(Show);
        } else {
            self.queue(Hide);
        }
    }

    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn erase_in_display(&mut self, range: EraseRange) {
        match range {
            EraseRange::ToEnd => self.queue(Clear(ClearType::FromCursorDown)),
            EraseRange::ToCursor => self.queue(Clear(ClearType::FromCursorUp)),
            EraseRange::All => {
                self.queue(Clear(ClearType::All));
                // Nothing is left on screen to keep the old position
                // relative to
                self.queue(MoveTo(cells(self.cursor.col), cells(self.cursor.row)));
                self.anchored = true;
            }
        }
    }

    fn erase_in_line(&mut self, range: EraseRange) {
        match range {
            EraseRange::ToEnd => self.queue(Clear(ClearType::UntilNewLine)),
            EraseRange::All => self.queue(Clear(ClearType::CurrentLine)),
            EraseRange::ToCursor => {
                let col = self.cursor.col;
                self.queue(MoveToColumn(0));
                let mut blanks = " ".repeat(col);
                if col + 1 < self.size.0 {
                    blanks.push(' ');
                }
                if self.error.is_none() {
                    if let Err(e) = self.writer.write_all(blanks.as_bytes()) {
                        self.error = Some(e);
                    }
                }
                if col + 1 >= self.size.0 {
                    // Writing the last cell would start a wrap
                    self.queue(Clear(ClearType::UntilNewLine));
                }
                self.queue(MoveToColumn(cells(col)));
            }
        }
    }

    fn clear(&mut self) {
        self.queue(Clear(ClearType::All));
        self.queue(MoveTo(0, 0));
        self.cursor = Position::ORIGIN;
        self.anchored = true;
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.take_error()?;

        let cols = self.size.0;
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\n' => {
                    out.push_str("\r\n");
                    self.line_feed();
                }
                '\r' => {
                    out.push('\r');
                    self.cursor.col = 0;
                }
                '\t' => {
                    out.push('\t');
                    let next = (self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH;
                    self.cursor.col = next.min(cols - 1);
                }
                '\x08' => {
                    out.push('\x08');
                    self.cursor.col = self.cursor.col.saturating_sub(1);
                }
                c if c.is_control() => {}
                c => {
                    out.push(c);
                    if self.cursor.col + 1 >= cols {
                        if self.eager_wrap {
                            out.push_str("\r\n");
                        }
                        self.line_feed();
                    } else {
                        self.cursor.col += 1;
                    }
                }
            }
        }
        self.writer.write_all(out.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.take_error()?;
        self.writer.flush()
    }
}
