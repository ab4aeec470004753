//! Direct console API
//!
//! The operations the emulator replays escape sequences onto. Backends
//! implement this for consoles that cannot interpret escape sequences.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ansi::AnsiColor;
use crate::position::Position;

/// Extent of an erase operation (ED / EL parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseRange {
    /// From the cursor to the end (0)
    ToEnd,
    /// From the start to the cursor, inclusive (1)
    ToCursor,
    /// Everything (2, 3)
    All,
}

impl EraseRange {
    pub fn from_param(param: u32) -> Self {
        match param {
            1 => EraseRange::ToCursor,
            2 | 3 => EraseRange::All,
            _ => EraseRange::ToEnd,
        }
    }
}

/// Console operations used by the emulator
pub trait ConsoleApi {
    fn foreground(&self) -> AnsiColor;
    fn background(&self) -> AnsiColor;
    fn set_foreground(&mut self, color: AnsiColor);
    fn set_background(&mut self, color: AnsiColor);

    /// Colors the console starts with and returns to on reset
    fn default_colors(&self) -> (AnsiColor, AnsiColor);

    fn reset_colors(&mut self) {
        let (fg, bg) = self.default_colors();
        self.set_foreground(fg);
        self.set_background(bg);
    }

    fn cursor(&self) -> Position;
    fn set_cursor(&mut self, pos: Position);
    fn set_cursor_visible(&mut self, visible: bool);

    /// Console size as (columns, rows)
    fn size(&self) -> (usize, usize);

    fn erase_in_display(&mut self, range: EraseRange);
    fn erase_in_line(&mut self, range: EraseRange);

    /// Clear the whole console and home the cursor
    fn clear(&mut self) {
        self.erase_in_display(EraseRange::All);
        self.set_cursor(Position::ORIGIN);
    }

    /// Write text at the cursor in the current colors
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared consoles, so a caller can inspect a console an `Output` drives
impl<T: ConsoleApi> ConsoleApi for Arc<Mutex<T>> {
    fn foreground(&self) -> AnsiColor {
        lock(self).foreground()
    }

    fn background(&self) -> AnsiColor {
        lock(self).background()
    }

    fn set_foreground(&mut self, color: AnsiColor) {
        lock(self).set_foreground(color)
    }

    fn set_background(&mut self, color: AnsiColor) {
        lock(self).set_background(color)
    }

    fn default_colors(&self) -> (AnsiColor, AnsiColor) {
        lock(self).default_colors()
    }

    fn cursor(&self) -> Position {
        lock(self).cursor()
    }

    fn set_cursor(&mut self, pos: Position) {
        lock(self).set_cursor(pos)
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        lock(self).set_cursor_visible(visible)
    }

    fn size(&self) -> (usize, usize) {
        lock(self).size()
    }

    fn erase_in_display(&mut self, range: EraseRange) {
        lock(self).erase_in_display(range)
    }

    fn erase_in_line(&mut self, range: EraseRange) {
        lock(self).erase_in_line(range)
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        lock(self).write_text(text)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(self).flush()
    }
}

/// Text-only backend for streams that support neither escape sequences
/// nor a console API. Colors are tracked but never shown; cursor moves
/// are limited to returning to the start of the current line.
pub struct PlainConsole<W: Write> {
    writer: W,
    fg: AnsiColor,
    bg: AnsiColor,
    cursor: Position,
    size: (usize, usize),
}

impl<W: Write> PlainConsole<W> {
    pub fn new(writer: W, size: (usize, usize)) -> Self {
        Self {
            writer,
            fg: AnsiColor::White,
            bg: AnsiColor::Black,
            cursor: Position::ORIGIN,
            size,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ConsoleApi for PlainConsole<W> {
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
        (AnsiColor::White, AnsiColor::Black)
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Position) {
        if pos.row == self.cursor.row && pos.col == 0 && self.cursor.col != 0 {
            if self.writer.write_all(b"\r").is_ok() {
                self.cursor.col = 0;
            }
        } else {
            tracing::trace!(?pos, "plain console cannot position the cursor");
        }
    }

    fn set_cursor_visible(&mut self, _visible: bool) {}

    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn erase_in_display(&mut self, _range: EraseRange) {}

    fn erase_in_line(&mut self, _range: EraseRange) {}

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        for ch in text.chars() {
            match ch {
                '\n' => self.cursor = self.cursor.newline(),
                '\r' => self.cursor = self.cursor.carriage_return(),
                c if c.is_control() => continue,
                _ => self.cursor = self.cursor.advance(1, self.size.0),
            }
            let mut buf = [0u8; 4];
            self.writer.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
