//! Escape sequence emulation
//!
//! Replays parsed command blocks onto a [`ConsoleApi`] for consoles that
//! cannot interpret escape sequences themselves. Color state that the
//! console API cannot express directly (inverted video, the custom color
//! stacks) lives in an explicit [`EmulatorState`].

mod console;
mod crossterm_console;
mod cursor;
mod headless;
mod sgr;

pub use console::{ConsoleApi, EraseRange, PlainConsole};
pub use crossterm_console::{to_crossterm, CrosstermConsole};
pub use headless::{Cell, HeadlessConsole};

use crate::ansi::{AnsiColor, CommandFamily};
use crate::parser::{self, CommandBlock, ParseError, ESC};
use crate::position::Position;

/// Error type for SGR and custom color commands
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SgrError {
    #[error("SGR {code} needs {needed} more parameters but {remaining} remain")]
    Format {
        code: u32,
        needed: usize,
        remaining: usize,
    },

    #[error("SGR {code} uses unsupported color mode {mode}")]
    ColorMode { code: u32, mode: u32 },

    #[error("palette index {index} is outside the 16 emulated colors")]
    PaletteIndex { index: u32 },

    #[error("unrecognized SGR code {code}")]
    Unrecognized { code: u32 },

    #[error("unrecognized color stack command {code}")]
    UnrecognizedStack { code: u32 },
}

/// Error type for emulation
#[derive(Debug, thiserror::Error)]
pub enum EmulateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{source} (in {command:?})")]
    Sgr {
        #[source]
        source: SgrError,
        command: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Emulation state that outlives a single call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmulatorState {
    /// Foreground and background are swapped
    inverted: bool,
    fg_stack: Vec<AnsiColor>,
    bg_stack: Vec<AnsiColor>,
    saved_cursor: Option<Position>,
}

impl EmulatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn fg_stack(&self) -> &[AnsiColor] {
        &self.fg_stack
    }

    pub fn bg_stack(&self) -> &[AnsiColor] {
        &self.bg_stack
    }

    /// Clear the invert flag and both color stacks
    pub fn reset(&mut self) {
        self.inverted = false;
        self.fg_stack.clear();
        self.bg_stack.clear();
    }
}

/// Sequential reader over a command's parameters
#[derive(Debug, Clone)]
pub struct ParamCursor<'a> {
    params: &'a [u32],
    pos: usize,
}

impl<'a> ParamCursor<'a> {
    pub fn new(params: &'a [u32]) -> Self {
        Self { params, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.params.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` parameters, or report how many were missing
    pub fn take_params(&mut self, code: u32, n: usize) -> Result<&'a [u32], SgrError> {
        if self.remaining() < n {
            return Err(SgrError::Format {
                code,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.params[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}

impl Iterator for ParamCursor<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let v = self.params.get(self.pos).copied()?;
        self.pos += 1;
        Some(v)
    }
}

/// Replay one block: apply its command, then write its text
pub fn execute<C>(state: &mut EmulatorState, console: &mut C, block: &CommandBlock<'_>) -> Result<(), EmulateError>
where
    C: ConsoleApi + ?Sized,
{
    if let Some(terminator) = block.command {
        let result = match CommandFamily::from_terminator(terminator) {
            CommandFamily::Sgr => sgr::apply_sgr(state, console, &block.params),
            CommandFamily::Custom => sgr::apply_stack(state, console, &block.params),
            CommandFamily::Cursor(byte) => {
                cursor::apply(state, console, byte, block);
                Ok(())
            }
            CommandFamily::Other(byte) => {
                tracing::debug!(terminator = %char::from(byte), "ignoring unsupported command");
                Ok(())
            }
        };
        result.map_err(|source| EmulateError::Sgr {
            source,
            command: block.command_prefix().to_string(),
        })?;
    }

    if block.has_control_char && block.text.contains(char::from(ESC)) {
        let text: String = block.text.chars().filter(|&c| c != char::from(ESC)).collect();
        console.write_text(&text)?;
    } else if !block.text.is_empty() {
        console.write_text(block.text)?;
    }
    Ok(())
}

/// Emulate a whole buffer, returning the number of printable chars written.
///
/// The buffer is parsed completely before anything is written, so a
/// malformed sequence produces no output at all.
pub fn emulate<C>(state: &mut EmulatorState, console: &mut C, buffer: &str) -> Result<usize, EmulateError>
where
    C: ConsoleApi + ?Sized,
{
    let blocks = parser::parse(buffer)?;
    let mut written = 0;
    for block in &blocks {
        execute(state, console, block)?;
        written += block.printable_len();
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi;

    fn run(buffer: &str) -> (EmulatorState, HeadlessConsole) {
        let mut state = EmulatorState::new();
        let mut console = HeadlessConsole::new(20, 4);
        emulate(&mut state, &mut console, buffer).unwrap();
        (state, console)
    }

    #[test]
    fn test_param_cursor_take_params() {
        let params = [2, 10, 20];
        let mut cursor = ParamCursor::new(&params);
        assert_eq!(cursor.next(), Some(2));
        assert_eq!(cursor.take_params(38, 2).unwrap(), &[10, 20]);
        assert!(cursor.is_empty());
        assert_eq!(
            cursor.take_params(38, 1),
            Err(SgrError::Format {
                code: 38,
                needed: 1,
                remaining: 0
            })
        );
    }

    #[test]
    fn test_colored_text_lands_in_cells() {
        let (_, console) = run("a\x1b[31mb\x1b[0mc");
        assert_eq!(console.row_text(0), "abc");
        assert_eq!(console.cell(0, 0).unwrap().fg, AnsiColor::White);
        assert_eq!(console.cell(0, 1).unwrap().fg, AnsiColor::Red);
        assert_eq!(console.cell(0, 2).unwrap().fg, AnsiColor::White);
    }

    #[test]
    fn test_returns_printable_length() {
        let mut state = EmulatorState::new();
        let mut console = HeadlessConsole::new(20, 4);
        let n = emulate(&mut state, &mut console, "\x1b[1mab\ncd").unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn test_malformed_buffer_writes_nothing() {
        let mut state = EmulatorState::new();
        let mut console = HeadlessConsole::new(20, 4);
        let err = emulate(&mut state, &mut console, "ok\x1b[31").unwrap_err();
        assert!(matches!(err, EmulateError::Parse(_)));
        assert_eq!(console.contents(), "");
    }

    #[test]
    fn test_unknown_terminator_is_skipped() {
        let (_, console) = run("a\x1b[6nb");
        assert_eq!(console.row_text(0), "ab");
    }

    #[test]
    fn test_nested_helpers_restore_colors() {
        let text = ansi::green(&format!("g{}g", ansi::red("r")));
        let (state, console) = run(&text);
        assert_eq!(console.cell(0, 0).unwrap().fg, AnsiColor::Green);
        assert_eq!(console.cell(0, 1).unwrap().fg, AnsiColor::Red);
        assert_eq!(console.cell(0, 2).unwrap().fg, AnsiColor::Green);
        assert!(state.fg_stack().is_empty());
    }

    #[test]
    fn test_error_names_the_command() {
        let mut state = EmulatorState::new();
        let mut console = HeadlessConsole::new(20, 4);
        let err = emulate(&mut state, &mut console, "\x1b[38;2;1mx").unwrap_err();
        assert!(err.to_string().contains("38;2;1m"));
    }

    #[test]
    fn test_lone_escape_not_written() {
        let (_, console) = run("a\x1bb");
        assert_eq!(console.row_text(0), "ab");
    }
}
