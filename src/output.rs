//! Native or emulated output
//!
//! [`Output`] writes escape-coded buffers either straight through to a
//! terminal that understands them, or through the emulator onto a console
//! API for one that does not.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::emulator::{self, ConsoleApi, CrosstermConsole, EmulateError, EmulatorState, PlainConsole};
use crate::parser;
use crate::platform;

/// When to emulate escape sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmulationMode {
    /// Emulate only when the terminal lacks native support
    #[default]
    Auto,
    /// Always emulate
    Always,
    /// Never emulate
    Never,
}

/// Destination for rendered buffers
pub enum Output {
    /// The terminal interprets escape sequences itself
    Native(Box<dyn Write + Send>),
    /// Escape sequences are replayed onto a console API
    Emulated {
        console: Box<dyn ConsoleApi + Send>,
        state: EmulatorState,
    },
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Native(_) => f.write_str("Output::Native"),
            Output::Emulated { state, .. } => f.debug_struct("Output::Emulated").field("state", state).finish(),
        }
    }
}

impl Output {
    pub fn native<W: Write + Send + 'static>(writer: W) -> Self {
        Output::Native(Box::new(writer))
    }

    pub fn emulated<C: ConsoleApi + Send + 'static>(console: C) -> Self {
        Output::Emulated {
            console: Box::new(console),
            state: EmulatorState::new(),
        }
    }

    /// Pick the stdout backend for `mode` and the detected platform support
    pub fn detect(mode: EmulationMode) -> Self {
        let emulate = match mode {
            EmulationMode::Always => true,
            EmulationMode::Never => false,
            EmulationMode::Auto => !platform::supports_escape_sequences(),
        };
        tracing::debug!(?mode, emulate, "selected output backend");

        if !emulate {
            Output::native(io::stdout())
        } else if platform::stdout_is_tty() {
            Output::emulated(CrosstermConsole::stdout())
        } else {
            // Nothing to position a cursor on
            let size = platform::terminal_size_or_default();
            Output::emulated(PlainConsole::new(io::stdout(), size))
        }
    }

    pub fn is_emulated(&self) -> bool {
        matches!(self, Output::Emulated { .. })
    }

    /// Write a buffer, returning the number of printable chars it contains
    pub fn write(&mut self, buffer: &str) -> Result<usize, EmulateError> {
        match self {
            Output::Native(writer) => {
                let len = parser::printable_len(buffer)?;
                writer.write_all(buffer.as_bytes())?;
                Ok(len)
            }
            Output::Emulated { console, state } => emulator::emulate(state, console.as_mut(), buffer),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Native(writer) => writer.flush(),
            Output::Emulated { console, .. } => console.flush(),
        }
    }
}
