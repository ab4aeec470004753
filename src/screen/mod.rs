//! Virtual screens
//!
//! A [`VirtualScreen`] holds an ordered set of [`TerminalText`] objects and
//! simulates where each one lands when printed one after another with
//! wrapping. A [`Terminal`] owns the screens and renders the active one's
//! changes through an [`Output`](crate::output::Output).

mod terminal;
mod text;
mod virtual_screen;

pub use terminal::Terminal;
pub use text::{flow, Dirty, ScreenId, TerminalText, TextId};
pub use virtual_screen::VirtualScreen;

use serde::Serialize;

use crate::emulator::EmulateError;
use crate::parser::ParseError;
use crate::position::Position;

/// Screen errors
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("index {index} out of range for a screen holding {len} texts")]
    OutOfRange { index: usize, len: usize },

    #[error("invalid buffer size {width}x{height}")]
    InvalidBufferSize { width: usize, height: usize },

    #[error("text {0:?} is not on this screen")]
    UnknownText(TextId),

    #[error("screen {0:?} is not attached to the terminal")]
    UnknownScreen(ScreenId),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emulate(#[from] EmulateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A change the renderer has to bring to the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScreenUpdate {
    /// An object's content or placement is out of date
    Changed { id: TextId, dirty: Dirty },
    /// Everything from this position on is stale
    Erased { from: Position },
    /// The screen was emptied
    Cleared,
}
