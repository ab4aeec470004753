//! Mochi Console
//!
//! Rendering core for styled, position-aware console output:
//!
//! - `parser`: splits escape-coded text into command blocks
//! - `ansi`: color and cursor sequence builders
//! - `emulator`: replays SGR, color stack and cursor commands on a console API
//! - `diff`: minimal rewrite chunks between displayed and desired text
//! - `screen`: virtual screens of independently updatable text objects
//! - `scheduler`: static lines redrawn below scrolling output by one writer thread

pub mod ansi;
pub mod config;
pub mod diff;
pub mod emulator;
pub mod error;
pub mod output;
pub mod parser;
pub mod platform;
pub mod position;
pub mod scheduler;
pub mod screen;

pub use config::RenderConfig;
pub use diff::{compile_transformations, difference, DiffKind, TextChunk, TextDiff};
pub use error::{Error, Result};
pub use output::{EmulationMode, Output};
pub use parser::{parse, strip, CommandBlock, ParseError};
pub use position::Position;
pub use scheduler::{Scheduler, StaticLine};
pub use screen::{Terminal, TerminalText, TextId, VirtualScreen};
