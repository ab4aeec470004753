//! Error types
//!
//! Every fallible operation in the crate returns one of the module errors
//! below. [`Error`] aggregates them for callers that mix layers.

use crate::config::ConfigError;
use crate::emulator::EmulateError;
use crate::parser::ParseError;
use crate::scheduler::SchedulerError;
use crate::screen::ScreenError;

/// Crate-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emulate(#[from] EmulateError),

    #[error(transparent)]
    Screen(#[from] ScreenError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_converts() {
        let err: Error = ParseError::MalformedSequence {
            offset: 3,
            fragment: "\x1b[31".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("offset 3"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
