//! Rendering configuration

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diff::{DiffOptions, DEFAULT_PARALLEL_THRESHOLD};
use crate::output::EmulationMode;
use crate::platform;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Columns to wrap at; detected from the terminal when unset
    pub buffer_width: Option<usize>,
    /// Rows of the virtual screen; detected from the terminal when unset
    pub buffer_height: Option<usize>,
    /// When to emulate escape sequences
    pub emulation: EmulationMode,
    /// Strip escape sequences from output written to sinks
    pub strip_sink_escapes: bool,
    /// Scan length at which the diff engine uses two threads
    pub diff_parallel_threshold: usize,
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            buffer_width: None,
            buffer_height: None,
            emulation: EmulationMode::Auto,
            strip_sink_escapes: true,
            diff_parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            log_filter: "warn".to_string(),
        }
    }
}

impl RenderConfig {
    /// Default location, `~/.config/mochi-console/config.json`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/mochi-console/config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load from the default location, falling back to defaults when the
    /// file is missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Buffer size with unset or zero dimensions taken from the terminal
    pub fn buffer_size(&self) -> (usize, usize) {
        let (cols, rows) = platform::terminal_size_or_default();
        (
            self.buffer_width.filter(|&w| w > 0).unwrap_or(cols),
            self.buffer_height.filter(|&h| h > 0).unwrap_or(rows),
        )
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            parallel_threshold: self.diff_parallel_threshold,
        }
    }
}
