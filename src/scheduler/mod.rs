//! Static line redraw scheduler
//!
//! Keeps a set of static lines pinned below scrolling output. Any thread
//! may register lines, change them or queue output; a single writer thread
//! serializes every terminal write.
//!
//! Each cycle the writer clears the static lines it drew last time, prints
//! queued output, then redraws the lines with the cursor-owning line last.
//! When nothing was queued and every line still occupies the same rows, the
//! changed lines are patched in place with diff chunks instead.

mod line;
mod render;
mod writer;

pub use line::{LineId, StaticLine};
pub use writer::WriterState;

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::config::RenderConfig;
use crate::diff::DiffOptions;
use crate::emulator::EmulateError;
use crate::output::Output;
use crate::parser::ParseError;
use crate::platform;

use line::Registry;
use writer::Signal;

/// Scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emulate(#[from] EmulateError),

    #[error("console writer panicked")]
    WriterPanicked,

    #[error("console writer is not running")]
    NotRunning,

    #[error("static line was already disposed")]
    AlreadyDisposed,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Lock a mutex, recovering the data from a poisoned lock
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A destination that receives queued output
pub(crate) struct Sink {
    writer: Box<dyn Write + Send>,
    /// Remove escape sequences before writing
    strip: bool,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("strip", &self.strip).finish()
    }
}

/// State shared between producers and the writer thread
#[derive(Debug)]
pub(crate) struct Shared {
    registry: Mutex<Registry>,
    queue: Mutex<VecDeque<String>>,
    signal: Signal,
    output: Mutex<Output>,
    sinks: Mutex<Vec<Sink>>,
    width: usize,
    diff_options: DiffOptions,
    /// Whether [`Scheduler::add_sink`] strips escape sequences
    strip_sinks: bool,
}

#[derive(Debug, Default)]
struct WriterSlot {
    state: WriterState,
    handle: Option<JoinHandle<Result<(), SchedulerError>>>,
}

/// Owner of the static lines and the writer thread
#[derive(Debug)]
pub struct Scheduler {
    shared: Arc<Shared>,
    writer: Mutex<WriterSlot>,
}

impl Scheduler {
    /// Create a scheduler drawing to `output`, wrapping at the real
    /// terminal's width
    pub fn new(output: Output) -> Self {
        let (width, _) = platform::terminal_size_or_default();
        Self::with_width(output, width)
    }

    pub fn with_width(output: Output, width: usize) -> Self {
        let defaults = RenderConfig::default();
        Self::build(output, width, defaults.diff_options(), defaults.strip_sink_escapes)
    }

    /// Create a scheduler on stdout as configured
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::with_config(Output::detect(config.emulation), config)
    }

    /// Create a scheduler drawing to `output` with the configured width,
    /// diff options and sink stripping
    pub fn with_config(output: Output, config: &RenderConfig) -> Self {
        let (width, _) = config.buffer_size();
        Self::build(output, width, config.diff_options(), config.strip_sink_escapes)
    }

    fn build(output: Output, width: usize, diff_options: DiffOptions, strip_sinks: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::default()),
                queue: Mutex::new(VecDeque::new()),
                signal: Signal::default(),
                output: Mutex::new(output),
                sinks: Mutex::new(Vec::new()),
                width,
                diff_options,
                strip_sinks,
            }),
            writer: Mutex::new(WriterSlot::default()),
        }
    }

    /// Register a static line.
    ///
    /// With `wants_cursor`, the line takes the cursor claim if no other
    /// line holds it; check [`StaticLine::has_cursor_control`].
    pub fn register(&self, text: impl Into<String>, wants_cursor: bool) -> Result<StaticLine, SchedulerError> {
        StaticLine::register(Arc::clone(&self.shared), text.into(), wants_cursor)
    }

    /// Number of registered lines
    pub fn line_count(&self) -> usize {
        lock(&self.shared.registry).len()
    }

    /// Queue scrolling output to print above the static lines
    pub fn enqueue(&self, line: impl Into<String>) -> Result<(), SchedulerError> {
        let line = line.into();
        crate::parser::printable_len(&line)?;
        lock(&self.shared.queue).push_back(line);
        self.shared.signal.raise_queue();
        Ok(())
    }

    /// Add a sink that receives every queued line, stripped of escape
    /// sequences when the scheduler's config says so
    pub fn add_sink<W: Write + Send + 'static>(&self, writer: W) {
        self.add_sink_with(writer, self.shared.strip_sinks);
    }

    /// Add a sink with explicit escape stripping
    pub fn add_sink_with<W: Write + Send + 'static>(&self, writer: W, strip_escapes: bool) {
        lock(&self.shared.sinks).push(Sink {
            writer: Box::new(writer),
            strip: strip_escapes,
        });
    }

    pub fn state(&self) -> WriterState {
        lock(&self.writer).state
    }

    /// Start the writer thread, stopping any previous one first.
    ///
    /// A failure of the previous writer is returned and no new writer is
    /// started.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut slot = lock(&self.writer);
        Self::stop_writer(&self.shared, &mut slot)?;

        slot.state = WriterState::Starting;
        self.shared.signal.reset();
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("mochi-console-writer".into())
            .spawn(move || writer::run(&shared));

        match spawned {
            Ok(handle) => {
                slot.handle = Some(handle);
                slot.state = WriterState::Running;
                Ok(())
            }
            Err(e) => {
                self.shared.signal.finish();
                slot.state = WriterState::Stopped;
                Err(e.into())
            }
        }
    }

    /// Stop the writer after a final cycle, returning its failure if any
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let mut slot = lock(&self.writer);
        Self::stop_writer(&self.shared, &mut slot)
    }

    fn stop_writer(shared: &Shared, slot: &mut WriterSlot) -> Result<(), SchedulerError> {
        let Some(handle) = slot.handle.take() else {
            slot.state = WriterState::Stopped;
            return Ok(());
        };

        slot.state = WriterState::Stopping;
        shared.signal.cancel();
        let joined = handle.join();
        slot.state = WriterState::Stopped;
        match joined {
            Ok(result) => result,
            Err(_) => Err(SchedulerError::WriterPanicked),
        }
    }

    /// Block until the writer has drawn every change made before the call
    pub fn flush(&self) -> Result<(), SchedulerError> {
        self.shared.signal.request_flush()
    }

    /// Run one cycle on the calling thread.
    ///
    /// For use while no writer thread is running.
    pub fn redraw_now(&self) -> Result<(), SchedulerError> {
        let slot = lock(&self.writer);
        if slot.handle.is_some() {
            drop(slot);
            return self.flush();
        }
        writer::cycle(&self.shared)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!(error = %e, "console writer failed during shutdown");
        }
    }
}
