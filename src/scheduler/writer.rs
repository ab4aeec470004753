//! Writer thread
//!
//! One background thread performs every terminal write. Producers raise
//! flags on a [`Signal`]; the thread wakes, runs a redraw cycle and goes
//! back to waiting until it is cancelled.

use std::io::Write;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use serde::Serialize;

use super::render;
use super::{lock, SchedulerError, Shared};
use crate::parser;

/// Lifecycle of the writer thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WriterState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Default)]
struct Flags {
    queue: bool,
    lines: bool,
    cancel: bool,
    alive: bool,
    /// Flush generations requested and served
    requested: u64,
    completed: u64,
}

impl Flags {
    fn pending(&self) -> bool {
        self.queue || self.lines || self.cancel || self.requested > self.completed
    }
}

/// Why the writer woke up
#[derive(Debug, Clone, Copy)]
pub(crate) struct Wake {
    pub cancel: bool,
    serving: u64,
}

/// Auto-resetting wake flags shared by producers and the writer
#[derive(Debug, Default)]
pub(crate) struct Signal {
    flags: Mutex<Flags>,
    wake: Condvar,
    done: Condvar,
}

impl Signal {
    fn flags(&self) -> MutexGuard<'_, Flags> {
        lock(&self.flags)
    }

    pub fn raise_queue(&self) {
        self.flags().queue = true;
        self.wake.notify_one();
    }

    pub fn raise_lines(&self) {
        self.flags().lines = true;
        self.wake.notify_one();
    }

    pub fn cancel(&self) {
        self.flags().cancel = true;
        self.wake.notify_one();
    }

    /// Prepare for a new writer
    pub fn reset(&self) {
        let mut flags = self.flags();
        flags.cancel = false;
        flags.alive = true;
        flags.completed = flags.requested;
    }

    /// Block until something is pending, then clear the change flags
    pub fn wait(&self) -> Wake {
        let mut flags = self.flags();
        while !flags.pending() {
            flags = self.wake.wait(flags).unwrap_or_else(PoisonError::into_inner);
        }
        flags.queue = false;
        flags.lines = false;
        Wake {
            cancel: flags.cancel,
            serving: flags.requested,
        }
    }

    /// Record that a cycle covering `wake` finished
    pub fn complete(&self, wake: Wake) {
        let mut flags = self.flags();
        flags.completed = flags.completed.max(wake.serving);
        self.done.notify_all();
    }

    /// The writer exited; release anyone waiting on it
    pub fn finish(&self) {
        self.flags().alive = false;
        self.done.notify_all();
    }

    /// Block until a cycle started after this call has completed
    pub fn request_flush(&self) -> Result<(), SchedulerError> {
        let mut flags = self.flags();
        if !flags.alive {
            return Err(SchedulerError::NotRunning);
        }
        flags.requested += 1;
        let target = flags.requested;
        self.wake.notify_one();

        while flags.alive && flags.completed < target {
            flags = self.done.wait(flags).unwrap_or_else(PoisonError::into_inner);
        }
        if flags.completed >= target {
            Ok(())
        } else {
            Err(SchedulerError::NotRunning)
        }
    }
}

/// Flushes sinks and releases flush waiters however the thread exits
struct FinalFlush<'a>(&'a Shared);

impl Drop for FinalFlush<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("console writer panicked");
            eprintln!("mochi-console: console writer panicked");
        }
        for sink in lock(&self.0.sinks).iter_mut() {
            if let Err(e) = sink.writer.flush() {
                tracing::warn!(error = %e, "failed to flush sink");
            }
        }
        if let Err(e) = lock(&self.0.output).flush() {
            tracing::warn!(error = %e, "failed to flush terminal");
        }
        self.0.signal.finish();
    }
}

/// Body of the writer thread
pub(crate) fn run(shared: &Shared) -> Result<(), SchedulerError> {
    let _final_flush = FinalFlush(shared);
    tracing::debug!("console writer started");

    let result = writer_loop(shared);
    match &result {
        Ok(()) => tracing::debug!("console writer stopped"),
        Err(e) => {
            tracing::error!(error = %e, "console writer failed");
            eprintln!("mochi-console: console writer failed: {e}");
        }
    }
    result
}

fn writer_loop(shared: &Shared) -> Result<(), SchedulerError> {
    loop {
        let wake = shared.signal.wait();
        cycle(shared)?;
        shared.signal.complete(wake);
        if wake.cancel {
            return Ok(());
        }
    }
}

/// One redraw: clear, drain the queue, reprint, then feed the sinks
pub(crate) fn cycle(shared: &Shared) -> Result<(), SchedulerError> {
    let queued: Vec<String> = lock(&shared.queue).drain(..).collect();
    let (lines, previous) = {
        let registry = lock(&shared.registry);
        (registry.snapshot(), registry.display.clone())
    };

    let redraw = render::compose(&previous, &lines, &queued, shared.width, &shared.diff_options)?;
    if !redraw.frame.is_empty() {
        let mut output = lock(&shared.output);
        output.write(&redraw.frame)?;
        output.flush()?;
    }
    tracing::trace!(
        queued = queued.len(),
        lines = lines.len(),
        in_place = redraw.in_place,
        bytes = redraw.frame.len(),
        "redraw cycle"
    );
    lock(&shared.registry).display = redraw.display;

    if !queued.is_empty() {
        let mut sinks = lock(&shared.sinks);
        for sink in sinks.iter_mut() {
            for line in &queued {
                let line = line.strip_suffix('\n').unwrap_or(line);
                if sink.strip {
                    writeln!(sink.writer, "{}", parser::strip(line)?)?;
                } else {
                    writeln!(sink.writer, "{line}")?;
                }
            }
            sink.writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_wait_resets_flags() {
        let signal = Signal::default();
        signal.raise_lines();
        signal.raise_queue();
        let wake = signal.wait();
        assert!(!wake.cancel);
        assert!(!signal.flags().pending());
    }

    #[test]
    fn test_cancel_stays_raised() {
        let signal = Signal::default();
        signal.cancel();
        assert!(signal.wait().cancel);
        assert!(signal.wait().cancel);
    }

    #[test]
    fn test_flush_without_writer() {
        let signal = Signal::default();
        assert!(matches!(signal.request_flush(), Err(SchedulerError::NotRunning)));
    }

    #[test]
    fn test_flush_waits_for_cycle() {
        let signal = Arc::new(Signal::default());
        signal.reset();
        let writer = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                let wake = signal.wait();
                signal.complete(wake);
            })
        };
        signal.request_flush().unwrap();
        writer.join().unwrap();
    }

    #[test]
    fn test_finish_releases_flush() {
        let signal = Arc::new(Signal::default());
        signal.reset();
        let writer = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                signal.wait();
                signal.finish();
            })
        };
        assert!(matches!(signal.request_flush(), Err(SchedulerError::NotRunning)));
        writer.join().unwrap();
    }
}
