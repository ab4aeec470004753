//! Static console lines
//!
//! A [`StaticLine`] is a handle to a line that stays below scrolling output.
//! The scheduler keeps the registered lines in a [`Registry`] shared with
//! the writer thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::render::{Display, LineSnapshot};
use super::{lock, SchedulerError, Shared};
use crate::parser;

static NEXT_LINE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a static line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineId(u64);

impl LineId {
    fn next() -> Self {
        LineId(NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        LineId(raw)
    }
}

#[derive(Debug)]
struct LineState {
    id: LineId,
    buffer: String,
    cursor_column: usize,
}

/// Registered lines, the display stack and the cursor claim
#[derive(Debug, Default)]
pub(crate) struct Registry {
    lines: Vec<LineState>,
    cursor_owner: Option<LineId>,
    pub(crate) display: Display,
}

impl Registry {
    fn register(&mut self, buffer: String, wants_cursor: bool) -> (LineId, bool) {
        let id = LineId::next();
        let claimed = wants_cursor && self.cursor_owner.is_none();
        if claimed {
            self.cursor_owner = Some(id);
        }
        self.lines.push(LineState {
            id,
            buffer,
            cursor_column: 0,
        });
        (id, claimed)
    }

    fn unregister(&mut self, id: LineId) {
        self.lines.retain(|l| l.id != id);
        if self.cursor_owner == Some(id) {
            self.cursor_owner = None;
        }
    }

    fn line_mut(&mut self, id: LineId) -> Option<&mut LineState> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    /// Lines to draw, in order, with the cursor owner last
    pub(crate) fn snapshot(&self) -> Vec<LineSnapshot> {
        let mut snapshot: Vec<LineSnapshot> = self
            .lines
            .iter()
            .filter(|l| !l.buffer.is_empty() && Some(l.id) != self.cursor_owner)
            .map(|l| LineSnapshot {
                id: l.id,
                buffer: l.buffer.clone(),
                cursor: None,
            })
            .collect();

        if let Some(owner) = self.cursor_owner.and_then(|id| self.lines.iter().find(|l| l.id == id)) {
            if !owner.buffer.is_empty() {
                snapshot.push(LineSnapshot {
                    id: owner.id,
                    buffer: owner.buffer.clone(),
                    cursor: Some(owner.cursor_column),
                });
            }
        }
        snapshot
    }
}

/// Handle to a registered static line.
///
/// Dropping the handle unregisters the line.
#[derive(Debug)]
pub struct StaticLine {
    id: LineId,
    shared: Arc<Shared>,
    has_cursor_control: bool,
    disposed: bool,
}

impl StaticLine {
    pub(crate) fn register(shared: Arc<Shared>, text: String, wants_cursor: bool) -> Result<Self, SchedulerError> {
        parser::printable_len(&text)?;
        let (id, has_cursor_control) = lock(&shared.registry).register(text, wants_cursor);
        if wants_cursor && !has_cursor_control {
            tracing::debug!(line = ?id, "cursor already claimed");
        }
        shared.signal.raise_lines();
        Ok(Self {
            id,
            shared,
            has_cursor_control,
            disposed: false,
        })
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    /// Whether this line owns cursor placement
    pub fn has_cursor_control(&self) -> bool {
        self.has_cursor_control
    }

    /// The text this line wants displayed
    pub fn buffer(&self) -> Result<String, SchedulerError> {
        self.with_line(|line| line.buffer.clone())
    }

    pub fn cursor_column(&self) -> Result<usize, SchedulerError> {
        self.with_line(|line| line.cursor_column)
    }

    pub fn set(&self, text: impl Into<String>) -> Result<(), SchedulerError> {
        let text = text.into();
        parser::printable_len(&text)?;
        self.update(|line| {
            if line.buffer == text {
                return Ok(false);
            }
            line.buffer = text;
            Ok(true)
        })
    }

    pub fn append(&self, text: &str) -> Result<(), SchedulerError> {
        self.update(|line| {
            if text.is_empty() {
                return Ok(false);
            }
            let mut buffer = String::with_capacity(line.buffer.len() + text.len());
            buffer.push_str(&line.buffer);
            buffer.push_str(text);
            parser::printable_len(&buffer)?;
            line.buffer = buffer;
            Ok(true)
        })
    }

    /// Set where the cursor rests within this line.
    ///
    /// Ignored unless the line holds the cursor claim.
    pub fn set_cursor_column(&self, column: usize) -> Result<(), SchedulerError> {
        if !self.has_cursor_control {
            self.ensure_live()?;
            return Ok(());
        }
        self.update(|line| {
            if line.cursor_column == column {
                return Ok(false);
            }
            line.cursor_column = column;
            Ok(true)
        })
    }

    /// Unregister the line, releasing any cursor claim
    pub fn dispose(&mut self) -> Result<(), SchedulerError> {
        self.ensure_live()?;
        self.disposed = true;
        lock(&self.shared.registry).unregister(self.id);
        self.shared.signal.raise_lines();
        tracing::trace!(line = ?self.id, "disposed static line");
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), SchedulerError> {
        if self.disposed {
            return Err(SchedulerError::AlreadyDisposed);
        }
        Ok(())
    }

    fn with_line<T>(&self, f: impl FnOnce(&LineState) -> T) -> Result<T, SchedulerError> {
        self.ensure_live()?;
        let mut registry = lock(&self.shared.registry);
        registry.line_mut(self.id).map(|line| f(line)).ok_or(SchedulerError::AlreadyDisposed)
    }

    fn update(&self, f: impl FnOnce(&mut LineState) -> Result<bool, SchedulerError>) -> Result<(), SchedulerError> {
        self.ensure_live()?;
        let changed = {
            let mut registry = lock(&self.shared.registry);
            let line = registry.line_mut(self.id).ok_or(SchedulerError::AlreadyDisposed)?;
            f(line)?
        };
        if changed {
            self.shared.signal.raise_lines();
        }
        Ok(())
    }
}

impl Drop for StaticLine {
    fn drop(&mut self) {
        if !self.disposed {
            self.disposed = true;
            lock(&self.shared.registry).unregister(self.id);
            self.shared.signal.raise_lines();
        }
    }
}
