//! Virtual screen implementation
//!
//! Objects are laid out strictly in insertion order: each one starts where
//! the previous one left the cursor. Changing an object's length therefore
//! moves every object after it, and nothing before it.

use std::mem;

use super::text::{ScreenId, TerminalText, TextId};
use super::{ScreenError, ScreenUpdate};
use crate::parser;
use crate::platform;
use crate::position::Position;

/// An ordered set of text objects with simulated placement
#[derive(Debug)]
pub struct VirtualScreen {
    id: ScreenId,
    texts: Vec<TerminalText>,
    /// Where the next object will start
    cursor: Position,
    width: usize,
    height: usize,
    /// Set while reflowing; notifications are dropped
    reflowing: bool,
    updates: Vec<ScreenUpdate>,
}

impl Default for VirtualScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualScreen {
    /// Create a screen sized like the real terminal
    pub fn new() -> Self {
        let (width, height) = platform::terminal_size_or_default();
        Self::build(width, height)
    }

    /// Create a screen with an explicit buffer size
    pub fn with_size(width: usize, height: usize) -> Result<Self, ScreenError> {
        validate_size(width, height)?;
        Ok(Self::build(width, height))
    }

    fn build(width: usize, height: usize) -> Self {
        Self {
            id: ScreenId::next(),
            texts: Vec::new(),
            cursor: Position::ORIGIN,
            width,
            height,
            reflowing: false,
            updates: Vec::new(),
        }
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Where the next added object will start
    pub fn position(&self) -> Position {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[TerminalText] {
        &self.texts
    }

    pub fn text(&self, id: TextId) -> Option<&TerminalText> {
        self.texts.iter().find(|t| t.id() == id)
    }

    pub fn index_of(&self, id: TextId) -> Option<usize> {
        self.texts.iter().position(|t| t.id() == id)
    }

    pub(crate) fn text_mut(&mut self, id: TextId) -> Option<&mut TerminalText> {
        self.texts.iter_mut().find(|t| t.id() == id)
    }

    pub(crate) fn texts_mut(&mut self) -> &mut [TerminalText] {
        &mut self.texts
    }

    /// Take the pending updates
    pub fn drain_updates(&mut self) -> Vec<ScreenUpdate> {
        mem::take(&mut self.updates)
    }

    /// Change the buffer size and re-wrap every object
    pub fn set_buffer_size(&mut self, width: usize, height: usize) -> Result<(), ScreenError> {
        validate_size(width, height)?;
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        self.width = width;
        self.height = height;
        self.reflow(0)?;
        self.repaint_from(0, Position::ORIGIN);
        Ok(())
    }

    /// Append an object after all others.
    ///
    /// Returns the printable length of its buffer.
    pub fn add(&mut self, mut text: TerminalText) -> Result<usize, ScreenError> {
        let len = parser::printable_len(text.buffer())?;
        text.mark_stale();
        text.place(self.cursor, self.width)?;
        text.set_owner(Some(self.id));
        self.cursor = text.end_position();

        let update = ScreenUpdate::Changed {
            id: text.id(),
            dirty: text.dirty(),
        };
        self.texts.push(text);
        self.notify(update);
        Ok(len)
    }

    /// Add a new object holding `buffer`
    pub fn add_text(&mut self, buffer: impl Into<String>) -> Result<TextId, ScreenError> {
        let text = TerminalText::new(buffer);
        let id = text.id();
        self.add(text)?;
        Ok(id)
    }

    pub fn remove(&mut self, id: TextId) -> Result<TerminalText, ScreenError> {
        let index = self.index_of(id).ok_or(ScreenError::UnknownText(id))?;
        self.remove_at(index)
    }

    /// Detach the object at `index` and re-flow everything after it
    pub fn remove_at(&mut self, index: usize) -> Result<TerminalText, ScreenError> {
        if index >= self.texts.len() {
            return Err(ScreenError::OutOfRange {
                index,
                len: self.texts.len(),
            });
        }

        let mut text = self.texts.remove(index);
        text.set_owner(None);
        let origin = text.position();
        self.reflow(index)?;
        self.repaint_from(index, origin);
        Ok(text)
    }

    /// Detach every object
    pub fn clear(&mut self) -> Vec<TerminalText> {
        let mut removed = mem::take(&mut self.texts);
        for text in &mut removed {
            text.set_owner(None);
        }
        self.cursor = Position::ORIGIN;
        self.notify(ScreenUpdate::Cleared);
        removed
    }

    /// Replace an object's buffer.
    ///
    /// Returns the printable length of the new buffer.
    pub fn set_text(&mut self, id: TextId, buffer: impl Into<String>) -> Result<usize, ScreenError> {
        let buffer = buffer.into();
        let len = parser::printable_len(&buffer)?;
        let index = self.index_of(id).ok_or(ScreenError::UnknownText(id))?;
        let width = self.width;

        let text = &mut self.texts[index];
        let old_end = text.end_position();
        text.set_buffer(buffer);
        text.place(text.position(), width)?;
        let new_end = text.end_position();
        let dirty = text.dirty();

        if !dirty.is_clean() {
            self.notify(ScreenUpdate::Changed { id, dirty });
        }
        if new_end != old_end {
            self.reflow(index + 1)?;
            self.repaint_from(index + 1, new_end);
        }
        Ok(len)
    }

    /// Append to an object's buffer
    pub fn append_text(&mut self, id: TextId, suffix: &str) -> Result<usize, ScreenError> {
        let text = self.text(id).ok_or(ScreenError::UnknownText(id))?;
        let mut buffer = String::with_capacity(text.buffer().len() + suffix.len());
        buffer.push_str(text.buffer());
        buffer.push_str(suffix);
        self.set_text(id, buffer)
    }

    /// Recompute the placement of every object from `start` on.
    ///
    /// Returns how many objects moved. Moved objects are marked
    /// position-dirty but no updates are queued for them.
    pub fn reflow(&mut self, start: usize) -> Result<usize, ScreenError> {
        if start > self.texts.len() {
            return Err(ScreenError::OutOfRange {
                index: start,
                len: self.texts.len(),
            });
        }

        let seed = match start {
            0 => Position::ORIGIN,
            n => self.texts[n - 1].end_position(),
        };

        self.reflowing = true;
        let result = self.flow_from(start, seed);
        self.reflowing = false;

        let moved = result?;
        tracing::debug!(screen = ?self.id, start, moved, "reflowed screen");
        Ok(moved)
    }

    fn flow_from(&mut self, start: usize, seed: Position) -> Result<usize, ScreenError> {
        let width = self.width;
        let mut pos = seed;
        let mut moved = 0;

        for index in start..self.texts.len() {
            let text = &mut self.texts[index];
            let did_move = text.place(pos, width)?;
            pos = text.end_position();
            if did_move {
                moved += 1;
                let update = ScreenUpdate::Changed {
                    id: text.id(),
                    dirty: text.dirty(),
                };
                self.notify(update);
            }
        }

        self.cursor = pos;
        Ok(moved)
    }

    /// Queue a full repaint of everything from `index` on, starting by
    /// erasing the terminal from `origin`
    fn repaint_from(&mut self, index: usize, origin: Position) {
        self.notify(ScreenUpdate::Erased { from: origin });
        for i in index..self.texts.len() {
            let text = &mut self.texts[i];
            text.mark_stale();
            let update = ScreenUpdate::Changed {
                id: text.id(),
                dirty: text.dirty(),
            };
            self.notify(update);
        }
    }

    fn notify(&mut self, update: ScreenUpdate) {
        if self.reflowing {
            return;
        }
        self.updates.push(update);
        if self.updates.len() > self.texts.len() + UPDATE_SLACK {
            self.collapse_updates();
        }
    }

    /// Replace the pending updates with one full repaint, so a screen
    /// nobody renders holds at most one update per object
    fn collapse_updates(&mut self) {
        self.updates.clear();
        self.updates.push(ScreenUpdate::Erased { from: Position::ORIGIN });
        for text in &mut self.texts {
            text.mark_stale();
            self.updates.push(ScreenUpdate::Changed {
                id: text.id(),
                dirty: text.dirty(),
            });
        }
        tracing::debug!(screen = ?self.id, "collapsed pending updates into a repaint");
    }
}

/// Pending updates allowed beyond one per object before they collapse
const UPDATE_SLACK: usize = 16;

fn validate_size(width: usize, height: usize) -> Result<(), ScreenError> {
    if width == 0 || height == 0 {
        return Err(ScreenError::InvalidBufferSize { width, height });
    }
    Ok(())
}
