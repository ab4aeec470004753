//! Terminal text objects
//!
//! One independently updatable span of on-screen text and the flow
//! simulation that predicts where the cursor ends up after printing it.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::parser::{Blocks, ParseError};
use crate::position::Position;

static NEXT_TEXT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SCREEN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a text object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextId(u64);

impl TextId {
    fn next() -> Self {
        TextId(NEXT_TEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a virtual screen, used as a non-owning back-reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScreenId(u64);

impl ScreenId {
    pub(crate) fn next() -> Self {
        ScreenId(NEXT_SCREEN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What about a text object is out of date on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Dirty {
    pub text: bool,
    pub position: bool,
}

impl Dirty {
    pub const CLEAN: Dirty = Dirty {
        text: false,
        position: false,
    };

    pub fn is_clean(&self) -> bool {
        !self.text && !self.position
    }
}

/// A span of text with its simulated placement
#[derive(Debug, Clone)]
pub struct TerminalText {
    id: TextId,
    buffer: String,
    displayed: String,
    position: Position,
    end: Position,
    dirty: Dirty,
    owner: Option<ScreenId>,
}

impl TerminalText {
    pub fn new(buffer: impl Into<String>) -> Self {
        Self {
            id: TextId::next(),
            buffer: buffer.into(),
            displayed: String::new(),
            position: Position::ORIGIN,
            end: Position::ORIGIN,
            dirty: Dirty {
                text: true,
                position: true,
            },
            owner: None,
        }
    }

    pub fn id(&self) -> TextId {
        self.id
    }

    /// Desired content
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Content last written to the terminal
    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    /// Where the first char is printed
    pub fn position(&self) -> Position {
        self.position
    }

    /// Where the cursor rests after printing
    pub fn end_position(&self) -> Position {
        self.end
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// The screen holding this text, if any
    pub fn owner(&self) -> Option<ScreenId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ScreenId>) {
        self.owner = owner;
    }

    pub(crate) fn set_buffer(&mut self, buffer: String) {
        if buffer != self.buffer {
            self.buffer = buffer;
            self.dirty.text = true;
        }
    }

    /// Move the text, returning true when its position changed
    pub(crate) fn place(&mut self, position: Position, width: usize) -> Result<bool, ParseError> {
        let moved = position != self.position;
        if moved {
            self.position = position;
            self.dirty.position = true;
        }
        self.end = flow(&self.buffer, position, width)?;
        Ok(moved)
    }

    /// Record that the buffer is now what the terminal shows
    pub(crate) fn mark_displayed(&mut self) {
        self.displayed.clone_from(&self.buffer);
        self.dirty = Dirty::CLEAN;
    }

    /// Forget what was displayed, e.g. after the terminal was cleared
    pub(crate) fn mark_stale(&mut self) {
        self.displayed.clear();
        self.dirty = Dirty {
            text: true,
            position: true,
        };
    }
}

/// Simulate printing `buffer` from `start` on a terminal `width` columns wide.
///
/// Control sequences take no space. Newline moves to the start of the next
/// row, carriage return to the start of the current one; other control
/// characters do not move the cursor.
pub fn flow(buffer: &str, start: Position, width: usize) -> Result<Position, ParseError> {
    let mut pos = start;
    for block in Blocks::new(buffer) {
        let block = block?;
        if !block.has_control_char {
            pos = pos.advance(block.text.chars().count(), width);
            continue;
        }

        let mut run = 0;
        for ch in block.text.chars() {
            match ch {
                '\n' => {
                    pos = pos.advance(run, width).newline();
                    run = 0;
                }
                '\r' => {
                    pos = pos.advance(run, width).carriage_return();
                    run = 0;
                }
                c if c.is_control() => {}
                _ => run += 1,
            }
        }
        pos = pos.advance(run, width);
    }
    Ok(pos)
}
