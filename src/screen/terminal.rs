//! Screen rendering
//!
//! The [`Terminal`] owns every virtual screen and the output they draw
//! to. Only the active screen is rendered; switching screens repaints the
//! whole terminal.

use super::text::{flow, ScreenId, TerminalText};
use super::virtual_screen::VirtualScreen;
use super::{ScreenError, ScreenUpdate};
use crate::ansi;
use crate::diff::{self, DiffOptions};
use crate::output::Output;
use crate::parser;
use crate::position::Position;

/// A set of virtual screens drawn to one output
#[derive(Debug)]
pub struct Terminal {
    screens: Vec<VirtualScreen>,
    active: usize,
    output: Output,
    diff_options: DiffOptions,
}

impl Terminal {
    /// Create a terminal whose active screen is `screen`
    pub fn new(output: Output, screen: VirtualScreen) -> Self {
        Self {
            screens: vec![screen],
            active: 0,
            output,
            diff_options: DiffOptions::default(),
        }
    }

    pub fn with_diff_options(mut self, options: DiffOptions) -> Self {
        self.diff_options = options;
        self
    }

    pub fn active_screen(&self) -> &VirtualScreen {
        &self.screens[self.active]
    }

    pub fn active_screen_mut(&mut self) -> &mut VirtualScreen {
        &mut self.screens[self.active]
    }

    /// Attach another screen without activating it
    pub fn add_screen(&mut self, screen: VirtualScreen) -> ScreenId {
        let id = screen.id();
        self.screens.push(screen);
        id
    }

    pub fn screen(&self, id: ScreenId) -> Option<&VirtualScreen> {
        self.screens.iter().find(|s| s.id() == id)
    }

    pub fn screen_mut(&mut self, id: ScreenId) -> Option<&mut VirtualScreen> {
        self.screens.iter_mut().find(|s| s.id() == id)
    }

    pub fn output_mut(&mut self) -> &mut Output {
        &mut self.output
    }

    pub fn into_output(self) -> Output {
        self.output
    }

    /// Make `id` the active screen and repaint the terminal with it
    pub fn set_active_screen(&mut self, id: ScreenId) -> Result<(), ScreenError> {
        let index = self
            .screens
            .iter()
            .position(|s| s.id() == id)
            .ok_or(ScreenError::UnknownScreen(id))?;
        self.active = index;
        tracing::debug!(screen = ?id, "activated screen");
        self.print_screen()
    }

    /// Clear the terminal and print every object of the active screen
    pub fn print_screen(&mut self) -> Result<(), ScreenError> {
        let screen = &mut self.screens[self.active];
        screen.drain_updates();

        let mut frame = begin_frame();
        frame.push_str(ansi::CLEAR_SCREEN);
        for text in screen.texts() {
            print_full(&mut frame, text);
        }
        end_frame(&mut frame);

        self.output.write(&frame)?;
        self.output.flush()?;
        for text in self.screens[self.active].texts_mut() {
            text.mark_displayed();
        }
        Ok(())
    }

    /// Bring the terminal up to date with the active screen.
    ///
    /// Returns the number of objects drawn.
    pub fn render(&mut self) -> Result<usize, ScreenError> {
        let screen = &mut self.screens[self.active];
        let updates = screen.drain_updates();
        if updates.is_empty() {
            return Ok(0);
        }

        let cleared = updates.contains(&ScreenUpdate::Cleared);
        let erase_from = updates
            .iter()
            .filter_map(|u| match u {
                ScreenUpdate::Erased { from } => Some(*from),
                _ => None,
            })
            .min();

        let mut frame = begin_frame();
        if cleared {
            frame.push_str(ansi::CLEAR_SCREEN);
        } else if let Some(from) = erase_from {
            frame.push_str(&ansi::cursor_to(from.row, from.col));
            frame.push_str(ansi::ERASE_BELOW);
        }

        let width = screen.width();
        let mut drawn = Vec::new();
        for text in screen.texts() {
            let dirty = text.dirty();
            if dirty.is_clean() {
                continue;
            }
            // Part of what is displayed may have been erased above
            let erased = cleared || erase_from.is_some_and(|from| text.end_position() > from);
            if dirty.position || erased {
                print_full(&mut frame, text);
            } else {
                print_chunks(&mut frame, text, width, &self.diff_options)?;
            }
            drawn.push(text.id());
        }
        end_frame(&mut frame);

        self.output.write(&frame)?;
        self.output.flush()?;

        let screen = &mut self.screens[self.active];
        for id in &drawn {
            if let Some(text) = screen.text_mut(*id) {
                text.mark_displayed();
            }
        }
        tracing::trace!(updates = updates.len(), drawn = drawn.len(), "rendered screen");
        Ok(drawn.len())
    }
}

fn begin_frame() -> String {
    let mut frame = String::new();
    frame.push_str(ansi::SAVE_CURSOR);
    frame.push_str(ansi::HIDE_CURSOR);
    frame
}

fn end_frame(frame: &mut String) {
    frame.push_str(ansi::RESTORE_CURSOR);
    frame.push_str(ansi::SHOW_CURSOR);
}

fn move_to(frame: &mut String, pos: Position) {
    frame.push_str(&ansi::cursor_to(pos.row, pos.col));
}

fn print_full(frame: &mut String, text: &TerminalText) {
    move_to(frame, text.position());
    frame.push_str(text.buffer());
}

/// Patch a text in place with the chunks that turn its displayed content
/// into its buffer
fn print_chunks(frame: &mut String, text: &TerminalText, width: usize, options: &DiffOptions) -> Result<(), ScreenError> {
    let chunks = diff::compile_transformations_with(text.displayed(), text.buffer(), options)?;
    let new_len = text.buffer().chars().count();

    for chunk in chunks {
        if chunk.is_erase(new_len) {
            let stale = parser::printable_len(text.displayed())?.saturating_sub(parser::printable_len(text.buffer())?);
            if stale > 0 {
                move_to(frame, text.end_position());
                frame.extend(std::iter::repeat(diff::ERASE_CHAR).take(stale));
            }
            continue;
        }

        let prefix: String = text.buffer().chars().take(chunk.offset).collect();
        move_to(frame, flow(&prefix, text.position(), width)?);
        frame.push_str(&chunk.text);
    }
    Ok(())
}
