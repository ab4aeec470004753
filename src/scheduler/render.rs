//! Static line redraw composition
//!
//! Given what is currently on screen and what should be, build the bytes
//! that get there. Rows are counted from the top of the static block, which
//! always sits directly below the most recent scrolling output.

use crate::ansi;
use crate::diff::{self, DiffOptions, ERASE_CHAR};
use crate::parser::{self, ParseError};
use crate::position::Position;
use crate::screen::flow;

use super::line::LineId;

/// A line as it should be drawn this cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineSnapshot {
    pub id: LineId,
    pub buffer: String,
    /// Declared cursor column, for the line holding the cursor claim
    pub cursor: Option<usize>,
}

/// A line as it was drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Drawn {
    pub id: LineId,
    pub text: String,
    pub start_row: usize,
    pub rows: usize,
}

/// What the static block looks like on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Display {
    /// Drawn lines, top to bottom
    pub stack: Vec<Drawn>,
    /// Cursor position relative to the top of the block
    pub cursor: Position,
}

/// Bytes for one cycle and the display they produce
#[derive(Debug)]
pub(crate) struct Redraw {
    pub frame: String,
    pub display: Display,
    pub in_place: bool,
}

/// Compose one redraw cycle
pub(crate) fn compose(
    previous: &Display,
    lines: &[LineSnapshot],
    queued: &[String],
    width: usize,
    options: &DiffOptions,
) -> Result<Redraw, ParseError> {
    let layout = layout(lines, width)?;

    if queued.is_empty() && can_patch(previous, &layout) {
        let (frame, display) = patch(previous, lines, &layout, width, options)?;
        return Ok(Redraw {
            frame,
            display,
            in_place: true,
        });
    }

    let mut frame = String::new();
    let mut cursor = previous.cursor;
    clear(&mut frame, &mut cursor, &previous.stack);

    for line in queued {
        frame.push_str(line.strip_suffix('\n').unwrap_or(line));
        frame.push('\n');
    }

    let mut stack = Vec::with_capacity(lines.len());
    let mut separate = false;
    for (line, slot) in lines.iter().zip(&layout) {
        if separate {
            frame.push('\n');
        }
        frame.push_str(&line.buffer);
        separate = slot.end.col != 0 || slot.end.row == 0;
        stack.push(Drawn {
            id: line.id,
            text: line.buffer.clone(),
            start_row: slot.start_row,
            rows: slot.rows,
        });
    }

    let mut cursor = layout.last().map_or(Position::ORIGIN, Slot::end_in_block);
    if let Some(target) = claim_target(lines, &layout, width)? {
        move_to(&mut frame, &mut cursor, target);
    }

    Ok(Redraw {
        frame,
        display: Display { stack, cursor },
        in_place: false,
    })
}

/// Where a line lands within the block
#[derive(Debug, Clone, Copy)]
struct Slot {
    start_row: usize,
    rows: usize,
    /// End of the line relative to its own start
    end: Position,
}

impl Slot {
    fn end_in_block(&self) -> Position {
        Position::new(self.start_row + self.end.row, self.end.col)
    }
}

fn layout(lines: &[LineSnapshot], width: usize) -> Result<Vec<Slot>, ParseError> {
    let mut slots = Vec::with_capacity(lines.len());
    let mut start_row = 0;
    for line in lines {
        let end = flow(&line.buffer, Position::ORIGIN, width)?;
        // A line ending exactly at a row boundary has already moved the
        // cursor onto the next row
        let rows = if end.col != 0 || end.row == 0 { end.row + 1 } else { end.row };
        slots.push(Slot { start_row, rows, end });
        start_row += rows;
    }
    Ok(slots)
}

/// Same lines in the same rows as what is displayed
fn can_patch(previous: &Display, layout: &[Slot]) -> bool {
    !previous.stack.is_empty()
        && previous.stack.len() == layout.len()
        && previous
            .stack
            .iter()
            .zip(layout)
            .all(|(drawn, slot)| drawn.start_row == slot.start_row && drawn.rows == slot.rows)
}

/// Where the cursor goes for the line holding the claim
fn claim_target(lines: &[LineSnapshot], layout: &[Slot], width: usize) -> Result<Option<Position>, ParseError> {
    let (Some(line), Some(slot)) = (lines.last(), layout.last()) else {
        return Ok(None);
    };
    let Some(column) = line.cursor else {
        return Ok(None);
    };
    let column = column.min(parser::printable_len(&line.buffer)?);
    let target = Position::ORIGIN.advance(column, width);
    Ok(Some(Position::new(slot.start_row + target.row, target.col)))
}

/// Erase every displayed line, bottom up, leaving the cursor at the top
/// of the block
fn clear(frame: &mut String, cursor: &mut Position, stack: &[Drawn]) {
    for drawn in stack.iter().rev() {
        for row in (drawn.start_row..drawn.start_row + drawn.rows).rev() {
            move_to(frame, cursor, Position::new(row, 0));
            frame.push_str(ansi::ERASE_LINE);
        }
    }
}

/// Rewrite only the changed parts of each line
fn patch(
    previous: &Display,
    lines: &[LineSnapshot],
    layout: &[Slot],
    width: usize,
    options: &DiffOptions,
) -> Result<(String, Display), ParseError> {
    let mut frame = String::new();
    let mut cursor = previous.cursor;
    let mut stack = Vec::with_capacity(lines.len());

    for ((line, slot), drawn) in lines.iter().zip(layout).zip(&previous.stack) {
        if line.id == drawn.id && line.buffer == drawn.text {
            stack.push(drawn.clone());
            continue;
        }

        let chunks = diff::compile_transformations_with(&drawn.text, &line.buffer, options)?;
        let new_len = line.buffer.chars().count();
        for chunk in chunks {
            let (at, text) = if chunk.is_erase(new_len) {
                let stale = parser::printable_len(&drawn.text)?.saturating_sub(parser::printable_len(&line.buffer)?);
                if stale == 0 {
                    continue;
                }
                (slot.end, std::iter::repeat(ERASE_CHAR).take(stale).collect())
            } else {
                let prefix: String = line.buffer.chars().take(chunk.offset).collect();
                (flow(&prefix, Position::ORIGIN, width)?, chunk.text)
            };

            move_to(&mut frame, &mut cursor, Position::new(slot.start_row + at.row, at.col));
            frame.push_str(&text);
            let after = flow(&text, at, width)?;
            cursor = Position::new(slot.start_row + after.row, after.col);
        }

        stack.push(Drawn {
            id: line.id,
            text: line.buffer.clone(),
            start_row: slot.start_row,
            rows: slot.rows,
        });
    }

    let target = match claim_target(lines, layout, width)? {
        Some(target) => target,
        None => layout.last().map_or(Position::ORIGIN, Slot::end_in_block),
    };
    if target != cursor || !frame.is_empty() {
        move_to(&mut frame, &mut cursor, target);
    }

    Ok((frame, Display { stack, cursor }))
}

/// Move within the block using relative row moves and an absolute column
fn move_to(frame: &mut String, cursor: &mut Position, target: Position) {
    frame.push('\r');
    if target.row < cursor.row {
        frame.push_str(&ansi::cursor_up(cursor.row - target.row));
    } else if target.row > cursor.row {
        frame.push_str(&ansi::cursor_down(target.row - cursor.row));
    }
    if target.col > 0 {
        frame.push_str(&ansi::cursor_column(target.col));
    }
    *cursor = target;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::{emulate, ConsoleApi, EmulatorState, HeadlessConsole};

    struct Harness {
        console: HeadlessConsole,
        state: EmulatorState,
        display: Display,
    }

    impl Harness {
        fn new(cols: usize, rows: usize) -> Self {
            Self {
                console: HeadlessConsole::new(cols, rows),
                state: EmulatorState::new(),
                display: Display::default(),
            }
        }

        fn cycle(&mut self, lines: &[LineSnapshot], queued: &[&str]) -> Redraw {
            let queued: Vec<String> = queued.iter().map(|s| s.to_string()).collect();
            let (cols, _) = self.console.size();
            let redraw = compose(&self.display, lines, &queued, cols, &DiffOptions::default()).unwrap();
            emulate(&mut self.state, &mut self.console, &redraw.frame).unwrap();
            self.display = redraw.display.clone();
            redraw
        }
    }

    fn line(id: u64, buffer: &str) -> LineSnapshot {
        LineSnapshot {
            id: LineId::from_raw(id),
            buffer: buffer.to_string(),
            cursor: None,
        }
    }

    #[test]
    fn test_first_draw() {
        let mut h = Harness::new(20, 5);
        let redraw = h.cycle(&[line(1, "status"), line(2, "progress")], &[]);
        assert!(!redraw.in_place);
        assert_eq!(h.console.lines()[..2], ["status", "progress"]);
        assert_eq!(h.display.cursor, Position::new(1, 8));
        assert_eq!(h.console.cursor(), Position::new(1, 8));
    }

    #[test]
    fn test_queued_lines_print_above() {
        let mut h = Harness::new(20, 5);
        h.cycle(&[line(1, "status")], &[]);
        h.cycle(&[line(1, "status")], &["log one", "log two\n"]);
        assert_eq!(h.console.lines()[..3], ["log one", "log two", "status"]);
    }

    #[test]
    fn test_in_place_patch() {
        let mut h = Harness::new(20, 5);
        h.cycle(&[line(1, "a"), line(2, "value: 10%")], &[]);
        let redraw = h.cycle(&[line(1, "a"), line(2, "value: 20%")], &[]);
        assert!(redraw.in_place);
        assert!(!redraw.frame.contains(ansi::ERASE_LINE));
        assert_eq!(h.console.lines()[..2], ["a", "value: 20%"]);
        assert_eq!(h.console.cursor(), Position::new(1, 10));
    }

    #[test]
    fn test_in_place_shrink() {
        let mut h = Harness::new(30, 5);
        h.cycle(&[line(1, "Hello Brave World")], &[]);
        let redraw = h.cycle(&[line(1, "Hello World")], &[]);
        assert!(redraw.in_place);
        assert_eq!(h.console.row_text(0), "Hello World");
    }

    #[test]
    fn test_unchanged_cycle_writes_nothing() {
        let mut h = Harness::new(20, 5);
        h.cycle(&[line(1, "same")], &[]);
        let redraw = h.cycle(&[line(1, "same")], &[]);
        assert!(redraw.frame.is_empty());
    }

    #[test]
    fn test_removed_line_is_cleared() {
        let mut h = Harness::new(20, 5);
        h.cycle(&[line(1, "first"), line(2, "second")], &[]);
        let redraw = h.cycle(&[line(2, "second")], &[]);
        assert!(!redraw.in_place);
        assert_eq!(h.console.lines()[..2], ["second", ""]);
    }

    #[test]
    fn test_wrapped_lines_are_cleared() {
        let mut h = Harness::new(5, 6);
        h.cycle(&[line(1, "abcdefgh"), line(2, "xy")], &[]);
        assert_eq!(h.console.lines()[..3], ["abcde", "fgh", "xy"]);

        h.cycle(&[line(2, "xy")], &["log"]);
        assert_eq!(h.console.lines()[..3], ["log", "xy", ""]);
    }

    #[test]
    fn test_claim_positions_cursor() {
        let mut h = Harness::new(20, 5);
        let mut prompt = line(2, "name: bob");
        prompt.cursor = Some(6);
        h.cycle(&[line(1, "status"), prompt.clone()], &[]);
        assert_eq!(h.console.cursor(), Position::new(1, 6));

        // Moving the cursor alone is patched in place
        prompt.cursor = Some(9);
        let redraw = h.cycle(&[line(1, "status"), prompt], &[]);
        assert!(redraw.in_place);
        assert_eq!(h.console.cursor(), Position::new(1, 9));
    }

    #[test]
    fn test_claim_column_clamped_to_text() {
        let mut h = Harness::new(20, 5);
        let mut prompt = line(1, "> ");
        prompt.cursor = Some(50);
        h.cycle(&[prompt], &[]);
        assert_eq!(h.console.cursor(), Position::new(0, 2));
    }

    #[test]
    fn test_layout_rows() {
        let slots = layout(&[line(1, "abcde"), line(2, "abc"), line(3, "a\nb"), line(4, "\x1b[1m")], 5).unwrap();
        let rows: Vec<usize> = slots.iter().map(|s| s.rows).collect();
        let starts: Vec<usize> = slots.iter().map(|s| s.start_row).collect();
        assert_eq!(rows, vec![1, 1, 2, 1]);
        assert_eq!(starts, vec![0, 1, 2, 4]);
    }
}
