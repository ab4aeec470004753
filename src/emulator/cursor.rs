//! Cursor, erase and visibility commands

use super::{ConsoleApi, EmulatorState, EraseRange};
use crate::parser::CommandBlock;
use crate::position::Position;

/// DECTCEM mode number
const CURSOR_VISIBLE_MODE: u32 = 25;

pub(super) fn apply<C>(state: &mut EmulatorState, console: &mut C, terminator: u8, block: &CommandBlock<'_>)
where
    C: ConsoleApi + ?Sized,
{
    let pos = console.cursor();
    let (cols, rows) = console.size();
    let n = block.param_or_default(0, 1) as usize;

    match terminator {
        b'A' => console.set_cursor(Position::new(pos.row.saturating_sub(n), pos.col)),
        b'B' => console.set_cursor(Position::new((pos.row + n).min(rows.saturating_sub(1)), pos.col)),
        b'C' => console.set_cursor(Position::new(pos.row, (pos.col + n).min(cols.saturating_sub(1)))),
        b'D' => console.set_cursor(Position::new(pos.row, pos.col.saturating_sub(n))),
        b'E' => console.set_cursor(Position::new((pos.row + n).min(rows.saturating_sub(1)), 0)),
        b'F' => console.set_cursor(Position::new(pos.row.saturating_sub(n), 0)),
        b'G' => console.set_cursor(Position::new(pos.row, n - 1)),
        b'H' | b'f' => {
            let row = block.param_or_default(0, 1) as usize - 1;
            let col = block.param_or_default(1, 1) as usize - 1;
            console.set_cursor(Position::new(row, col));
        }
        b'J' => console.erase_in_display(EraseRange::from_param(block.param(0, 0))),
        b'K' => console.erase_in_line(EraseRange::from_param(block.param(0, 0))),
        b's' => state.saved_cursor = Some(pos),
        b'u' => {
            if let Some(saved) = state.saved_cursor {
                console.set_cursor(saved);
            }
        }
        b'h' | b'l' if block.marker == Some(b'?') => {
            if block.params.contains(&CURSOR_VISIBLE_MODE) {
                console.set_cursor_visible(terminator == b'h');
            }
        }
        other => {
            tracing::debug!(terminator = %char::from(other), "ignoring cursor command");
        }
    }
}
