//! Golden tests for parsing, emulation, diffing and screen rendering
//!
//! Each test feeds a fixed escape-coded input through the public API and
//! checks the exact blocks, chunks or console contents it produces.

use std::sync::{Arc, Mutex};

use mochi_console::ansi::{self, AnsiColor};
use mochi_console::emulator::{emulate, ConsoleApi, EmulateError, EmulatorState, HeadlessConsole, SgrError};
use mochi_console::parser::{self, ParseError};
use mochi_console::{compile_transformations, difference, DiffKind, Output, Position, TextChunk, TextDiff};
use mochi_console::{Terminal, VirtualScreen};

/// Run a buffer through the emulator on a fresh console
fn render(input: &str, cols: usize, rows: usize) -> HeadlessConsole {
    let mut console = HeadlessConsole::new(cols, rows);
    let mut state = EmulatorState::new();
    emulate(&mut state, &mut console, input).unwrap();
    console
}

/// A terminal whose output lands on a shared in-memory console
fn terminal(cols: usize, rows: usize) -> (Terminal, Arc<Mutex<HeadlessConsole>>) {
    let console = Arc::new(Mutex::new(HeadlessConsole::new(cols, rows)));
    let screen = VirtualScreen::with_size(cols, rows).unwrap();
    (Terminal::new(Output::emulated(Arc::clone(&console)), screen), console)
}

fn screen_lines(console: &Arc<Mutex<HeadlessConsole>>) -> Vec<String> {
    console.lock().unwrap().lines()
}

// =============================================================================
// Parser
// =============================================================================

#[test]
fn test_parse_colored_hello() {
    let blocks = parser::parse("\x1b[31mHello\x1b[0m").unwrap();
    assert_eq!(blocks.len(), 2);

    assert_eq!(blocks[0].command, Some(b'm'));
    assert_eq!(blocks[0].params, vec![31]);
    assert_eq!(blocks[0].text, "Hello");
    assert_eq!((blocks[0].block_start, blocks[0].text_start, blocks[0].block_end), (0, 5, 10));

    assert_eq!(blocks[1].command, Some(b'm'));
    assert_eq!(blocks[1].params, vec![0]);
    assert_eq!(blocks[1].text, "");
    assert_eq!((blocks[1].block_start, blocks[1].text_start, blocks[1].block_end), (10, 14, 14));
    assert_eq!(parser::strip("\x1b[31mHello\x1b[0m").unwrap(), "Hello");
}

#[test]
fn test_parse_plain_text() {
    let blocks = parser::parse("no escapes here").unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].command, None);
    assert!(!blocks[0].has_control_char);
}

#[test]
fn test_parse_empty_slots_keep_position() {
    let blocks = parser::parse("\x1b[38;5;;mx").unwrap();
    assert_eq!(blocks[0].params, vec![38, 5, 0]);
    assert_eq!(blocks[0].text, "x");
}

#[test]
fn test_parse_marks_control_chars() {
    let blocks = parser::parse("one\ntwo").unwrap();
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].has_control_char);
    assert_eq!(blocks[0].printable_len(), 6);
}

#[test]
fn test_parse_unterminated_sequence() {
    let err = parser::parse("abc\x1b[31").unwrap_err();
    assert!(matches!(err, ParseError::MalformedSequence { offset: 3, .. }));
    assert!(parser::strip("abc\x1b[31").is_err());
}

#[test]
fn test_blocks_serialize_to_json() {
    let blocks = parser::parse("\x1b[1mbold").unwrap();
    let json = serde_json::to_value(&blocks).unwrap();
    assert_eq!(json[0]["text"], "bold");
    assert_eq!(json[0]["params"][0], 1);
}

#[test]
fn test_strip_styled_text() {
    assert_eq!(parser::strip("\x1b[1mbold\x1b[22m and plain").unwrap(), "bold and plain");
    assert_eq!(parser::strip(&ansi::red("alert")).unwrap(), "alert");
}

// =============================================================================
// Emulator
// =============================================================================

#[test]
fn test_emulate_colored_hello() {
    let mut console = HeadlessConsole::new(20, 2);
    let mut state = EmulatorState::new();
    let written = emulate(&mut state, &mut console, "\x1b[31mHello\x1b[0m World").unwrap();

    assert_eq!(written, 11);
    assert_eq!(console.row_text(0), "Hello World");
    assert_eq!(console.cell(0, 0).unwrap().fg, AnsiColor::Red);
    assert_eq!(console.cell(0, 6).unwrap().fg, AnsiColor::White);
    assert_eq!(console.cursor(), Position::new(0, 11));
}

#[test]
fn test_emulate_color_stack() {
    let console = render("\x1b[10z\x1b[32mgreen\x1b[20zwhite", 20, 2);
    assert_eq!(console.row_text(0), "greenwhite");
    assert_eq!(console.cell(0, 0).unwrap().fg, AnsiColor::Green);
    assert_eq!(console.cell(0, 5).unwrap().fg, AnsiColor::White);
}

#[test]
fn test_emulate_rgb_inside_stack_keeps_outer_color() {
    let inner = ansi::green(&format!("a{}b", ansi::orange("c")));
    let console = render(&format!("\x1b[34m{inner}d"), 10, 2);
    assert_eq!(console.row_text(0), "acbd");
    assert_eq!(console.cell(0, 0).unwrap().fg, AnsiColor::Green);
    assert_eq!(console.cell(0, 2).unwrap().fg, AnsiColor::White);
    assert_eq!(console.cell(0, 3).unwrap().fg, AnsiColor::Blue);
}

#[test]
fn test_emulate_cursor_movement() {
    let console = render("first\nsecond\x1b[1;3HX\x1b[2;1H>", 10, 3);
    assert_eq!(console.lines(), vec!["fiXst", ">econd", ""]);
}

#[test]
fn test_emulate_wraps_at_width() {
    let console = render("abcdefgh", 5, 3);
    assert_eq!(console.row_text(0), "abcde");
    assert_eq!(console.row_text(1), "fgh");
    assert_eq!(console.cursor(), Position::new(1, 3));
}

#[test]
fn test_emulate_rejects_bad_color_format() {
    let mut console = HeadlessConsole::new(10, 2);
    let mut state = EmulatorState::new();
    let err = emulate(&mut state, &mut console, "\x1b[38;2;10mx").unwrap_err();
    assert!(matches!(err, EmulateError::Sgr { source: SgrError::Format { code: 38, .. }, .. }));
}

#[test]
fn test_emulate_malformed_writes_nothing() {
    let mut console = HeadlessConsole::new(10, 2);
    let mut state = EmulatorState::new();
    assert!(emulate(&mut state, &mut console, "visible\x1b[3").is_err());
    assert!(console.contents().is_empty());
}

// =============================================================================
// Diff engine
// =============================================================================

#[test]
fn test_diff_hello_brave_world() {
    assert_eq!(
        difference("Hello World", "Hello Brave World"),
        vec![TextDiff::new(DiffKind::Insertion, 6, 12)]
    );
    assert_eq!(
        difference("Hello Brave World", "Hello World"),
        vec![TextDiff::new(DiffKind::Removal, 6, 12)]
    );
}

#[test]
fn test_diff_empty_sides() {
    assert_eq!(difference("", "abc"), vec![TextDiff::new(DiffKind::Insertion, 0, 3)]);
    assert_eq!(difference("abc", ""), vec![TextDiff::new(DiffKind::Removal, 0, 3)]);
    assert!(difference("", "").is_empty());
}

#[test]
fn test_compile_hello_brave_world() {
    let chunks = compile_transformations("Hello World", "Hello Brave World").unwrap();
    assert_eq!(chunks, vec![TextChunk::new(6, "Brave World")]);
}

#[test]
fn test_compile_shorter_buffer_erases_tail() {
    let chunks = compile_transformations("progress: done!", "progress: ok").unwrap();
    let last = chunks.last().unwrap();
    assert_eq!(last.offset, 12);
    assert_eq!(last.text, "   ");
}

// =============================================================================
// Screen rendering
// =============================================================================

#[test]
fn test_screen_renders_objects_in_order() {
    let (mut term, console) = terminal(12, 4);
    let screen = term.active_screen_mut();
    screen.add_text("status: ").unwrap();
    screen.add_text(ansi::green("ok")).unwrap();
    screen.add_text("\nnext line").unwrap();
    term.render().unwrap();

    assert_eq!(screen_lines(&console)[..2], ["status: ok", "next line"]);
    assert_eq!(console.lock().unwrap().cell(0, 8).unwrap().fg, AnsiColor::Green);
}

#[test]
fn test_screen_update_shifts_followers() {
    let (mut term, console) = terminal(12, 4);
    let screen = term.active_screen_mut();
    let count = screen.add_text("7").unwrap();
    screen.add_text(" files").unwrap();
    term.render().unwrap();
    assert_eq!(screen_lines(&console)[0], "7 files");

    term.active_screen_mut().set_text(count, "128").unwrap();
    term.render().unwrap();
    assert_eq!(screen_lines(&console)[0], "128 files");

    term.active_screen_mut().set_text(count, "9").unwrap();
    term.render().unwrap();
    assert_eq!(screen_lines(&console)[0], "9 files");
}

#[test]
fn test_screen_remove_reflows() {
    let (mut term, console) = terminal(10, 4);
    let screen = term.active_screen_mut();
    screen.add_text("aaaaaaaa").unwrap();
    let middle = screen.add_text("bbbbbbbb").unwrap();
    screen.add_text("cc").unwrap();
    term.render().unwrap();
    assert_eq!(screen_lines(&console)[..2], ["aaaaaaaabb", "bbbbbbcc"]);

    term.active_screen_mut().remove(middle).unwrap();
    term.render().unwrap();
    assert_eq!(screen_lines(&console)[..2], ["aaaaaaaacc", ""]);
    assert_eq!(term.active_screen().position(), Position::new(1, 0));
}

#[test]
fn test_screen_resize_rewraps() {
    let console = Arc::new(Mutex::new(HeadlessConsole::new(4, 4)));
    let mut term = Terminal::new(Output::emulated(Arc::clone(&console)), VirtualScreen::with_size(10, 4).unwrap());
    let id = term.active_screen_mut().add_text("abcdefgh").unwrap();
    assert_eq!(term.active_screen().text(id).unwrap().end_position(), Position::new(0, 8));

    term.active_screen_mut().set_buffer_size(4, 4).unwrap();
    assert_eq!(term.active_screen().text(id).unwrap().end_position(), Position::new(2, 0));

    term.render().unwrap();
    assert_eq!(screen_lines(&console)[..2], ["abcd", "efgh"]);
}
