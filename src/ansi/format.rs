//! Formatting helpers
//!
//! Pure string builders that wrap text in escape sequences. Foreground and
//! background helpers save the enclosing color with the custom push command
//! and restore it afterwards, so helpers can nest.

use super::{code, AnsiColor, StackCode, CUSTOM, SGR};

/// Build a CSI sequence from parameters and a terminator
pub fn csi(params: &[u32], terminator: u8) -> String {
    let mut out = String::with_capacity(4 + params.len() * 4);
    out.push_str("\x1b[");
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(&p.to_string());
    }
    out.push(char::from(terminator));
    out
}

/// Build an SGR sequence (`ESC[..m`)
pub fn sgr(params: &[u32]) -> String {
    csi(params, SGR)
}

/// Build a custom color-stack command (`ESC[..z`)
pub fn stack_command(code: StackCode) -> String {
    csi(&[code.code()], CUSTOM)
}

/// Wrap text in a foreground color, restoring the previous color after
pub fn fg(color: AnsiColor, text: &str) -> String {
    format!(
        "{}{}{}{}",
        stack_command(StackCode::PushFg),
        sgr(&[color.fg_code()]),
        text,
        stack_command(StackCode::PopFg)
    )
}

/// Wrap text in a background color, restoring the previous color after
pub fn bg(color: AnsiColor, text: &str) -> String {
    format!(
        "{}{}{}{}",
        stack_command(StackCode::PushBg),
        sgr(&[color.bg_code()]),
        text,
        stack_command(StackCode::PopBg)
    )
}

/// Wrap text in a 24-bit foreground color, then restore the default foreground
pub fn rgb(r: u8, g: u8, b: u8, text: &str) -> String {
    format!(
        "{}{}{}",
        sgr(&[code::FG_EXTENDED, code::MODE_RGB, r as u32, g as u32, b as u32]),
        text,
        sgr(&[code::FG_DEFAULT])
    )
}

/// Wrap text in a 24-bit background color, then restore the default background
pub fn bg_rgb(r: u8, g: u8, b: u8, text: &str) -> String {
    format!(
        "{}{}{}",
        sgr(&[code::BG_EXTENDED, code::MODE_RGB, r as u32, g as u32, b as u32]),
        text,
        sgr(&[code::BG_DEFAULT])
    )
}

pub fn orange(text: &str) -> String {
    rgb(255, 120, 0, text)
}

pub fn orange_bright(text: &str) -> String {
    rgb(255, 170, 0, text)
}

macro_rules! color_helpers {
    ($($fg_name:ident, $bg_name:ident => $color:ident;)*) => {
        $(
            pub fn $fg_name(text: &str) -> String {
                fg(AnsiColor::$color, text)
            }

            pub fn $bg_name(text: &str) -> String {
                bg(AnsiColor::$color, text)
            }
        )*
    };
}

color_helpers! {
    black, bg_black => Black;
    red, bg_red => Red;
    green, bg_green => Green;
    yellow, bg_yellow => Yellow;
    blue, bg_blue => Blue;
    magenta, bg_magenta => Magenta;
    cyan, bg_cyan => Cyan;
    white, bg_white => White;
    bright_black, bg_bright_black => BrightBlack;
    bright_red, bg_bright_red => BrightRed;
    bright_green, bg_bright_green => BrightGreen;
    bright_yellow, bg_bright_yellow => BrightYellow;
    bright_blue, bg_bright_blue => BrightBlue;
    bright_magenta, bg_bright_magenta => BrightMagenta;
    bright_cyan, bg_bright_cyan => BrightCyan;
    bright_white, bg_bright_white => BrightWhite;
}

fn styled(on: u32, off: u32, text: &str) -> String {
    format!("{}{}{}", sgr(&[on]), text, sgr(&[off]))
}

pub fn bold(text: &str) -> String {
    styled(code::BOLD, code::NORMAL_INTENSITY, text)
}

pub fn italic(text: &str) -> String {
    styled(code::ITALIC, code::NO_ITALIC, text)
}

pub fn underline(text: &str) -> String {
    styled(code::UNDERLINE, code::NO_UNDERLINE, text)
}

pub fn blink(text: &str) -> String {
    styled(code::BLINK, code::NO_BLINK, text)
}

pub fn invert(text: &str) -> String {
    styled(code::INVERT, code::NO_INVERT, text)
}

// Cursor and erase sequences. Positions are 0-indexed here and converted
// to the 1-indexed form terminals expect.

pub fn cursor_up(n: usize) -> String {
    csi(&[n as u32], b'A')
}

pub fn cursor_down(n: usize) -> String {
    csi(&[n as u32], b'B')
}

pub fn cursor_forward(n: usize) -> String {
    csi(&[n as u32], b'C')
}

pub fn cursor_back(n: usize) -> String {
    csi(&[n as u32], b'D')
}

/// Move to column `col` on the current row (CHA)
pub fn cursor_column(col: usize) -> String {
    csi(&[col as u32 + 1], b'G')
}

/// Move to `(row, col)` (CUP)
pub fn cursor_to(row: usize, col: usize) -> String {
    csi(&[row as u32 + 1, col as u32 + 1], b'H')
}

pub const CLEAR_SCREEN: &str = "\x1b[2J";
pub const CURSOR_HOME: &str = "\x1b[H";
pub const ERASE_LINE: &str = "\x1b[2K";
pub const ERASE_BELOW: &str = "\x1b[J";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const SAVE_CURSOR: &str = "\x1b[s";
pub const RESTORE_CURSOR: &str = "\x1b[u";
pub const RESET: &str = "\x1b[0m";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn test_sgr_builder() {
        assert_eq!(sgr(&[]), "\x1b[m");
        assert_eq!(sgr(&[1, 31]), "\x1b[1;31m");
    }

    #[test]
    fn test_fg_wraps_with_stack_commands() {
        assert_eq!(red("x"), "\x1b[10z\x1b[31mx\x1b[20z");
        assert_eq!(bg_bright_blue("x"), "\x1b[11z\x1b[104mx\x1b[21z");
    }

    #[test]
    fn test_rgb_helpers() {
        assert_eq!(orange("o"), "\x1b[38;2;255;120;0mo\x1b[39m");
        assert_eq!(bg_rgb(1, 2, 3, "b"), "\x1b[48;2;1;2;3mb\x1b[49m");
    }

    #[test]
    fn test_styles() {
        assert_eq!(bold("b"), "\x1b[1mb\x1b[22m");
        assert_eq!(invert("i"), "\x1b[7mi\x1b[27m");
    }

    #[test]
    fn test_cursor_sequences_are_one_indexed() {
        assert_eq!(cursor_to(0, 0), "\x1b[1;1H");
        assert_eq!(cursor_column(4), "\x1b[5G");
        assert_eq!(cursor_up(2), "\x1b[2A");
    }

    #[test]
    fn test_helpers_strip_to_text() {
        let nested = green(&format!("a{}b", bold(&red("c"))));
        assert_eq!(parser::strip(&nested).unwrap(), "acb");
    }
}
