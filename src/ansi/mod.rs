//! ANSI codes
//!
//! Numeric codes for the SGR family, the custom color-stack commands and
//! the 16-entry color enumeration shared by the emulator and formatting
//! helpers.

mod format;

pub use format::*;

use serde::{Deserialize, Serialize};

/// SGR terminator
pub const SGR: u8 = b'm';

/// Terminator of the custom color-stack command family
pub const CUSTOM: u8 = b'z';

/// SGR codes with special meaning to the emulator
pub mod code {
    pub const RESET: u32 = 0;
    pub const BOLD: u32 = 1;
    pub const NORMAL_INTENSITY: u32 = 22;
    pub const ITALIC: u32 = 3;
    pub const NO_ITALIC: u32 = 23;
    pub const UNDERLINE: u32 = 4;
    pub const NO_UNDERLINE: u32 = 24;
    pub const BLINK: u32 = 5;
    pub const RAPID_BLINK: u32 = 6;
    pub const NO_BLINK: u32 = 25;
    pub const INVERT: u32 = 7;
    pub const NO_INVERT: u32 = 27;
    /// Legacy invert-off, same effect as 27
    pub const NO_INVERT_ALT: u32 = 26;
    pub const FG_EXTENDED: u32 = 38;
    pub const FG_DEFAULT: u32 = 39;
    pub const BG_EXTENDED: u32 = 48;
    pub const BG_DEFAULT: u32 = 49;
    /// Extended color mode: direct RGB triple
    pub const MODE_RGB: u32 = 2;
    /// Extended color mode: palette index
    pub const MODE_INDEXED: u32 = 5;
}

/// Custom color-stack command codes (terminator `z`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackCode {
    PushFg = 10,
    PushBg = 11,
    PopFg = 20,
    PopBg = 21,
}

impl StackCode {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            10 => Some(Self::PushFg),
            11 => Some(Self::PushBg),
            20 => Some(Self::PopFg),
            21 => Some(Self::PopBg),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// The 16 standard terminal colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnsiColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

/// Default RGB values for the 16 colors (xterm-like)
pub const DEFAULT_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),       // 0: Black
    (205, 0, 0),     // 1: Red
    (0, 205, 0),     // 2: Green
    (205, 205, 0),   // 3: Yellow
    (0, 0, 238),     // 4: Blue
    (205, 0, 205),   // 5: Magenta
    (0, 205, 205),   // 6: Cyan
    (229, 229, 229), // 7: White
    (127, 127, 127), // 8: Bright Black
    (255, 0, 0),     // 9: Bright Red
    (0, 255, 0),     // 10: Bright Green
    (255, 255, 0),   // 11: Bright Yellow
    (92, 92, 255),   // 12: Bright Blue
    (255, 0, 255),   // 13: Bright Magenta
    (0, 255, 255),   // 14: Bright Cyan
    (255, 255, 255), // 15: Bright White
];

impl AnsiColor {
    pub const ALL: [AnsiColor; 16] = [
        AnsiColor::Black,
        AnsiColor::Red,
        AnsiColor::Green,
        AnsiColor::Yellow,
        AnsiColor::Blue,
        AnsiColor::Magenta,
        AnsiColor::Cyan,
        AnsiColor::White,
        AnsiColor::BrightBlack,
        AnsiColor::BrightRed,
        AnsiColor::BrightGreen,
        AnsiColor::BrightYellow,
        AnsiColor::BrightBlue,
        AnsiColor::BrightMagenta,
        AnsiColor::BrightCyan,
        AnsiColor::BrightWhite,
    ];

    /// Color for a palette index (0-15)
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_bright(self) -> bool {
        self.index() >= 8
    }

    /// Foreground SGR code (30-37, 90-97)
    pub fn fg_code(self) -> u32 {
        let i = self.index() as u32;
        if i < 8 {
            30 + i
        } else {
            90 + (i - 8)
        }
    }

    /// Background SGR code (40-47, 100-107)
    pub fn bg_code(self) -> u32 {
        self.fg_code() + 10
    }

    /// Decode a 3/4-bit foreground code
    pub fn from_fg_code(code: u32) -> Option<Self> {
        match code {
            30..=37 => Self::from_index(code - 30),
            90..=97 => Self::from_index(code - 90 + 8),
            _ => None,
        }
    }

    /// Decode a 3/4-bit background code
    pub fn from_bg_code(code: u32) -> Option<Self> {
        match code {
            40..=47 => Self::from_index(code - 40),
            100..=107 => Self::from_index(code - 100 + 8),
            _ => None,
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        DEFAULT_PALETTE[self.index() as usize]
    }

    /// Closest palette entry to an RGB value (squared euclidean distance)
    pub fn nearest(r: u8, g: u8, b: u8) -> Self {
        let dist = |(pr, pg, pb): (u8, u8, u8)| {
            let dr = pr as i32 - r as i32;
            let dg = pg as i32 - g as i32;
            let db = pb as i32 - b as i32;
            dr * dr + dg * dg + db * db
        };
        Self::ALL
            .iter()
            .copied()
            .min_by_key(|c| dist(c.rgb()))
            .unwrap_or(AnsiColor::White)
    }
}

/// Command families the emulator dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFamily {
    /// Select Graphic Rendition (`m`)
    Sgr,
    /// Custom color-stack commands (`z`)
    Custom,
    /// Cursor movement, erasure and visibility
    Cursor(u8),
    /// Anything else
    Other(u8),
}

impl CommandFamily {
    pub fn from_terminator(byte: u8) -> Self {
        match byte {
            SGR => CommandFamily::Sgr,
            CUSTOM => CommandFamily::Custom,
            b'A'..=b'H' | b'J' | b'K' | b'f' | b's' | b'u' | b'h' | b'l' => CommandFamily::Cursor(byte),
            other => CommandFamily::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fg_bg_codes() {
        assert_eq!(AnsiColor::Red.fg_code(), 31);
        assert_eq!(AnsiColor::Red.bg_code(), 41);
        assert_eq!(AnsiColor::BrightCyan.fg_code(), 96);
        assert_eq!(AnsiColor::BrightCyan.bg_code(), 106);
    }

    #[test]
    fn test_code_round_trip_for_all_colors() {
        for color in AnsiColor::ALL {
            assert_eq!(AnsiColor::from_fg_code(color.fg_code()), Some(color));
            assert_eq!(AnsiColor::from_bg_code(color.bg_code()), Some(color));
        }
        assert_eq!(AnsiColor::from_fg_code(38), None);
        assert_eq!(AnsiColor::from_bg_code(49), None);
    }

    #[test]
    fn test_nearest() {
        assert_eq!(AnsiColor::nearest(0, 0, 0), AnsiColor::Black);
        assert_eq!(AnsiColor::nearest(250, 5, 5), AnsiColor::BrightRed);
        assert_eq!(AnsiColor::nearest(200, 10, 0), AnsiColor::Red);
        assert_eq!(AnsiColor::nearest(255, 255, 250), AnsiColor::BrightWhite);
    }

    #[test]
    fn test_stack_codes() {
        assert_eq!(StackCode::from_code(10), Some(StackCode::PushFg));
        assert_eq!(StackCode::from_code(21), Some(StackCode::PopBg));
        assert_eq!(StackCode::from_code(12), None);
        assert_eq!(StackCode::PopFg.code(), 20);
    }

    #[test]
    fn test_command_family() {
        assert_eq!(CommandFamily::from_terminator(b'm'), CommandFamily::Sgr);
        assert_eq!(CommandFamily::from_terminator(b'z'), CommandFamily::Custom);
        assert_eq!(CommandFamily::from_terminator(b'H'), CommandFamily::Cursor(b'H'));
        assert_eq!(CommandFamily::from_terminator(b'n'), CommandFamily::Other(b'n'));
    }
}
