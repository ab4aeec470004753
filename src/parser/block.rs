//! Command blocks
//!
//! The unit produced by the parser: an optional control sequence followed
//! by the plain text that runs up to the next escape initiator.

use serde::Serialize;

/// Escape initiator (ESC)
pub const ESC: u8 = 0x1B;

/// Control sequence introducer following ESC
pub const CSI_INTRODUCER: u8 = b'[';

/// Returns true for bytes that terminate a control sequence
#[inline]
pub fn is_final_byte(byte: u8) -> bool {
    (0x40..=0x7E).contains(&byte)
}

/// Returns true for parameter bytes (digits, separators, private markers)
#[inline]
pub fn is_parameter_byte(byte: u8) -> bool {
    (0x30..=0x3F).contains(&byte)
}

/// Returns true for private markers that may open a parameter list
#[inline]
pub fn is_private_marker(byte: u8) -> bool {
    matches!(byte, b'<' | b'=' | b'>' | b'?')
}

/// A parsed segment of an escape-coded buffer.
///
/// Offsets are byte offsets into the parsed buffer. `raw` always spans
/// `block_start..block_end`, so concatenating the `raw` of every block
/// reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandBlock<'a> {
    /// Terminator byte of the control sequence, if the block has one
    pub command: Option<u8>,
    /// Private marker (`?`, `>`, `=`, `<`) directly after the introducer
    pub marker: Option<u8>,
    /// Numeric parameters in order of appearance
    pub params: Vec<u32>,
    /// Plain text following the command
    pub text: &'a str,
    /// The full source slice of this block
    pub raw: &'a str,
    /// Offset of the first byte of the block
    pub block_start: usize,
    /// Offset of the first byte of `text`
    pub text_start: usize,
    /// Offset one past the last byte of the block
    pub block_end: usize,
    /// `text` contains non-printing control characters
    pub has_control_char: bool,
}

impl<'a> CommandBlock<'a> {
    /// The raw control sequence preceding the text (empty for text-only blocks)
    pub fn command_prefix(&self) -> &'a str {
        &self.raw[..self.text_start - self.block_start]
    }

    /// Terminator as a char, for display and matching
    pub fn command_char(&self) -> Option<char> {
        self.command.map(char::from)
    }

    /// Get parameter at index, or default value if not present
    pub fn param(&self, index: usize, default: u32) -> u32 {
        self.params.get(index).copied().unwrap_or(default)
    }

    /// Get parameter at index, treating 0 as default
    pub fn param_or_default(&self, index: usize, default: u32) -> u32 {
        match self.params.get(index) {
            Some(&0) | None => default,
            Some(&v) => v,
        }
    }

    /// Number of chars in `text` that occupy a column when printed
    pub fn printable_len(&self) -> usize {
        if self.has_control_char {
            self.text.chars().filter(|c| !c.is_control()).count()
        } else {
            self.text.chars().count()
        }
    }

    /// Byte range of the command prefix
    pub fn command_range(&self) -> std::ops::Range<usize> {
        self.block_start..self.text_start
    }

    /// Byte range of the trailing text
    pub fn text_range(&self) -> std::ops::Range<usize> {
        self.text_start..self.block_end
    }
}
