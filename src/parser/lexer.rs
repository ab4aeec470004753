//! Block lexer
//!
//! Splits a buffer into [`CommandBlock`]s. Stateless between blocks: every
//! call to `next` resumes at the byte where the previous block ended.

use super::block::{is_final_byte, is_private_marker, CommandBlock, CSI_INTRODUCER, ESC};
use super::ParseError;

/// Bytes of context included in a malformed-sequence fragment
const FRAGMENT_CONTEXT: usize = 16;

/// Iterator over the command blocks of a buffer.
///
/// Yields `Err` once for a malformed sequence and then stops, since the
/// offsets of anything after it would be unreliable.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    input: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Blocks<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            failed: false,
        }
    }

    /// Scan one block starting at `self.pos`
    fn scan_block(&mut self) -> Result<CommandBlock<'a>, ParseError> {
        let bytes = self.input.as_bytes();
        let block_start = self.pos;

        let mut command = None;
        let mut marker = None;
        let mut params = Vec::new();
        let mut text_start = block_start;
        let mut lone_escape = false;

        if bytes[block_start] == ESC {
            if bytes.get(block_start + 1) == Some(&CSI_INTRODUCER) {
                let (final_byte, end) = self.scan_sequence(block_start, &mut marker, &mut params)?;
                command = Some(final_byte);
                text_start = end;
            } else {
                // ESC without an introducer is carried as control text
                lone_escape = true;
            }
        }

        let scan_from = if lone_escape { text_start + 1 } else { text_start };
        let block_end = match self.input[scan_from..].find(char::from(ESC)) {
            Some(idx) => scan_from + idx,
            None => self.input.len(),
        };

        let text = &self.input[text_start..block_end];
        let has_control_char = lone_escape || text.chars().any(char::is_control);

        self.pos = block_end;

        Ok(CommandBlock {
            command,
            marker,
            params,
            text,
            raw: &self.input[block_start..block_end],
            block_start,
            text_start,
            block_end,
            has_control_char,
        })
    }

    /// Consume a control sequence starting at the ESC at `start`.
    ///
    /// Returns the terminator and the offset just past it.
    fn scan_sequence(
        &self,
        start: usize,
        marker: &mut Option<u8>,
        params: &mut Vec<u32>,
    ) -> Result<(u8, usize), ParseError> {
        let bytes = self.input.as_bytes();
        let params_start = start + 2;
        let mut current_param: u32 = 0;
        let mut param_has_digit = false;

        let mut i = params_start;
        loop {
            let Some(&byte) = bytes.get(i) else {
                return Err(self.malformed(start, i));
            };

            match byte {
                ESC => return Err(self.malformed(start, i)),
                b if is_final_byte(b) => {
                    if param_has_digit {
                        params.push(current_param);
                    }
                    return Ok((b, i + 1));
                }
                b'0'..=b'9' => {
                    current_param = current_param
                        .saturating_mul(10)
                        .saturating_add((byte - b'0') as u32);
                    param_has_digit = true;
                }
                b';' | b':' => {
                    // An empty slot still occupies a position
                    params.push(if param_has_digit { current_param } else { 0 });
                    current_param = 0;
                    param_has_digit = false;
                }
                b if is_private_marker(b) && i == params_start => {
                    *marker = Some(b);
                }
                // Intermediates and stray bytes carry no parameters
                _ => {}
            }
            i += 1;
        }
    }

    fn malformed(&self, start: usize, stop: usize) -> ParseError {
        let mut end = (stop + FRAGMENT_CONTEXT).min(self.input.len());
        while !self.input.is_char_boundary(end) {
            end -= 1;
        }
        ParseError::MalformedSequence {
            offset: start,
            fragment: self.input[start..end].to_string(),
        }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Result<CommandBlock<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.input.len() {
            return None;
        }

        let result = self.scan_block();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
