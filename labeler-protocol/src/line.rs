//! Byte-at-a-time line assembly for the serial console
//!
//! Bytes arrive one by one from the UART. A line ends at `\n`; a `\r`
//! anywhere is dropped so both `\n` and `\r\n` hosts work. The finished
//! line is whitespace-trimmed.

use heapless::{String, Vec};

/// Maximum accepted line length in bytes (excluding the terminator)
pub const MAX_LINE_LEN: usize = 64;

/// One console line
pub type Line = String<MAX_LINE_LEN>;

/// Errors that can occur while assembling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`]; the whole line was discarded
    Overflow,
    /// Line was not valid UTF-8
    InvalidUtf8,
}

/// State machine for assembling incoming lines
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    buffer: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl LineParser {
    /// Create a new line parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(line))` at a terminator, `Ok(None)` when more
    /// bytes are needed, or `Err` at the terminator of a bad line.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        match byte {
            b'\r' => Ok(None),
            b'\n' => {
                if self.overflowed {
                    self.reset();
                    return Err(LineError::Overflow);
                }
                let line = finish(&self.buffer);
                self.reset();
                line.map(Some)
            }
            _ => {
                if self.buffer.push(byte).is_err() {
                    self.overflowed = true;
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete line found, if any, and the number of
    /// bytes consumed. Bytes after the terminator are left for the next
    /// call.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (usize, Result<Option<Line>, LineError>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (i + 1, other),
            }
        }
        (bytes.len(), Ok(None))
    }

    /// Number of bytes buffered for the current partial line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn finish(raw: &[u8]) -> Result<Line, LineError> {
    let text = core::str::from_utf8(raw).map_err(|_| LineError::InvalidUtf8)?;
    let mut line = Line::new();
    // The buffer and the line share a capacity
    line.push_str(text.trim()).map_err(|_| LineError::Overflow)?;
    Ok(line)
}
