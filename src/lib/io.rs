//! Input/output collaborators for the reference interpreter. Kept generic
//! over [`Input`]/[`Output`] traits so the interpreter itself never knows
//! whether it's talking to a terminal or a test fixture.

use std::collections::VecDeque;
use std::io::Write;

pub trait Input {
    type InputError: std::error::Error + 'static;

    fn read_byte(&mut self) -> Result<u8, Self::InputError>;
}

pub trait Output {
    type OutputError: std::error::Error + 'static;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::OutputError>;
}

const EOF_OUTPUT: u8 = 0;
const NEWLINE_OUTPUT: u8 = 10;

/// Reads stdin line-by-line, buffering the bytes; once the terminal yields
/// an empty read (end of input) every subsequent read is `0`.
pub struct StdIn {
    eof: bool,
    input_buffer: VecDeque<u8>,
}

impl StdIn {
    pub fn new() -> Self {
        Self { eof: false, input_buffer: VecDeque::new() }
    }
}

impl Default for StdIn {
    fn default() -> Self {
        Self::new()
    }
}

impl Input for StdIn {
    type InputError = std::io::Error;

    fn read_byte(&mut self) -> Result<u8, Self::InputError> {
        if self.eof {
            return Ok(EOF_OUTPUT);
        }

        while self.input_buffer.is_empty() {
            let mut line = String::new();
            let n = std::io::stdin().read_line(&mut line)?;
            if n == 0 {
                self.eof = true;
                return Ok(EOF_OUTPUT);
            }
            // There's no way to read raw bytes from a terminal line-by-line
            // without adding newlines or reaching for a curses dependency,
            // so a read newline is remapped to the BF convention.
            for byte in line.bytes() {
                if byte == b'\n' {
                    self.input_buffer.push_back(NEWLINE_OUTPUT);
                } else {
                    self.input_buffer.push_back(byte);
                }
            }
        }

        Ok(self.input_buffer.pop_front().unwrap())
    }
}

pub struct StdOut(());

impl StdOut {
    pub fn new() -> Self {
        StdOut(())
    }
}

impl Default for StdOut {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for StdOut {
    type OutputError = std::io::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::OutputError> {
        std::io::stdout().lock().write_all(&[byte])
    }
}

/// An in-memory [`Input`] useful for tests and for driving the interpreter
/// from a captured byte string.
pub struct SliceIn<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceIn<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl<'a> Input for SliceIn<'a> {
    type InputError = std::convert::Infallible;

    fn read_byte(&mut self) -> Result<u8, Self::InputError> {
        let b = self.bytes.get(self.pos).copied().unwrap_or(EOF_OUTPUT);
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
        Ok(b)
    }
}

/// An in-memory [`Output`] that accumulates every written byte.
#[derive(Default)]
pub struct VecOut(pub Vec<u8>);

impl Output for VecOut {
    type OutputError = std::convert::Infallible;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::OutputError> {
        self.0.push(byte);
        Ok(())
    }
}
