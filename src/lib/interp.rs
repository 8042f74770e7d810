//! The reference interpreter: the oracle every optimization pass must
//! agree with. Walks a terminal (or unoptimized) IR tree against a
//! byte-addressed tape that grows on demand.

use crate::io::{Input, Output};
use crate::ir::Block;

#[derive(Debug, thiserror::Error)]
pub enum InterpError<IE, OE>
where
    IE: std::error::Error + 'static,
    OE: std::error::Error + 'static,
{
    #[error("tape underflow: pointer moved below index 0")]
    TapeUnderflow,
    #[error("read error: {0}")]
    ReadError(#[source] IE),
    #[error("write error: {0}")]
    WriteError(#[source] OE),
    /// A pass emitted a `LinVecAdd`, which the naive interpreter does not
    /// execute -- reaching here indicates a pipeline bug, not user error.
    #[error("unknown command: LinVecAdd reached the reference interpreter")]
    UnknownCommand,
}

pub struct Interpreter {
    tape: Vec<u8>,
    ptr: usize,
}

impl Interpreter {
    pub fn new(initial_tape_len: usize) -> Self {
        Self { tape: vec![0u8; initial_tape_len.max(1)], ptr: 0 }
    }

    fn ensure_capacity(&mut self, index: usize) {
        while index >= self.tape.len() {
            let new_len = self.tape.len() * 2;
            self.tape.resize(new_len, 0);
        }
    }

    fn move_ptr(&mut self, delta: i64) -> Result<(), ()> {
        let new_ptr = self.ptr as i64 + delta;
        if new_ptr < 0 {
            return Err(());
        }
        self.ptr = new_ptr as usize;
        self.ensure_capacity(self.ptr);
        Ok(())
    }

    /// The tape contents up to (and including) the highest index ever
    /// touched -- useful for tests and for `--profile`-style diagnostics.
    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn ptr(&self) -> usize {
        self.ptr
    }

    pub fn run<I: Input, O: Output>(
        &mut self,
        block: &Block,
        input: &mut I,
        output: &mut O,
    ) -> Result<(), InterpError<I::InputError, O::OutputError>> {
        self.exec(block, input, output)
    }

    fn exec<I: Input, O: Output>(
        &mut self,
        block: &Block,
        input: &mut I,
        output: &mut O,
    ) -> Result<(), InterpError<I::InputError, O::OutputError>> {
        match block {
            Block::List(children) => {
                for c in children {
                    self.exec(c, input, output)?;
                }
                Ok(())
            }
            Block::Loop(children) => {
                while self.tape[self.ptr] != 0 {
                    for c in children {
                        self.exec(c, input, output)?;
                    }
                }
                Ok(())
            }
            Block::PtrAdd(d) => self.move_ptr(*d).map_err(|_| InterpError::TapeUnderflow),
            Block::CellAdd(d) => {
                self.tape[self.ptr] = (self.tape[self.ptr] as i64 + d).rem_euclid(256) as u8;
                Ok(())
            }
            Block::CellSet(v) => {
                self.tape[self.ptr] = *v;
                Ok(())
            }
            Block::Read(n) => {
                for _ in 0..*n {
                    let byte = input.read_byte().map_err(InterpError::ReadError)?;
                    self.tape[self.ptr] = byte;
                }
                Ok(())
            }
            Block::Write(n) => {
                for _ in 0..*n {
                    output.write_byte(self.tape[self.ptr]).map_err(InterpError::WriteError)?;
                }
                Ok(())
            }
            Block::VecAdd(v) => {
                for (i, b) in v.iter().enumerate() {
                    let idx = self.ptr + i;
                    self.ensure_capacity(idx);
                    self.tape[idx] = self.tape[idx].wrapping_add(*b);
                }
                Ok(())
            }
            Block::LinVecAdd { .. } => Err(InterpError::UnknownCommand),
        }
    }
}
