//! The intermediate representation: a tree of [`Block`]s, plus the
//! one-to-one construction from a flat [`crate::lex::Instr`] stream and a
//! textual dump. The transformation passes live in [`crate::passes`].

use std::fmt;

use crate::lex::Instr;

/// One node of the IR tree.
///
/// `List` and `Loop` are the only container kinds; every other kind is a
/// leaf. A block is owned exclusively by its parent -- there is no sharing,
/// no back-pointer, no cycle. Passes rewrite a container by building a
/// fresh child vector rather than mutating in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// Sequential composition; no run-time effect of its own.
    List(Vec<Block>),
    /// Repeat the children while the current cell is nonzero.
    Loop(Vec<Block>),
    /// Add `delta` to the tape pointer.
    PtrAdd(i64),
    /// Add `delta` (mod 256) to the current cell.
    CellAdd(i64),
    /// Overwrite the current cell with `value`.
    CellSet(u8),
    /// Read `count` bytes into the current cell, each overwriting the last.
    Read(u32),
    /// Emit the current cell `count` times.
    Write(u32),
    /// `for i in 0..vec.len(): tape[ptr + i] += vec[i] (mod 256)`. Pointer
    /// unchanged.
    VecAdd(Vec<u8>),
    /// The loop-folding idiom: equivalent to running a
    /// loop guarded by `tape[ptr + offset]`, multiplying every other touched
    /// offset's delta by the guard's initial value in one step.
    LinVecAdd { offset: i64, vec: Vec<u8> },
}

impl Block {
    /// Does this node carry children?
    pub fn is_container(&self) -> bool {
        matches!(self, Block::List(_) | Block::Loop(_))
    }

    pub fn children(&self) -> Option<&[Block]> {
        match self {
            Block::List(c) | Block::Loop(c) => Some(c),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::List(c) | Block::Loop(c) => Some(c),
            _ => None,
        }
    }

    /// Renders the tree as an indented, one-node-per-line listing showing
    /// kind, parameter, and (for vector kinds) both the byte sequence and
    /// the two computed costs.
    pub fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Block::List(children) => {
                writeln!(out, "{pad}List")?;
                for c in children {
                    c.dump(out, indent + 1)?;
                }
            }
            Block::Loop(children) => {
                writeln!(out, "{pad}Loop")?;
                for c in children {
                    c.dump(out, indent + 1)?;
                }
            }
            Block::PtrAdd(d) => writeln!(out, "{pad}PtrAdd {d}")?,
            Block::CellAdd(d) => writeln!(out, "{pad}CellAdd {d}")?,
            Block::CellSet(v) => writeln!(out, "{pad}CellSet {v}")?,
            Block::Read(n) => writeln!(out, "{pad}Read x{n}")?,
            Block::Write(n) => writeln!(out, "{pad}Write x{n}")?,
            Block::VecAdd(v) => {
                let (vcost, scost) = crate::passes::balance::costs(v);
                writeln!(out, "{pad}VecAdd {v:?} vcost={vcost} scost={scost}")?;
            }
            Block::LinVecAdd { offset, vec } => {
                writeln!(out, "{pad}LinVecAdd offset={offset} vec={vec:?}")?;
            }
        }
        Ok(())
    }

    pub fn dump_to_string(&self) -> String {
        let mut s = String::new();
        self.dump(&mut s, 0).expect("writing to a String cannot fail");
        s
    }
}

/// Errors produced while walking an [`Instr`] stream into a [`Block`] tree.
///
/// This duplicates [`crate::lex::LexError`]'s bracket-balance checking on
/// purpose: the lexer already guarantees balance for well-formed streams,
/// but `build` is a public entry point in its own right and
/// must not assume its caller was the bundled lexer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("unbalanced brackets: unmatched ']' at instruction {ip}")]
    UnmatchedClose { ip: usize },
    #[error("unbalanced brackets: {open} unclosed '[' remain at end of stream")]
    UnmatchedOpen { open: usize },
}

/// Builds an IR tree from a flat instruction stream.
///
/// Maintains a stack of "current container", starting at the root `List`.
/// `[` opens a new `Loop`, pushes the old container, and makes the loop
/// current; `]` pops back to the parent. A mismatched `]` or an unclosed
/// `[` at end-of-stream is a [`BuildError`].
pub fn build(instrs: &[Instr]) -> Result<Block, BuildError> {
    let mut stack: Vec<Vec<Block>> = vec![Vec::new()];

    for (ip, instr) in instrs.iter().enumerate() {
        match instr {
            Instr::PtrAdd(d) => stack.last_mut().unwrap().push(Block::PtrAdd(*d)),
            Instr::CellAdd(d) => stack.last_mut().unwrap().push(Block::CellAdd(*d)),
            Instr::Read => stack.last_mut().unwrap().push(Block::Read(1)),
            Instr::Write => stack.last_mut().unwrap().push(Block::Write(1)),
            Instr::LoopStart => stack.push(Vec::new()),
            Instr::LoopEnd => {
                if stack.len() < 2 {
                    return Err(BuildError::UnmatchedClose { ip });
                }
                let body = stack.pop().unwrap();
                stack.last_mut().unwrap().push(Block::Loop(body));
            }
        }
    }

    if stack.len() != 1 {
        return Err(BuildError::UnmatchedOpen { open: stack.len() - 1 });
    }

    Ok(Block::List(stack.pop().unwrap()))
}
