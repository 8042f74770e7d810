//! Turns source text into a flat instruction stream, stripping comments.
//!
//! This is a collaborator, not part of the optimizing core: the
//! core only ever consumes an [`Instr`] slice. Recognized instruction bytes
//! are `> < + - . , [ ]`; everything else is whitespace/comment, except `#`
//! which starts a line comment running to the next end-of-line (this is the
//! most recent of the two comment-handling revisions found in
//! `gobflib/bf.go`'s `ReadCommands`).

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Instr {
    /// `>` / `<`, already fused to a signed delta (`+1` / `-1`) at lex time.
    PtrAdd(i64),
    /// `+` / `-`, already fused to a signed delta (`+1` / `-1`) at lex time.
    CellAdd(i64),
    Read,
    Write,
    LoopStart,
    LoopEnd,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unbalanced brackets: unmatched ']' at byte offset {byte_offset}")]
    UnmatchedClose { byte_offset: usize },
    #[error("unbalanced brackets: '[' at byte offset {byte_offset} is never closed")]
    UnmatchedOpen { byte_offset: usize },
}

/// Lexes a full source string into an [`Instr`] stream, validating bracket
/// balance up front so [`crate::ir::build`] never has to.
pub fn lex(src: &str) -> Result<Vec<Instr>, LexError> {
    let mut out = Vec::new();
    let mut depth: usize = 0;
    let mut open_offsets: Vec<usize> = Vec::new();
    let mut in_comment = false;

    for (byte_offset, ch) in src.char_indices() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }

        match ch {
            '#' => in_comment = true,
            '>' => out.push(Instr::PtrAdd(1)),
            '<' => out.push(Instr::PtrAdd(-1)),
            '+' => out.push(Instr::CellAdd(1)),
            '-' => out.push(Instr::CellAdd(-1)),
            '.' => out.push(Instr::Write),
            ',' => out.push(Instr::Read),
            '[' => {
                open_offsets.push(byte_offset);
                depth += 1;
                out.push(Instr::LoopStart);
            }
            ']' => {
                if depth == 0 {
                    return Err(LexError::UnmatchedClose { byte_offset });
                }
                depth -= 1;
                open_offsets.pop();
                out.push(Instr::LoopEnd);
            }
            _ => {}
        }
    }

    if let Some(byte_offset) = open_offsets.first() {
        return Err(LexError::UnmatchedOpen { byte_offset: *byte_offset });
    }

    Ok(out)
}
