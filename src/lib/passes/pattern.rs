//! Generic pattern-replace driver plus the two shipped patterns: zero-clear
//! and linear-vector.

use rayon::prelude::*;

use crate::ir::Block;

/// A pattern inspects a single block and, if it matches, returns the
/// replacement list. Patterns are tried in order; only the first match at
/// a node fires.
pub trait Pattern: Sync {
    fn try_match(&self, block: &Block) -> Option<Vec<Block>>;
}

/// Matches a `Loop` whose body is exactly one `CellAdd(-1)`, or exactly one
/// `VecAdd` of length 1 whose single byte is `0xFF`, or a `LinVecAdd` with
/// offset 0 whose single byte is `0xFF`. Replaces with `CellSet(0)`:
/// decrementing the current cell until it reaches zero is equivalent to
/// setting it to zero for every starting value, since byte arithmetic wraps.
pub struct ZeroClear;

impl Pattern for ZeroClear {
    fn try_match(&self, block: &Block) -> Option<Vec<Block>> {
        let body = match block {
            Block::Loop(body) => body,
            _ => return None,
        };
        if body.len() != 1 {
            return None;
        }
        let hit = match &body[0] {
            Block::CellAdd(-1) => true,
            Block::VecAdd(v) if v.len() == 1 && v[0] == 0xFF => true,
            Block::LinVecAdd { offset: 0, vec } if vec.len() == 1 && vec[0] == 0xFF => true,
            _ => false,
        };
        hit.then(|| vec![Block::CellSet(0)])
    }
}

/// Matches a `Loop` whose body is either
///   (a) one `VecAdd` with no surrounding pointer move, or
///   (b) `PtrAdd(o) + VecAdd(v) + PtrAdd(-o)` with `o <= 0`, `-o < v.len()`,
///       and `v[-o] == 0xFF`.
/// Replaces with `LinVecAdd { offset: o, vec: v }`: because `v[-o]` is -1,
/// the controlling cell is decremented to zero in one simulated pass, while
/// every other touched offset accumulates its delta times the controlling
/// cell's initial value.
pub struct LinearVector;

impl Pattern for LinearVector {
    fn try_match(&self, block: &Block) -> Option<Vec<Block>> {
        let body = match block {
            Block::Loop(body) => body,
            _ => return None,
        };

        if body.len() == 1 {
            if let Block::VecAdd(v) = &body[0] {
                if !v.is_empty() && v[0] == 0xFF {
                    return Some(vec![Block::LinVecAdd { offset: 0, vec: v.clone() }]);
                }
            }
            return None;
        }

        if body.len() == 3 {
            if let (Block::PtrAdd(o), Block::VecAdd(v), Block::PtrAdd(o2)) =
                (&body[0], &body[1], &body[2])
            {
                if *o <= 0 && *o2 == -*o {
                    let idx = (-*o) as usize;
                    if idx < v.len() && v[idx] == 0xFF {
                        return Some(vec![Block::LinVecAdd { offset: *o, vec: v.clone() }]);
                    }
                }
            }
        }

        None
    }
}

/// Applies every pattern in order at each node, rewriting the first match
/// as a `List` of the replacement and continuing the search into both the
/// replacement and the remaining siblings. Recurses into sub-trees in
/// parallel. Returns the total number of matches.
pub fn replace_all(block: &mut Block, patterns: &[&dyn Pattern]) -> u64 {
    let mut total = 0u64;

    for p in patterns {
        if let Some(replacement) = p.try_match(block) {
            *block = Block::List(replacement);
            total += 1;
            break;
        }
    }

    if let Some(children) = block.children_mut() {
        total += children
            .par_iter_mut()
            .map(|c| replace_all(c, patterns))
            .sum::<u64>();
    }

    total
}
