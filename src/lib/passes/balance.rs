//! Vector cost balancing: dissolve any `VecAdd` that costs more than its
//! scalar equivalent.
//!
//! The constants below are an estimate, not tuned per host; see DESIGN.md
//! for the reasoning.

use rayon::prelude::*;

use crate::ir::Block;

/// Three fixed operations (allocation check, slice, bound check) plus one
/// add per element.
const VECTOR_FIXED_COST: u64 = 3;
/// Three operations per nonzero element (add, bound-check, readjust).
const SCALAR_COST_PER_NONZERO: u64 = 3;

/// Returns `(vector_cost, scalar_cost)` for a `VecAdd` payload, per
/// Used both by Balance and by the IR dump.
pub fn costs(vec: &[u8]) -> (u64, u64) {
    let vector_cost = vec.len() as u64 + VECTOR_FIXED_COST;
    let nonzero = vec.iter().filter(|&&b| b != 0).count() as u64;
    let scalar_cost = SCALAR_COST_PER_NONZERO * nonzero;
    (vector_cost, scalar_cost)
}

/// Balances `block` in place, recursing into containers in parallel.
/// Returns the number of `VecAdd`s dissolved.
pub fn balance(block: &mut Block) -> u64 {
    let children = match block.children_mut() {
        Some(c) => c,
        None => return 0,
    };

    let old = std::mem::take(children);
    let mut out: Vec<Block> = Vec::with_capacity(old.len());
    let mut dissolved = 0u64;

    for child in old {
        match child {
            Block::VecAdd(ref vec) => {
                let (vcost, scost) = costs(vec);
                if vcost > scost {
                    let len = vec.len();
                    for &b in vec.iter() {
                        out.push(Block::CellAdd(b as i64));
                        out.push(Block::PtrAdd(1));
                    }
                    out.push(Block::PtrAdd(-(len as i64)));
                    dissolved += 1;
                } else {
                    out.push(child);
                }
            }
            other => out.push(other),
        }
    }

    let recursed: u64 = out
        .par_iter_mut()
        .filter(|b| b.is_container())
        .map(balance)
        .sum();

    *block.children_mut().unwrap() = out;
    dissolved + recursed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dissolves_a_mostly_zero_vector() {
        // len 5, 1 nonzero: vcost = 5+3=8, scost = 3*1=3 -> dissolve
        let mut b = Block::List(vec![Block::VecAdd(vec![0, 0, 7, 0, 0])]);
        let n = balance(&mut b);
        assert_eq!(n, 1);
        match &b {
            Block::List(children) => {
                // 5 * (CellAdd, PtrAdd) pairs + final fixup PtrAdd(-5)
                assert_eq!(children.len(), 11);
                assert_eq!(children[4], Block::CellAdd(7));
                assert_eq!(children[5], Block::PtrAdd(1));
                assert_eq!(*children.last().unwrap(), Block::PtrAdd(-5));
            }
            _ => panic!("expected List"),
        }
    }

    #[test]
    fn keeps_a_dense_vector() {
        // len 3, all nonzero: vcost=3+3=6, scost=3*3=9 -> keep
        let mut b = Block::List(vec![Block::VecAdd(vec![1, 2, 3])]);
        let n = balance(&mut b);
        assert_eq!(n, 0);
        assert_eq!(b, Block::List(vec![Block::VecAdd(vec![1, 2, 3])]));
    }

    #[test]
    fn dissolved_sequence_has_equal_aggregate_effect() {
        let vec = vec![5u8, 0, 250];
        let mut b = Block::List(vec![Block::VecAdd(vec.clone())]);
        balance(&mut b);

        // simulate both forms against a small tape and compare
        let mut tape_vec = [0u8; 8];
        let mut ptr = 2usize;
        for (i, v) in vec.iter().enumerate() {
            tape_vec[ptr + i] = tape_vec[ptr + i].wrapping_add(*v);
        }

        let mut tape_scalar = [0u8; 8];
        let mut dp = 2usize;
        if let Block::List(children) = &b {
            for c in children {
                match c {
                    Block::CellAdd(d) => tape_scalar[dp] = tape_scalar[dp].wrapping_add(*d as u8),
                    Block::PtrAdd(d) => dp = (dp as i64 + d) as usize,
                    _ => unreachable!(),
                }
            }
        }
        let _ = ptr;
        ptr = 2;
        assert_eq!(&tape_vec[ptr..ptr + 3], &tape_scalar[2..5]);
        assert_eq!(dp, 2); // epilogue restores pointer
    }
}
