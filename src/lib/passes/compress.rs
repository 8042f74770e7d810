//! Compress: flatten nested `List`s and fuse runs of like-typed siblings.
//! Run as part of the transformation pipeline.

use rayon::prelude::*;

use crate::ir::Block;

/// Flattens and fuses `block` in place, recursing into containers in
/// parallel (each child sub-tree is an independent task, joined
/// before the parent's own rewrite continues). Returns the number of
/// fusions performed, so the orchestrator can detect convergence.
pub fn compress(block: &mut Block) -> u64 {
    let children = match block.children_mut() {
        Some(c) => c,
        None => return 0,
    };

    // Step A: flatten -- splice any List child's children in place. Loops
    // are never flattened even though they share List's container shape.
    let mut flattened: Vec<Block> = std::mem::take(children)
        .into_iter()
        .flat_map(|child| match child {
            Block::List(grandchildren) => grandchildren,
            other => vec![other],
        })
        .collect();

    // Recurse into every child sub-tree concurrently; distinct children own
    // disjoint blocks, so there is nothing to synchronize beyond the join.
    let recursion_fusions: u64 = flattened.par_iter_mut().map(|child| compress(child)).sum();

    // Step B: fuse runs of adjacent siblings, strictly left-to-right,
    // within this single parent only. No look-through across a List
    // boundary (already removed) or any other kind.
    let mut out: Vec<Block> = Vec::with_capacity(flattened.len());
    let mut fuse_count = 0u64;
    for item in flattened.drain(..) {
        match (out.last_mut(), &item) {
            (Some(Block::PtrAdd(a)), Block::PtrAdd(b)) => {
                *a += b;
                fuse_count += 1;
            }
            (Some(Block::Write(a)), Block::Write(b)) => {
                *a += b;
                fuse_count += 1;
            }
            (Some(Block::CellAdd(a)), Block::CellAdd(b)) => {
                *a += b;
                fuse_count += 1;
            }
            (Some(Block::CellSet(a)), Block::CellAdd(b)) => {
                *a = (*a as i64 + b).rem_euclid(256) as u8;
                fuse_count += 1;
            }
            (Some(Block::CellSet(_)), Block::CellSet(b)) => {
                *out.last_mut().unwrap() = Block::CellSet(*b);
                fuse_count += 1;
            }
            (Some(Block::CellAdd(_)), Block::CellSet(b)) => {
                *out.last_mut().unwrap() = Block::CellSet(*b);
                fuse_count += 1;
            }
            _ => out.push(item),
        }
    }

    *block.children_mut().unwrap() = out;
    recursion_fusions + fuse_count
}
