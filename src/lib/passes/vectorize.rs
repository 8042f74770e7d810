//! Vectorize: absorb runs of scalar `PtrAdd`/`CellAdd` siblings into a
//! prologue `PtrAdd` + `VecAdd` + epilogue `PtrAdd` triple.

use rayon::prelude::*;

use crate::ir::Block;

/// Per-run bookkeeping for an in-progress vectorize overlay: indices of the
/// already-appended prologue/vector/epilogue blocks in the output vector,
/// plus the current logical offset relative to the vector's index-zero
/// cell (the "overlay").
struct Overlay {
    prologue_ix: usize,
    vec_ix: usize,
    epilogue_ix: usize,
    ptr_off: i64,
}

/// Vectorizes `block` in place, recursing into containers in parallel.
/// Returns the number of overlays opened (i.e. runs absorbed), matching the
/// convergence-counting convention of the other passes.
pub fn vectorize(block: &mut Block) -> u64 {
    let children = match block.children_mut() {
        Some(c) => c,
        None => return 0,
    };

    let old = std::mem::take(children);
    let mut out: Vec<Block> = Vec::with_capacity(old.len());
    let mut overlay: Option<Overlay> = None;
    let mut opened = 0u64;

    for child in old {
        match child {
            Block::Read(_) | Block::Write(_) | Block::VecAdd(_) => {
                overlay = None;
                out.push(child);
            }
            Block::List(_) | Block::Loop(_) => {
                overlay = None;
                out.push(child);
            }
            Block::CellAdd(d) => {
                let ov = overlay.get_or_insert_with(|| {
                    opened += 1;
                    let prologue_ix = out.len();
                    out.push(Block::PtrAdd(0));
                    let vec_ix = out.len();
                    out.push(Block::VecAdd(Vec::new()));
                    let epilogue_ix = out.len();
                    out.push(Block::PtrAdd(0));
                    Overlay { prologue_ix, vec_ix, epilogue_ix, ptr_off: 0 }
                });
                cell_add(&mut out, ov, d);
            }
            Block::PtrAdd(d) => {
                if let Some(ov) = overlay.as_mut() {
                    ov.ptr_off += d;
                    out[ov.epilogue_ix] = Block::PtrAdd(ov.ptr_off);
                } else {
                    out.push(Block::PtrAdd(d));
                }
            }
            // CellSet/LinVecAdd never appear before Vectorize runs in the
            // canonical pipeline order, but close any open overlay and pass
            // them through unchanged rather than silently absorbing them.
            other => {
                overlay = None;
                out.push(other);
            }
        }
    }

    // Recurse into the (unvectorized) container children in parallel, now
    // that this level's own run-folding is done.
    let recursed: u64 = out
        .par_iter_mut()
        .filter(|b| b.is_container())
        .map(vectorize)
        .sum();

    *block.children_mut().unwrap() = out;
    opened + recursed
}

fn cell_add(out: &mut [Block], ov: &mut Overlay, delta: i64) {
    let vec = match &mut out[ov.vec_ix] {
        Block::VecAdd(v) => v,
        _ => unreachable!("vec_ix always points at the overlay's VecAdd"),
    };

    if ov.ptr_off < 0 {
        // Extend negatively: shift existing bytes right and move the
        // prologue's delta down so the vector's base stays at the
        // prologue's post-move position.
        let shift = (-ov.ptr_off) as usize;
        let mut shifted = vec![0u8; shift + vec.len()];
        shifted[shift..].copy_from_slice(vec);
        *vec = shifted;

        if let Block::PtrAdd(p) = &mut out[ov.prologue_ix] {
            *p += ov.ptr_off;
        }
        ov.ptr_off = 0;
        if let Block::PtrAdd(e) = &mut out[ov.epilogue_ix] {
            *e = ov.ptr_off;
        }
    } else if ov.ptr_off as usize >= vec.len() {
        vec.resize(ov.ptr_off as usize + 1, 0);
    }

    let vec = match &mut out[ov.vec_ix] {
        Block::VecAdd(v) => v,
        _ => unreachable!(),
    };
    let idx = ov.ptr_off as usize;
    vec[idx] = vec[idx].wrapping_add(delta as u8);
}
