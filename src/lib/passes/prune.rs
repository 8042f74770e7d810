//! Prune: remove no-op nodes, depth-first.

use rayon::prelude::*;

use crate::ir::Block;

/// A block is prunable when it is an empty `List`, or a `PtrAdd`/`CellAdd`/
/// `Write`/`VecAdd` whose parameter is zero (an empty `VecAdd` arises from a
/// Vectorize overlay that never collected a delta, prunable alongside the
/// zero-delta scalar ops). `Loop` is never prunable, even with an empty
/// body: the guard still reads the current cell and may block forever,
/// which is the user's intent.
fn is_prunable(b: &Block) -> bool {
    match b {
        Block::List(c) => c.is_empty(),
        Block::PtrAdd(d) => *d == 0,
        Block::CellAdd(d) => *d == 0,
        Block::Write(n) => *n == 0,
        Block::VecAdd(v) => v.is_empty(),
        _ => false,
    }
}

/// Rebuilds each container's child list, recursing into every child first
/// in parallel, then dropping prunable children. Returns the number of
/// removals.
pub fn prune(block: &mut Block) -> u64 {
    let children = match block.children_mut() {
        Some(c) => c,
        None => return 0,
    };

    let recursion_removed: u64 = children.par_iter_mut().map(prune).sum();

    let before = children.len();
    children.retain(|c| !is_prunable(c));
    let removed_here = (before - children.len()) as u64;

    recursion_removed + removed_here
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_zero_ptr_add() {
        let mut b = Block::List(vec![Block::PtrAdd(0)]);
        let removed = prune(&mut b);
        assert_eq!(removed, 1);
        assert_eq!(b, Block::List(vec![]));
    }

    #[test]
    fn drops_zero_cell_add() {
        let mut b = Block::List(vec![Block::CellAdd(0)]);
        prune(&mut b);
        assert_eq!(b, Block::List(vec![]));
    }

    #[test]
    fn drops_zero_write() {
        let mut b = Block::List(vec![Block::Write(0)]);
        prune(&mut b);
        assert_eq!(b, Block::List(vec![]));
    }

    #[test]
    fn drops_empty_vec_add() {
        let mut b = Block::List(vec![Block::VecAdd(vec![])]);
        prune(&mut b);
        assert_eq!(b, Block::List(vec![]));
    }

    #[test]
    fn drops_empty_nested_list() {
        let mut b = Block::List(vec![Block::List(vec![])]);
        prune(&mut b);
        assert_eq!(b, Block::List(vec![]));
    }

    #[test]
    fn keeps_loop_with_empty_body() {
        let mut b = Block::List(vec![Block::Loop(vec![])]);
        prune(&mut b);
        assert_eq!(b, Block::List(vec![Block::Loop(vec![])]));
    }

    #[test]
    fn prune_is_idempotent() {
        let mut b = Block::List(vec![
            Block::PtrAdd(0),
            Block::CellAdd(1),
            Block::List(vec![Block::Write(0)]),
        ]);
        prune(&mut b);
        let once = b.clone();
        prune(&mut b);
        assert_eq!(b, once);
    }

    #[test]
    fn prunes_depth_first_so_parents_see_emptied_children() {
        let mut b = Block::List(vec![Block::List(vec![Block::PtrAdd(0)])]);
        prune(&mut b);
        assert_eq!(b, Block::List(vec![]));
    }
}
