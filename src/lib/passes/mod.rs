//! The transformation passes and the orchestrator that sequences them.

pub mod balance;
pub mod compress;
pub mod pattern;
pub mod prune;
pub mod vectorize;

use crate::ir::Block;
use pattern::{LinearVector, Pattern, ZeroClear};

/// Which optimizations the orchestrator should run, mirroring the CLI flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineOptions {
    pub compress: bool,
    pub prune: bool,
    pub vectorize: bool,
    pub full_vectorize: bool,
    pub lvec: bool,
    pub zero: bool,
}

impl PipelineOptions {
    /// The historical default: compress and prune on, nothing else.
    pub fn baseline() -> Self {
        Self { compress: true, prune: true, ..Default::default() }
    }
}

fn compress_prune(block: &mut Block) -> u64 {
    compress::compress(block) + prune::prune(block)
}

/// Runs the canonical pass order against `block` in place, gated by
/// `opts`. Returns the number of "the fixpoint was not reached in the
/// hard-coded number of steps" warnings logged (0 or 1), matching the
/// orchestrator's non-fixpoint design: it hard-codes the
/// minimum pass order that suffices and warns rather than retries.
pub fn run(block: &mut Block, opts: PipelineOptions) {
    if opts.compress {
        compress::compress(block);
    }
    if opts.prune {
        prune::prune(block);
    }

    if opts.vectorize {
        vectorize::vectorize(block);
        if !opts.full_vectorize {
            balance::balance(block);
        }
        prune::prune(block);
        compress::compress(block);
        prune::prune(block);

        let extra = compress_prune(block);
        if extra > 0 {
            log::warn!("additional compress/prune passes were necessary after vectorize");
        }
    }

    if opts.lvec {
        // Idempotent on an already-vectorized tree.
        vectorize::vectorize(block);
        prune::prune(block);
        compress::compress(block);
        prune::prune(block);

        let patterns: [&dyn Pattern; 1] = [&LinearVector];
        pattern::replace_all(block, &patterns);
        compress::compress(block);
        prune::prune(block);

        if !opts.full_vectorize {
            balance::balance(block);
            prune::prune(block);
            compress::compress(block);
            prune::prune(block);
        }
    }

    if opts.zero {
        let patterns: [&dyn Pattern; 1] = [&ZeroClear];
        pattern::replace_all(block, &patterns);
        compress::compress(block);
        prune::prune(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build;
    use crate::lex::lex;

    fn tree(src: &str) -> Block {
        build(&lex(src).unwrap()).unwrap()
    }

    #[test]
    fn zero_loop_collapses_to_cell_set_with_zero_opt() {
        let mut b = tree("+++[-].");
        run(
            &mut b,
            PipelineOptions { compress: true, prune: true, zero: true, ..Default::default() },
        );
        // +++ compresses to CellAdd(3), loop collapses to CellSet(0), then
        // CellSet(0) is immediately followed by Write(1).
        assert_eq!(
            b,
            Block::List(vec![Block::CellAdd(3), Block::CellSet(0), Block::Write(1)])
        );
    }

    #[test]
    fn multiply_loop_collapses_to_lin_vec_add() {
        let mut b = tree("++[>+++<-]>.");
        run(
            &mut b,
            PipelineOptions {
                compress: true,
                prune: true,
                vectorize: true,
                lvec: true,
                ..Default::default()
            },
        );
        let has_lin_vec_add = matches!(
            &b,
            Block::List(children) if children.iter().any(|c| matches!(c, Block::LinVecAdd { .. }))
        );
        assert!(has_lin_vec_add, "expected a LinVecAdd in {:?}", b);
    }
}
