pub mod emit;
pub mod hostc;
pub mod interp;
pub mod io;
pub mod ir;
pub mod lex;
pub mod passes;

pub use ir::{build, BuildError, Block};
pub use lex::{lex, Instr, LexError};
pub use passes::{run as run_passes, PipelineOptions};
