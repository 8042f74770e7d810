//! Drives the host `rustc` over emitted source; the Rust analogue of
//! the original's `CompileGo`/`CompileIL`.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;

use crate::emit::{emit, EmitOptions};
use crate::ir::Block;

#[derive(Debug, thiserror::Error)]
pub enum HostCompileError {
    #[error("failed to create temp directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write generated source: {0}")]
    WriteSource(#[source] std::io::Error),
    #[error("failed to invoke rustc: {0}")]
    SpawnRustc(#[source] std::io::Error),
    #[error("rustc exited with status {status}")]
    RustcFailed { status: i32 },
}

/// Result of a successful [`compile`]: the produced binary's path, and the
/// temp directory, which is only retained (and therefore `Some`) when
/// `debug` was requested.
pub struct CompileOutcome {
    pub outfile: PathBuf,
    pub kept_tempdir: Option<PathBuf>,
}

/// Generates Rust source for `block`, writes it to a temp directory, and
/// shells out to `rustc -O` to produce `outfile`. Mirrors the original's
/// `CompileIL`: on success the temp directory is removed unless `debug` is
/// set, in which case it's kept and returned for inspection.
pub fn compile(
    block: &Block,
    outfile: &std::path::Path,
    opts: EmitOptions,
    debug: bool,
) -> Result<CompileOutcome, HostCompileError> {
    let tempdir = tempfile::Builder::new()
        .prefix("bfoptcompile")
        .tempdir()
        .map_err(HostCompileError::TempDir)?;

    let source_path = tempdir.path().join("main.rs");
    let source = emit(block, opts);
    let mut f = std::fs::File::create(&source_path).map_err(HostCompileError::WriteSource)?;
    f.write_all(source.as_bytes()).map_err(HostCompileError::WriteSource)?;
    drop(f);

    let status = Command::new("rustc")
        .arg("-O")
        .arg("-o")
        .arg(outfile)
        .arg(&source_path)
        .status()
        .map_err(HostCompileError::SpawnRustc)?;

    if !status.success() {
        log::error!("rustc failed compiling generated source at {}", source_path.display());
        return Err(HostCompileError::RustcFailed { status: status.code().unwrap_or(-1) });
    }

    let kept_tempdir = if debug {
        Some(tempdir.into_path())
    } else {
        None
    };

    Ok(CompileOutcome { outfile: outfile.to_path_buf(), kept_tempdir })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build;
    use crate::lex::lex;

    #[test]
    fn emits_before_invoking_rustc() {
        // Exercises only the generation half -- invoking a real rustc in a
        // unit test would make this crate's test suite depend on the host
        // toolchain being present, which `emit`'s own tests already avoid.
        let tree = build(&lex("+.").unwrap()).unwrap();
        let src = emit(&tree, EmitOptions::default());
        assert!(src.contains("fn main()"));
    }
}
