use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use bf_core::emit::{emit, EmitOptions};
use bf_core::hostc;
use bf_core::interp::Interpreter;
use bf_core::io::{StdIn, StdOut};
use bf_core::passes::{run as run_passes, PipelineOptions};
use bf_core::{build, lex};

const DEFAULT_TAPE_SIZE: usize = 30_000;
const RECOGNIZED_OPTIMIZE_NAMES: [&str; 2] = ["lvec", "zero"];

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Lex(#[from] bf_core::lex::LexError),
    #[error(transparent)]
    Build(#[from] bf_core::ir::BuildError),
    #[error("unrecognized optimization name {name:?} (expected one of {RECOGNIZED_OPTIMIZE_NAMES:?})")]
    UnknownOptimization { name: String },
    #[error(transparent)]
    Interp(#[from] bf_core::interp::InterpError<std::io::Error, std::io::Error>),
    #[error(transparent)]
    HostCompile(#[from] hostc::HostCompileError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::HostCompile(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bfopt", about = "An optimizing compiler and interpreter for the tape language")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose progress and pass counts.
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emitted program includes runtime profiling instrumentation.
    #[arg(short, long, global = true)]
    profile: bool,

    /// Run the Compress pass (on by default).
    #[arg(short = 'C', long, global = true, default_value_t = true, action = ArgAction::Set)]
    compress: bool,

    /// Run the Prune pass (on by default).
    #[arg(short = 'P', long, global = true, default_value_t = true, action = ArgAction::Set)]
    prune: bool,

    /// Run Vectorize (+ Balance unless --full-vectorize).
    #[arg(short = 'V', long, global = true)]
    vectorize: bool,

    /// Implies --vectorize, skips Balance.
    #[arg(short = 'F', long, global = true)]
    full_vectorize: bool,

    /// Enable a named optimization; may be repeated. Recognized: lvec, zero.
    #[arg(short = 'O', long = "optimize", global = true, action = ArgAction::Append)]
    optimize: Vec<String>,

    /// Initial tape length for `run` and for the emitted program.
    #[arg(long, global = true, default_value_t = DEFAULT_TAPE_SIZE)]
    tape_size: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, interpret with stdin/stdout.
    Run { source: PathBuf },
    /// Parse, run pipeline, dump the IR tree.
    DumpIl { source: PathBuf, out: Option<PathBuf> },
    /// Parse, run pipeline, emit host-language source.
    GenGo { source: PathBuf, out: Option<PathBuf> },
    /// As gengo, then invoke the host compiler to produce a binary.
    Compile { source: PathBuf, out: Option<PathBuf> },
}

fn pipeline_options(cli: &Cli) -> Result<PipelineOptions, CliError> {
    let mut lvec = false;
    let mut zero = false;
    for name in &cli.optimize {
        match name.as_str() {
            "lvec" => lvec = true,
            "zero" => zero = true,
            other => return Err(CliError::UnknownOptimization { name: other.to_string() }),
        }
    }

    Ok(PipelineOptions {
        compress: cli.compress,
        prune: cli.prune,
        vectorize: cli.vectorize || cli.full_vectorize,
        full_vectorize: cli.full_vectorize,
        lvec,
        zero,
    })
}

fn stem_named(source: &std::path::Path, out: &Option<PathBuf>) -> PathBuf {
    out.clone().unwrap_or_else(|| {
        let stem = source.file_stem().map(|s| s.to_owned()).unwrap_or_default();
        PathBuf::from(stem)
    })
}

fn run_cli(cli: &Cli) -> Result<(), CliError> {
    let opts = pipeline_options(cli)?;

    match &cli.command {
        Command::Run { source } => {
            let src = fs::read_to_string(source)?;
            let instrs = lex::lex(&src)?;
            let mut tree = build(&instrs)?;
            run_passes(&mut tree, opts);

            let mut input = StdIn::new();
            let mut output = StdOut::new();
            let mut interp = Interpreter::new(cli.tape_size);
            interp.run(&tree, &mut input, &mut output)?;
            Ok(())
        }
        Command::DumpIl { source, out } => {
            let src = fs::read_to_string(source)?;
            let instrs = lex::lex(&src)?;
            let mut tree = build(&instrs)?;
            run_passes(&mut tree, opts);

            let dump = tree.dump_to_string();
            match out {
                Some(path) => fs::write(path, dump)?,
                None => print!("{dump}"),
            }
            Ok(())
        }
        Command::GenGo { source, out } => {
            let src = fs::read_to_string(source)?;
            let instrs = lex::lex(&src)?;
            let mut tree = build(&instrs)?;
            run_passes(&mut tree, opts);

            let generated = emit(&tree, EmitOptions::new(cli.tape_size, cli.profile));
            let out_path = match out {
                Some(path) => path.clone(),
                None => stem_named(source, &None).with_extension("rs"),
            };
            fs::write(&out_path, generated)?;
            Ok(())
        }
        Command::Compile { source, out } => {
            let src = fs::read_to_string(source)?;
            let instrs = lex::lex(&src)?;
            let mut tree = build(&instrs)?;
            run_passes(&mut tree, opts);

            let out_path = stem_named(source, out);
            let outcome = hostc::compile(
                &tree,
                &out_path,
                EmitOptions::new(cli.tape_size, cli.profile),
                cli.debug,
            )?;
            if let Some(kept) = outcome.kept_tempdir {
                log::debug!("kept temp directory at {}", kept.display());
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
