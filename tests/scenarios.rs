//! End-to-end scenarios: every source runs through the
//! reference interpreter both unoptimized and with the scenario's relevant
//! optimization flags, and the two output streams must agree.
//!
//! A tree that survived the "lvec" optimization may contain a `LinVecAdd`,
//! which the reference interpreter deliberately refuses to execute (§4.8/
//! §7: `InterpError::UnknownCommand`). Those scenarios are instead checked
//! by emitting the optimized tree, compiling it with the host `rustc`, and
//! comparing the compiled program's output against the same expectation.

use std::io::Write as _;
use std::process::{Command, Stdio};

use bf_core::emit::EmitOptions;
use bf_core::hostc;
use bf_core::interp::Interpreter;
use bf_core::io::{SliceIn, VecOut};
use bf_core::ir::build;
use bf_core::lex::lex;
use bf_core::passes::{run as run_passes, PipelineOptions};

fn interpret(src: &str, input: &[u8], opts: PipelineOptions) -> Vec<u8> {
    let instrs = lex(src).unwrap();
    let mut tree = build(&instrs).unwrap();
    run_passes(&mut tree, opts);

    let mut interp = Interpreter::new(256);
    let mut inp = SliceIn::new(input);
    let mut out = VecOut::default();
    interp.run(&tree, &mut inp, &mut out).unwrap();
    out.0
}

/// Builds `src` under `opts`, emits it, compiles it with `rustc`, runs the
/// resulting binary with `input` piped to its stdin, and returns its stdout.
/// Used for trees that may contain a `LinVecAdd`, which only the emitted
/// program (not the reference interpreter) can execute.
fn run_compiled(src: &str, input: &[u8], opts: PipelineOptions) -> Vec<u8> {
    let instrs = lex(src).unwrap();
    let mut tree = build(&instrs).unwrap();
    run_passes(&mut tree, opts);

    let dir = tempfile::tempdir().unwrap();
    let outfile = dir.path().join("scenario");
    hostc::compile(&tree, &outfile, EmitOptions::new(256, false), false).unwrap();

    let mut child = Command::new(&outfile)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawning the compiled scenario binary");
    child.stdin.take().unwrap().write_all(input).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "compiled scenario binary exited with {}", output.status);
    output.stdout
}

fn assert_equivalent(src: &str, input: &[u8], expected: &[u8], optimized: PipelineOptions) {
    assert_eq!(interpret(src, input, PipelineOptions::default()), expected);
    assert_eq!(interpret(src, input, optimized), expected);
}

/// Same contract as [`assert_equivalent`], but for an optimized tree that
/// may contain a `LinVecAdd`: the optimized side is checked via the
/// compiled emitted program instead of the reference interpreter.
fn assert_equivalent_via_emitter(src: &str, input: &[u8], expected: &[u8], optimized: PipelineOptions) {
    assert_eq!(interpret(src, input, PipelineOptions::default()), expected);
    assert_eq!(run_compiled(src, input, optimized), expected);
}

#[test]
fn scenario_1_empty_program() {
    assert_equivalent("", b"", b"", PipelineOptions::baseline());
}

#[test]
fn scenario_2_nested_multiply_produces_lowercase_d() {
    let src = "+++++ +++++ [> +++++ +++++ < -] > .\n";
    let opts = PipelineOptions {
        compress: true,
        prune: true,
        vectorize: true,
        lvec: true,
        ..Default::default()
    };
    assert_equivalent_via_emitter(src, b"", b"d", opts);
}

#[test]
fn scenario_2_lvec_collapses_loop_to_lin_vec_add() {
    let mut tree = build(&lex("+++++ +++++ [> +++++ +++++ < -] > .\n").unwrap()).unwrap();
    run_passes(
        &mut tree,
        PipelineOptions { compress: true, prune: true, vectorize: true, lvec: true, ..Default::default() },
    );
    let has_lin_vec_add = tree
        .children()
        .unwrap()
        .iter()
        .any(|c| matches!(c, bf_core::ir::Block::LinVecAdd { .. }));
    assert!(has_lin_vec_add, "expected a LinVecAdd node in {:?}", tree);
}

#[test]
fn scenario_3_echo_four_bytes_sequentially() {
    assert_equivalent(",.,.,.,.", b"abcd", b"abcd", PipelineOptions::baseline());
}

#[test]
fn scenario_4_echo_via_offset_walk() {
    assert_equivalent(",>,>,>,<<<[.>]", b"abcd", b"abcd", PipelineOptions::baseline());
}

#[test]
fn scenario_5_zero_clear_produces_nul() {
    let opts = PipelineOptions { compress: true, prune: true, zero: true, ..Default::default() };
    assert_equivalent("+++[-].", b"", &[0u8], opts);
}

#[test]
fn scenario_5_zero_opt_collapses_loop_to_cell_set() {
    let mut tree = build(&lex("+++[-].").unwrap()).unwrap();
    run_passes(
        &mut tree,
        PipelineOptions { compress: true, prune: true, zero: true, ..Default::default() },
    );
    assert_eq!(
        tree,
        bf_core::ir::Block::List(vec![
            bf_core::ir::Block::CellAdd(3),
            bf_core::ir::Block::CellSet(0),
            bf_core::ir::Block::Write(1),
        ])
    );
}

#[test]
fn scenario_6_multiply_two_by_three_produces_six() {
    let opts = PipelineOptions {
        compress: true,
        prune: true,
        vectorize: true,
        lvec: true,
        ..Default::default()
    };
    assert_equivalent_via_emitter("++[>+++<-]>.", b"", &[6u8], opts);
}

#[test]
fn scenario_6_shifted_form_multiplies_by_the_correct_guard_cell() {
    // `[-<+>]`: the guard at offset 0 decrements to zero while offset -1
    // accumulates the guard's initial value. This is the §4.6(b) shifted
    // form (PtrAdd(o) + VecAdd(v) + PtrAdd(-o) with o < 0), which the
    // maintainer flagged as reading the wrong control cell when o != 0.
    let opts = PipelineOptions {
        compress: true,
        prune: true,
        vectorize: true,
        lvec: true,
        ..Default::default()
    };
    assert_equivalent_via_emitter("+++[-<+>]<.", b"", &[3u8], opts);
}
