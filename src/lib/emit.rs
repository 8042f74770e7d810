//! Renders an IR tree as a standalone Rust source file: the host compiler
//! driver in `hostc` hands the result straight to `rustc`.
//!
//! The emitted program is deliberately self-contained -- no dependency on
//! this crate -- so it compiles with nothing but the host's `rustc`.

use std::fmt::Write as _;

use crate::ir::Block;

/// Knobs that mirror the CLI's persistent flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmitOptions {
    pub initial_data_size: usize,
    pub profile: bool,
}

impl EmitOptions {
    pub fn new(initial_data_size: usize, profile: bool) -> Self {
        Self { initial_data_size, profile }
    }
}

const DEFAULT_DATA_SIZE: usize = 30_000;

pub fn emit(block: &Block, opts: EmitOptions) -> String {
    let data_size = if opts.initial_data_size == 0 { DEFAULT_DATA_SIZE } else { opts.initial_data_size };

    let mut body = String::new();
    emit_block(block, &mut body, 1);

    let mut out = String::new();
    out.push_str("// generated by bfopt; do not edit by hand\n\n");
    out.push_str("use std::io::{Read, Write};\n");
    if opts.profile {
        out.push_str("use std::time::Instant;\n");
    }
    out.push('\n');

    if opts.profile {
        out.push_str("struct Profile {\n    datap_max: usize,\n    expansions: u64,\n    start: Instant,\n}\n\n");
        out.push_str("impl Profile {\n");
        out.push_str("    fn new() -> Self {\n        Self { datap_max: 0, expansions: 0, start: Instant::now() }\n    }\n\n");
        out.push_str("    fn update_datap_max(&mut self, dp: usize) {\n        if dp > self.datap_max {\n            self.datap_max = dp;\n        }\n    }\n\n");
        out.push_str("    fn report(&self, data: &[u8]) {\n");
        out.push_str("        eprintln!(\"Runtime:              {:?}\", self.start.elapsed());\n");
        out.push_str("        eprintln!(\"Data Ptr Max:         {}\", self.datap_max);\n");
        out.push_str("        eprintln!(\"Data Expansion Count: {}\", self.expansions);\n");
        out.push_str("        eprintln!(\"Data Length:          {}\", data.len());\n");
        out.push_str("    }\n}\n\n");
    }

    out.push_str("struct Tape {\n    data: Vec<u8>,\n    datap: usize,\n");
    if opts.profile {
        out.push_str("    prof: Profile,\n");
    }
    out.push_str("}\n\n");

    out.push_str("impl Tape {\n");
    let _ = writeln!(out, "    fn new() -> Self {{");
    let _ = writeln!(out, "        Tape {{ data: vec![0u8; {}], datap: 0{} }}", data_size, if opts.profile { ", prof: Profile::new()" } else { "" });
    out.push_str("    }\n\n");

    out.push_str("    fn writeb(&mut self, repeat: u32) {\n");
    out.push_str("        let stdout = std::io::stdout();\n");
    out.push_str("        let mut lock = stdout.lock();\n");
    out.push_str("        let byte = self.data[self.datap];\n");
    out.push_str("        for _ in 0..repeat {\n            lock.write_all(&[byte]).expect(\"write to stdout\");\n        }\n");
    out.push_str("    }\n\n");

    out.push_str("    fn readb(&mut self) {\n");
    out.push_str("        let mut buf = [0u8; 1];\n");
    out.push_str("        let n = std::io::stdin().read(&mut buf).expect(\"read from stdin\");\n");
    out.push_str("        self.data[self.datap] = if n == 0 { 0 } else { buf[0] };\n");
    out.push_str("    }\n\n");

    out.push_str("    fn datapadd(&mut self, delta: i64) {\n");
    out.push_str("        let next = self.datap as i64 + delta;\n");
    out.push_str("        if next < 0 {\n            panic!(\"data pointer is out of bounds\");\n        }\n");
    out.push_str("        self.datap = next as usize;\n");
    out.push_str("        while self.datap >= self.data.len() {\n");
    out.push_str("            let new_len = self.data.len() * 2;\n            self.data.resize(new_len, 0);\n");
    if opts.profile {
        out.push_str("            self.prof.expansions += 1;\n");
    }
    out.push_str("        }\n");
    if opts.profile {
        out.push_str("        self.prof.update_datap_max(self.datap);\n");
    }
    out.push_str("    }\n\n");

    out.push_str("    fn dataadd(&mut self, delta: u8) {\n        self.data[self.datap] = self.data[self.datap].wrapping_add(delta);\n    }\n\n");
    out.push_str("    fn dataset(&mut self, value: u8) {\n        self.data[self.datap] = value;\n    }\n\n");

    out.push_str("    fn dataaddvector(&mut self, vec: &[u8]) {\n");
    out.push_str("        while self.datap + vec.len() > self.data.len() {\n");
    out.push_str("            let new_len = self.data.len() * 2;\n            self.data.resize(new_len, 0);\n");
    if opts.profile {
        out.push_str("            self.prof.expansions += 1;\n");
    }
    out.push_str("        }\n");
    out.push_str("        for (i, b) in vec.iter().enumerate() {\n");
    out.push_str("            self.data[self.datap + i] = self.data[self.datap + i].wrapping_add(*b);\n        }\n");
    if opts.profile {
        out.push_str("        self.prof.update_datap_max(self.datap + vec.len() - 1);\n");
    }
    out.push_str("    }\n\n");

    out.push_str("    fn data_lin_vec_add(&mut self, offset: i64, vec: &[u8]) {\n");
    out.push_str("        let control = self.data[self.datap];\n");
    out.push_str("        for (i, b) in vec.iter().enumerate() {\n");
    out.push_str("            let idx = (self.datap as i64 + offset + i as i64) as usize;\n");
    out.push_str("            while idx >= self.data.len() {\n");
    out.push_str("                let new_len = self.data.len() * 2;\n                self.data.resize(new_len, 0);\n            }\n");
    out.push_str("            self.data[idx] = self.data[idx].wrapping_add(b.wrapping_mul(control));\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n\n");

    out.push_str("fn main() {\n    let mut t = Tape::new();\n");
    out.push_str(&body);
    if opts.profile {
        out.push_str("    t.prof.report(&t.data);\n");
    }
    out.push_str("}\n");

    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("    ");
    }
}

fn emit_block(block: &Block, out: &mut String, depth: usize) {
    match block {
        Block::List(children) => {
            for c in children {
                emit_block(c, out, depth);
            }
        }
        Block::Loop(children) => {
            indent(out, depth);
            out.push_str("while t.data[t.datap] != 0 {\n");
            for c in children {
                emit_block(c, out, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        Block::PtrAdd(d) => {
            indent(out, depth);
            let _ = writeln!(out, "t.datapadd({});", d);
        }
        Block::CellAdd(d) => {
            indent(out, depth);
            let byte = (*d).rem_euclid(256) as u8;
            let _ = writeln!(out, "t.dataadd({});", byte);
        }
        Block::CellSet(v) => {
            indent(out, depth);
            let _ = writeln!(out, "t.dataset({});", v);
        }
        Block::Read(n) => {
            for _ in 0..*n {
                indent(out, depth);
                out.push_str("t.readb();\n");
            }
        }
        Block::Write(n) => {
            indent(out, depth);
            let _ = writeln!(out, "t.writeb({});", n);
        }
        Block::VecAdd(v) => {
            indent(out, depth);
            let _ = write!(out, "t.dataaddvector(&[");
            for (i, b) in v.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}", b);
            }
            out.push_str("]);\n");
        }
        Block::LinVecAdd { offset, vec } => {
            indent(out, depth);
            let _ = write!(out, "t.data_lin_vec_add({}, &[", offset);
            for (i, b) in vec.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}", b);
            }
            out.push_str("]);\n");
        }
    }
}
