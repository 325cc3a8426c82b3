use std::io::Write;

use anyhow::{Context, Result};

use crate::generator::{FixedVectors, Slot};
use crate::lanes::Vector;
use crate::record::{block_name, RecordSink, TestRecord};

const INDENT: &str = "        ";

pub fn hexlist(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| format!("{v:#x}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One macro invocation: `test_<form> <mnemonic>, <result>, [<mask>, ]<operands>`.
pub fn fmt_record(rec: &TestRecord) -> String {
    let mut line = format!("{INDENT}test_{} {}, {}, ", rec.form, rec.mnemonic, rec.result);
    if let Some(mask) = rec.mask {
        line.push_str(&format!("{mask:#x}, "));
    }
    let operands: Vec<String> = rec.operands.iter().map(ToString::to_string).collect();
    line.push_str(&operands.join(", "));
    line
}

/// Assembly test program writer.
pub struct AsmSink<W: Write> {
    out: W,
    generator: String,
}

impl<W: Write> AsmSink<W> {
    /// `generator` is named in the do-not-edit banner.
    pub fn new(out: W, generator: impl Into<String>) -> Self {
        Self { out, generator: generator.into() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for AsmSink<W> {
    fn begin(&mut self) -> Result<()> {
        writeln!(self.out, "# This file auto-generated by {}. Do not edit.", self.generator)?;
        writeln!(self.out, "{INDENT}#include \"arithmetic_macros.inc\"")?;
        writeln!(self.out)?;
        writeln!(self.out, "{INDENT}.globl _start")?;
        writeln!(self.out, "_start:").context("writing program header")
    }

    fn record(&mut self, rec: &TestRecord) -> Result<()> {
        writeln!(self.out, "{}", fmt_record(rec))
            .with_context(|| format!("writing {} ({})", rec.mnemonic, rec.form))
    }

    fn finish(&mut self, fixed: &FixedVectors, results: &[Vector]) -> Result<()> {
        writeln!(self.out, "{INDENT}call pass_test")?;
        writeln!(self.out)?;
        writeln!(self.out, "{INDENT}.align 64")?;
        for slot in Slot::ALL {
            writeln!(self.out, "{}: .long {}", slot.label(), hexlist(fixed.get(slot)))?;
        }
        for (i, lanes) in results.iter().enumerate() {
            writeln!(self.out, "{}: .long {}", block_name(i), hexlist(lanes))?;
        }
        self.out.flush().context("flushing assembly output")
    }
}
