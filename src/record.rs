//! Flat records handed to serializers, and the sink seam they go through.

use std::fmt;
use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::generator::{Expected, FixedVectors, Operand, Slot, TestCase, TestMatrix};
use crate::lanes::Vector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    /// Inline 32-bit value.
    Hex(u32),
    /// Reference to a named 16-lane data block.
    Block(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Hex(v) => write!(f, "{v:#x}"),
            Literal::Block(name) => f.write_str(name),
        }
    }
}

pub fn block_name(index: usize) -> String {
    format!("result{index}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    /// Mnemonic with `_mask` appended for masked forms.
    pub mnemonic: String,
    pub form: String,
    pub result: Literal,
    pub mask: Option<u16>,
    /// Operand 2 only for unary opcodes, otherwise operand 1 then operand 2.
    pub operands: Vec<Literal>,
}

impl TestRecord {
    pub fn from_case(case: &TestCase) -> Self {
        let desc = case.desc();
        let unary = desc.is_unary();

        let literal = |op: &Operand| match op {
            Operand::Scalar(v) => Literal::Hex(*v),
            Operand::Vector { slot, .. } => Literal::Block(slot.label().to_owned()),
        };
        let result = match &case.expected {
            Expected::Scalar(v) => Literal::Hex(*v),
            Expected::Block { index, .. } => Literal::Block(block_name(*index)),
        };
        let operands = if unary {
            vec![literal(&case.op2)]
        } else {
            vec![literal(&case.op1), literal(&case.op2)]
        };

        Self {
            mnemonic: format!("{}{}", desc.mnemonic, case.form.suffix()),
            form: case.form.tag(unary),
            result,
            mask: case.mask.map(|m| m.0),
            operands,
        }
    }
}

/// Consumer of a record stream.
///
/// `finish` receives the shared input vectors and the named result blocks
/// once every record has been delivered.
pub trait RecordSink {
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }
    fn record(&mut self, rec: &TestRecord) -> Result<()>;
    fn finish(&mut self, fixed: &FixedVectors, results: &[Vector]) -> Result<()>;
}

impl RecordSink for Vec<TestRecord> {
    fn record(&mut self, rec: &TestRecord) -> Result<()> {
        self.push(rec.clone());
        Ok(())
    }
    fn finish(&mut self, _fixed: &FixedVectors, _results: &[Vector]) -> Result<()> {
        Ok(())
    }
}

pub fn emit_matrix<S: RecordSink + ?Sized>(matrix: &TestMatrix, sink: &mut S) -> Result<()> {
    sink.begin()?;
    for case in &matrix.cases {
        sink.record(&TestRecord::from_case(case))?;
    }
    sink.finish(&matrix.fixed, &matrix.results)
}

#[derive(Debug, Clone, Serialize)]
struct NamedBlock<'a> {
    name: String,
    lanes: &'a Vector,
}

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    records: &'a [TestRecord],
    blocks: Vec<NamedBlock<'a>>,
}

/// Writes the whole oracle as one pretty-printed JSON document.
pub struct JsonSink<W: Write> {
    out: W,
    records: Vec<TestRecord>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, records: Vec::new() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn record(&mut self, rec: &TestRecord) -> Result<()> {
        self.records.push(rec.clone());
        Ok(())
    }

    fn finish(&mut self, fixed: &FixedVectors, results: &[Vector]) -> Result<()> {
        let mut blocks: Vec<NamedBlock> = Slot::ALL
            .iter()
            .map(|&slot| NamedBlock { name: slot.label().to_owned(), lanes: fixed.get(slot) })
            .collect();
        blocks.extend(
            results
                .iter()
                .enumerate()
                .map(|(i, lanes)| NamedBlock { name: block_name(i), lanes }),
        );
        let doc = JsonDocument { records: &self.records, blocks };
        serde_json::to_writer_pretty(&mut self.out, &doc).context("writing JSON oracle")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
