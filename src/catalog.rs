use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::lanes::{self, Vector};
use crate::model::{self, RefFn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    Or,
    And,
    Xor,
    AddI,
    SubI,
    MullI,
    MulhU,
    MulhI,
    Ashr,
    Shr,
    Shl,
    Clz,
    Ctz,
    Move,
}

impl Opcode {
    pub fn desc(self) -> &'static OpDesc {
        // CATALOG is declared in enum order
        &CATALOG[self as usize]
    }
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpFlags: u8 {
const UNARY = 1 << 0; // reads operand 2 only
const SHIFT = 1 << 1; // operand 2 is a shift amount
}
}

#[derive(Debug, Clone, Copy)]
pub struct OpDesc {
    pub op: Opcode,
    pub mnemonic: &'static str,
    pub flags: OpFlags,
    pub func: RefFn,
}

impl OpDesc {
    pub fn is_unary(&self) -> bool {
        self.flags.contains(OpFlags::UNARY)
    }

    pub fn is_shift(&self) -> bool {
        self.flags.contains(OpFlags::SHIFT)
    }

    pub fn eval(&self, a: u32, b: u32) -> u32 {
        (self.func)(a, b)
    }

    pub fn eval_lanes(&self, a: &Vector, b: &Vector) -> Vector {
        lanes::lanewise(a, b, self.func)
    }
}

const fn binary(op: Opcode, mnemonic: &'static str, func: RefFn) -> OpDesc {
    OpDesc { op, mnemonic, flags: OpFlags::empty(), func }
}

const fn shift(op: Opcode, mnemonic: &'static str, func: RefFn) -> OpDesc {
    OpDesc { op, mnemonic, flags: OpFlags::SHIFT, func }
}

const fn unary(op: Opcode, mnemonic: &'static str, func: RefFn) -> OpDesc {
    OpDesc { op, mnemonic, flags: OpFlags::UNARY, func }
}

pub const CATALOG: &[OpDesc] = &[
    binary(Opcode::Or, "or", model::or),
    binary(Opcode::And, "and", model::and),
    binary(Opcode::Xor, "xor", model::xor),
    binary(Opcode::AddI, "add_i", model::add),
    binary(Opcode::SubI, "sub_i", model::sub),
    binary(Opcode::MullI, "mull_i", model::mull),
    binary(Opcode::MulhU, "mulh_u", model::mulh_u),
    binary(Opcode::MulhI, "mulh_i", model::mulh_i),
    shift(Opcode::Ashr, "ashr", model::ashr32),
    shift(Opcode::Shr, "shr", model::shr),
    shift(Opcode::Shl, "shl", model::shl),
    unary(Opcode::Clz, "clz", model::clz),
    unary(Opcode::Ctz, "ctz", model::ctz),
    unary(Opcode::Move, "move", model::mov),
];

pub fn by_mnemonic(mnemonic: &str) -> Option<&'static OpDesc> {
    CATALOG.iter().find(|d| d.mnemonic == mnemonic)
}

/// How an operand is materialized in the emitted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Scalar,
    Vector,
    Immediate,
}

impl Kind {
    pub fn tag(self) -> char {
        match self {
            Kind::Scalar => 's',
            Kind::Vector => 'v',
            Kind::Immediate => 'i',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Form {
    pub op1: Kind,
    pub op2: Kind,
    pub masked: bool,
}

impl Form {
    pub const fn new(op1: Kind, op2: Kind, masked: bool) -> Self {
        Self { op1, op2, masked }
    }

    /// Result is a vector register (operand 1 names the destination shape).
    pub fn yields_vector(&self) -> bool {
        self.op1 == Kind::Vector
    }

    pub fn suffix(&self) -> &'static str {
        if self.masked { "_mask" } else { "" }
    }

    /// Test macro tag: destination kind, operand 1 kind (binary only),
    /// operand 2 kind, then `m` when masked. `vvsm`, `ssi`, `vs`, ...
    pub fn tag(&self, unary: bool) -> String {
        let mut tag = String::with_capacity(4);
        tag.push(self.op1.tag());
        if !unary {
            tag.push(self.op1.tag());
        }
        tag.push(self.op2.tag());
        if self.masked {
            tag.push('m');
        }
        tag
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op1.tag(), self.op2.tag())?;
        if self.masked {
            f.write_str("+mask")?;
        }
        Ok(())
    }
}

pub const FORMS: &[Form] = &[
    Form::new(Kind::Scalar, Kind::Scalar, false),
    Form::new(Kind::Vector, Kind::Scalar, false),
    Form::new(Kind::Vector, Kind::Scalar, true),
    Form::new(Kind::Vector, Kind::Vector, false),
    Form::new(Kind::Vector, Kind::Vector, true),
    Form::new(Kind::Scalar, Kind::Immediate, false),
    Form::new(Kind::Vector, Kind::Immediate, false),
    Form::new(Kind::Vector, Kind::Immediate, true),
];

/// Forms enumerated for `desc`: all of them, minus immediate operand 2 for
/// unary opcodes.
pub fn valid_forms(desc: &OpDesc) -> impl Iterator<Item = &'static Form> + '_ {
    FORMS
        .iter()
        .filter(move |f| !(desc.is_unary() && f.op2 == Kind::Immediate))
}
