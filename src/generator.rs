use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{self, Form, Kind, OpDesc, Opcode, CATALOG};
use crate::lanes::{self, Mask, Vector};

/// Operand range policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Largest scalar shift amount drawn for the shift family.
    pub shift_max: u32,
    /// Largest immediate drawn for non-shift opcodes (7-bit field).
    pub imm_max: u32,
    /// Largest lane value in the shared shift-amount vector.
    pub shift_vector_max: u32,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            shift_max: 15,
            imm_max: 0x7F,
            shift_vector_max: 16,
        }
    }
}

impl GenConfig {
    pub fn validate(&self) -> Result<(), GenError> {
        for (what, max) in [
            ("shift_max", self.shift_max),
            ("shift_vector_max", self.shift_vector_max),
        ] {
            if max >= 32 {
                return Err(GenError::InvalidRange { what, max, limit: 31 });
            }
        }
        if self.imm_max >= 1 << 12 {
            return Err(GenError::InvalidRange {
                what: "imm_max",
                max: self.imm_max,
                limit: (1 << 12) - 1,
            });
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("no reference mapping for `{mnemonic}` in form {form}")]
    UnsupportedForm { mnemonic: &'static str, form: Form },
    #[error("{what} = {max} exceeds {limit}")]
    InvalidRange {
        what: &'static str,
        max: u32,
        limit: u32,
    },
}

/// Which of the shared input vectors an operand refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Operand1,
    Operand2,
    Operand3,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Operand1, Slot::Operand2, Slot::Operand3];

    pub fn label(self) -> &'static str {
        match self {
            Slot::Operand1 => "voperand1",
            Slot::Operand2 => "voperand2",
            Slot::Operand3 => "voperand3",
        }
    }
}

/// Input vectors drawn once per run and shared by every vector case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedVectors {
    pub operand1: Vector,
    pub operand2: Vector,
    /// Shift amounts, `0..=shift_vector_max`.
    pub operand3: Vector,
}

impl FixedVectors {
    pub fn draw<R: Rng>(rng: &mut R, cfg: &GenConfig) -> Self {
        let operand1 = std::array::from_fn(|_| rng.random());
        let operand2 = std::array::from_fn(|_| rng.random());
        let operand3 = std::array::from_fn(|_| rng.random_range(0..=cfg.shift_vector_max));
        Self { operand1, operand2, operand3 }
    }

    pub fn get(&self, slot: Slot) -> &Vector {
        match slot {
            Slot::Operand1 => &self.operand1,
            Slot::Operand2 => &self.operand2,
            Slot::Operand3 => &self.operand3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Operand {
    Scalar(u32),
    Vector { slot: Slot, lanes: Vector },
}

impl Operand {
    pub fn vector(fixed: &FixedVectors, slot: Slot) -> Self {
        Operand::Vector { slot, lanes: *fixed.get(slot) }
    }

    /// Lane view; a scalar is broadcast to every lane.
    pub fn lanes(&self) -> Vector {
        match self {
            Operand::Scalar(v) => lanes::splat(*v),
            Operand::Vector { lanes, .. } => *lanes,
        }
    }
}

/// Unnamed model output, before a result block is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Value {
    Scalar(u32),
    Vector(Vector),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Expected {
    Scalar(u32),
    /// Stored as the `index`th named result block.
    Block { index: usize, lanes: Vector },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub op: Opcode,
    pub form: Form,
    pub op1: Operand,
    pub op2: Operand,
    pub mask: Option<Mask>,
    pub expected: Expected,
}

impl TestCase {
    pub fn desc(&self) -> &'static OpDesc {
        self.op.desc()
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestMatrix {
    pub fixed: FixedVectors,
    pub cases: Vec<TestCase>,
    /// Named result blocks in index order; `Expected::Block::index` points here.
    pub results: Vec<Vector>,
}

/// Compute the expected value of one instruction.
///
/// The model runs on unmasked operands; the mask, if any, is applied to its
/// output afterwards. Operand shapes must agree with `form`.
pub fn resolve(
    desc: &OpDesc,
    form: &Form,
    op1: &Operand,
    op2: &Operand,
    mask: Option<Mask>,
) -> Result<Value, GenError> {
    let unsupported = || GenError::UnsupportedForm { mnemonic: desc.mnemonic, form: *form };

    if desc.is_unary() && form.op2 == Kind::Immediate {
        return Err(unsupported());
    }
    if form.masked != mask.is_some() {
        return Err(unsupported());
    }
    let op2_is_vector = matches!(op2, Operand::Vector { .. });
    if op2_is_vector != (form.op2 == Kind::Vector) {
        return Err(unsupported());
    }

    match (form.op1, op1) {
        (Kind::Scalar, Operand::Scalar(a)) if !form.masked && !op2_is_vector => {
            let Operand::Scalar(b) = op2 else { return Err(unsupported()) };
            Ok(Value::Scalar(desc.eval(*a, *b)))
        }
        (Kind::Vector, Operand::Vector { lanes: a, .. }) => {
            let raw = desc.eval_lanes(a, &op2.lanes());
            Ok(Value::Vector(match mask {
                Some(m) => m.apply(&raw),
                None => raw,
            }))
        }
        _ => Err(unsupported()),
    }
}

/// Walks the opcode × form matrix, drawing operands from an explicit RNG.
pub struct Generator<R: Rng = ChaCha8Rng> {
    cfg: GenConfig,
    rng: R,
    fixed: FixedVectors,
}

impl Generator<ChaCha8Rng> {
    pub fn from_seed(cfg: GenConfig, seed: u64) -> Result<Self, GenError> {
        Self::new(cfg, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Generator<R> {
    /// Draws the shared input vectors up front.
    pub fn new(cfg: GenConfig, mut rng: R) -> Result<Self, GenError> {
        cfg.validate()?;
        let fixed = FixedVectors::draw(&mut rng, &cfg);
        Self::with_fixed(cfg, rng, fixed)
    }

    /// Use caller-provided input vectors instead of drawing them.
    pub fn with_fixed(cfg: GenConfig, rng: R, fixed: FixedVectors) -> Result<Self, GenError> {
        cfg.validate()?;
        Ok(Self { cfg, rng, fixed })
    }

    pub fn config(&self) -> &GenConfig {
        &self.cfg
    }

    pub fn fixed(&self) -> &FixedVectors {
        &self.fixed
    }

    /// Upper bound of operand 2 for this opcode and form.
    pub fn op2_max(&self, desc: &OpDesc, form: &Form) -> u32 {
        if desc.is_shift() {
            self.cfg.shift_max
        } else if form.op2 == Kind::Immediate {
            self.cfg.imm_max
        } else {
            u32::MAX
        }
    }

    /// Draw operands for one (opcode, form) pair and resolve its expected value.
    /// Vector results are appended to `results`; the case records its index there.
    pub fn build_case(
        &mut self,
        desc: &OpDesc,
        form: &Form,
        results: &mut Vec<Vector>,
    ) -> Result<TestCase, GenError> {
        let op2_max = self.op2_max(desc, form);
        let mask = form.masked.then(|| Mask(self.rng.random()));

        let op1 = match form.op1 {
            Kind::Vector => Operand::vector(&self.fixed, Slot::Operand1),
            _ => Operand::Scalar(self.rng.random()),
        };
        let op2 = match form.op2 {
            Kind::Vector if op2_max < u32::MAX => Operand::vector(&self.fixed, Slot::Operand3),
            Kind::Vector => Operand::vector(&self.fixed, Slot::Operand2),
            _ => Operand::Scalar(self.rng.random_range(0..=op2_max)),
        };

        let expected = match resolve(desc, form, &op1, &op2, mask)? {
            Value::Scalar(v) => Expected::Scalar(v),
            Value::Vector(lanes) => {
                let index = results.len();
                results.push(lanes);
                Expected::Block { index, lanes }
            }
        };
        debug!(mnemonic = desc.mnemonic, form = %form, ?expected, "case");

        Ok(TestCase { op: desc.op, form: *form, op1, op2, mask, expected })
    }

    /// Full matrix: catalog order outer, form order inner, one case per
    /// valid pair. Stops at the first error.
    pub fn generate(&mut self) -> Result<TestMatrix, GenError> {
        let mut cases = Vec::new();
        let mut results = Vec::new();
        for desc in CATALOG {
            for form in catalog::valid_forms(desc) {
                cases.push(self.build_case(desc, form, &mut results)?);
            }
        }
        info!(cases = cases.len(), result_blocks = results.len(), "generated test matrix");
        Ok(TestMatrix { fixed: self.fixed.clone(), cases, results })
    }
}
