use std::collections::HashSet;

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use arith_oracle::catalog::{self, Form, Kind, Opcode, CATALOG, FORMS};
use arith_oracle::generator::{
    resolve, Expected, FixedVectors, Operand, Slot, Value,
};
use arith_oracle::lanes::{Mask, Vector};
use arith_oracle::{GenConfig, GenError, Generator};

fn counting_fixed() -> FixedVectors {
    FixedVectors {
        operand1: std::array::from_fn(|i| i as u32 + 1),
        operand2: std::array::from_fn(|i| 0x1000_0000 * (i as u32 % 16)),
        operand3: std::array::from_fn(|i| i as u32),
    }
}

#[test]
fn add_vector_scalar_masked_end_to_end() {
    let fixed = counting_fixed();
    let form = Form::new(Kind::Vector, Kind::Scalar, true);
    let op1 = Operand::vector(&fixed, Slot::Operand1);
    let got = resolve(Opcode::AddI.desc(), &form, &op1, &Operand::Scalar(5), Some(Mask(0xAAAA)))
        .unwrap();

    let want: Vector = std::array::from_fn(|i| if i % 2 == 0 { 0 } else { fixed.operand1[i] + 5 });
    assert_eq!(got, Value::Vector(want));
}

#[test]
fn scalar_form_is_inline() {
    let form = Form::new(Kind::Scalar, Kind::Scalar, false);
    let got = resolve(
        Opcode::Ashr.desc(),
        &form,
        &Operand::Scalar(0x8000_0000),
        &Operand::Scalar(4),
        None,
    )
    .unwrap();
    assert_eq!(got, Value::Scalar(0xF800_0000));
}

#[test]
fn unsupported_combinations_are_rejected() {
    let fixed = counting_fixed();
    let imm = Form::new(Kind::Scalar, Kind::Immediate, false);
    let err = resolve(Opcode::Clz.desc(), &imm, &Operand::Scalar(0), &Operand::Scalar(1), None)
        .unwrap_err();
    assert_eq!(err, GenError::UnsupportedForm { mnemonic: "clz", form: imm });

    // scalar destination with a vector source
    let sv = Form::new(Kind::Scalar, Kind::Vector, false);
    let op2 = Operand::vector(&fixed, Slot::Operand2);
    assert!(resolve(Opcode::Or.desc(), &sv, &Operand::Scalar(1), &op2, None).is_err());

    // mask presence must agree with the form
    let vs = Form::new(Kind::Vector, Kind::Scalar, false);
    let op1 = Operand::vector(&fixed, Slot::Operand1);
    assert!(resolve(Opcode::Or.desc(), &vs, &op1, &Operand::Scalar(1), Some(Mask::ALL)).is_err());

    let mut gen =
        Generator::with_fixed(GenConfig::default(), ChaCha8Rng::seed_from_u64(1), fixed).unwrap();
    let mut results = Vec::new();
    assert!(gen.build_case(Opcode::Move.desc(), &imm, &mut results).is_err());
    assert!(results.is_empty());
}

#[test]
fn config_rejects_wide_shift_bounds() {
    let cfg = GenConfig { shift_max: 32, ..GenConfig::default() };
    let err = Generator::from_seed(cfg, 0).err().unwrap();
    assert_eq!(err, GenError::InvalidRange { what: "shift_max", max: 32, limit: 31 });

    let cfg = GenConfig { shift_vector_max: 40, ..GenConfig::default() };
    let rng = ChaCha8Rng::seed_from_u64(0);
    assert!(Generator::with_fixed(cfg, rng, counting_fixed()).is_err());
}

#[test]
fn config_rejects_wide_immediates() {
    let cfg = GenConfig { imm_max: u32::MAX, ..GenConfig::default() };
    let err = Generator::from_seed(cfg, 1).err().unwrap();
    assert_eq!(
        err,
        GenError::InvalidRange { what: "imm_max", max: u32::MAX, limit: 0xFFF }
    );

    let cfg = GenConfig { imm_max: 0xFFF, ..GenConfig::default() };
    assert!(Generator::from_seed(cfg, 1).is_ok());
}

#[test]
fn standalone_cases_do_not_leak_into_matrix() {
    let mut gen = Generator::from_seed(GenConfig::default(), 8).unwrap();
    let vs = Form::new(Kind::Vector, Kind::Scalar, false);
    let mut scratch = Vec::new();
    let case = gen.build_case(Opcode::Or.desc(), &vs, &mut scratch).unwrap();
    assert!(matches!(case.expected, Expected::Block { index: 0, .. }));
    assert_eq!(scratch.len(), 1);

    let matrix = gen.generate().unwrap();
    assert_eq!(matrix.results.len(), 11 * 6 + 3 * 4);
    let first = matrix.cases.iter().find_map(|c| match c.expected {
        Expected::Block { index, .. } => Some(index),
        Expected::Scalar(_) => None,
    });
    assert_eq!(first, Some(0));

    // a second run numbers from zero again
    let again = gen.generate().unwrap();
    assert_eq!(again.results.len(), matrix.results.len());
}

#[test]
fn enumeration_is_complete() {
    let matrix = Generator::from_seed(GenConfig::default(), 42).unwrap().generate().unwrap();
    assert_eq!(matrix.cases.len(), 11 * 8 + 3 * 5);

    for desc in CATALOG {
        let got: Vec<Form> = matrix
            .cases
            .iter()
            .filter(|c| c.op == desc.op)
            .map(|c| c.form)
            .collect();
        let unique: HashSet<Form> = got.iter().copied().collect();
        assert_eq!(unique.len(), got.len(), "duplicate form for {}", desc.mnemonic);

        let want: Vec<Form> = catalog::valid_forms(desc).copied().collect();
        assert_eq!(got, want, "{}", desc.mnemonic);
        let expected_len = if desc.is_unary() { FORMS.len() - 3 } else { FORMS.len() };
        assert_eq!(got.len(), expected_len);
    }

    // catalog order outer
    let order: Vec<Opcode> = matrix.cases.iter().map(|c| c.op).collect();
    let mut dedup = order.clone();
    dedup.dedup();
    assert_eq!(dedup, CATALOG.iter().map(|d| d.op).collect::<Vec<_>>());
}

#[test]
fn result_blocks_are_numbered_in_order() {
    let matrix = Generator::from_seed(GenConfig::default(), 7).unwrap().generate().unwrap();
    let mut next = 0;
    for case in &matrix.cases {
        match &case.expected {
            Expected::Block { index, lanes } => {
                assert!(case.form.yields_vector());
                assert_eq!(*index, next);
                assert_eq!(&matrix.results[*index], lanes);
                next += 1;
            }
            Expected::Scalar(_) => assert!(!case.form.yields_vector()),
        }
    }
    assert_eq!(next, matrix.results.len());
    assert_eq!(next, 11 * 6 + 3 * 4);
}

#[test]
fn operand_ranges_follow_policy() {
    let cfg = GenConfig::default();
    let matrix = Generator::from_seed(cfg, 0xC0FFEE).unwrap().generate().unwrap();
    assert!(matrix.fixed.operand3.iter().all(|&v| v <= cfg.shift_vector_max));

    for case in &matrix.cases {
        let desc = case.desc();
        match (&case.op2, case.form.op2) {
            (Operand::Scalar(v), _) if desc.is_shift() => assert!(*v <= cfg.shift_max),
            (Operand::Scalar(v), Kind::Immediate) => assert!(*v <= cfg.imm_max),
            (Operand::Vector { slot, .. }, Kind::Vector) => {
                let want = if desc.is_shift() { Slot::Operand3 } else { Slot::Operand2 };
                assert_eq!(*slot, want, "{}", desc.mnemonic);
            }
            (Operand::Scalar(_), Kind::Scalar) => {}
            other => panic!("unexpected operand 2 {other:?} for {}", desc.mnemonic),
        }
        if case.form.yields_vector() {
            assert_eq!(case.op1, Operand::vector(&matrix.fixed, Slot::Operand1));
        }
        assert_eq!(case.mask.is_some(), case.form.masked);
    }
}

#[test]
fn expected_values_agree_with_model() {
    let matrix = Generator::from_seed(GenConfig::default(), 99).unwrap().generate().unwrap();
    for case in &matrix.cases {
        let desc = case.desc();
        match &case.expected {
            Expected::Scalar(v) => {
                let (Operand::Scalar(a), Operand::Scalar(b)) = (&case.op1, &case.op2) else {
                    panic!("scalar result with vector operands");
                };
                assert_eq!(*v, desc.eval(*a, *b));
            }
            Expected::Block { lanes, .. } => {
                let a = case.op1.lanes();
                let b = case.op2.lanes();
                let mask = case.mask.unwrap_or(Mask::ALL);
                for i in 0..16 {
                    let want = if mask.is_active(i) { desc.eval(a[i], b[i]) } else { 0 };
                    assert_eq!(lanes[i], want, "{} {} lane {i}", desc.mnemonic, case.form);
                }
            }
        }
    }
}

#[test]
fn same_seed_same_matrix() {
    let a = Generator::from_seed(GenConfig::default(), 1234).unwrap().generate().unwrap();
    let b = Generator::from_seed(GenConfig::default(), 1234).unwrap().generate().unwrap();
    assert_eq!(a, b);
    let c = Generator::from_seed(GenConfig::default(), 1235).unwrap().generate().unwrap();
    assert_ne!(a.fixed, c.fixed);
}

#[test]
fn config_round_trips_through_json() {
    let cfg: GenConfig = serde_json::from_str(r#"{ "imm_max": 31 }"#).unwrap();
    assert_eq!(cfg, GenConfig { imm_max: 31, ..GenConfig::default() });
}
