use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of 32-bit lanes in a vector register.
pub const VECTOR_WIDTH: usize = 16;

pub type Vector = [u32; VECTOR_WIDTH];

pub fn splat(val: u32) -> Vector {
    [val; VECTOR_WIDTH]
}

/// Apply `f` lane by lane: `out[i] = f(a[i], b[i])`.
pub fn lanewise(a: &Vector, b: &Vector, f: impl Fn(u32, u32) -> u32) -> Vector {
    std::array::from_fn(|i| f(a[i], b[i]))
}

/// Per-lane write enable. Bit `i` set keeps lane `i`, clear forces it to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mask(pub u16);

impl Mask {
    pub const ALL: Mask = Mask(0xFFFF);
    pub const NONE: Mask = Mask(0x0000);

    /// Lanes past the vector width are never active.
    pub fn is_active(self, lane: usize) -> bool {
        self.0.view_bits::<Lsb0>().get(lane).is_some_and(|bit| *bit)
    }

    pub fn apply(self, value: &Vector) -> Vector {
        let mut out = *value;
        let bits = self.0.view_bits::<Lsb0>();
        for (lane, active) in out.iter_mut().zip(bits.iter().by_vals()) {
            if !active {
                *lane = 0;
            }
        }
        out
    }
}
