//! Bit-exact reference semantics for the integer ALU.
//!
//! Every operation takes two 32-bit register values and returns the 32-bit
//! architectural result. Unary operations receive operand 1 too and ignore it,
//! so the whole catalog shares one signature.

/// Shared signature of every reference function: `(operand1, operand2) -> result`.
pub type RefFn = fn(u32, u32) -> u32;

/// Sign-extend a 32-bit register value to 64 bits.
#[inline]
pub fn sext64(val: u32) -> i64 {
    val as i32 as i64
}

pub fn or(a: u32, b: u32) -> u32 {
    a | b
}

pub fn and(a: u32, b: u32) -> u32 {
    a & b
}

pub fn xor(a: u32, b: u32) -> u32 {
    a ^ b
}

pub fn add(a: u32, b: u32) -> u32 {
    a.wrapping_add(b)
}

pub fn sub(a: u32, b: u32) -> u32 {
    a.wrapping_sub(b)
}

/// Low half of the product.
pub fn mull(a: u32, b: u32) -> u32 {
    a.wrapping_mul(b)
}

/// High half of the unsigned 64-bit product.
pub fn mulh_u(a: u32, b: u32) -> u32 {
    ((a as u64 * b as u64) >> 32) as u32
}

/// High half of the signed 64-bit product. Two sign-extended 32-bit values
/// always fit the product in an i64.
pub fn mulh_i(a: u32, b: u32) -> u32 {
    ((sext64(a) * sext64(b)) >> 32) as u32
}

/// Arithmetic shift right. Amounts of 32 and above leave only the sign fill.
pub fn ashr32(val: u32, amt: u32) -> u32 {
    (sext64(val) >> amt.min(63)) as u32
}

/// Logical shift right of `|val|`.
///
/// The magnitude is taken on the register value as the unsigned quantity it
/// is, widened to i64, so it never flips the sign bit: `shr(0x8000_0000, 4)`
/// is `0x0800_0000`.
pub fn shr(val: u32, amt: u32) -> u32 {
    let magnitude = i64::from(val).unsigned_abs();
    magnitude.checked_shr(amt).unwrap_or(0) as u32
}

pub fn shl(val: u32, amt: u32) -> u32 {
    val.checked_shl(amt).unwrap_or(0)
}

/// Leading zeros of operand 2; 32 when it is zero.
pub fn clz(_a: u32, b: u32) -> u32 {
    b.leading_zeros()
}

/// Trailing zeros of operand 2; 32 when it is zero.
pub fn ctz(_a: u32, b: u32) -> u32 {
    b.trailing_zeros()
}

pub fn mov(_a: u32, b: u32) -> u32 {
    b
}
