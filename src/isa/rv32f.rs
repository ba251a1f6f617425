//! Single-precision fused multiply-add.
//!
//! All four forms round once, through [`f32::mul_add`], always to nearest
//! even. The static rounding mode of an instruction is not honoured; decoding
//! only rejects the reserved modes. Every NaN result is the canonical NaN.

use super::op::FusedOp;

/// Bit pattern of the canonical quiet NaN.
pub const CANONICAL_NAN: u32 = 0x7FC0_0000;

/// Compute `op` on `a * b` and `c`.
///
/// - `fmadd.s`: `(a * b) + c`
/// - `fmsub.s`: `(a * b) - c`
/// - `fnmsub.s`: `-(a * b) + c`
/// - `fnmadd.s`: `-(a * b) - c`
#[inline]
#[must_use]
pub fn compute_fused(op: FusedOp, a: f32, b: f32, c: f32) -> f32 {
    let result = match op {
        FusedOp::FmaddS => a.mul_add(b, c),
        FusedOp::FmsubS => a.mul_add(b, -c),
        FusedOp::FnmsubS => (-a).mul_add(b, c),
        FusedOp::FnmaddS => (-a).mul_add(b, -c),
    };
    if result.is_nan() {
        f32::from_bits(CANONICAL_NAN)
    } else {
        result
    }
}

/// Bit-level variant used by the register file, which stores raw bits.
#[inline]
#[must_use]
pub fn compute_fused_bits(op: FusedOp, a: u32, b: u32, c: u32) -> u32 {
    compute_fused(op, f32::from_bits(a), f32::from_bits(b), f32::from_bits(c)).to_bits()
}
