//! Pure integer compute: register-register ALU results and branch conditions.
//!
//! The cast warnings below are intentionally allowed because RISC-V semantics
//! require deliberate signed/unsigned reinterpretation of 32-bit values.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

use super::op::{BranchOp, RegOp};
use super::rv32m;

/// Compute `a op b`.
///
/// Shift amounts use the low 5 bits of `b`; comparisons yield 0 or 1.
/// Immediate forms reuse this with the sign-extended immediate as `b`.
#[inline]
#[must_use]
pub const fn compute_reg(op: RegOp, a: u32, b: u32) -> u32 {
    match op {
        RegOp::Add => a.wrapping_add(b),
        RegOp::Sub => a.wrapping_sub(b),
        RegOp::Sll => a << (b & 0x1F),
        RegOp::Srl => a >> (b & 0x1F),
        RegOp::Sra => ((a as i32) >> (b & 0x1F)) as u32,
        RegOp::Slt => ((a as i32) < (b as i32)) as u32,
        RegOp::Sltu => (a < b) as u32,
        RegOp::Xor => a ^ b,
        RegOp::Or => a | b,
        RegOp::And => a & b,
        RegOp::Mul => rv32m::mul(a, b),
        RegOp::Mulh => rv32m::mulh(a, b),
        RegOp::Mulhsu => rv32m::mulhsu(a, b),
        RegOp::Mulhu => rv32m::mulhu(a, b),
        RegOp::Div => rv32m::div(a, b),
        RegOp::Divu => rv32m::divu(a, b),
        RegOp::Rem => rv32m::rem(a, b),
        RegOp::Remu => rv32m::remu(a, b),
    }
}

/// Whether the branch is taken.
#[inline]
#[must_use]
pub const fn compute_branch(op: BranchOp, a: u32, b: u32) -> bool {
    match op {
        BranchOp::Beq => a == b,
        BranchOp::Bne => a != b,
        BranchOp::Blt => (a as i32) < (b as i32),
        BranchOp::Bge => (a as i32) >= (b as i32),
        BranchOp::Bltu => a < b,
        BranchOp::Bgeu => a >= b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sub_wrap() {
        assert_eq!(compute_reg(RegOp::Add, 100, 42), 142);
        assert_eq!(compute_reg(RegOp::Add, u32::MAX, 1), 0);
        assert_eq!(compute_reg(RegOp::Sub, 100, 42), 58);
        assert_eq!(compute_reg(RegOp::Sub, 0, 1), u32::MAX);
    }

    #[test]
    fn test_shifts() {
        // Sign-extended
        assert_eq!(compute_reg(RegOp::Sra, 0x8000_0000, 4), 0xF800_0000);
        // Zero-extended
        assert_eq!(compute_reg(RegOp::Srl, 0x8000_0000, 4), 0x0800_0000);
        // Only the low 5 bits of the amount count
        assert_eq!(compute_reg(RegOp::Sll, 1, 33), 2);
        assert_eq!(compute_reg(RegOp::Sll, 1, 0x403), 8);
    }

    #[test]
    fn test_compares() {
        let minus_one = (-1i32) as u32;
        assert_eq!(compute_reg(RegOp::Slt, minus_one, 1), 1);
        assert_eq!(compute_reg(RegOp::Sltu, minus_one, 1), 0);
        assert_eq!(compute_reg(RegOp::Slt, 5, 5), 0);
    }

    #[test]
    fn test_logic() {
        assert_eq!(compute_reg(RegOp::And, 0b1100, 0b1010), 0b1000);
        assert_eq!(compute_reg(RegOp::Or, 0b1100, 0b1010), 0b1110);
        assert_eq!(compute_reg(RegOp::Xor, 0b1100, 0b1010), 0b0110);
    }

    #[test]
    fn test_muldiv_delegates() {
        assert_eq!(compute_reg(RegOp::Mul, 7, 6), 42);
        assert_eq!(compute_reg(RegOp::Div, 42, 0), u32::MAX);
        assert_eq!(compute_reg(RegOp::Remu, 42, 0), 42);
    }

    #[test]
    fn test_branches() {
        let minus_one = (-1i32) as u32;
        assert!(compute_branch(BranchOp::Beq, 42, 42));
        assert!(!compute_branch(BranchOp::Bne, 42, 42));
        assert!(compute_branch(BranchOp::Blt, minus_one, 0));
        assert!(!compute_branch(BranchOp::Bltu, minus_one, 0));
        assert!(compute_branch(BranchOp::Bge, 0, minus_one));
        assert!(compute_branch(BranchOp::Bgeu, minus_one, 0));
        assert!(compute_branch(BranchOp::Bge, 3, 3));
    }
}
