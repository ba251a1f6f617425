//! RV32M extension: multiply and divide.
//!
//! The cast warnings below are intentionally allowed because RISC-V semantics
//! require deliberate signed/unsigned reinterpretation of 32-bit values.
//!
//! Division never traps. Per RISC-V:
//! - division by zero: quotient = all 1s, remainder = dividend
//! - overflow (`MIN / -1`): quotient = MIN, remainder = 0

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]

/// Lower 32 bits of the product.
#[inline]
#[must_use]
pub const fn mul(a: u32, b: u32) -> u32 {
    a.wrapping_mul(b)
}

/// Upper 32 bits of signed x signed.
#[inline]
#[must_use]
pub const fn mulh(a: u32, b: u32) -> u32 {
    let a = a as i32 as i64;
    let b = b as i32 as i64;
    ((a * b) >> 32) as u32
}

/// Upper 32 bits of signed x unsigned.
#[inline]
#[must_use]
pub const fn mulhsu(a: u32, b: u32) -> u32 {
    let a = a as i32 as i64;
    let b = b as u64 as i64;
    ((a * b) >> 32) as u32
}

/// Upper 32 bits of unsigned x unsigned.
#[inline]
#[must_use]
pub const fn mulhu(a: u32, b: u32) -> u32 {
    let a = a as u64;
    let b = b as u64;
    ((a * b) >> 32) as u32
}

/// Signed division.
#[inline]
#[must_use]
pub const fn div(a: u32, b: u32) -> u32 {
    let dividend = a as i32;
    let divisor = b as i32;
    if divisor == 0 {
        u32::MAX
    } else if dividend == i32::MIN && divisor == -1 {
        dividend as u32
    } else {
        (dividend / divisor) as u32
    }
}

/// Unsigned division.
#[inline]
#[must_use]
pub const fn divu(a: u32, b: u32) -> u32 {
    if b == 0 { u32::MAX } else { a / b }
}

/// Signed remainder; the sign follows the dividend.
#[inline]
#[must_use]
pub const fn rem(a: u32, b: u32) -> u32 {
    let dividend = a as i32;
    let divisor = b as i32;
    if divisor == 0 {
        a
    } else if dividend == i32::MIN && divisor == -1 {
        0
    } else {
        (dividend % divisor) as u32
    }
}

/// Unsigned remainder.
#[inline]
#[must_use]
pub const fn remu(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { a % b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul() {
        assert_eq!(mul(7, 6), 42);
        // Lower 32 bits of 0x1_0000_0000
        assert_eq!(mul(0x8000_0000, 2), 0);
    }

    #[test]
    fn test_mulh() {
        assert_eq!(mulh(0x7FFF_FFFF, 2), 0);
        // -1 * -1 = 1, upper bits = 0
        assert_eq!(mulh(u32::MAX, u32::MAX), 0);
        // -2 * 3 = -6, upper bits all ones
        assert_eq!(mulh((-2i32) as u32, 3), u32::MAX);
    }

    #[test]
    fn test_mulhsu() {
        // -1 * 0xFFFFFFFF = -0xFFFFFFFF
        assert_eq!(mulhsu(u32::MAX, u32::MAX), u32::MAX);
        assert_eq!(mulhsu(2, 0x8000_0000), 1);
    }

    #[test]
    fn test_mulhu() {
        // 0xFFFFFFFF * 0xFFFFFFFF = 0xFFFFFFFE_00000001
        assert_eq!(mulhu(u32::MAX, u32::MAX), 0xFFFF_FFFE);
    }

    #[test]
    fn test_div() {
        assert_eq!(div(42, 7), 6);
        assert_eq!(div((-42i32) as u32, 7) as i32, -6);
        // Truncates toward zero
        assert_eq!(div((-7i32) as u32, 2) as i32, -3);
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(div(42, 0), u32::MAX);
        assert_eq!(divu(42, 0), u32::MAX);
        assert_eq!(rem(42, 0), 42);
        assert_eq!(remu(42, 0), 42);
        assert_eq!(rem((-5i32) as u32, 0) as i32, -5);
    }

    #[test]
    fn test_div_overflow() {
        assert_eq!(div(0x8000_0000, (-1i32) as u32), 0x8000_0000);
        assert_eq!(rem(0x8000_0000, (-1i32) as u32), 0);
    }

    #[test]
    fn test_rem_sign() {
        assert_eq!(rem(43, 7), 1);
        assert_eq!(rem((-43i32) as u32, 7) as i32, -1);
        assert_eq!(rem(43, (-7i32) as u32), 1);
    }

    #[test]
    fn test_div_rem_identity() {
        // For any a, b where b != 0: (a / b) * b + (a % b) == a
        let (a, b) = (12345u32, 67u32);
        assert_eq!(divu(a, b).wrapping_mul(b).wrapping_add(remu(a, b)), a);

        let (a, b) = ((-12345i32) as u32, 67u32);
        assert_eq!(div(a, b).wrapping_mul(b).wrapping_add(rem(a, b)), a);
    }
}
