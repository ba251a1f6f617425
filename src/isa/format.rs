//! Per-format operand decoders and encoders.
//!
//! Decoders only reshape bits: they never fail and have no side effects.
//! Choosing the right format for a word is the registry's job.
//!
//! The cast warnings below are intentionally allowed because RISC-V semantics
//! require deliberate signed/unsigned reinterpretation of 32-bit values.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]

use thiserror::Error;

use super::op::Format;

/// Decoded operands, one variant per format.
///
/// # Field Conventions
/// - `rd`, `rs1`, `rs2`, `rs3`: register indices (0-31)
/// - `imm`: sign-extended immediate; for U-type it is already shifted into
///   bits 31:12, for B/J-type it is a byte offset (always even)
#[allow(missing_docs)] // Fields are self-documenting per RISC-V spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operands {
    R { rd: u8, rs1: u8, rs2: u8 },
    I { rd: u8, rs1: u8, imm: i32 },
    S { rs1: u8, rs2: u8, imm: i32 },
    B { rs1: u8, rs2: u8, imm: i32 },
    U { rd: u8, imm: i32 },
    J { rd: u8, imm: i32 },
    R4 { rd: u8, rs1: u8, rs2: u8, rs3: u8 },
}

/// Operands that cannot be represented in their format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// No instruction with this mnemonic is registered.
    #[error("unknown instruction '{0}'")]
    UnknownMnemonic(String),
    /// The operands belong to a different format than the instruction.
    #[error("'{mnemonic}' takes {expected:?}-type operands, got {found:?}-type")]
    FormatMismatch {
        /// Instruction being encoded.
        mnemonic: &'static str,
        /// Format of the instruction.
        expected: Format,
        /// Format of the supplied operands.
        found: Format,
    },
    /// A register index is not in 0-31.
    #[error("register index {0} out of range")]
    RegisterOutOfRange(u8),
    /// The immediate does not fit in the format's immediate field.
    #[error("immediate {imm} does not fit in {format:?}-type")]
    ImmediateOutOfRange {
        /// The rejected immediate.
        imm: i32,
        /// Format whose field it should fit in.
        format: Format,
    },
}

impl Operands {
    /// The format these operands belong to.
    #[must_use]
    pub const fn format(&self) -> Format {
        match self {
            Operands::R { .. } => Format::R,
            Operands::I { .. } => Format::I,
            Operands::S { .. } => Format::S,
            Operands::B { .. } => Format::B,
            Operands::U { .. } => Format::U,
            Operands::J { .. } => Format::J,
            Operands::R4 { .. } => Format::R4,
        }
    }

    /// Check every register index and immediate fits its field.
    ///
    /// # Errors
    ///
    /// Returns the first register or immediate that does not fit.
    pub fn validate(&self) -> Result<(), EncodeError> {
        // Unused slots stay 0, which is always in range.
        let regs = match *self {
            Operands::R { rd, rs1, rs2 } => [rd, rs1, rs2, 0],
            Operands::I { rd, rs1, .. } => [rd, rs1, 0, 0],
            Operands::S { rs1, rs2, .. } | Operands::B { rs1, rs2, .. } => [rs1, rs2, 0, 0],
            Operands::U { rd, .. } | Operands::J { rd, .. } => [rd, 0, 0, 0],
            Operands::R4 { rd, rs1, rs2, rs3 } => [rd, rs1, rs2, rs3],
        };
        if let Some(&index) = regs.iter().find(|&&r| r > 31) {
            return Err(EncodeError::RegisterOutOfRange(index));
        }

        let imm_fits = match *self {
            Operands::R { .. } | Operands::R4 { .. } => true,
            Operands::I { imm, .. } | Operands::S { imm, .. } => (-2048..=2047).contains(&imm),
            Operands::B { imm, .. } => (-4096..=4094).contains(&imm) && imm % 2 == 0,
            Operands::U { imm, .. } => imm & 0xFFF == 0,
            Operands::J { imm, .. } => (-1_048_576..=1_048_574).contains(&imm) && imm % 2 == 0,
        };
        if let (false, Some(imm)) = (imm_fits, self.imm()) {
            return Err(EncodeError::ImmediateOutOfRange {
                imm,
                format: self.format(),
            });
        }
        Ok(())
    }

    /// The immediate, if the format has one.
    #[must_use]
    pub const fn imm(&self) -> Option<i32> {
        match *self {
            Operands::I { imm, .. }
            | Operands::S { imm, .. }
            | Operands::B { imm, .. }
            | Operands::U { imm, .. }
            | Operands::J { imm, .. } => Some(imm),
            Operands::R { .. } | Operands::R4 { .. } => None,
        }
    }

    /// Place the operand fields into an otherwise empty word.
    ///
    /// Opcode and function fields are left zero; OR in the selector bits of
    /// the instruction to get a complete encoding.
    #[must_use]
    pub const fn encode(&self) -> u32 {
        match *self {
            Operands::R { rd, rs1, rs2 } => reg(rd, 7) | reg(rs1, 15) | reg(rs2, 20),
            Operands::I { rd, rs1, imm } => reg(rd, 7) | reg(rs1, 15) | encode_i_imm(imm),
            Operands::S { rs1, rs2, imm } => reg(rs1, 15) | reg(rs2, 20) | encode_s_imm(imm),
            Operands::B { rs1, rs2, imm } => reg(rs1, 15) | reg(rs2, 20) | encode_b_imm(imm),
            Operands::U { rd, imm } => reg(rd, 7) | encode_u_imm(imm),
            Operands::J { rd, imm } => reg(rd, 7) | encode_j_imm(imm),
            Operands::R4 { rd, rs1, rs2, rs3 } => {
                reg(rd, 7) | reg(rs1, 15) | reg(rs2, 20) | reg(rs3, 27)
            }
        }
    }
}

/// Decode the operands of `word` under `format`.
#[must_use]
pub const fn decode(format: Format, word: u32) -> Operands {
    match format {
        Format::R => decode_r(word),
        Format::I => decode_i(word),
        Format::S => decode_s(word),
        Format::B => decode_b(word),
        Format::U => decode_u(word),
        Format::J => decode_j(word),
        Format::R4 => decode_r4(word),
    }
}

/// R-type: rd = [11:7], rs1 = [19:15], rs2 = [24:20].
#[must_use]
pub const fn decode_r(word: u32) -> Operands {
    Operands::R {
        rd: rd(word),
        rs1: rs1(word),
        rs2: rs2(word),
    }
}

/// I-type: rd, rs1, and a 12-bit sign-extended immediate.
#[must_use]
pub const fn decode_i(word: u32) -> Operands {
    Operands::I {
        rd: rd(word),
        rs1: rs1(word),
        imm: decode_i_imm(word),
    }
}

/// S-type: rs1, rs2, and a 12-bit sign-extended immediate.
#[must_use]
pub const fn decode_s(word: u32) -> Operands {
    Operands::S {
        rs1: rs1(word),
        rs2: rs2(word),
        imm: decode_s_imm(word),
    }
}

/// B-type: rs1, rs2, and a 13-bit sign-extended even offset.
#[must_use]
pub const fn decode_b(word: u32) -> Operands {
    Operands::B {
        rs1: rs1(word),
        rs2: rs2(word),
        imm: decode_b_imm(word),
    }
}

/// U-type: rd and the upper 20 bits in place.
#[must_use]
pub const fn decode_u(word: u32) -> Operands {
    Operands::U {
        rd: rd(word),
        imm: decode_u_imm(word),
    }
}

/// J-type: rd and a 21-bit sign-extended even offset.
#[must_use]
pub const fn decode_j(word: u32) -> Operands {
    Operands::J {
        rd: rd(word),
        imm: decode_j_imm(word),
    }
}

/// R4-type: four floating-point register indices.
#[must_use]
pub const fn decode_r4(word: u32) -> Operands {
    Operands::R4 {
        rd: rd(word),
        rs1: rs1(word),
        rs2: rs2(word),
        rs3: ((word >> 27) & 0x1F) as u8,
    }
}

// ==================== Field Extraction ====================

const fn rd(word: u32) -> u8 {
    ((word >> 7) & 0x1F) as u8
}

const fn rs1(word: u32) -> u8 {
    ((word >> 15) & 0x1F) as u8
}

const fn rs2(word: u32) -> u8 {
    ((word >> 20) & 0x1F) as u8
}

const fn reg(index: u8, shift: u32) -> u32 {
    ((index as u32) & 0x1F) << shift
}

// ==================== Immediate Decoders ====================

/// imm[11:0] = inst[31:20]
const fn decode_i_imm(word: u32) -> i32 {
    (word as i32) >> 20
}

/// imm[11:5] = inst[31:25], imm[4:0] = inst[11:7]
const fn decode_s_imm(word: u32) -> i32 {
    let imm11_5 = (word >> 25) & 0x7F;
    let imm4_0 = (word >> 7) & 0x1F;
    let imm = (imm11_5 << 5) | imm4_0;
    // Sign-extend from bit 11
    ((imm as i32) << 20) >> 20
}

/// imm[12|10:5|4:1|11] = inst[31|30:25|11:8|7]
const fn decode_b_imm(word: u32) -> i32 {
    let imm12 = (word >> 31) & 0x1;
    let imm11 = (word >> 7) & 0x1;
    let imm10_5 = (word >> 25) & 0x3F;
    let imm4_1 = (word >> 8) & 0xF;
    let imm = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
    // Sign-extend from bit 12
    ((imm as i32) << 19) >> 19
}

/// imm[31:12] = inst[31:12]
const fn decode_u_imm(word: u32) -> i32 {
    (word & 0xFFFF_F000) as i32
}

/// imm[20|10:1|11|19:12] = inst[31|30:21|20|19:12]
const fn decode_j_imm(word: u32) -> i32 {
    let imm20 = (word >> 31) & 0x1;
    let imm19_12 = (word >> 12) & 0xFF;
    let imm11 = (word >> 20) & 0x1;
    let imm10_1 = (word >> 21) & 0x3FF;
    let imm = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
    // Sign-extend from bit 20
    ((imm as i32) << 11) >> 11
}

// ==================== Immediate Encoders ====================

const fn encode_i_imm(imm: i32) -> u32 {
    ((imm as u32) & 0xFFF) << 20
}

const fn encode_s_imm(imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7F) << 25) | ((imm & 0x1F) << 7)
}

const fn encode_b_imm(imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3F) << 25)
        | (((imm >> 1) & 0xF) << 8)
        | (((imm >> 11) & 0x1) << 7)
}

const fn encode_u_imm(imm: i32) -> u32 {
    (imm as u32) & 0xFFFF_F000
}

const fn encode_j_imm(imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3FF) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xFF) << 12)
}
