//! Per-instruction metadata: mnemonic, help text, and identifying fields.

use std::fmt;

use super::op::{Format, Op};

/// Immutable description of one instruction.
///
/// The selector fields (`opcode`, `funct3`, `funct7`, `funct12`) identify the
/// instruction inside an encoded word. `None` means the field does not take
/// part in identifying this instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Assembly mnemonic, unique within a registry.
    pub mnemonic: &'static str,
    /// Operand syntax, without the mnemonic.
    pub usage: &'static str,
    /// What the instruction does.
    pub description: &'static str,
    /// 7-bit major opcode.
    pub opcode: u8,
    /// 3-bit function field, bits 14:12.
    pub funct3: Option<u8>,
    /// 7-bit function field, bits 31:25.
    pub funct7: Option<u8>,
    /// 12-bit function field, bits 31:20 (system instructions only).
    pub funct12: Option<u16>,
    /// The operation this instruction performs.
    pub op: Op,
}

/// The selector fields extracted from a word (or asked for by a caller).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EncodingKey {
    pub opcode: u8,
    pub funct3: Option<u8>,
    pub funct7: Option<u8>,
    pub funct12: Option<u16>,
}

impl EncodingKey {
    /// Key with only an opcode.
    #[must_use]
    pub const fn opcode(opcode: u8) -> Self {
        Self {
            opcode,
            funct3: None,
            funct7: None,
            funct12: None,
        }
    }

    /// Extract every selector field `format` defines from `word`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_word(word: u32, format: Format) -> Self {
        Self {
            opcode: (word & 0x7F) as u8,
            funct3: if format.has_funct3() {
                Some(((word >> 12) & 0x7) as u8)
            } else {
                None
            },
            funct7: if format.has_funct7() {
                Some((word >> 25) as u8)
            } else {
                None
            },
            funct12: if format.has_funct12() {
                Some((word >> 20) as u16)
            } else {
                None
            },
        }
    }
}

impl Descriptor {
    /// Describe an instruction identified by `opcode` alone.
    #[must_use]
    pub const fn new(
        op: Op,
        mnemonic: &'static str,
        usage: &'static str,
        description: &'static str,
        opcode: u8,
    ) -> Self {
        Self {
            mnemonic,
            usage,
            description,
            opcode,
            funct3: None,
            funct7: None,
            funct12: None,
            op,
        }
    }

    /// Also identify the instruction by funct3.
    #[must_use]
    pub const fn funct3(self, funct3: u8) -> Self {
        Self {
            funct3: Some(funct3),
            ..self
        }
    }

    /// Also identify the instruction by funct7.
    #[must_use]
    pub const fn funct7(self, funct7: u8) -> Self {
        Self {
            funct7: Some(funct7),
            ..self
        }
    }

    /// Also identify the instruction by funct12.
    #[must_use]
    pub const fn funct12(self, funct12: u16) -> Self {
        Self {
            funct12: Some(funct12),
            ..self
        }
    }

    /// The encoding format of this instruction.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.op.format()
    }

    /// The selector fields as a lookup key.
    #[must_use]
    pub const fn key(&self) -> EncodingKey {
        EncodingKey {
            opcode: self.opcode,
            funct3: self.funct3,
            funct7: self.funct7,
            funct12: self.funct12,
        }
    }

    /// The selector fields placed in their word positions.
    #[must_use]
    pub const fn selector_bits(&self) -> u32 {
        let mut bits = self.opcode as u32;
        if let Some(funct3) = self.funct3 {
            bits |= (funct3 as u32) << 12;
        }
        if let Some(funct7) = self.funct7 {
            bits |= (funct7 as u32) << 25;
        }
        if let Some(funct12) = self.funct12 {
            bits |= (funct12 as u32) << 20;
        }
        bits
    }

    /// Whether every selector this instruction uses agrees with `key`.
    #[must_use]
    pub fn matches(&self, key: &EncodingKey) -> bool {
        self.opcode == key.opcode
            && field_matches(self.funct3, key.funct3)
            && field_matches(self.funct7, key.funct7)
            && field_matches(self.funct12, key.funct12)
    }

    /// How many optional selectors this instruction uses; higher is narrower.
    #[must_use]
    pub fn specificity(&self) -> usize {
        usize::from(self.funct3.is_some())
            + usize::from(self.funct7.is_some())
            + usize::from(self.funct12.is_some())
    }
}

fn field_matches<T: PartialEq>(required: Option<T>, actual: Option<T>) -> bool {
    match required {
        None => true,
        Some(required) => actual == Some(required),
    }
}

/// Listing form: `mnemonic usage` on the first line, the description on the
/// second.
impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.usage.is_empty() {
            write!(f, "{}\n{}", self.mnemonic, self.description)
        } else {
            write!(f, "{} {}\n{}", self.mnemonic, self.usage, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::op::{ImmOp, RegOp};

    const SRAI: Descriptor = Descriptor::new(
        Op::Imm(ImmOp::Srai),
        "srai",
        "rd, rs1, shamt",
        "set rd = rs1 >> shamt (arithmetic)",
        0b001_0011,
    )
    .funct3(0b101)
    .funct7(0b010_0000);

    #[test]
    fn test_display() {
        assert_eq!(
            SRAI.to_string(),
            "srai rd, rs1, shamt\nset rd = rs1 >> shamt (arithmetic)"
        );
    }

    #[test]
    fn test_selector_bits() {
        assert_eq!(SRAI.selector_bits(), 0x4000_5013);
    }

    #[test]
    fn test_matches_word() {
        // srai x1, x1, 3
        let key = EncodingKey::from_word(0x4030_D093, Format::I);
        assert!(SRAI.matches(&key));
        // srli x1, x1, 3
        let key = EncodingKey::from_word(0x0030_D093, Format::I);
        assert!(!SRAI.matches(&key));
    }

    #[test]
    fn test_opcode_only_key_does_not_match_narrow_descriptor() {
        let add = Descriptor::new(Op::Reg(RegOp::Add), "add", "", "", 0b011_0011)
            .funct3(0)
            .funct7(0);
        assert!(!add.matches(&EncodingKey::opcode(0b011_0011)));
        assert_eq!(add.specificity(), 2);
    }
}
