//! Operation tags, grouped by encoding format.
//!
//! Every supported instruction has exactly one tag. Tags are grouped into one
//! enum per format so execution can match exhaustively within a family.

/// Instruction encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    /// Register-register: rd, rs1, rs2.
    R,
    /// Register-immediate: rd, rs1, imm[11:0].
    I,
    /// Store: rs1, rs2, imm[11:0] split across two fields.
    S,
    /// Branch: rs1, rs2, imm[12:1].
    B,
    /// Upper immediate: rd, imm[31:12].
    U,
    /// Jump: rd, imm[20:1].
    J,
    /// Four-register floating point: rd, rs1, rs2, rs3.
    R4,
}

impl Format {
    /// Bits of the word that are not operands under this format
    /// (opcode and function fields).
    #[must_use]
    pub const fn selector_mask(self) -> u32 {
        match self {
            Format::R => 0xFE00_707F,
            Format::I | Format::S | Format::B => 0x0000_707F,
            Format::U | Format::J => 0x0000_007F,
            // funct3 holds the rounding mode, bits 26:25 the precision
            Format::R4 => 0x0600_707F,
        }
    }

    /// Whether instructions of this format are told apart by funct3.
    #[must_use]
    pub const fn has_funct3(self) -> bool {
        matches!(self, Format::R | Format::I | Format::S | Format::B)
    }

    /// Whether bits 31:25 can act as a funct7 selector.
    #[must_use]
    pub const fn has_funct7(self) -> bool {
        matches!(self, Format::R | Format::I)
    }

    /// Whether bits 31:20 can act as a funct12 selector.
    #[must_use]
    pub const fn has_funct12(self) -> bool {
        matches!(self, Format::I)
    }
}

/// R-type operations (RV32I register-register plus the M extension).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegOp {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
}

/// I-type operations: immediate ALU, loads, `jalr`, and system.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmOp {
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Flw,
    Jalr,
    Fence,
    FenceI,
    Ecall,
    Ebreak,
}

impl ImmOp {
    /// The register-register operation this immediate form computes, if it
    /// is an ALU operation.
    #[must_use]
    pub const fn alu_equivalent(self) -> Option<RegOp> {
        match self {
            ImmOp::Addi => Some(RegOp::Add),
            ImmOp::Slti => Some(RegOp::Slt),
            ImmOp::Sltiu => Some(RegOp::Sltu),
            ImmOp::Xori => Some(RegOp::Xor),
            ImmOp::Ori => Some(RegOp::Or),
            ImmOp::Andi => Some(RegOp::And),
            ImmOp::Slli => Some(RegOp::Sll),
            ImmOp::Srli => Some(RegOp::Srl),
            ImmOp::Srai => Some(RegOp::Sra),
            ImmOp::Lb
            | ImmOp::Lh
            | ImmOp::Lw
            | ImmOp::Lbu
            | ImmOp::Lhu
            | ImmOp::Flw
            | ImmOp::Jalr
            | ImmOp::Fence
            | ImmOp::FenceI
            | ImmOp::Ecall
            | ImmOp::Ebreak => None,
        }
    }

    /// Shift-by-immediate operations only use the low 5 bits of the immediate.
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, ImmOp::Slli | ImmOp::Srli | ImmOp::Srai)
    }

    /// Loads render as `rd, offset(rs1)`.
    #[must_use]
    pub const fn is_load(self) -> bool {
        matches!(
            self,
            ImmOp::Lb | ImmOp::Lh | ImmOp::Lw | ImmOp::Lbu | ImmOp::Lhu | ImmOp::Flw
        )
    }
}

/// S-type operations.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Sb,
    Sh,
    Sw,
    Fsw,
}

/// B-type operations.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchOp {
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
}

/// U-type operations.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpperOp {
    Lui,
    Auipc,
}

/// J-type operations.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpOp {
    Jal,
}

/// R4-type fused multiply-add operations (single precision).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FusedOp {
    FmaddS,
    FmsubS,
    FnmsubS,
    FnmaddS,
}

/// The operation an instruction performs.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Reg(RegOp),
    Imm(ImmOp),
    Store(StoreOp),
    Branch(BranchOp),
    Upper(UpperOp),
    Jump(JumpOp),
    Fused(FusedOp),
}

impl Op {
    /// The encoding format used by this operation.
    #[must_use]
    pub const fn format(self) -> Format {
        match self {
            Op::Reg(_) => Format::R,
            Op::Imm(_) => Format::I,
            Op::Store(_) => Format::S,
            Op::Branch(_) => Format::B,
            Op::Upper(_) => Format::U,
            Op::Jump(_) => Format::J,
            Op::Fused(_) => Format::R4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_format() {
        assert_eq!(Op::Reg(RegOp::Mulhsu).format(), Format::R);
        assert_eq!(Op::Imm(ImmOp::Ecall).format(), Format::I);
        assert_eq!(Op::Fused(FusedOp::FnmaddS).format(), Format::R4);
    }

    #[test]
    fn test_alu_equivalent() {
        assert_eq!(ImmOp::Sltiu.alu_equivalent(), Some(RegOp::Sltu));
        assert_eq!(ImmOp::Lbu.alu_equivalent(), None);
        assert!(ImmOp::Srai.is_shift());
        assert!(!ImmOp::Addi.is_shift());
    }
}
