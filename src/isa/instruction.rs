//! Decoded instruction representation and disassembly.

use std::fmt;

use super::format::Operands;
use super::op::{BranchOp, FusedOp, ImmOp, JumpOp, Op, RegOp, StoreOp, UpperOp};

/// A decoded RISC-V instruction: an operation tag plus its operands.
///
/// One variant per encoding format, so an operation can never be paired with
/// operands of the wrong shape.
///
/// # Field Conventions
/// - `rd`: Destination register (0-31)
/// - `rs1`, `rs2`, `rs3`: Source registers (0-31)
/// - `imm`: Sign-extended immediate value
#[allow(missing_docs)] // Fields are self-documenting per RISC-V spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    R { op: RegOp, rd: u8, rs1: u8, rs2: u8 },
    I { op: ImmOp, rd: u8, rs1: u8, imm: i32 },
    S { op: StoreOp, rs1: u8, rs2: u8, imm: i32 },
    B { op: BranchOp, rs1: u8, rs2: u8, imm: i32 },
    U { op: UpperOp, rd: u8, imm: i32 },
    J { op: JumpOp, rd: u8, imm: i32 },
    R4 { op: FusedOp, rd: u8, rs1: u8, rs2: u8, rs3: u8 },
}

impl Instruction {
    /// Pair an operation with its operands.
    ///
    /// Returns `None` if the operands are not of the operation's format.
    #[must_use]
    pub const fn from_parts(op: Op, operands: Operands) -> Option<Self> {
        Some(match (op, operands) {
            (Op::Reg(op), Operands::R { rd, rs1, rs2 }) => Instruction::R { op, rd, rs1, rs2 },
            (Op::Imm(op), Operands::I { rd, rs1, imm }) => Instruction::I { op, rd, rs1, imm },
            (Op::Store(op), Operands::S { rs1, rs2, imm }) => {
                Instruction::S { op, rs1, rs2, imm }
            }
            (Op::Branch(op), Operands::B { rs1, rs2, imm }) => {
                Instruction::B { op, rs1, rs2, imm }
            }
            (Op::Upper(op), Operands::U { rd, imm }) => Instruction::U { op, rd, imm },
            (Op::Jump(op), Operands::J { rd, imm }) => Instruction::J { op, rd, imm },
            (Op::Fused(op), Operands::R4 { rd, rs1, rs2, rs3 }) => {
                Instruction::R4 {
                    op,
                    rd,
                    rs1,
                    rs2,
                    rs3,
                }
            }
            _ => return None,
        })
    }

    /// The operation tag.
    #[must_use]
    pub const fn op(&self) -> Op {
        match *self {
            Instruction::R { op, .. } => Op::Reg(op),
            Instruction::I { op, .. } => Op::Imm(op),
            Instruction::S { op, .. } => Op::Store(op),
            Instruction::B { op, .. } => Op::Branch(op),
            Instruction::U { op, .. } => Op::Upper(op),
            Instruction::J { op, .. } => Op::Jump(op),
            Instruction::R4 { op, .. } => Op::Fused(op),
        }
    }

    /// The operands, detached from the operation.
    #[must_use]
    pub const fn operands(&self) -> Operands {
        match *self {
            Instruction::R { rd, rs1, rs2, .. } => Operands::R { rd, rs1, rs2 },
            Instruction::I { rd, rs1, imm, .. } => Operands::I { rd, rs1, imm },
            Instruction::S { rs1, rs2, imm, .. } => Operands::S { rs1, rs2, imm },
            Instruction::B { rs1, rs2, imm, .. } => Operands::B { rs1, rs2, imm },
            Instruction::U { rd, imm, .. } => Operands::U { rd, imm },
            Instruction::J { rd, imm, .. } => Operands::J { rd, imm },
            Instruction::R4 {
                rd, rs1, rs2, rs3, ..
            } => Operands::R4 { rd, rs1, rs2, rs3 },
        }
    }
}

/// Assembly-syntax rendering of an instruction, e.g. `addi x5, x0, 10`.
///
/// Created by [`Registry::disassemble`](super::Registry::disassemble), which
/// supplies the mnemonic.
#[derive(Debug, Clone, Copy)]
pub struct Disassembly<'a> {
    pub(super) mnemonic: &'a str,
    pub(super) inst: Instruction,
}

impl fmt::Display for Disassembly<'_> {
    #[allow(clippy::cast_sign_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic;
        match self.inst {
            Instruction::R { rd, rs1, rs2, .. } => write!(f, "{m} x{rd}, x{rs1}, x{rs2}"),
            Instruction::I { op, rd, rs1, imm } => match op {
                ImmOp::Ecall | ImmOp::Ebreak | ImmOp::Fence | ImmOp::FenceI => write!(f, "{m}"),
                ImmOp::Flw => write!(f, "{m} f{rd}, {imm}(x{rs1})"),
                _ if op.is_load() => write!(f, "{m} x{rd}, {imm}(x{rs1})"),
                ImmOp::Jalr => write!(f, "{m} x{rd}, {imm}(x{rs1})"),
                _ if op.is_shift() => write!(f, "{m} x{rd}, x{rs1}, {}", imm & 0x1F),
                _ => write!(f, "{m} x{rd}, x{rs1}, {imm}"),
            },
            Instruction::S {
                op: StoreOp::Fsw,
                rs1,
                rs2,
                imm,
            } => write!(f, "{m} f{rs2}, {imm}(x{rs1})"),
            Instruction::S { rs1, rs2, imm, .. } => write!(f, "{m} x{rs2}, {imm}(x{rs1})"),
            Instruction::B { rs1, rs2, imm, .. } => write!(f, "{m} x{rs1}, x{rs2}, {imm}"),
            Instruction::U { rd, imm, .. } => {
                write!(f, "{m} x{rd}, {:#x}", (imm as u32) >> 12)
            }
            Instruction::J { rd, imm, .. } => write!(f, "{m} x{rd}, {imm}"),
            Instruction::R4 {
                rd, rs1, rs2, rs3, ..
            } => write!(f, "{m} f{rd}, f{rs1}, f{rs2}, f{rs3}"),
        }
    }
}
