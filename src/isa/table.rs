//! The standard instruction table.
//!
//! Every supported instruction is listed here exactly once; the registry is
//! populated by iterating this table at startup.

use super::descriptor::Descriptor;
use super::op::{BranchOp, FusedOp, ImmOp, JumpOp, Op, RegOp, StoreOp, UpperOp};

/// RISC-V major opcodes.
pub mod opcode {
    /// Integer loads.
    pub const LOAD: u8 = 0b000_0011;
    /// Floating-point loads.
    pub const LOAD_FP: u8 = 0b000_0111;
    /// Fences.
    pub const MISC_MEM: u8 = 0b000_1111;
    /// Register-immediate ALU.
    pub const OP_IMM: u8 = 0b001_0011;
    /// Add upper immediate to PC.
    pub const AUIPC: u8 = 0b001_0111;
    /// Integer stores.
    pub const STORE: u8 = 0b010_0011;
    /// Floating-point stores.
    pub const STORE_FP: u8 = 0b010_0111;
    /// Register-register ALU.
    pub const OP: u8 = 0b011_0011;
    /// Load upper immediate.
    pub const LUI: u8 = 0b011_0111;
    /// Fused multiply-add.
    pub const MADD: u8 = 0b100_0011;
    /// Fused multiply-subtract.
    pub const MSUB: u8 = 0b100_0111;
    /// Negated fused multiply-subtract.
    pub const NMSUB: u8 = 0b100_1011;
    /// Negated fused multiply-add.
    pub const NMADD: u8 = 0b100_1111;
    /// Conditional branches.
    pub const BRANCH: u8 = 0b110_0011;
    /// Jump and link register.
    pub const JALR: u8 = 0b110_0111;
    /// Jump and link.
    pub const JAL: u8 = 0b110_1111;
    /// Environment calls and breakpoints.
    pub const SYSTEM: u8 = 0b111_0011;
}

use opcode::{
    AUIPC, BRANCH, JAL, JALR, LOAD, LOAD_FP, LUI, MADD, MISC_MEM, MSUB, NMADD, NMSUB, OP,
    OP_IMM, STORE, STORE_FP, SYSTEM,
};

const BASE: u8 = 0b000_0000;
const ALT: u8 = 0b010_0000;
const MULDIV: u8 = 0b000_0001;

const fn r(op: RegOp, mnemonic: &'static str, description: &'static str) -> Descriptor {
    Descriptor::new(Op::Reg(op), mnemonic, "rd, rs1, rs2", description, OP)
}

const fn i(
    op: ImmOp,
    mnemonic: &'static str,
    usage: &'static str,
    description: &'static str,
    opcode: u8,
) -> Descriptor {
    Descriptor::new(Op::Imm(op), mnemonic, usage, description, opcode)
}

const fn s(
    op: StoreOp,
    mnemonic: &'static str,
    usage: &'static str,
    description: &'static str,
    opcode: u8,
) -> Descriptor {
    Descriptor::new(Op::Store(op), mnemonic, usage, description, opcode)
}

const fn b(op: BranchOp, mnemonic: &'static str, description: &'static str) -> Descriptor {
    Descriptor::new(Op::Branch(op), mnemonic, "rs1, rs2, offset", description, BRANCH)
}

const fn r4(
    op: FusedOp,
    mnemonic: &'static str,
    description: &'static str,
    opcode: u8,
) -> Descriptor {
    Descriptor::new(Op::Fused(op), mnemonic, "frd, frs1, frs2, frs3", description, opcode)
}

/// Every instruction the simulator supports.
#[rustfmt::skip]
pub const STANDARD: &[Descriptor] = &[
    // ==================== R-type ====================
    r(RegOp::Add, "add", "set rd = rs1 + rs2").funct3(0b000).funct7(BASE),
    r(RegOp::Sub, "sub", "set rd = rs1 - rs2").funct3(0b000).funct7(ALT),
    r(RegOp::Sll, "sll", "set rd = rs1 << rs2[4:0]").funct3(0b001).funct7(BASE),
    r(RegOp::Slt, "slt", "set rd = 1 if rs1 < rs2 (signed), else 0").funct3(0b010).funct7(BASE),
    r(RegOp::Sltu, "sltu", "set rd = 1 if rs1 < rs2 (unsigned), else 0").funct3(0b011).funct7(BASE),
    r(RegOp::Xor, "xor", "set rd = rs1 ^ rs2").funct3(0b100).funct7(BASE),
    r(RegOp::Srl, "srl", "set rd = rs1 >>u rs2[4:0]").funct3(0b101).funct7(BASE),
    r(RegOp::Sra, "sra", "set rd = rs1 >>s rs2[4:0]").funct3(0b101).funct7(ALT),
    r(RegOp::Or, "or", "set rd = rs1 | rs2").funct3(0b110).funct7(BASE),
    r(RegOp::And, "and", "set rd = rs1 & rs2").funct3(0b111).funct7(BASE),
    r(RegOp::Mul, "mul", "set rd = (rs1 * rs2)[31:0]").funct3(0b000).funct7(MULDIV),
    r(RegOp::Mulh, "mulh", "set rd = (rs1 s*s rs2)[63:32]").funct3(0b001).funct7(MULDIV),
    r(RegOp::Mulhsu, "mulhsu", "set rd = (rs1 s*u rs2)[63:32]").funct3(0b010).funct7(MULDIV),
    r(RegOp::Mulhu, "mulhu", "set rd = (rs1 u*u rs2)[63:32]").funct3(0b011).funct7(MULDIV),
    r(RegOp::Div, "div", "set rd = rs1 /s rs2").funct3(0b100).funct7(MULDIV),
    r(RegOp::Divu, "divu", "set rd = rs1 /u rs2").funct3(0b101).funct7(MULDIV),
    r(RegOp::Rem, "rem", "set rd = rs1 %s rs2").funct3(0b110).funct7(MULDIV),
    r(RegOp::Remu, "remu", "set rd = rs1 %u rs2").funct3(0b111).funct7(MULDIV),
    // ==================== I-type ====================
    i(ImmOp::Jalr, "jalr", "rd, offset(rs1)", "set pc = (rs1 + sext(offset)) & ~1, rd = pc + 4", JALR).funct3(0b000),
    i(ImmOp::Lb, "lb", "rd, offset(rs1)", "set rd = sext(memory[rs1 + sext(offset)][7:0])", LOAD).funct3(0b000),
    i(ImmOp::Lh, "lh", "rd, offset(rs1)", "set rd = sext(memory[rs1 + sext(offset)][15:0])", LOAD).funct3(0b001),
    i(ImmOp::Lw, "lw", "rd, offset(rs1)", "set rd = memory[rs1 + sext(offset)][31:0]", LOAD).funct3(0b010),
    i(ImmOp::Lbu, "lbu", "rd, offset(rs1)", "set rd = memory[rs1 + sext(offset)][7:0]", LOAD).funct3(0b100),
    i(ImmOp::Lhu, "lhu", "rd, offset(rs1)", "set rd = memory[rs1 + sext(offset)][15:0]", LOAD).funct3(0b101),
    i(ImmOp::Addi, "addi", "rd, rs1, imm", "set rd = rs1 + sext(imm)", OP_IMM).funct3(0b000),
    i(ImmOp::Slti, "slti", "rd, rs1, imm", "set rd = 1 if rs1 < sext(imm) (signed), else 0", OP_IMM).funct3(0b010),
    i(ImmOp::Sltiu, "sltiu", "rd, rs1, imm", "set rd = 1 if rs1 < sext(imm) (unsigned), else 0", OP_IMM).funct3(0b011),
    i(ImmOp::Xori, "xori", "rd, rs1, imm", "set rd = rs1 ^ sext(imm)", OP_IMM).funct3(0b100),
    i(ImmOp::Ori, "ori", "rd, rs1, imm", "set rd = rs1 | sext(imm)", OP_IMM).funct3(0b110),
    i(ImmOp::Andi, "andi", "rd, rs1, imm", "set rd = rs1 & sext(imm)", OP_IMM).funct3(0b111),
    i(ImmOp::Slli, "slli", "rd, rs1, shamt", "set rd = rs1 << shamt", OP_IMM).funct3(0b001).funct7(BASE),
    i(ImmOp::Srli, "srli", "rd, rs1, shamt", "set rd = rs1 >>u shamt", OP_IMM).funct3(0b101).funct7(BASE),
    i(ImmOp::Srai, "srai", "rd, rs1, shamt", "set rd = rs1 >>s shamt", OP_IMM).funct3(0b101).funct7(ALT),
    i(ImmOp::Flw, "flw", "frd, offset(rs1)", "set frd = f32(memory[rs1 + sext(offset)][31:0])", LOAD_FP).funct3(0b010),
    i(ImmOp::Fence, "fence", "", "order memory accesses (no-op on a single hart)", MISC_MEM).funct3(0b000),
    i(ImmOp::FenceI, "fence.i", "", "synchronize instruction and data streams (no-op)", MISC_MEM).funct3(0b001),
    i(ImmOp::Ecall, "ecall", "", "request a service from the execution environment", SYSTEM).funct3(0b000).funct12(0),
    i(ImmOp::Ebreak, "ebreak", "", "return control to the debugging environment", SYSTEM).funct3(0b000).funct12(1),
    // ==================== S-type ====================
    s(StoreOp::Sb, "sb", "rs2, offset(rs1)", "set memory[rs1 + sext(offset)] = rs2[7:0]", STORE).funct3(0b000),
    s(StoreOp::Sh, "sh", "rs2, offset(rs1)", "set memory[rs1 + sext(offset)] = rs2[15:0]", STORE).funct3(0b001),
    s(StoreOp::Sw, "sw", "rs2, offset(rs1)", "set memory[rs1 + sext(offset)] = rs2[31:0]", STORE).funct3(0b010),
    s(StoreOp::Fsw, "fsw", "frs2, offset(rs1)", "set memory[rs1 + sext(offset)] = bits(frs2)", STORE_FP).funct3(0b010),
    // ==================== B-type ====================
    b(BranchOp::Beq, "beq", "if rs1 == rs2 then pc += sext(offset)").funct3(0b000),
    b(BranchOp::Bne, "bne", "if rs1 != rs2 then pc += sext(offset)").funct3(0b001),
    b(BranchOp::Blt, "blt", "if rs1 < rs2 (signed) then pc += sext(offset)").funct3(0b100),
    b(BranchOp::Bge, "bge", "if rs1 >= rs2 (signed) then pc += sext(offset)").funct3(0b101),
    b(BranchOp::Bltu, "bltu", "if rs1 < rs2 (unsigned) then pc += sext(offset)").funct3(0b110),
    b(BranchOp::Bgeu, "bgeu", "if rs1 >= rs2 (unsigned) then pc += sext(offset)").funct3(0b111),
    // ==================== U-type ====================
    Descriptor::new(Op::Upper(UpperOp::Lui), "lui", "rd, imm", "set rd = imm << 12", LUI),
    Descriptor::new(Op::Upper(UpperOp::Auipc), "auipc", "rd, imm", "set rd = pc + (imm << 12)", AUIPC),
    // ==================== J-type ====================
    Descriptor::new(Op::Jump(JumpOp::Jal), "jal", "rd, offset", "set rd = pc + 4, pc += sext(offset)", JAL),
    // ==================== R4-type ====================
    r4(FusedOp::FmaddS, "fmadd.s", "set frd = frs1 * frs2 + frs3", MADD),
    r4(FusedOp::FmsubS, "fmsub.s", "set frd = frs1 * frs2 - frs3", MSUB),
    r4(FusedOp::FnmsubS, "fnmsub.s", "set frd = -frs1 * frs2 + frs3", NMSUB),
    r4(FusedOp::FnmaddS, "fnmadd.s", "set frd = -frs1 * frs2 - frs3", NMADD),
];
