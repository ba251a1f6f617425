//! Instruction execution: reads operands from the register file, applies the
//! pure compute functions, and writes results back.
//!
//! The cast warnings below are intentionally allowed because RISC-V semantics
//! require deliberate signed/unsigned reinterpretation of 32-bit values.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]

use super::alu::{compute_branch, compute_reg};
use super::op::{ImmOp, StoreOp, UpperOp};
use super::rv32f::compute_fused_bits;
use crate::error::{TrapCause, VmResult};
use crate::isa::Instruction;
use crate::vm::cpu::Cpu;
use crate::vm::memory::Memory;

/// Execute one decoded instruction located at `pc`.
///
/// Returns the next PC value on success, or a trap cause on failure.
/// The caller is responsible for advancing the PC.
///
/// # Errors
///
/// Returns a [`TrapCause`] if the instruction causes a trap (ecall, ebreak,
/// memory fault).
#[inline]
pub fn execute(inst: Instruction, cpu: &mut Cpu, memory: &mut Memory, pc: u32) -> VmResult<u32> {
    let next_pc = pc.wrapping_add(4);

    match inst {
        // ==================== Register-register ====================
        Instruction::R { op, rd, rs1, rs2 } => {
            let result = compute_reg(op, cpu.read_reg(rs1), cpu.read_reg(rs2));
            cpu.write_reg(rd, result);
            Ok(next_pc)
        }

        // ==================== Immediate ====================
        Instruction::I { op, rd, rs1, imm } => {
            if let Some(alu) = op.alu_equivalent() {
                // Shift immediates carry funct7 in the upper bits; compute_reg
                // masks the amount to 5 bits.
                let result = compute_reg(alu, cpu.read_reg(rs1), imm as u32);
                cpu.write_reg(rd, result);
                return Ok(next_pc);
            }

            let addr = cpu.read_reg(rs1).wrapping_add(imm as u32);
            match op {
                // ==================== Loads ====================
                ImmOp::Lb => cpu.write_reg(rd, i32::from(memory.load_i8(addr)?) as u32),
                ImmOp::Lh => cpu.write_reg(rd, i32::from(memory.load_i16(addr)?) as u32),
                ImmOp::Lw => cpu.write_reg(rd, memory.load_u32(addr)?),
                ImmOp::Lbu => cpu.write_reg(rd, u32::from(memory.load_u8(addr)?)),
                ImmOp::Lhu => cpu.write_reg(rd, u32::from(memory.load_u16(addr)?)),
                ImmOp::Flw => cpu.write_freg(rd, memory.load_u32(addr)?),

                // ==================== Jumps ====================
                ImmOp::Jalr => {
                    // Target first: rd may equal rs1.
                    let target = addr & !1;
                    cpu.write_reg(rd, next_pc);
                    return Ok(target);
                }

                // ==================== System ====================
                ImmOp::Ecall => return Err(TrapCause::Ecall),
                ImmOp::Ebreak => return Err(TrapCause::Ebreak),
                // No-ops for a single hart without caches
                ImmOp::Fence | ImmOp::FenceI => {}

                // Computed above
                ImmOp::Addi
                | ImmOp::Slti
                | ImmOp::Sltiu
                | ImmOp::Xori
                | ImmOp::Ori
                | ImmOp::Andi
                | ImmOp::Slli
                | ImmOp::Srli
                | ImmOp::Srai => {}
            }
            Ok(next_pc)
        }

        // ==================== Stores ====================
        Instruction::S { op, rs1, rs2, imm } => {
            let addr = cpu.read_reg(rs1).wrapping_add(imm as u32);
            match op {
                StoreOp::Sb => memory.store_u8(addr, cpu.read_reg(rs2) as u8)?,
                StoreOp::Sh => memory.store_u16(addr, cpu.read_reg(rs2) as u16)?,
                StoreOp::Sw => memory.store_u32(addr, cpu.read_reg(rs2))?,
                StoreOp::Fsw => memory.store_u32(addr, cpu.read_freg(rs2))?,
            }
            Ok(next_pc)
        }

        // ==================== Branches ====================
        Instruction::B { op, rs1, rs2, imm } => {
            if compute_branch(op, cpu.read_reg(rs1), cpu.read_reg(rs2)) {
                Ok(pc.wrapping_add(imm as u32))
            } else {
                Ok(next_pc)
            }
        }

        // ==================== Upper Immediate ====================
        Instruction::U { op, rd, imm } => {
            let result = match op {
                UpperOp::Lui => imm as u32,
                UpperOp::Auipc => pc.wrapping_add(imm as u32),
            };
            cpu.write_reg(rd, result);
            Ok(next_pc)
        }

        // ==================== Jumps ====================
        Instruction::J { rd, imm, .. } => {
            cpu.write_reg(rd, next_pc);
            Ok(pc.wrapping_add(imm as u32))
        }

        // ==================== Fused multiply-add ====================
        Instruction::R4 {
            op,
            rd,
            rs1,
            rs2,
            rs3,
        } => {
            let result =
                compute_fused_bits(op, cpu.read_freg(rs1), cpu.read_freg(rs2), cpu.read_freg(rs3));
            cpu.write_freg(rd, result);
            Ok(next_pc)
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::isa::op::{BranchOp, FusedOp, JumpOp, RegOp};

    fn make_cpu() -> Cpu {
        Cpu::new()
    }

    fn make_memory() -> Memory {
        Memory::new(1024, 0)
    }

    fn r(op: RegOp, rd: u8, rs1: u8, rs2: u8) -> Instruction {
        Instruction::R { op, rd, rs1, rs2 }
    }

    fn i(op: ImmOp, rd: u8, rs1: u8, imm: i32) -> Instruction {
        Instruction::I { op, rd, rs1, imm }
    }

    #[test]
    fn test_add() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 100);
        cpu.write_reg(2, 42);

        let next = execute(r(RegOp::Add, 3, 1, 2), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(cpu.read_reg(3), 142);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_div_overflow_through_glue() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 0x8000_0000);
        cpu.write_reg(2, (-1i32) as u32);

        execute(r(RegOp::Div, 3, 1, 2), &mut cpu, &mut mem, 0).unwrap();
        execute(r(RegOp::Rem, 4, 1, 2), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(cpu.read_reg(3), 0x8000_0000);
        assert_eq!(cpu.read_reg(4), 0);
    }

    #[test]
    fn test_addi_negative() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 10);

        execute(i(ImmOp::Addi, 2, 1, -11), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(cpu.read_reg(2), u32::MAX);
    }

    #[test]
    fn test_srai_uses_low_bits() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 0x8000_0000);

        // srai x2, x1, 4 (imm field carries funct7 = 0x20)
        execute(i(ImmOp::Srai, 2, 1, 0x404), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(cpu.read_reg(2), 0xF800_0000);
    }

    #[test]
    fn test_sltiu_sign_extended_immediate() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 5);

        // -1 compares as 0xFFFFFFFF
        execute(i(ImmOp::Sltiu, 2, 1, -1), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(cpu.read_reg(2), 1);
    }

    #[test]
    fn test_write_to_x0_discarded() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();

        execute(i(ImmOp::Addi, 0, 0, 5), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(cpu.read_reg(0), 0);
    }

    #[test]
    fn test_beq_taken() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 42);
        cpu.write_reg(2, 42);

        let inst = Instruction::B {
            op: BranchOp::Beq,
            rs1: 1,
            rs2: 2,
            imm: 100,
        };
        assert_eq!(execute(inst, &mut cpu, &mut mem, 0x10).unwrap(), 0x74);
    }

    #[test]
    fn test_beq_not_taken() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 42);
        cpu.write_reg(2, 43);

        let inst = Instruction::B {
            op: BranchOp::Beq,
            rs1: 1,
            rs2: 2,
            imm: 100,
        };
        // Not taken, advance by 4
        assert_eq!(execute(inst, &mut cpu, &mut mem, 0x10).unwrap(), 0x14);
    }

    #[test]
    fn test_backward_branch() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();

        let inst = Instruction::B {
            op: BranchOp::Bge,
            rs1: 0,
            rs2: 0,
            imm: -8,
        };
        assert_eq!(execute(inst, &mut cpu, &mut mem, 0x20).unwrap(), 0x18);
    }

    #[test]
    fn test_jal() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();

        let inst = Instruction::J {
            op: JumpOp::Jal,
            rd: 1,
            imm: 100,
        };
        let next = execute(inst, &mut cpu, &mut mem, 0).unwrap();

        // Return address
        assert_eq!(cpu.read_reg(1), 4);
        assert_eq!(next, 100);
    }

    #[test]
    fn test_jalr_clears_low_bit() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        // Odd address
        cpu.write_reg(1, 101);

        let next = execute(i(ImmOp::Jalr, 2, 1, 0), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(next, 100);
        assert_eq!(cpu.read_reg(2), 4);
    }

    #[test]
    fn test_jalr_same_register() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 0x200);

        let next = execute(i(ImmOp::Jalr, 1, 1, 8), &mut cpu, &mut mem, 0x40).unwrap();

        assert_eq!(next, 0x208);
        assert_eq!(cpu.read_reg(1), 0x44);
    }

    #[test]
    fn test_lui_auipc() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();

        let lui = Instruction::U {
            op: UpperOp::Lui,
            rd: 1,
            imm: 0x1234_5000,
        };
        execute(lui, &mut cpu, &mut mem, 0).unwrap();
        assert_eq!(cpu.read_reg(1), 0x1234_5000);

        let auipc = Instruction::U {
            op: UpperOp::Auipc,
            rd: 2,
            imm: 0x0001_0000,
        };
        execute(auipc, &mut cpu, &mut mem, 0x1000).unwrap();
        assert_eq!(cpu.read_reg(2), 0x0001_1000);
    }

    #[test]
    fn test_load_store_word() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(2, 0xDEAD_BEEF);

        let sw = Instruction::S {
            op: StoreOp::Sw,
            rs1: 1,
            rs2: 2,
            imm: 100,
        };
        execute(sw, &mut cpu, &mut mem, 0).unwrap();
        execute(i(ImmOp::Lw, 3, 1, 100), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(cpu.read_reg(3), 0xDEAD_BEEF);
    }

    #[test]
    fn test_sub_word_loads() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        mem.store_u32(0, 0xAABB_CCDD).unwrap();

        execute(i(ImmOp::Lb, 1, 0, 0), &mut cpu, &mut mem, 0).unwrap();
        execute(i(ImmOp::Lbu, 2, 0, 0), &mut cpu, &mut mem, 0).unwrap();
        execute(i(ImmOp::Lh, 3, 0, 2), &mut cpu, &mut mem, 0).unwrap();
        execute(i(ImmOp::Lhu, 4, 0, 2), &mut cpu, &mut mem, 0).unwrap();
        execute(i(ImmOp::Lb, 5, 0, 1), &mut cpu, &mut mem, 0).unwrap();

        // Sign-extended
        assert_eq!(cpu.read_reg(1), 0xFFFF_FFDD);
        // Zero-extended
        assert_eq!(cpu.read_reg(2), 0xDD);
        assert_eq!(cpu.read_reg(3), 0xFFFF_AABB);
        assert_eq!(cpu.read_reg(4), 0xAABB);
        assert_eq!(cpu.read_reg(5), 0xFFFF_FFCC);
    }

    #[test]
    fn test_store_truncates() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(2, 0x1234_5678);

        let sb = Instruction::S {
            op: StoreOp::Sb,
            rs1: 0,
            rs2: 2,
            imm: 8,
        };
        let sh = Instruction::S {
            op: StoreOp::Sh,
            rs1: 0,
            rs2: 2,
            imm: 16,
        };
        execute(sb, &mut cpu, &mut mem, 0).unwrap();
        execute(sh, &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(mem.load_u32(8).unwrap(), 0x78);
        assert_eq!(mem.load_u32(16).unwrap(), 0x5678);
    }

    #[test]
    fn test_load_fault() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_reg(1, 1022);

        let result = execute(i(ImmOp::Lw, 2, 1, 0), &mut cpu, &mut mem, 0);

        assert_eq!(
            result,
            Err(TrapCause::MemoryFault {
                addr: 1022,
                access: crate::error::AccessType::Read
            })
        );
        assert_eq!(cpu.read_reg(2), 0);
    }

    #[test]
    fn test_flw_fsw() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        mem.store_u32(0x40, 1.5f32.to_bits()).unwrap();

        execute(i(ImmOp::Flw, 3, 0, 0x40), &mut cpu, &mut mem, 0).unwrap();
        assert_eq!(f32::from_bits(cpu.read_freg(3)), 1.5);

        let fsw = Instruction::S {
            op: StoreOp::Fsw,
            rs1: 0,
            rs2: 3,
            imm: 0x80,
        };
        execute(fsw, &mut cpu, &mut mem, 0).unwrap();
        assert_eq!(mem.load_u32(0x80).unwrap(), 1.5f32.to_bits());
    }

    #[test]
    fn test_fmadd_fnmadd() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();
        cpu.write_freg(1, 2.0f32.to_bits());
        cpu.write_freg(2, 3.0f32.to_bits());
        cpu.write_freg(3, 1.0f32.to_bits());

        let fused = |op, rd| Instruction::R4 {
            op,
            rd,
            rs1: 1,
            rs2: 2,
            rs3: 3,
        };
        execute(fused(FusedOp::FmaddS, 4), &mut cpu, &mut mem, 0).unwrap();
        execute(fused(FusedOp::FnmaddS, 5), &mut cpu, &mut mem, 0).unwrap();

        assert_eq!(f32::from_bits(cpu.read_freg(4)), 7.0);
        assert_eq!(f32::from_bits(cpu.read_freg(5)), -7.0);
    }

    #[test]
    fn test_system() {
        let mut cpu = make_cpu();
        let mut mem = make_memory();

        let ecall = execute(i(ImmOp::Ecall, 0, 0, 0), &mut cpu, &mut mem, 0);
        let ebreak = execute(i(ImmOp::Ebreak, 0, 0, 1), &mut cpu, &mut mem, 0);
        let fence = execute(i(ImmOp::Fence, 0, 0, 0), &mut cpu, &mut mem, 8);

        assert_eq!(ecall, Err(TrapCause::Ecall));
        assert_eq!(ebreak, Err(TrapCause::Ebreak));
        assert_eq!(fence, Ok(12));
    }
}
