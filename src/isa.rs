//! RISC-V instruction set definitions: RV32I, RV32M and fused
//! single-precision multiply-add.
//!
//! Instructions are described by static [`Descriptor`]s collected into a
//! [`Registry`], which resolves encoded words to [`Instruction`]s and
//! mnemonics back to encodings. Execution lives in [`execute`] on top of the
//! pure compute functions in [`alu`], [`rv32m`] and [`rv32f`].

pub mod alu;
mod descriptor;
pub mod format;
mod instruction;
pub mod op;
mod registry;
mod rv32i;
pub mod rv32f;
pub mod rv32m;
pub mod table;

pub use descriptor::{Descriptor, EncodingKey};
pub use format::{EncodeError, Operands};
pub use instruction::{Disassembly, Instruction};
pub use op::{BranchOp, Format, FusedOp, ImmOp, JumpOp, Op, RegOp, StoreOp, UpperOp};
pub use registry::{Registry, RegistryBuilder, RegistryError, registry};
pub use rv32i::execute;

use crate::error::VmResult;

/// Decode a 32-bit instruction word with the standard registry.
///
/// # Errors
///
/// Returns [`TrapCause::InvalidInstruction`](crate::TrapCause::InvalidInstruction)
/// if no registered instruction matches the word.
pub fn decode(word: u32) -> VmResult<Instruction> {
    registry().decode(word)
}

/// Encode an instruction with the standard registry.
///
/// # Errors
///
/// Returns an [`EncodeError`] if the mnemonic is unknown or the operands do
/// not fit.
pub fn encode(mnemonic: &str, operands: Operands) -> Result<u32, EncodeError> {
    registry().encode(mnemonic, operands)
}
