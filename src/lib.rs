// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
#![cfg_attr(test, allow(clippy::cast_sign_loss, clippy::cast_possible_wrap))]
//! vsim: a RISC-V instruction-set simulator.
//!
//! Supports RV32I, RV32M, and single-precision fused multiply-add with
//! `flw`/`fsw`. Results are bit-exact: two's-complement wraparound, RISC-V
//! division edge cases, and single rounding for fused multiply-add.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Host: loader, config, env calls   │
//! ├─────────────────────────────────────┤
//! │   Vm session: fetch / step / run    │
//! ├─────────────────────────────────────┤
//! │   Execution: alu, rv32m, rv32f      │
//! ├─────────────────────────────────────┤
//! │   Registry: descriptors, decoders   │
//! └─────────────────────────────────────┘
//! ```
//!
//! ```
//! use vsim::{NoSyscalls, StepResult, Vm};
//!
//! let mut vm = Vm::new(4096, 0, NoSyscalls);
//! let word = vsim::isa::encode("addi", vsim::isa::Operands::I { rd: 5, rs1: 0, imm: 10 }).unwrap();
//! vm.memory.store_u32(0, word).unwrap();
//!
//! assert_eq!(vm.step(), StepResult::Ok(4));
//! assert_eq!(vm.cpu.read_reg(5), 10);
//! ```

pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod isa;
pub mod loader;
pub mod vm;

pub use config::{ConfigError, VmConfig};
pub use diagnostics::{Diagnostic, Severity};
pub use env::Environment;
pub use error::{AccessType, TrapCause, VmResult};
pub use isa::{Descriptor, Instruction, Registry, registry};
pub use loader::{LoadError, LoadedProgram};
pub use vm::{Cpu, Memory, NoSyscalls, RunResult, StepResult, SyscallHandler, Vm};
