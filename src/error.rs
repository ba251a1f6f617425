//! Error types for the RISC-V VM.

use thiserror::Error;

/// Memory access type for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    /// Read access (load instructions).
    Read,
    /// Write access (store instructions).
    Write,
    /// Execute access (instruction fetch).
    Execute,
}

/// Trap causes that halt or redirect VM execution.
///
/// Environment calls and breakpoints are requests for the hosting session,
/// not failures: the session decides what to do with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrapCause {
    /// Environment call (ecall instruction).
    #[error("environment call")]
    Ecall,
    /// Breakpoint (ebreak instruction).
    #[error("breakpoint")]
    Ebreak,
    /// No registered instruction matches this word.
    #[error("invalid instruction: {0:#010x}")]
    InvalidInstruction(u32),
    /// Memory access violation.
    #[error("memory {access:?} fault at {addr:#010x}")]
    MemoryFault {
        /// The address that caused the fault.
        addr: u32,
        /// The type of access attempted.
        access: AccessType,
    },
    /// Instruction address misaligned.
    #[error("instruction address misaligned: {0:#010x}")]
    InstructionMisaligned(u32),
    /// The program asked the environment to terminate.
    #[error("program exited with code {0}")]
    Exit(i32),
}

/// Result type for VM execution steps.
pub type VmResult<T> = Result<T, TrapCause>;
