//! Output formatting utilities for CLI.

use serde::Serialize;
use vsim::{Cpu, Descriptor, RunResult};

/// JSON-serializable run result.
#[derive(Debug, Serialize)]
pub(super) struct JsonRunResult {
    /// `halted`, `trap` or `step_limit`.
    pub(super) outcome: &'static str,
    /// Exit code (null unless halted).
    pub(super) exit_code: Option<i32>,
    /// Trap description (null unless trapped).
    pub(super) trap: Option<String>,
    /// PC when execution stopped.
    pub(super) pc: u32,
    /// Instructions retired.
    pub(super) steps: u64,
    /// Integer registers x0-x31.
    pub(super) registers: [u32; 32],
    /// Everything the program printed.
    pub(super) output: String,
}

impl JsonRunResult {
    /// Create from a run result and the final machine state.
    pub(super) fn new(result: &RunResult, cpu: &Cpu, output: &[u8]) -> Self {
        let (outcome, exit_code, trap, steps) = match *result {
            RunResult::Halted { code, steps } => ("halted", Some(code), None, steps),
            RunResult::Trap { cause, steps, .. } => ("trap", None, Some(cause.to_string()), steps),
            RunResult::StepLimit { steps } => ("step_limit", None, None, steps),
        };
        Self {
            outcome,
            exit_code,
            trap,
            pc: cpu.pc,
            steps,
            registers: *cpu.registers(),
            output: String::from_utf8_lossy(output).into_owned(),
        }
    }
}

/// Format a run result as a one-line human-readable summary.
pub(super) fn format_run_text(result: &RunResult) -> String {
    match *result {
        RunResult::Halted { code, steps } => {
            format!("exited with code {code} after {steps} instructions")
        }
        RunResult::Trap { cause, pc, steps } => {
            format!("trap at {pc:#010x}: {cause} (after {steps} instructions)")
        }
        RunResult::StepLimit { steps } => format!("step limit reached after {steps} instructions"),
    }
}

/// JSON-serializable instruction descriptor.
#[derive(Debug, Serialize)]
pub(super) struct JsonInstruction {
    mnemonic: &'static str,
    usage: &'static str,
    description: &'static str,
    format: String,
    opcode: u8,
    funct3: Option<u8>,
    funct7: Option<u8>,
    funct12: Option<u16>,
}

impl From<&Descriptor> for JsonInstruction {
    fn from(desc: &Descriptor) -> Self {
        Self {
            mnemonic: desc.mnemonic,
            usage: desc.usage,
            description: desc.description,
            format: format!("{:?}", desc.format()),
            opcode: desc.opcode,
            funct3: desc.funct3,
            funct7: desc.funct7,
            funct12: desc.funct12,
        }
    }
}
