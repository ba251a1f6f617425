//! Virtual machine session: fetch, decode, execute.
//!
//! A [`Vm`] owns its register file and memory and borrows the shared
//! instruction registry. Environment calls are forwarded to a
//! [`SyscallHandler`] chosen by the host.

pub mod cpu;
pub mod memory;

pub use cpu::Cpu;
pub use memory::Memory;

use tracing::{debug, trace};

use crate::error::{TrapCause, VmResult};
use crate::isa::{self, Registry};

/// Services `ecall` instructions for a session.
pub trait SyscallHandler {
    /// Handle one environment call. The service number and arguments are in
    /// the registers (a7 and a0..a6 by convention).
    ///
    /// # Errors
    ///
    /// Returning a [`TrapCause`] stops the session at the `ecall`, e.g.
    /// [`TrapCause::Exit`] when the program asks to terminate.
    fn handle(&mut self, cpu: &mut Cpu, memory: &mut Memory) -> VmResult<()>;
}

/// Handler that services nothing: every `ecall` traps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSyscalls;

impl SyscallHandler for NoSyscalls {
    fn handle(&mut self, _cpu: &mut Cpu, _memory: &mut Memory) -> VmResult<()> {
        Err(TrapCause::Ecall)
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The instruction retired; holds the new PC.
    Ok(u32),
    /// Execution stopped; the PC still points at the trapping instruction.
    Trap(TrapCause),
}

/// Outcome of [`Vm::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    /// The program exited through the environment.
    Halted {
        /// Exit code.
        code: i32,
        /// Instructions retired during this run.
        steps: u64,
    },
    /// Execution stopped on a trap other than an exit.
    Trap {
        /// Why execution stopped.
        cause: TrapCause,
        /// Address of the trapping instruction.
        pc: u32,
        /// Instructions retired during this run.
        steps: u64,
    },
    /// The step budget ran out.
    StepLimit {
        /// Instructions retired during this run.
        steps: u64,
    },
}

/// A RISC-V execution session.
#[derive(Debug)]
pub struct Vm<S> {
    /// Register file and PC.
    pub cpu: Cpu,
    /// Guest memory.
    pub memory: Memory,
    /// Environment call handler.
    pub syscalls: S,
    registry: &'static Registry,
    steps: u64,
}

impl<S: SyscallHandler> Vm<S> {
    /// Create a session with zeroed memory of `memory_size` bytes at `base`.
    /// Execution starts at `base`.
    #[must_use]
    pub fn new(memory_size: u32, base: u32, syscalls: S) -> Self {
        Self::with_state(Cpu::with_pc(base), Memory::new(memory_size, base), syscalls)
    }

    /// Create a session from prepared machine state, e.g. a loaded program.
    #[must_use]
    pub fn with_state(cpu: Cpu, memory: Memory, syscalls: S) -> Self {
        Vm {
            cpu,
            memory,
            syscalls,
            registry: isa::registry(),
            steps: 0,
        }
    }

    /// Instructions retired since the session was created.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Execute one instruction.
    ///
    /// An `ecall` is passed to the syscall handler; if the handler succeeds
    /// execution continues after the `ecall`.
    pub fn step(&mut self) -> StepResult {
        match self.try_step() {
            Ok(pc) => StepResult::Ok(pc),
            Err(cause) => StepResult::Trap(cause),
        }
    }

    fn try_step(&mut self) -> VmResult<u32> {
        let pc = self.cpu.pc;
        if pc & 0b11 != 0 {
            return Err(TrapCause::InstructionMisaligned(pc));
        }

        let word = self.memory.fetch(pc)?;
        let inst = self.registry.decode(word)?;
        trace!(
            pc = format_args!("{pc:#010x}"),
            word = format_args!("{word:#010x}"),
            "{}",
            self.registry.disassemble(inst)
        );

        let next_pc = match isa::execute(inst, &mut self.cpu, &mut self.memory, pc) {
            Err(TrapCause::Ecall) => {
                self.syscalls.handle(&mut self.cpu, &mut self.memory)?;
                pc.wrapping_add(4)
            }
            result => result?,
        };

        self.cpu.pc = next_pc;
        self.steps += 1;
        Ok(next_pc)
    }

    /// Run until the program exits, traps, or `max_steps` instructions have
    /// retired.
    pub fn run(&mut self, max_steps: u64) -> RunResult {
        let start = self.steps;
        debug!(
            pc = format_args!("{:#010x}", self.cpu.pc),
            max_steps, "running"
        );

        let result = loop {
            let steps = self.steps - start;
            if steps >= max_steps {
                break RunResult::StepLimit { steps };
            }
            if let StepResult::Trap(cause) = self.step() {
                let steps = self.steps - start;
                break match cause {
                    TrapCause::Exit(code) => RunResult::Halted { code, steps },
                    cause => RunResult::Trap {
                        cause,
                        pc: self.cpu.pc,
                        steps,
                    },
                };
            }
        };

        debug!(?result, "stopped");
        result
    }
}
