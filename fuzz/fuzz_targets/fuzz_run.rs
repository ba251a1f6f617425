#![no_main]

//! Execution fuzzer.
//!
//! Runs arbitrary code with arbitrary registers against the console
//! environment. The session must never panic, must stay within its step
//! budget, and x0 must read zero afterwards.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vsim::{Cpu, Environment, Memory, RunResult, Vm};

const BASE: u32 = 0x1000;
const MEMORY_SIZE: u32 = 0x1000;
const MAX_STEPS: u64 = 4096;

#[derive(Arbitrary, Debug)]
struct RunInput {
    registers: [u32; 32],
    float_registers: [u32; 8],
    code: Vec<u8>,
}

fuzz_target!(|input: RunInput| {
    let mut memory = Memory::new(MEMORY_SIZE, BASE);
    let len = input.code.len().min(MEMORY_SIZE as usize);
    if memory.store_bytes(BASE, &input.code[..len]).is_err() {
        return;
    }

    let mut cpu = Cpu::with_pc(BASE);
    cpu.set_registers(input.registers);
    for (reg, bits) in (0u8..).zip(input.float_registers) {
        cpu.write_freg(reg, bits);
    }

    let mut vm = Vm::with_state(cpu, memory, Environment::new(Vec::new()));
    let steps = match vm.run(MAX_STEPS) {
        RunResult::Halted { steps, .. }
        | RunResult::Trap { steps, .. }
        | RunResult::StepLimit { steps } => steps,
    };

    assert!(steps <= MAX_STEPS);
    assert_eq!(vm.steps(), steps);
    assert_eq!(vm.cpu.read_reg(0), 0);
});
