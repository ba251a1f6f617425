//! Console environment calls.
//!
//! The service number is taken from a7, arguments from a0..a2. Numbering
//! follows the RARS/MARS convention, with the Linux `write`/`exit` numbers
//! accepted as well so small bare-metal programs built with a standard
//! toolchain can print and exit:
//!
//! | a7 | Service                                        |
//! |----|------------------------------------------------|
//! | 1  | print a0 as a signed decimal                    |
//! | 4  | print the NUL-terminated string at a0           |
//! | 10 | exit with code 0                                |
//! | 11 | print the low byte of a0 as a character         |
//! | 34 | print a0 as `0x`-prefixed 8-digit hex           |
//! | 64 | write a2 bytes from a1 (fd in a0), a0 = count   |
//! | 93 | exit with code a0                               |

#![allow(clippy::cast_possible_wrap)]

use std::io::Write;

use tracing::{error, warn};

use crate::error::{TrapCause, VmResult};
use crate::vm::{Cpu, Memory, SyscallHandler};

/// Service numbers.
pub mod service {
    /// Print a0 as a signed decimal.
    pub const PRINT_INT: u32 = 1;
    /// Print the NUL-terminated string at a0.
    pub const PRINT_STRING: u32 = 4;
    /// Exit with code 0.
    pub const EXIT: u32 = 10;
    /// Print the low byte of a0.
    pub const PRINT_CHAR: u32 = 11;
    /// Print a0 as hex.
    pub const PRINT_HEX: u32 = 34;
    /// Write a buffer.
    pub const WRITE: u32 = 64;
    /// Exit with the code in a0.
    pub const EXIT_CODE: u32 = 93;
}

const A0: u8 = 10;
const A1: u8 = 11;
const A2: u8 = 12;
const A7: u8 = 17;

/// Longest string [`service::PRINT_STRING`] will scan for a terminator.
const MAX_STRING: u32 = 1 << 20;

/// A [`SyscallHandler`] writing program output to `out`.
#[derive(Debug)]
pub struct Environment<W> {
    out: W,
}

impl<W: Write> Environment<W> {
    /// Create an environment writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Environment { out }
    }

    /// The output sink.
    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Consume the environment, returning the output sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, bytes: &[u8]) -> VmResult<()> {
        self.out.write_all(bytes).map_err(|err| {
            error!(%err, "program output failed");
            TrapCause::Ecall
        })
    }

    fn flush(&mut self) {
        if let Err(err) = self.out.flush() {
            warn!(%err, "flushing program output failed");
        }
    }
}

/// Read a NUL-terminated string starting at `addr`.
fn read_c_string(memory: &Memory, addr: u32) -> VmResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for offset in 0..MAX_STRING {
        match memory.load_u8(addr.wrapping_add(offset))? {
            0 => break,
            byte => bytes.push(byte),
        }
    }
    Ok(bytes)
}

impl<W: Write> SyscallHandler for Environment<W> {
    fn handle(&mut self, cpu: &mut Cpu, memory: &mut Memory) -> VmResult<()> {
        let a0 = cpu.read_reg(A0);
        match cpu.read_reg(A7) {
            service::PRINT_INT => self.emit((a0 as i32).to_string().as_bytes()),
            service::PRINT_STRING => {
                let bytes = read_c_string(memory, a0)?;
                self.emit(&bytes)
            }
            service::PRINT_CHAR => self.emit(&[a0.to_le_bytes()[0]]),
            service::PRINT_HEX => self.emit(format!("{a0:#010x}").as_bytes()),
            service::WRITE => {
                let len = cpu.read_reg(A2);
                let bytes = memory.load_bytes(cpu.read_reg(A1), len)?.to_vec();
                self.emit(&bytes)?;
                cpu.write_reg(A0, len);
                Ok(())
            }
            service::EXIT => {
                self.flush();
                Err(TrapCause::Exit(0))
            }
            service::EXIT_CODE => {
                self.flush();
                Err(TrapCause::Exit(a0 as i32))
            }
            other => {
                warn!(
                    service = other,
                    pc = format_args!("{:#010x}", cpu.pc),
                    "unknown environment call"
                );
                Err(TrapCause::Ecall)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(
        env: &mut Environment<Vec<u8>>,
        memory: &mut Memory,
        service: u32,
        a0: u32,
    ) -> VmResult<()> {
        let mut cpu = Cpu::new();
        cpu.write_reg(A7, service);
        cpu.write_reg(A0, a0);
        env.handle(&mut cpu, memory)
    }

    fn output(env: &Environment<Vec<u8>>) -> &str {
        std::str::from_utf8(env.output()).unwrap()
    }

    #[test]
    fn test_print_services() {
        let mut env = Environment::new(Vec::new());
        let mut memory = Memory::new(64, 0);

        call(&mut env, &mut memory, service::PRINT_INT, (-17i32) as u32).unwrap();
        call(&mut env, &mut memory, service::PRINT_CHAR, u32::from(b' ')).unwrap();
        call(&mut env, &mut memory, service::PRINT_HEX, 0xBEEF).unwrap();

        assert_eq!(output(&env), "-17 0x0000beef");
    }

    #[test]
    fn test_print_string() {
        let mut env = Environment::new(Vec::new());
        let mut memory = Memory::new(64, 0x100);
        memory.store_bytes(0x110, b"hello\0world").unwrap();

        call(&mut env, &mut memory, service::PRINT_STRING, 0x110).unwrap();

        assert_eq!(output(&env), "hello");
    }

    #[test]
    fn test_unterminated_string_faults() {
        let mut env = Environment::new(Vec::new());
        let mut memory = Memory::new(4, 0);
        memory.store_bytes(0, b"abcd").unwrap();

        let result = call(&mut env, &mut memory, service::PRINT_STRING, 0);

        assert!(matches!(result, Err(TrapCause::MemoryFault { addr: 4, .. })));
    }

    #[test]
    fn test_write_returns_count() {
        let mut env = Environment::new(Vec::new());
        let mut memory = Memory::new(64, 0);
        memory.store_bytes(8, b"ok\n").unwrap();
        let mut cpu = Cpu::new();
        cpu.write_reg(A7, service::WRITE);
        cpu.write_reg(A0, 1);
        cpu.write_reg(A1, 8);
        cpu.write_reg(A2, 3);

        env.handle(&mut cpu, &mut memory).unwrap();

        assert_eq!(output(&env), "ok\n");
        assert_eq!(cpu.read_reg(A0), 3);
    }

    #[test]
    fn test_exit_services() {
        let mut env = Environment::new(Vec::new());
        let mut memory = Memory::new(16, 0);

        assert_eq!(
            call(&mut env, &mut memory, service::EXIT, 99),
            Err(TrapCause::Exit(0))
        );
        assert_eq!(
            call(&mut env, &mut memory, service::EXIT_CODE, 3),
            Err(TrapCause::Exit(3))
        );
    }

    #[test]
    fn test_unknown_service_traps() {
        let mut env = Environment::new(Vec::new());
        let mut memory = Memory::new(16, 0);

        assert_eq!(
            call(&mut env, &mut memory, 12345, 0),
            Err(TrapCause::Ecall)
        );
        assert!(env.into_inner().is_empty());
    }
}
