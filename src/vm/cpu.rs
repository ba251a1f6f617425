//! CPU state: integer and float registers, and the program counter.

/// RISC-V hart state.
///
/// Contains 32 general-purpose 32-bit registers, 32 single-precision float
/// registers and the program counter. Register x0 is hardwired to zero per
/// the RISC-V specification; f0 is an ordinary register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cpu {
    /// General-purpose registers x0-x31.
    /// x0 is hardwired to zero (writes ignored, reads return 0).
    x: [u32; 32],

    /// Float registers f0-f31, stored as raw IEEE-754 bits so NaN payloads
    /// survive a load/store round trip.
    f: [u32; 32],

    /// Program counter - address of current instruction.
    pub pc: u32,
}

impl Cpu {
    /// Create a new CPU with all registers zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pc(0)
    }

    /// Create a new CPU with a specific entry point.
    #[must_use]
    pub fn with_pc(pc: u32) -> Self {
        Cpu {
            x: [0u32; 32],
            f: [0u32; 32],
            pc,
        }
    }

    /// Read a register value. x0 always returns 0.
    #[inline]
    #[must_use]
    pub fn read_reg(&self, reg: u8) -> u32 {
        if reg == 0 { 0 } else { self.x[reg as usize] }
    }

    /// Write a register value. Writes to x0 are ignored.
    #[inline]
    pub fn write_reg(&mut self, reg: u8, value: u32) {
        if reg != 0 {
            self.x[reg as usize] = value;
        }
    }

    /// Read the raw bits of a float register.
    #[inline]
    #[must_use]
    pub fn read_freg(&self, reg: u8) -> u32 {
        self.f[reg as usize]
    }

    /// Write the raw bits of a float register.
    #[inline]
    pub fn write_freg(&mut self, reg: u8, bits: u32) {
        self.f[reg as usize] = bits;
    }

    /// Read a float register as `f32`.
    #[inline]
    #[must_use]
    pub fn read_f32(&self, reg: u8) -> f32 {
        f32::from_bits(self.read_freg(reg))
    }

    /// Write an `f32` into a float register.
    #[inline]
    pub fn write_f32(&mut self, reg: u8, value: f32) {
        self.write_freg(reg, value.to_bits());
    }

    /// Get a reference to the register file (for testing/debugging).
    #[must_use]
    pub fn registers(&self) -> &[u32; 32] {
        &self.x
    }

    /// Get a reference to the float register file, as raw bits.
    #[must_use]
    pub fn float_registers(&self) -> &[u32; 32] {
        &self.f
    }

    /// Set the entire register file (for testing/differential comparison).
    pub fn set_registers(&mut self, regs: [u32; 32]) {
        self.x = regs;
        // Enforce x0 = 0 invariant
        self.x[0] = 0;
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_x0_hardwired_zero() {
        let mut cpu = Cpu::new();

        // Writes to x0 should be ignored
        cpu.write_reg(0, 0xDEAD_BEEF);
        assert_eq!(cpu.read_reg(0), 0);

        // Other registers should work normally
        cpu.write_reg(1, 42);
        assert_eq!(cpu.read_reg(1), 42);
    }

    #[test]
    fn test_all_registers() {
        let mut cpu = Cpu::new();

        for i in 1..32u8 {
            cpu.write_reg(i, u32::from(i) * 100);
        }

        assert_eq!(cpu.read_reg(0), 0); // x0 still zero
        for i in 1..32u8 {
            assert_eq!(cpu.read_reg(i), u32::from(i) * 100);
        }
    }

    #[test]
    fn test_set_registers_enforces_x0() {
        let mut cpu = Cpu::new();
        let mut regs = [0xFFFF_FFFFu32; 32];
        regs[0] = 0xDEAD_BEEF; // Try to set x0

        cpu.set_registers(regs);

        // x0 should still be 0
        assert_eq!(cpu.read_reg(0), 0);
        // Other registers should have their values
        assert_eq!(cpu.read_reg(1), 0xFFFF_FFFF);
    }

    #[test]
    fn test_f0_is_writable() {
        let mut cpu = Cpu::new();

        cpu.write_f32(0, 2.5);

        assert_eq!(cpu.read_f32(0), 2.5);
        assert_eq!(cpu.read_reg(0), 0);
    }

    #[test]
    fn test_nan_payload_preserved() {
        let mut cpu = Cpu::with_pc(0x1000);
        let signalling = 0x7F80_0001;

        cpu.write_freg(7, signalling);

        assert_eq!(cpu.read_freg(7), signalling);
        assert_eq!(cpu.float_registers()[7], signalling);
        assert_eq!(cpu.pc, 0x1000);
    }
}
