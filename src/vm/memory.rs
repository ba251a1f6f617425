//! Guest RAM: one contiguous little-endian region starting at a base
//! address.
//!
//! Every access is range-checked against the region and faults with the
//! access kind that caused it. Alignment is not checked.

#![allow(clippy::cast_possible_truncation)]

use std::ops::Range;

use crate::error::{AccessType, TrapCause, VmResult};

/// The guest's physical memory.
#[derive(Debug, Clone)]
pub struct Memory {
    data: Vec<u8>,
    base: u32,
}

impl Memory {
    /// Zeroed region of `size` bytes at `base`. A region that would run past
    /// `0xFFFF_FFFF` is cut short there.
    #[must_use]
    pub fn new(size: u32, base: u32) -> Self {
        let size = size.min(u32::MAX - base);
        Memory {
            data: vec![0u8; size as usize],
            base,
        }
    }

    /// Region length in bytes.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }

    /// First guest address of the region.
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Whether `addr` lies inside this region.
    #[must_use]
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.base && addr - self.base < self.size()
    }

    /// One past the last valid address.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.base.wrapping_add(self.size())
    }

    /// Host index range backing guest bytes `addr..addr + len`.
    #[inline]
    fn span(&self, addr: u32, len: u32, access: AccessType) -> VmResult<Range<usize>> {
        let fault = TrapCause::MemoryFault { addr, access };
        let start = addr.checked_sub(self.base).ok_or(fault)?;
        let end = start.checked_add(len).ok_or(fault)?;
        if end > self.size() {
            return Err(fault);
        }
        Ok(start as usize..end as usize)
    }

    #[inline]
    fn read<const N: usize>(&self, addr: u32, access: AccessType) -> VmResult<[u8; N]> {
        let span = self.span(addr, N as u32, access)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[span]);
        Ok(bytes)
    }

    #[inline]
    fn write(&mut self, addr: u32, bytes: &[u8]) -> VmResult<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| TrapCause::MemoryFault {
            addr,
            access: AccessType::Write,
        })?;
        let span = self.span(addr, len, AccessType::Write)?;
        self.data[span].copy_from_slice(bytes);
        Ok(())
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] outside the region.
    #[inline]
    pub fn load_u8(&self, addr: u32) -> VmResult<u8> {
        let [byte] = self.read(addr, AccessType::Read)?;
        Ok(byte)
    }

    /// Read a halfword.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] if any of the two bytes is outside the region.
    #[inline]
    pub fn load_u16(&self, addr: u32) -> VmResult<u16> {
        self.read(addr, AccessType::Read).map(u16::from_le_bytes)
    }

    /// Read a word.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] if any of the four bytes is outside the region.
    #[inline]
    pub fn load_u32(&self, addr: u32) -> VmResult<u32> {
        self.read(addr, AccessType::Read).map(u32::from_le_bytes)
    }

    /// Read one byte as a signed value (`lb`).
    ///
    /// # Errors
    ///
    /// Same as [`Memory::load_u8`].
    #[inline]
    pub fn load_i8(&self, addr: u32) -> VmResult<i8> {
        self.read(addr, AccessType::Read).map(i8::from_le_bytes)
    }

    /// Read a halfword as a signed value (`lh`).
    ///
    /// # Errors
    ///
    /// Same as [`Memory::load_u16`].
    #[inline]
    pub fn load_i16(&self, addr: u32) -> VmResult<i16> {
        self.read(addr, AccessType::Read).map(i16::from_le_bytes)
    }

    /// Write one byte.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] outside the region. Nothing is written.
    #[inline]
    pub fn store_u8(&mut self, addr: u32, value: u8) -> VmResult<()> {
        self.write(addr, &[value])
    }

    /// Write the low halfword of a register.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] if the halfword does not fit. Nothing is
    /// written.
    #[inline]
    pub fn store_u16(&mut self, addr: u32, value: u16) -> VmResult<()> {
        self.write(addr, &value.to_le_bytes())
    }

    /// Write a word.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] if the word does not fit. Nothing is
    /// written.
    #[inline]
    pub fn store_u32(&mut self, addr: u32, value: u32) -> VmResult<()> {
        self.write(addr, &value.to_le_bytes())
    }

    /// Instruction fetch. Faults report [`AccessType::Execute`].
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] if the word is outside the region.
    #[inline]
    pub fn fetch(&self, addr: u32) -> VmResult<u32> {
        self.read(addr, AccessType::Execute).map(u32::from_le_bytes)
    }

    /// Borrow `len` guest bytes starting at `addr`. Used by the environment
    /// services to read buffers and strings.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] unless the whole range is inside the region.
    #[inline]
    pub fn load_bytes(&self, addr: u32, len: u32) -> VmResult<&[u8]> {
        let span = self.span(addr, len, AccessType::Read)?;
        Ok(&self.data[span])
    }

    /// Copy `bytes` into guest memory at `addr`. The loader places segments
    /// with this.
    ///
    /// # Errors
    ///
    /// [`TrapCause::MemoryFault`] unless the whole range is inside the region.
    /// Nothing is written on failure.
    #[inline]
    pub fn store_bytes(&mut self, addr: u32, bytes: &[u8]) -> VmResult<()> {
        self.write(addr, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_store_byte() {
        let mut mem = Memory::new(256, 0);

        mem.store_u8(0, 0x42).unwrap();
        assert_eq!(mem.load_u8(0).unwrap(), 0x42);

        mem.store_u8(255, 0xFF).unwrap();
        assert_eq!(mem.load_u8(255).unwrap(), 0xFF);
    }

    #[test]
    fn test_load_store_word_little_endian() {
        let mut mem = Memory::new(256, 0);

        mem.store_u32(0, 0x1234_5678).unwrap();

        // Check little-endian byte order
        assert_eq!(mem.load_u8(0).unwrap(), 0x78);
        assert_eq!(mem.load_u8(1).unwrap(), 0x56);
        assert_eq!(mem.load_u8(2).unwrap(), 0x34);
        assert_eq!(mem.load_u8(3).unwrap(), 0x12);

        assert_eq!(mem.load_u32(0).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_base_address() {
        let mut mem = Memory::new(256, 0x1000);

        // Access at base should work
        mem.store_u32(0x1000, 0xDEAD_BEEF).unwrap();
        assert_eq!(mem.load_u32(0x1000).unwrap(), 0xDEAD_BEEF);

        // Access below base should fail
        assert!(mem.load_u8(0x0FFF).is_err());
    }

    #[test]
    fn test_bounds_checking() {
        let mem = Memory::new(256, 0);

        // Valid accesses
        assert!(mem.load_u8(255).is_ok());
        assert!(mem.load_u32(252).is_ok());

        // Out of bounds
        assert!(mem.load_u8(256).is_err());
        assert!(mem.load_u32(253).is_err()); // Would read past end
    }

    #[test]
    fn test_signed_loads() {
        let mut mem = Memory::new(16, 0);
        mem.store_u32(0, 0xAABB_CCDD).unwrap();

        assert_eq!(mem.load_i8(0).unwrap(), -0x23);
        assert_eq!(mem.load_i8(3).unwrap(), -0x56);
        assert_eq!(mem.load_i16(2).unwrap(), -0x5545);
        assert_eq!(mem.load_u16(2).unwrap(), 0xAABB);
    }

    #[test]
    fn test_unaligned_access() {
        let mut mem = Memory::new(16, 0);

        mem.store_u32(1, 0x1122_3344).unwrap();

        assert_eq!(mem.load_u32(1).unwrap(), 0x1122_3344);
        assert_eq!(mem.load_u16(3).unwrap(), 0x1122);
    }

    #[test]
    fn test_fault_reports_access_type() {
        let mut mem = Memory::new(16, 0x100);

        assert_eq!(
            mem.store_u8(0x110, 1),
            Err(TrapCause::MemoryFault {
                addr: 0x110,
                access: AccessType::Write
            })
        );
        assert_eq!(
            mem.fetch(0xFE),
            Err(TrapCause::MemoryFault {
                addr: 0xFE,
                access: AccessType::Execute
            })
        );
    }

    #[test]
    fn test_bulk_bytes() {
        let mut mem = Memory::new(16, 0x100);

        mem.store_bytes(0x104, b"hi\0").unwrap();

        assert_eq!(mem.load_bytes(0x104, 3).unwrap(), b"hi\0");
        assert!(mem.store_bytes(0x10E, b"abc").is_err());
        assert!(mem.contains(0x10F));
        assert!(!mem.contains(0x110));
        assert_eq!(mem.end(), 0x110);
    }

    #[test]
    fn test_straddling_store_writes_nothing() {
        let mut mem = Memory::new(8, 0x100);
        mem.store_u32(0x104, 0x1111_1111).unwrap();

        assert!(mem.store_u32(0x106, 0xFFFF_FFFF).is_err());
        assert!(mem.store_bytes(0x107, b"ab").is_err());

        assert_eq!(mem.load_u32(0x104).unwrap(), 0x1111_1111);
    }

    #[test]
    fn test_region_clamped_to_address_space() {
        let mem = Memory::new(0x100, 0xFFFF_FFC0);

        assert_eq!(mem.size(), 0x3F);
        assert!(mem.load_u8(0xFFFF_FFFE).is_ok());
        assert!(mem.load_u32(0xFFFF_FFFC).is_err());
    }
}
