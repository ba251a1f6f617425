//! Program loading: RISC-V ELF executables and flat binary images.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use goblin::elf::Elf;
use goblin::elf::program_header::{PF_X, PT_LOAD};
use thiserror::Error;
use tracing::debug;

use crate::config::VmConfig;
use crate::vm::{Cpu, Memory};

/// Stack pointer register.
const SP: u8 = 2;
/// Global pointer register.
const GP: u8 = 3;

/// Error loading a program.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The program file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The ELF structure is invalid.
    #[error("failed to parse ELF: {0}")]
    Parse(#[from] goblin::error::Error),
    /// The ELF is not for RISC-V.
    #[error("expected RISC-V ELF (machine 243), got machine type {0}")]
    WrongMachine(u16),
    /// The ELF is 64-bit.
    #[error("expected 32-bit ELF, got 64-bit")]
    Not32Bit,
    /// The ELF is big-endian.
    #[error("expected little-endian ELF")]
    BigEndian,
    /// A header field does not fit in 32 bits.
    #[error("{field} {value:#x} doesn't fit in u32")]
    FieldOverflow {
        /// Which field.
        field: &'static str,
        /// Its value.
        value: u64,
    },
    /// A segment or image lies outside guest memory.
    #[error("{len:#x} bytes at {addr:#010x} exceed memory {start:#010x}..{end:#010x}")]
    OutOfMemory {
        /// Load address.
        addr: u32,
        /// Bytes to place.
        len: u64,
        /// First guest address.
        start: u32,
        /// One past the last guest address.
        end: u32,
    },
    /// A segment's file data extends past the end of the file.
    #[error("segment file data at offset {offset} size {size} exceeds ELF size {file_size}")]
    Truncated {
        /// Offset in the file.
        offset: usize,
        /// Size in the file.
        size: usize,
        /// Length of the file.
        file_size: usize,
    },
    /// The start address is outside guest memory.
    #[error("entry point {0:#010x} is outside guest memory")]
    EntryOutOfRange(u32),
}

/// A program placed in fresh guest memory, ready to run.
#[derive(Debug, Clone)]
pub struct LoadedProgram {
    /// Registers with PC, sp and (for ELF) gp set up.
    pub cpu: Cpu,
    /// Guest memory holding the program.
    pub memory: Memory,
    /// Address ranges holding code.
    pub text: Vec<Range<u32>>,
}

impl LoadedProgram {
    /// The start address.
    #[must_use]
    pub fn entry(&self) -> u32 {
        self.cpu.pc
    }
}

/// Whether `bytes` start with the ELF magic.
#[must_use]
pub fn is_elf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"\x7fELF")
}

/// Read and load a program file, detecting ELF by its magic number.
///
/// # Errors
///
/// Returns a [`LoadError`] if the file cannot be read or the program does
/// not fit the configured memory.
pub fn load_file(path: &Path, config: &VmConfig) -> Result<LoadedProgram, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), len = bytes.len(), "loading program");
    load_bytes(&bytes, config)
}

/// Load a program image, detecting ELF by its magic number.
///
/// # Errors
///
/// Returns a [`LoadError`] if the program does not fit the configured memory.
pub fn load_bytes(bytes: &[u8], config: &VmConfig) -> Result<LoadedProgram, LoadError> {
    if is_elf(bytes) {
        load_elf(bytes, config)
    } else {
        load_flat(bytes, config)
    }
}

/// Place a flat binary image at the memory base. Execution starts at the
/// configured entry, or the memory base.
///
/// # Errors
///
/// Returns [`LoadError::OutOfMemory`] if the image is larger than memory.
pub fn load_flat(image: &[u8], config: &VmConfig) -> Result<LoadedProgram, LoadError> {
    let mut memory = Memory::new(config.memory_size, config.memory_base);
    let base = memory.base();
    let len = u32::try_from(image.len())
        .ok()
        .filter(|&len| len <= memory.size())
        .ok_or(LoadError::OutOfMemory {
            addr: base,
            len: image.len() as u64,
            start: base,
            end: memory.end(),
        })?;
    memory
        .store_bytes(base, image)
        .map_err(|_| out_of_memory(&memory, base, u64::from(len)))?;

    let entry = config.entry.unwrap_or(base);
    finish(memory, entry, vec![base..base + len], None, config)
}

/// Load a RISC-V 32-bit little-endian ELF executable.
///
/// `PT_LOAD` segments are copied into memory (the rest of each segment is
/// left zeroed). The PC is set to the configured entry or the ELF entry
/// point; gp is set from `__global_pointer$` when the symbol is present.
///
/// # Errors
///
/// Returns a [`LoadError`] if the ELF is invalid, not RISC-V 32-bit, or
/// segments don't fit in memory.
pub fn load_elf(elf_bytes: &[u8], config: &VmConfig) -> Result<LoadedProgram, LoadError> {
    let elf = Elf::parse(elf_bytes)?;
    validate_elf_header(&elf)?;

    let mut memory = Memory::new(config.memory_size, config.memory_base);
    let mut text = Vec::new();

    for phdr in elf.program_headers.iter().filter(|p| p.p_type == PT_LOAD) {
        let range = load_segment(&mut memory, elf_bytes, phdr)?;
        if phdr.p_flags & PF_X != 0 && !range.is_empty() {
            text.push(range);
        }
    }

    let entry = match config.entry {
        Some(entry) => entry,
        None => narrow("entry point", elf.entry)?,
    };
    finish(memory, entry, text, find_global_pointer(&elf), config)
}

fn finish(
    memory: Memory,
    entry: u32,
    text: Vec<Range<u32>>,
    gp: Option<u32>,
    config: &VmConfig,
) -> Result<LoadedProgram, LoadError> {
    if !memory.contains(entry) {
        return Err(LoadError::EntryOutOfRange(entry));
    }

    let mut cpu = Cpu::with_pc(entry);
    cpu.write_reg(SP, config.initial_sp());
    if let Some(gp) = gp {
        cpu.write_reg(GP, gp);
    }

    debug!(
        entry = format_args!("{entry:#010x}"),
        segments = text.len(),
        "program loaded"
    );
    Ok(LoadedProgram { cpu, memory, text })
}

/// Validate the ELF header for RISC-V 32-bit.
fn validate_elf_header(elf: &Elf) -> Result<(), LoadError> {
    if elf.header.e_machine != goblin::elf::header::EM_RISCV {
        return Err(LoadError::WrongMachine(elf.header.e_machine));
    }
    if elf.is_64 {
        return Err(LoadError::Not32Bit);
    }
    if !elf.little_endian {
        return Err(LoadError::BigEndian);
    }
    Ok(())
}

/// Copy one program segment into memory, returning the range it occupies.
fn load_segment(
    memory: &mut Memory,
    elf_bytes: &[u8],
    phdr: &goblin::elf::ProgramHeader,
) -> Result<Range<u32>, LoadError> {
    let vaddr = narrow("segment vaddr", phdr.p_vaddr)?;
    let memsz = narrow("segment memsz", phdr.p_memsz)?;
    let filesz = usize::try_from(phdr.p_filesz).map_err(|_| LoadError::FieldOverflow {
        field: "segment filesz",
        value: phdr.p_filesz,
    })?;
    let offset = usize::try_from(phdr.p_offset).map_err(|_| LoadError::FieldOverflow {
        field: "segment offset",
        value: phdr.p_offset,
    })?;

    let end = vaddr
        .checked_add(memsz)
        .filter(|&end| vaddr >= memory.base() && end <= memory.end())
        .ok_or_else(|| out_of_memory(memory, vaddr, u64::from(memsz)))?;

    if filesz > 0 {
        let data = offset
            .checked_add(filesz)
            .and_then(|file_end| elf_bytes.get(offset..file_end))
            .ok_or(LoadError::Truncated {
                offset,
                size: filesz,
                file_size: elf_bytes.len(),
            })?;
        memory
            .store_bytes(vaddr, data)
            .map_err(|_| out_of_memory(memory, vaddr, phdr.p_filesz))?;
    }

    // BSS (memsz > filesz) is already zero-initialized in Memory::new()
    Ok(vaddr..end)
}

fn narrow(field: &'static str, value: u64) -> Result<u32, LoadError> {
    u32::try_from(value).map_err(|_| LoadError::FieldOverflow { field, value })
}

fn out_of_memory(memory: &Memory, addr: u32, len: u64) -> LoadError {
    LoadError::OutOfMemory {
        addr,
        len,
        start: memory.base(),
        end: memory.end(),
    }
}

/// Find the global pointer symbol value if present.
fn find_global_pointer(elf: &Elf) -> Option<u32> {
    elf.syms
        .iter()
        .find(|sym| elf.strtab.get_at(sym.st_name) == Some("__global_pointer$"))
        .and_then(|sym| u32::try_from(sym.st_value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal ELF32 executable with one loadable segment.
    fn tiny_elf(machine: u16, entry: u32, vaddr: u32, code: &[u8], memsz: u32) -> Vec<u8> {
        const EHSIZE: u32 = 52;
        const PHENTSIZE: u32 = 32;
        let code_offset = EHSIZE + PHENTSIZE;
        let filesz = u32::try_from(code.len()).unwrap();

        let mut elf = Vec::new();
        elf.extend_from_slice(b"\x7fELF");
        // 32-bit, little-endian, version 1
        elf.extend_from_slice(&[1, 1, 1, 0]);
        elf.extend_from_slice(&[0; 8]);
        elf.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        elf.extend_from_slice(&machine.to_le_bytes());
        elf.extend_from_slice(&1u32.to_le_bytes());
        elf.extend_from_slice(&entry.to_le_bytes());
        elf.extend_from_slice(&EHSIZE.to_le_bytes()); // e_phoff
        elf.extend_from_slice(&0u32.to_le_bytes()); // e_shoff
        elf.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        elf.extend_from_slice(&52u16.to_le_bytes());
        elf.extend_from_slice(&32u16.to_le_bytes());
        elf.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
        elf.extend_from_slice(&40u16.to_le_bytes());
        elf.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
        elf.extend_from_slice(&0u16.to_le_bytes());
        assert_eq!(elf.len(), 52);

        elf.extend_from_slice(&PT_LOAD.to_le_bytes());
        elf.extend_from_slice(&code_offset.to_le_bytes());
        elf.extend_from_slice(&vaddr.to_le_bytes());
        elf.extend_from_slice(&vaddr.to_le_bytes());
        elf.extend_from_slice(&filesz.to_le_bytes());
        elf.extend_from_slice(&memsz.to_le_bytes());
        elf.extend_from_slice(&(PF_X | 4).to_le_bytes()); // R + X
        elf.extend_from_slice(&4u32.to_le_bytes());
        assert_eq!(elf.len(), 84);

        elf.extend_from_slice(code);
        elf
    }

    fn config() -> VmConfig {
        VmConfig {
            memory_size: 0x1000,
            memory_base: 0x1_0000,
            ..VmConfig::default()
        }
    }

    #[test]
    fn test_load_elf() {
        // addi a0, x0, 42
        let code = 0x02A0_0513u32.to_le_bytes();
        let elf = tiny_elf(goblin::elf::header::EM_RISCV, 0x1_0000, 0x1_0000, &code, 16);

        let program = load_bytes(&elf, &config()).unwrap();

        assert_eq!(program.entry(), 0x1_0000);
        assert_eq!(program.memory.load_u32(0x1_0000).unwrap(), 0x02A0_0513);
        assert_eq!(program.memory.load_u32(0x1_0004).unwrap(), 0);
        assert_eq!(program.text, vec![0x1_0000..0x1_0010]);
        // End of memory, aligned down to 16
        assert_eq!(program.cpu.read_reg(SP), 0x1_1000);
    }

    #[test]
    fn test_wrong_machine() {
        let elf = tiny_elf(62, 0x1_0000, 0x1_0000, &[0; 4], 4);
        assert!(matches!(
            load_elf(&elf, &config()),
            Err(LoadError::WrongMachine(62))
        ));
        assert_eq!(
            LoadError::WrongMachine(62).to_string(),
            "expected RISC-V ELF (machine 243), got machine type 62"
        );
    }

    #[test]
    fn test_parse_error_converts() {
        let err = load_elf(b"\x7fELF", &config()).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_segment_outside_memory() {
        let elf = tiny_elf(goblin::elf::header::EM_RISCV, 0x1_0000, 0x2_0000, &[0; 4], 4);
        assert!(matches!(
            load_elf(&elf, &config()),
            Err(LoadError::OutOfMemory { addr: 0x2_0000, .. })
        ));
    }

    #[test]
    fn test_invalid_elf_bytes() {
        let result = load_elf(&[0x7f, b'E', b'L', b'F', 1], &config());
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_load_flat() {
        let image = [0x13, 0, 0, 0, 0x73, 0, 0x10, 0];
        let config = VmConfig {
            stack_top: Some(0x1_0800),
            ..config()
        };

        let program = load_bytes(&image, &config).unwrap();

        assert_eq!(program.entry(), 0x1_0000);
        assert_eq!(program.memory.load_u32(0x1_0004).unwrap(), 0x0010_0073);
        assert_eq!(program.text, vec![0x1_0000..0x1_0008]);
        assert_eq!(program.cpu.read_reg(SP), 0x1_0800);
    }

    #[test]
    fn test_flat_image_too_large() {
        let image = vec![0u8; 0x1001];
        assert!(matches!(
            load_flat(&image, &config()),
            Err(LoadError::OutOfMemory { len: 0x1001, .. })
        ));
    }

    #[test]
    fn test_entry_outside_memory() {
        let config = VmConfig {
            entry: Some(0x4000),
            ..config()
        };
        assert!(matches!(
            load_flat(&[0; 4], &config),
            Err(LoadError::EntryOutOfRange(0x4000))
        ));
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_file(&dir.path().join("missing.bin"), &config());
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
