//! Session configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default guest memory size (1 MiB).
pub const DEFAULT_MEMORY_SIZE: u32 = 1 << 20;

/// Default guest memory base address.
pub const DEFAULT_MEMORY_BASE: u32 = 0x0001_0000;

/// Default step budget for a run.
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

/// Configuration for a simulation session.
///
/// Every field is optional in JSON; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
    /// Guest memory size in bytes.
    pub memory_size: u32,
    /// Address of the first byte of guest memory.
    pub memory_base: u32,
    /// Start address; defaults to the ELF entry point, or the memory base
    /// for flat images.
    pub entry: Option<u32>,
    /// Initial stack pointer; defaults to the end of memory, aligned down to
    /// 16 bytes.
    pub stack_top: Option<u32>,
    /// Instructions to execute before giving up.
    pub max_steps: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            memory_base: DEFAULT_MEMORY_BASE,
            entry: None,
            stack_top: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Error reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not a valid configuration.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The memory region does not fit the 32-bit address space.
    #[error("memory of {size:#x} bytes at {base:#010x} exceeds the 32-bit address space")]
    MemoryRange {
        /// Configured base.
        base: u32,
        /// Configured size.
        size: u32,
    },
}

impl VmConfig {
    /// Read a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid
    /// JSON for this structure, or describes an impossible memory region.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the memory region fits the address space.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MemoryRange`] if `memory_base + memory_size`
    /// overflows 32 bits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_base.checked_add(self.memory_size).is_none() {
            return Err(ConfigError::MemoryRange {
                base: self.memory_base,
                size: self.memory_size,
            });
        }
        Ok(())
    }

    /// One past the last guest address.
    #[must_use]
    pub fn memory_end(&self) -> u32 {
        self.memory_base.saturating_add(self.memory_size)
    }

    /// The initial stack pointer.
    #[must_use]
    pub fn initial_sp(&self) -> u32 {
        self.stack_top.unwrap_or(self.memory_end() & !0xF)
    }
}
