//! CLI command implementations for vsim.

pub(crate) mod disasm;
pub(crate) mod list;
pub(crate) mod run;

mod output;

use std::io;
use std::path::Path;

use clap::{Args, ValueEnum};
use thiserror::Error;
use vsim::{ConfigError, LoadError, VmConfig};

/// Output format for `run` and `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Command-line overrides for the memory layout.
#[derive(Debug, Clone, Copy, Default, Args)]
pub(crate) struct ConfigOverrides {
    /// Guest memory size in bytes (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_u32)]
    memory_size: Option<u32>,

    /// Guest memory base address (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_u32)]
    base: Option<u32>,
}

/// CLI error type.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Reading the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Loading the program failed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    /// Serializing JSON output failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a decimal or `0x`-prefixed hexadecimal number.
fn parse_u32(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number '{text}': {e}"))
}

/// Build the session configuration: defaults, then the config file, then
/// command-line overrides.
fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
    max_steps: Option<u64>,
) -> Result<VmConfig, CliError> {
    let mut config = match path {
        Some(path) => VmConfig::from_json_file(path)?,
        None => VmConfig::default(),
    };
    if let Some(size) = overrides.memory_size {
        config.memory_size = size;
    }
    if let Some(base) = overrides.base {
        config.memory_base = base;
    }
    if let Some(max_steps) = max_steps {
        config.max_steps = max_steps;
    }
    config.validate()?;
    Ok(config)
}
