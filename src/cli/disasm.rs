//! Disassembly command implementation.

use std::io::{self, Write};
use std::path::Path;

use vsim::{LoadedProgram, Registry, loader, registry};

use super::{CliError, ConfigOverrides, load_config};

/// Execute the disasm command.
///
/// # Errors
///
/// Returns an error if the program cannot be loaded or output fails.
pub(crate) fn execute(
    program: &Path,
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<(), CliError> {
    let config = load_config(config_path, overrides, None)?;
    let loaded = loader::load_file(program, &config)?;

    let mut out = io::stdout().lock();
    write_listing(&mut out, &loaded, registry())?;
    out.flush()?;
    Ok(())
}

/// Write one line per word of every code range: address, raw word, and
/// assembly (or `<invalid>`).
fn write_listing(out: &mut impl Write, program: &LoadedProgram, registry: &Registry) -> io::Result<()> {
    for range in &program.text {
        let mut addr = range.start;
        while addr.saturating_add(4) <= range.end {
            let Ok(word) = program.memory.load_u32(addr) else {
                break;
            };
            let marker = if addr == program.entry() { ">" } else { " " };
            match registry.decode(word) {
                Ok(inst) => writeln!(
                    out,
                    "{marker}{addr:08x}:  {word:08x}  {}",
                    registry.disassemble(inst)
                )?,
                Err(_) => writeln!(out, "{marker}{addr:08x}:  {word:08x}  <invalid>")?,
            }
            addr += 4;
        }
    }
    Ok(())
}
