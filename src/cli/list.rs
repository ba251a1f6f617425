//! Instruction listing command implementation.

use vsim::registry;

use super::output::JsonInstruction;
use super::{CliError, OutputFormat};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn execute(format: OutputFormat) -> Result<(), CliError> {
    let registry = registry();
    match format {
        OutputFormat::Text => {
            // Blank line between entries
            for desc in registry.iter() {
                println!("{desc}\n");
            }
            println!("{} instructions", registry.len());
        }
        OutputFormat::Json => {
            let list: Vec<JsonInstruction> = registry.iter().map(JsonInstruction::from).collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
    }
    Ok(())
}
