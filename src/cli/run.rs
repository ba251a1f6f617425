//! Run command implementation.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use vsim::{Environment, RunResult, Vm, loader};

use super::output::{JsonRunResult, format_run_text};
use super::{CliError, ConfigOverrides, OutputFormat, load_config};

/// Execute the run command.
///
/// Text mode streams program output to stdout and the summary to stderr;
/// JSON mode captures program output into the result document.
///
/// # Errors
///
/// Returns an error if the configuration or program cannot be loaded.
pub(crate) fn execute(
    program: &Path,
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
    max_steps: Option<u64>,
    format: OutputFormat,
) -> Result<ExitCode, CliError> {
    let config = load_config(config_path, overrides, max_steps)?;
    let loaded = loader::load_file(program, &config)?;

    let result = match format {
        OutputFormat::Text => {
            let env = Environment::new(io::stdout().lock());
            let mut vm = Vm::with_state(loaded.cpu, loaded.memory, env);
            let result = vm.run(config.max_steps);
            vm.syscalls.into_inner().flush()?;
            eprintln!("{}", format_run_text(&result));
            result
        }
        OutputFormat::Json => {
            let mut vm = Vm::with_state(loaded.cpu, loaded.memory, Environment::new(Vec::new()));
            let result = vm.run(config.max_steps);
            let json = JsonRunResult::new(&result, &vm.cpu, vm.syscalls.output());
            println!("{}", serde_json::to_string_pretty(&json)?);
            result
        }
    };

    Ok(exit_code(&result))
}

/// The process exit status for a run: the program's own code (low 8 bits)
/// when it exited, failure otherwise.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn exit_code(result: &RunResult) -> ExitCode {
    match *result {
        RunResult::Halted { code, .. } => ExitCode::from(code as u8),
        RunResult::Trap { .. } | RunResult::StepLimit { .. } => ExitCode::FAILURE,
    }
}
