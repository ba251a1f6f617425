//! vsim CLI - run, disassemble and list RISC-V programs.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// vsim - a RISC-V instruction-set simulator
#[derive(Parser, Debug)]
#[command(name = "vsim")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program until it exits, traps, or runs out of steps
    Run {
        /// ELF executable or flat binary image
        #[arg(required = true)]
        program: PathBuf,

        /// JSON session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: cli::ConfigOverrides,

        /// Maximum instructions to execute
        #[arg(short = 'n', long)]
        max_steps: Option<u64>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Log every executed instruction to stderr
        #[arg(long)]
        trace: bool,
    },

    /// Disassemble the code of a program
    Disasm {
        /// ELF executable or flat binary image
        #[arg(required = true)]
        program: PathBuf,

        /// JSON session configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: cli::ConfigOverrides,
    },

    /// List the supported instructions
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` is honoured unless
/// `trace` forces instruction-level logging.
fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    let trace = matches!(args.command, Commands::Run { trace: true, .. });
    init_logging(trace);

    let result = match args.command {
        Commands::Run {
            program,
            config,
            overrides,
            max_steps,
            format,
            trace: _,
        } => cli::run::execute(&program, config.as_deref(), overrides, max_steps, format),

        Commands::Disasm {
            program,
            config,
            overrides,
        } => cli::disasm::execute(&program, config.as_deref(), overrides).map(|()| ExitCode::SUCCESS),

        Commands::List { format } => cli::list::execute(format).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
