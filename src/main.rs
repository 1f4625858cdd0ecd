//! Cotejar CLI - differential correctness harness
//!
//! Drives the full optimizer-configuration matrix of the fixed
//! power-iteration program: candidate (fused, code-generated) against
//! oracle (reference) with tolerance comparison and fusion-signature
//! verification.
//!
//! # Commands
//!
//! - `run` - Run the scenario matrix and report per-scenario verdicts
//! - `list` - Print the enumerated scenario matrix
//! - `info` - Show version info

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use cotejar::cli::{handle_info, handle_list, handle_run, OutputFormat};
use cotejar::scenario::{Backend, SuiteOptions};

/// Cotejar - differential correctness harness for fused numeric kernels
///
/// Validates that the auto-fused execution path of a PageRank-style power
/// iteration matches a trusted reference within an absolute tolerance, and
/// that the fused operator actually fired.
#[derive(Parser)]
#[command(name = "cotejar")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Single-node execution
    Local,
    /// Cluster execution mode (operator naming variant)
    Distributed,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => Backend::Local,
            BackendArg::Distributed => Backend::Distributed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenario matrix
    ///
    /// Examples:
    ///   cotejar run
    ///   cotejar run --rows 256 --cols 256 --format json
    ///   cotejar run --backend distributed
    Run {
        /// Link matrix rows
        #[arg(long, default_value_t = 1468)]
        rows: usize,

        /// Link matrix columns
        #[arg(long, default_value_t = 1468)]
        cols: usize,

        /// Damping factor
        #[arg(long, default_value_t = 0.85)]
        alpha: f64,

        /// Iteration count
        #[arg(long, default_value_t = 10)]
        maxiter: u32,

        /// Absolute comparison tolerance
        #[arg(long, default_value_t = 0.1)]
        tolerance: f64,

        /// Execution backend for every scenario
        #[arg(long, value_enum, default_value = "local")]
        backend: BackendArg,

        /// Report format: table or json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Print the enumerated scenario matrix
    List {
        /// Execution backend for every scenario
        #[arg(long, value_enum, default_value = "local")]
        backend: BackendArg,
    },

    /// Show version info
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            rows,
            cols,
            alpha,
            maxiter,
            tolerance,
            backend,
            format,
        } => {
            let Some(format) = OutputFormat::parse(&format) else {
                eprintln!("unknown format '{format}' (expected table or json)");
                return ExitCode::from(2);
            };
            let options = SuiteOptions {
                rows,
                cols,
                alpha,
                maxiter,
                abs_tolerance: tolerance,
                backend: backend.into(),
                ..SuiteOptions::default()
            };
            if handle_run(options, format) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::List { backend } => {
            let options = SuiteOptions {
                backend: backend.into(),
                ..SuiteOptions::default()
            };
            handle_list(&options);
            ExitCode::SUCCESS
        }
        Commands::Info => {
            handle_info();
            ExitCode::SUCCESS
        }
    }
}
