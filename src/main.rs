//! Main entry point for the zipper CLI application.
//!
//! Resolves the source directory and output archive (from arguments or
//! interactive prompts), runs the packing pipeline with a live progress bar,
//! and prints the run summary.
//!
//! Exit codes: 0 when every file was added (or there was nothing to add),
//! 1 on a fatal error, 2 when the archive was written but some files failed.

use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

use zipper::ui::{self, ConsoleProgress};
use zipper::{Cli, RunOutcome, pack};

/// Exit status for a run that produced an archive with failed entries.
const EXIT_PARTIAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!("run failed: {:?}", e);
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Run the pipeline once and map its outcome to an exit code.
fn run(cli: &Cli) -> Result<ExitCode> {
    let (source, output) = ui::resolve_inputs(cli)?;
    let mut progress = ConsoleProgress::new(&source, &output, cli.is_quiet());

    match pack(Path::new(&source), &output, &mut progress)? {
        RunOutcome::EmptySource { root } => {
            ui::print_empty(&root);
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Completed(report) => {
            ui::print_summary(&report);
            if report.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_PARTIAL))
            }
        }
    }
}
