//! Terminal front end: input prompts, pre-run preview, live progress and the
//! final summary.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use console::style;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::Cli;
use crate::config::{compression_label, default_output_name, resolve_output_path};
use crate::io::{FileEntry, FileList};
use crate::progress::{Progress, Stage};
use crate::report::{EntryResult, RunReport};

const BAR_TEMPLATE: &str =
    "{spinner:.magenta} [{elapsed_precise}] [{bar:34.magenta/blue}] {pos}/{len} ({percent}%) ETA {eta} {wide_msg}";

/// Source directory and output path for a run.
///
/// Missing values are asked for interactively when stdin is a terminal.
pub fn resolve_inputs(cli: &Cli) -> Result<(String, PathBuf)> {
    if let Some(source) = &cli.source {
        return Ok((source.clone(), resolve_output_path(source, cli.output.as_deref())));
    }
    if !std::io::stdin().is_terminal() {
        bail!("no source directory given (pass DIR or run interactively)");
    }

    let theme = ColorfulTheme::default();
    let source: String = Input::with_theme(&theme)
        .with_prompt("Folder to pack")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("a folder is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let source = source.trim().to_string();

    let output = match &cli.output {
        Some(output) => output.clone(),
        None => Input::with_theme(&theme)
            .with_prompt("Output archive")
            .default(default_output_name(&source))
            .interact_text()?,
    };
    let output = resolve_output_path(&source, Some(&output));
    Ok((source, output))
}

/// [`Progress`] implementation drawing an indicatif bar on stderr.
pub struct ConsoleProgress {
    source: String,
    output: PathBuf,
    quiet: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(source: &str, output: &Path, quiet: bool) -> Self {
        Self {
            source: source.to_string(),
            output: output.to_path_buf(),
            quiet,
            bar: None,
        }
    }

    fn print_preview(&self, files: &FileList) {
        let rows = [
            ("Source", self.source.clone()),
            ("Output", self.output.display().to_string()),
            ("Files found", files.len().to_string()),
            ("Total size", format_size(files.total_bytes())),
            ("Compression", compression_label()),
        ];
        eprintln!("{}", style("Ready to pack").magenta().bold());
        for (label, value) in rows {
            eprintln!("  {:>12}  {}", style(label).dim(), style(value).bold());
        }
        eprintln!();
    }
}

impl Progress for ConsoleProgress {
    fn stage(&mut self, stage: Stage) {
        let Some(bar) = &self.bar else {
            return;
        };
        match stage {
            Stage::Finalizing => bar.set_message("writing central directory"),
            Stage::Reported => bar.finish_with_message(style("done").green().to_string()),
            _ => {}
        }
    }

    fn scanned(&mut self, files: &FileList) {
        if self.quiet {
            return;
        }
        self.print_preview(files);

        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar = Some(bar);
    }

    fn entry_started(&mut self, _index: usize, entry: &FileEntry) {
        if let Some(bar) = &self.bar {
            bar.set_message(entry.archive_name.clone());
        }
    }

    // Failed entries are logged at warn level and listed in the summary
    fn entry_finished(&mut self, _index: usize, _result: &EntryResult) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

/// Final report after an archive was written.
pub fn print_summary(report: &RunReport) {
    println!();
    println!("{}", style("Summary").magenta().bold());
    let errors = if report.failed > 0 {
        style(report.failed.to_string()).red().bold()
    } else {
        style(report.failed.to_string()).dim()
    };
    println!("  {:<16} {}", "Files processed", report.total_files);
    println!("  {:<16} {}", "Added", style(report.succeeded).green().bold());
    println!("  {:<16} {}", "Errors", errors);
    println!("  {:<16} {}", "Archive size", format_size(report.output_size_bytes));
    if let Some(ratio) = report.compression_ratio() {
        println!("  {:<16} {:.1}%", "Ratio", ratio * 100.0);
    }
    println!("  {:<16} {:.2}s", "Total time", report.elapsed_seconds());
    println!(
        "  {:<16} {}/s",
        "Throughput",
        format_size(report.throughput_bytes_per_sec() as u64)
    );
    println!("  {:<16} {}", "Output", report.output_path.display());

    if !report.failures.is_empty() {
        println!();
        println!("{}", style("Files with errors").red().bold());
        for failure in &report.failures {
            println!("  {}  {}", style(&failure.archive_name).red(), style(&failure.message).dim());
        }
    }

    println!();
    if report.is_success() {
        println!(
            "{} {}",
            style("✔ Archive created:").green().bold(),
            report.output_path.display()
        );
    } else {
        println!(
            "{}",
            style(format!("Archive created with {} error(s).", report.failed)).yellow()
        );
    }
}

/// Message for a source directory without any files.
pub fn print_empty(root: &Path) {
    eprintln!(
        "{} no files found in {}",
        style("⚠").yellow().bold(),
        root.display()
    );
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```
/// use zipper::ui::format_size;
///
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_resolve_inputs_without_prompt() {
        let cli = Cli {
            source: Some("data/".to_string()),
            output: None,
            verbose: 0,
            quiet: true,
        };
        let (source, output) = resolve_inputs(&cli).unwrap();
        assert_eq!(source, "data/");
        assert_eq!(output, PathBuf::from("data.zip"));
    }

    #[test]
    fn test_quiet_progress_has_no_bar() {
        let mut progress = ConsoleProgress::new("src", Path::new("src.zip"), true);
        progress.scanned(&FileList::default());
        assert!(progress.bar.is_none());
        progress.entry_finished(0, &EntryResult::success("a", 1, 1));
        progress.stage(Stage::Reported);
    }
}
