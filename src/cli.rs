use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipper")]
#[command(version)]
#[command(about = "Pack a directory into a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipper photos                  pack ./photos into photos.zip\n  \
  zipper photos -o backup.zip    pack ./photos into backup.zip\n  \
  zipper                         ask for the folder and archive name")]
pub struct Cli {
    /// Directory to pack (asked for interactively when omitted)
    #[arg(value_name = "DIR")]
    pub source: Option<String>,

    /// Output archive (default: <DIR name>.zip)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<String>,

    /// Verbose logging (-vv => more)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, no preview or progress bar
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Default log filter for the verbosity count; `RUST_LOG` takes precedence.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
