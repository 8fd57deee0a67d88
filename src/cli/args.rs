use clap::{Parser, Subcommand};
use anyhow::Result;
use std::path::PathBuf;
use log::debug;

/// GitHub Repository Activity Tracker
#[derive(Parser, Debug)]
#[command(name = "gitometer")]
#[command(about = "Tracks GitHub repository activity: star and commit histories, rolling window counts and graph-ready monthly series")]
#[command(version)]
pub struct Args {
    /// Verbose output (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log format: text or json [default: text]
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Log file path for file output
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION", global = true)]
    pub config_name: Option<String>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    // ============ COLLECTION SETTINGS ============

    /// Snapshot store file (JSON)
    #[arg(long, value_name = "FILE", global = true)]
    pub store: Option<PathBuf>,

    /// Maximum number of pages a single listing may span
    #[arg(long, value_name = "N", global = true)]
    pub max_pages: Option<u32>,

    /// Pause between backward page fetches, in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub page_delay_ms: Option<u64>,

    /// Time budget for collecting one listing, in seconds (0 disables)
    #[arg(long, value_name = "SECS", global = true)]
    pub deadline_secs: Option<u64>,

    /// Number of repositories aggregated at the same time
    #[arg(long, value_name = "N", global = true)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Aggregate repositories and store their snapshots
    Aggregate {
        /// Repositories as OWNER/NAME or https://github.com/OWNER/NAME
        #[arg(value_name = "OWNER/NAME", required = true)]
        repositories: Vec<String>,

        /// Print the snapshots as JSON instead of summary lines
        #[arg(long)]
        json: bool,
    },

    /// List stored repositories, most stars first
    List,

    /// Print a stored snapshot as JSON
    Show {
        #[arg(value_name = "OWNER/NAME")]
        repository: String,

        /// Also show repositories younger than three months
        #[arg(long)]
        any_age: bool,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        anyhow::bail!("Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified");
    }

    if let Some(ref format) = args.log_format {
        match format.to_lowercase().as_str() {
            "text" | "json" => {}
            _ => anyhow::bail!("Invalid log format '{}'. Valid options: text, json", format),
        }
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => anyhow::bail!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace",
                level
            ),
        }

        if args.log_file.is_none() {
            anyhow::bail!("--log-file-level requires --log-file to be specified");
        }
    }

    if args.max_pages == Some(0) {
        anyhow::bail!("--max-pages must be greater than 0");
    }

    if args.concurrency == Some(0) {
        anyhow::bail!("--concurrency must be greater than 0");
    }

    Ok(())
}
