//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// busylight - shared busy indicator demo
#[derive(Debug, Parser)]
#[command(
    name = "bl",
    about = "Drive a shared busy indicator from concurrent start/stop signals",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send random start/stop signals on an interval until Ctrl-C
    Demo {
        /// Milliseconds between signals
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Milliseconds the indicator stays up after the last stop
        #[arg(short, long)]
        keep_open_ms: Option<u64>,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration_secs: Option<u64>,
    },

    /// Run random operations through the indicator and report how they ended
    Simulate {
        /// Number of operations
        #[arg(short, long)]
        operations: Option<usize>,

        /// Longest single operation in milliseconds
        #[arg(short, long)]
        max_duration_ms: Option<u64>,

        /// Milliseconds the indicator stays up after the last stop
        #[arg(short, long)]
        keep_open_ms: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Where the log file lives
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("busylight")
        .join("logs")
        .join("busylight.log")
}

/// Output format for reports
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
