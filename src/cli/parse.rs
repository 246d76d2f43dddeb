//! CLI parse: clap types only. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lodgen CLI - structured hotel metadata generation
#[derive(Parser)]
#[command(name = "lodgen")]
#[command(about = "Generate structured hotel metadata from a generative language model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate metadata for a single hotel
    Generate {
        /// Country the hotel is in (required, non-blank)
        #[arg(long)]
        country: String,

        /// Hotel name (required, non-blank)
        #[arg(long = "name")]
        hotel_name: String,

        /// Optional city context
        #[arg(long)]
        city: Option<String>,

        /// Pre-resolved external identifier, echoed back unchanged
        #[arg(long)]
        external_id: Option<String>,

        /// Preferred source URL for description content (repeatable)
        #[arg(long = "source-url")]
        source_urls: Vec<String>,

        /// Directory to write the one-row CSV export into
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Stdout format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Process a batch of hotels from a CSV file
    Batch {
        /// Input CSV file; row 1 must be the header row
        input: PathBuf,

        /// Write results as a pretty-printed JSON array to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write results as CSV (input columns + appended columns) to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Seconds to wait before resuming after a rate-limit pause
        #[arg(long)]
        cooldown_secs: Option<u64>,
    },
    /// Write a starter lodgen.toml into the current directory
    Init {
        /// Overwrite an existing lodgen.toml
        #[arg(long)]
        force: bool,
    },
}
