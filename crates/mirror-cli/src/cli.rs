//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;
use mirror_core::config::DEFAULT_INTERVAL_SECS;

/// Mirror a source directory onto a replica, one way, at a fixed interval
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to mirror from
    pub source: PathBuf,

    /// Directory made to match the source
    pub replica: PathBuf,

    /// Seconds between synchronization passes
    #[arg(default_value_t = DEFAULT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// File that operation records are appended to
    #[arg(default_value = "log.txt")]
    pub log_file: PathBuf,

    /// Project config file [default: ./mirror.toml, if present]
    #[arg(long, value_name = "PATH", env = "MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Show what one pass would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Compare file content by SHA-256 instead of size and mtime
    #[arg(long)]
    pub checksum: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
