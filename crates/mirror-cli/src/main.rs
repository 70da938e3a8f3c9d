//! Directory mirror CLI
//!
//! Validates the two roots, then keeps the replica in line with the source
//! until the process is terminated.

mod cli;
mod error;
mod logging;
mod mirror;

use clap::Parser;
use colored::Colorize;

use cli::Cli;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose)?;
    tracing::debug!(?cli, "Parsed arguments");

    mirror::run(&cli)
}
