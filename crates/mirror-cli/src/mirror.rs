//! Wiring from parsed arguments to a running engine

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use mirror_core::config::DEFAULT_CONFIG_FILE;
use mirror_core::{
    CompareMode, MirrorConfig, OperationLog, PassReport, SyncEngine, SyncOperation, SyncOptions,
    SyncTarget, Ticker,
};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Validate inputs, then run the polling loop (or a single pass).
pub fn run(cli: &Cli) -> Result<()> {
    // Roots first: a bad path must stop us before anything is touched.
    let target = SyncTarget::new(&cli.source, &cli.replica)?;
    let config = load_config(cli.config.as_deref())?;
    let options = sync_options(cli, &config);

    if cli.dry_run {
        return dry_run(target, options);
    }

    let log = OperationLog::open(&cli.log_file)?;
    let mut engine = SyncEngine::new(target, log, options);

    if cli.once {
        return finish(engine.run_pass());
    }

    let ticker = Ticker::new(config.effective_interval(Duration::from_secs(cli.interval)));
    if config.debug_mode {
        tracing::warn!(
            interval_secs = ticker.interval().as_secs(),
            "Debug mode: requested interval ignored"
        );
    }

    tracing::info!(
        source = %engine.target().source().display(),
        replica = %engine.target().replica().display(),
        interval_secs = ticker.interval().as_secs(),
        log = %engine.sink().path().display(),
        "Starting mirror"
    );

    engine.run(&ticker);
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<MirrorConfig> {
    let config = match explicit {
        Some(path) => MirrorConfig::load(path)?,
        None => MirrorConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

fn sync_options(cli: &Cli, config: &MirrorConfig) -> SyncOptions {
    SyncOptions {
        compare: if cli.checksum {
            CompareMode::Checksum
        } else {
            config.compare
        },
        dry_run: cli.dry_run,
    }
}

fn dry_run(target: SyncTarget, options: SyncOptions) -> Result<()> {
    let mut engine = SyncEngine::new(target, Vec::<SyncOperation>::new(), options);
    let report = engine.run_pass();

    if report.operations.is_empty() {
        println!("{} Replica already matches source.", "OK".green().bold());
    }
    for operation in &report.operations {
        println!("{} Would: {}", "[dry-run]".yellow(), operation);
    }

    finish(report)
}

fn finish(report: PassReport) -> Result<()> {
    if report.has_errors() {
        for error in &report.errors {
            eprintln!("   {} {}", "-".red(), error);
        }
        return Err(CliError::user(format!("Pass incomplete: {report}")));
    }
    Ok(())
}
