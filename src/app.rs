// Declare modules
pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod models;
pub mod rebuilder;

use anyhow::{Context, Result};
use std::env;

use self::config::parse_args;
use self::models::RuntimeConfig;
use self::rebuilder::Rebuilder;

/// Initializes components and orchestrates data flow.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let config = parse_args(env::args_os().skip(1))?;

    // 2. Logging, now that we know how chatty to be
    init_logger(&config);

    // 3. Rebuild
    let rebuilder = Rebuilder::from_config(&config);
    let report = rebuilder
        .rebuild_file(&config.listing)
        .with_context(|| format!("Failed to rebuild {}", config.listing.display()))?;

    // 4. Report
    let verb = if config.dry_run { "would create" } else { "created" };
    log::info!(
        "{} {} directories and {} files ({} excluded, {} lines skipped)",
        verb,
        report.directories,
        report.files,
        report.excluded,
        report.skipped
    );

    Ok(())
}

fn init_logger(config: &RuntimeConfig) {
    let level = if config.verbose { "info" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
