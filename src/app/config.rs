use crate::app::cli::Cli;
use crate::app::error::TransplantError;
use crate::app::models::RuntimeConfig;
use clap::Parser;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::ffi::OsString;

/// Parses command-line tokens (program name excluded) into a validated config.
pub fn parse_args<I, T>(args: I) -> Result<RuntimeConfig, TransplantError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let tokens = std::iter::once(OsString::from(env!("CARGO_PKG_NAME")))
        .chain(args.into_iter().map(Into::into));
    let cli = Cli::try_parse_from(tokens)?;
    resolve_config(cli)
}

pub fn resolve_config(cli: Cli) -> Result<RuntimeConfig, TransplantError> {
    if !cli.listing.exists() {
        return Err(TransplantError::ListingNotFound(cli.listing));
    }

    if cli.destination.is_none() && !cli.dry_run {
        return Err(TransplantError::MissingDestination);
    }

    // Surface bad globs now rather than halfway through a rebuild
    let exclude = build_globset(&cli.exclude.unwrap_or_default())?;

    Ok(RuntimeConfig {
        listing: cli.listing,
        destination: cli.destination,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        exclude,
    })
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet, TransplantError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|source| TransplantError::InvalidPattern {
            pattern: pat.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| TransplantError::InvalidPattern {
            pattern: patterns.join(" "),
            source,
        })
}
