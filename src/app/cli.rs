use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "transplant",
    author,
    version,
    about = "Recreate an empty directory skeleton from a `tree` listing"
)]
pub struct Cli {
    /// Text file containing the tree listing
    pub listing: PathBuf,

    /// Root under which the structure is recreated (optional with --dry-run)
    pub destination: Option<PathBuf>,

    /// Parse and report only, never touch the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Log every entry and every skipped line
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Patterns for entries to leave out (matched against the path below the destination)
    #[arg(long, num_args = 1..)]
    pub exclude: Option<Vec<String>>,
}
