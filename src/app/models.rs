use globset::GlobSet;
use std::path::PathBuf;

/// Represents the final configuration after validating the CLI args.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub listing: PathBuf,
    pub destination: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
    /// Compiled `--exclude` patterns.
    pub exclude: GlobSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A single entry read from one listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    /// Nesting level, 1 for children of the root marker.
    pub depth: usize,
    pub kind: EntryKind,
    /// 1-based line number in the listing.
    pub line: usize,
}

/// Counts announced by the trailing `N directories, M files` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub directories: usize,
    pub files: Option<usize>,
}

/// What one rebuild pass did (or would do, in dry-run).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub directories: usize,
    pub files: usize,
    pub skipped: usize,
    pub excluded: usize,
    /// Entries classified per kind, whether created, excluded or not.
    pub listed_directories: usize,
    pub listed_files: usize,
    pub summary: Option<Summary>,
}

impl RebuildReport {
    /// True when the summary line disagrees with what was listed.
    ///
    /// `tree` never counts the root, and hand-written listings often do, so
    /// a difference of one directory is common and not an error.
    pub fn summary_mismatch(&self) -> bool {
        let Some(summary) = self.summary else {
            return false;
        };
        let files_differ = summary
            .files
            .is_some_and(|files| files != self.listed_files);
        summary.directories != self.listed_directories || files_differ
    }
}
