use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransplantError {
    #[error(transparent)]
    Usage(#[from] clap::Error),
    #[error("a destination path is required unless --dry-run is given")]
    MissingDestination,
    #[error("invalid exclude pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("listing not found: {}", .0.display())]
    ListingNotFound(PathBuf),
    #[error("failed to read listing {}: {source}", .path.display())]
    ListingUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} already exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl TransplantError {
    /// Usage problems exit with 2, like clap does; everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            TransplantError::Usage(err) => err.exit_code(),
            TransplantError::MissingDestination
            | TransplantError::InvalidPattern { .. }
            | TransplantError::ListingNotFound(_) => 2,
            _ => 1,
        }
    }
}
