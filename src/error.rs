//! Error types for the photo importer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photo importer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the photo importer
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("exiftool not found at {path}. Install exiftool or set the executable path")]
    ExifToolNotFound { path: PathBuf },

    #[error("Failed to launch exiftool for {path}: {message}")]
    ExifToolLaunch { path: PathBuf, message: String },

    #[error("exiftool timed out after {timeout_secs}s for {path}")]
    ExifToolTimeout { path: PathBuf, timeout_secs: u64 },

    #[error("Failed to create destination directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{role} directory is not set")]
    DirectoryNotSet { role: &'static str },

    #[error("{role} directory {path} does not exist or is not a directory")]
    DirectoryMissing { role: &'static str, path: PathBuf },

    #[error("Source directory {path} has no entries, nothing to do")]
    SourceEmpty { path: PathBuf },

    #[error("A run is already in progress")]
    RunInProgress,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Precondition errors are reported before any work starts and never
    /// spawn a worker.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::DirectoryNotSet { .. }
                | Error::DirectoryMissing { .. }
                | Error::SourceEmpty { .. }
                | Error::RunInProgress
        )
    }
}
