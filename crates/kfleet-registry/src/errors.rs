//! Registry error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading or writing the fleet file.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The fleet file is not a JSON array of devices.
    #[error("malformed fleet file {}: {source}", path.display())]
    Json {
        /// Fleet file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Replacing the fleet file with its rewritten copy failed.
    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        /// Fleet file.
        path: PathBuf,
        /// Underlying error.
        source: tempfile::PersistError,
    },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
