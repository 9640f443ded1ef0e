//! Menu engine error types.

use std::path::PathBuf;

use kfleet_kconfig::KconfigError;
use thiserror::Error;

/// Errors surfaced by a [`Session`](crate::Session).
///
/// Inapplicable mutations (unknown names, invisible targets, bad choice
/// references) are not errors; the gatekeeper absorbs them.
#[derive(Debug, Error)]
pub enum MenuError {
    /// A query, mutation or save was attempted before a successful load.
    #[error("no definition tree loaded")]
    NotLoaded,

    /// The root definition file does not exist.
    #[error("definition file not found: {}", path.display())]
    DefinitionNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Malformed definitions, or a value the engine's type coercion rejects.
    #[error("parse failure: {0}")]
    ParseFailure(#[from] KconfigError),

    /// Filesystem failure outside of parsing (profile I/O, placeholder
    /// creation, working directory changes).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MenuError {
    /// Map an engine error from profile I/O: read/write failures become
    /// [`MenuError::Io`], anything else stays a parse failure.
    pub(crate) fn from_profile_io(err: KconfigError) -> Self {
        match err {
            KconfigError::Io { source, .. } => Self::Io(source),
            other => Self::ParseFailure(other),
        }
    }
}

/// Result type for menu engine operations.
pub type Result<T> = std::result::Result<T, MenuError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
