//! Symbol graph error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while parsing definitions, coercing values, or doing
/// profile I/O.
#[derive(Debug, Error)]
pub enum KconfigError {
    /// A definition or profile file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed definition input.
    #[error("{}:{line}: {message}", file.display())]
    Syntax {
        /// File containing the error.
        file: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Diagnostic text.
        message: String,
    },

    /// A value was rejected by the symbol's declared type.
    #[error("invalid value '{value}' for {kind} symbol {name}")]
    InvalidValue {
        /// Symbol name.
        name: String,
        /// Rejected value.
        value: String,
        /// Declared type of the symbol.
        kind: &'static str,
    },

    /// The named symbol is not defined anywhere in the tree.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

impl KconfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn syntax(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

/// Result type for symbol graph operations.
pub type Result<T> = std::result::Result<T, KconfigError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
