use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error taxonomy for compilation, store access and loading.
///
/// `NotPresent` is the only locally recoverable kind: an optional file or
/// feature is simply absent and callers may continue without it. Everything
/// else is fatal for the operation that produced it.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error("not present: {0}")]
    NotPresent(String),

    #[error("store version mismatch: found {found}, expected {expected}")]
    SchemaMismatch { found: String, expected: String },

    #[error("{}:{line}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("corrupt store file {}: {message} (recompile the store)", path.display())]
    Corruption { path: PathBuf, message: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compilation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, FabricError>;

impl FabricError {
    pub fn not_present(what: impl Into<String>) -> Self {
        FabricError::NotPresent(what.into())
    }

    pub fn malformed(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        FabricError::Malformed {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn corruption(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        FabricError::Corruption {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        FabricError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn is_not_present(&self) -> bool {
        matches!(self, FabricError::NotPresent(_))
    }

    /// Exit code for external CLI drivers: `0` success, `2` usage,
    /// `3` compile failure, `4` store corruption, `5` load failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            FabricError::Malformed { .. }
            | FabricError::InvariantViolation(_)
            | FabricError::Cancelled => 3,
            FabricError::Corruption { .. } => 4,
            FabricError::NotPresent(_)
            | FabricError::SchemaMismatch { .. }
            | FabricError::Io { .. } => 5,
        }
    }
}
