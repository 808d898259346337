use srm_storage::StorageError;
use thiserror::Error;

/// Seed loading errors
#[derive(Debug, Error)]
pub enum SeedError {
    /// The document is malformed; `path` names the offending field
    #[error("validation error at {path}: {message}")]
    Validation { path: String, message: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SeedError {
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Field path of a validation error.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Validation { path, .. } => Some(path),
            Self::Storage(_) => None,
        }
    }
}

pub type SeedResult<T> = Result<T, SeedError>;
