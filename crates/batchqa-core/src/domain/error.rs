//! Domain-level error taxonomy for batch QA.
//!
//! These errors are fatal and only occur before the pipeline starts. Anything
//! that goes wrong while a component executes is recorded as a failure entry
//! instead.

use std::path::PathBuf;

/// Batch QA setup errors.
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("batch directory has no name: {}", path.display())]
    UnnamedBatch { path: PathBuf },

    #[error("invalid property definition '{0}', expected KEY=VALUE")]
    InvalidProperty(String),

    #[error("setup error: {0}")]
    Setup(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl QaError {
    /// Whether this error stems from bad operator input rather than the
    /// environment.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            QaError::NotADirectory { .. } | QaError::UnnamedBatch { .. } | QaError::InvalidProperty(_)
        )
    }
}

/// Result type for batch QA setup operations.
pub type Result<T> = std::result::Result<T, QaError>;
