//! Batch identity.

use crate::domain::error::{QaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A timestamped lifecycle marker in a batch's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchEvent {
    /// What happened.
    pub label: String,

    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

/// The unit under test: one delivered batch directory.
///
/// Immutable once identified. The id is the directory name and is never
/// empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Batch {
    id: String,
    path: PathBuf,
    events: Vec<BatchEvent>,
}

impl Batch {
    /// Identify the batch stored in the directory at `path`.
    ///
    /// Relative paths are resolved against the current directory. Fails with
    /// [`QaError::NotADirectory`] unless the path is an existing directory.
    pub fn identify(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_dir(path.as_ref())?;
        if !path.is_dir() {
            return Err(QaError::NotADirectory { path });
        }

        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if id.is_empty() {
            return Err(QaError::UnnamedBatch { path });
        }

        Ok(Self {
            id,
            path,
            events: Vec::new(),
        })
    }

    /// The batch id (directory name).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute path of the batch directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lifecycle history. Always empty for batches identified from disk.
    pub fn events(&self) -> &[BatchEvent] {
        &self.events
    }
}

/// Absolute form of a batch directory path.
///
/// Paths ending in `..` have no file name until resolved, so those are
/// canonicalized; a path that cannot be resolved is returned absolute.
pub fn resolve_dir(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    if absolute.file_name().is_some() {
        return Ok(absolute);
    }
    Ok(std::fs::canonicalize(&absolute).unwrap_or(absolute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("B-42");
        std::fs::create_dir(&dir).expect("mkdir");

        let batch = Batch::identify(&dir).expect("identify");
        assert_eq!(batch.id(), "B-42");
        assert!(batch.path().is_absolute());
        assert!(batch.events().is_empty());
    }

    #[test]
    fn test_identify_trailing_dot_segments() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("B-7");
        std::fs::create_dir_all(dir.join("sub")).expect("mkdir");

        let batch = Batch::identify(dir.join(".")).expect("identify dot");
        assert_eq!(batch.id(), "B-7");

        let batch = Batch::identify(dir.join("sub").join("..")).expect("identify dotdot");
        assert_eq!(batch.id(), "B-7");
        assert_eq!(batch.path().file_name(), Some(std::ffi::OsStr::new("B-7")));
        assert!(batch.path().join("sub").is_dir());
    }

    #[test]
    fn test_identify_missing_path() {
        let err = Batch::identify("/tmp/does-not-exist-batchqa").unwrap_err();
        assert!(matches!(err, QaError::NotADirectory { .. }));
    }

    #[test]
    fn test_identify_regular_file() {
        let root = tempfile::tempdir().expect("tempdir");
        let file = root.path().join("page.pdf");
        std::fs::write(&file, b"%PDF").expect("write");

        let err = Batch::identify(&file).unwrap_err();
        assert!(matches!(err, QaError::NotADirectory { .. }));
    }
}
