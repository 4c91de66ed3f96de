//! Batch directory layout: locating, listing and classifying batch files.

use anyhow::Context;
use batchqa_core::{Batch, QaConfig};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Role of a file within a batch.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Content file destined for bit storage, requires a checksum.
    Data,

    /// Checksum companion of a data file.
    Checksum,

    /// Anything else, mostly metadata.
    Other,
}

/// One file found in a batch.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchFile {
    /// Path relative to the batch directory, `/`-separated.
    pub relative: String,

    #[serde(skip)]
    pub path: PathBuf,

    pub size: u64,

    pub kind: FileKind,
}

/// File naming conventions taken from the configuration.
#[derive(Debug, Clone)]
pub struct FileLayout {
    batches_folder: Option<PathBuf>,
    data_pattern: Regex,
    ignored: Option<Regex>,
    grouping_char: String,
    checksum_postfix: String,
}

impl FileLayout {
    pub fn from_config(config: &QaConfig) -> anyhow::Result<Self> {
        let data_pattern = Regex::new(config.data_file_pattern())
            .with_context(|| format!("invalid data file pattern '{}'", config.data_file_pattern()))?;
        let ignored = match config.ignored_files() {
            "" => None,
            pattern => Some(
                Regex::new(pattern)
                    .with_context(|| format!("invalid ignored files pattern '{pattern}'"))?,
            ),
        };

        Ok(Self {
            batches_folder: config.batches_folder(),
            data_pattern,
            ignored,
            grouping_char: config.grouping_char().to_string(),
            checksum_postfix: config.checksum_postfix().to_string(),
        })
    }

    /// Directory holding the content of `batch`.
    ///
    /// Resolved under the configured batches folder unless that folder is
    /// the one the batch was identified in, in which case the identified
    /// directory is used as is.
    pub fn batch_root(&self, batch: &Batch) -> PathBuf {
        match &self.batches_folder {
            Some(folder) if !folder.as_os_str().is_empty() && batch.path().parent() != Some(folder.as_path()) => {
                folder.join(batch.id())
            }
            _ => batch.path().to_path_buf(),
        }
    }

    pub fn checksum_postfix(&self) -> &str {
        &self.checksum_postfix
    }

    /// Classify a batch-relative path.
    pub fn classify(&self, relative: &str) -> FileKind {
        if !self.checksum_postfix.is_empty() && relative.ends_with(&self.checksum_postfix) {
            FileKind::Checksum
        } else if self.data_pattern.is_match(relative) {
            FileKind::Data
        } else {
            FileKind::Other
        }
    }

    pub fn is_ignored(&self, relative: &str) -> bool {
        self.ignored.as_ref().is_some_and(|re| re.is_match(relative))
    }

    /// Group key of a batch-relative path: its directory plus the file name
    /// up to the first grouping character.
    pub fn group_of<'a>(&self, relative: &'a str) -> &'a str {
        let name_start = relative.rfind('/').map(|i| i + 1).unwrap_or(0);
        if self.grouping_char.is_empty() {
            return relative;
        }
        match relative[name_start..].find(self.grouping_char.as_str()) {
            Some(i) => &relative[..name_start + i],
            None => relative,
        }
    }

    /// List all non-ignored files under `root`, sorted by relative path.
    pub fn scan(&self, root: &Path) -> anyhow::Result<Vec<BatchFile>> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root) {
            // The walkdir error already names the path and its io source
            let entry = entry.map_err(|err| anyhow::anyhow!("failed to read batch directory: {err}"))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .with_context(|| format!("{} escapes the batch directory", entry.path().display()))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if self.is_ignored(&relative) {
                continue;
            }

            let size = entry
                .metadata()
                .with_context(|| format!("failed to stat {}", entry.path().display()))?
                .len();
            files.push(BatchFile {
                kind: self.classify(&relative),
                relative,
                path: entry.into_path(),
                size,
            });
        }
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(files)
    }

    /// [`scan`](Self::scan) on the blocking pool.
    pub async fn scan_blocking(&self, root: PathBuf) -> anyhow::Result<Vec<BatchFile>> {
        let layout = self.clone();
        tokio::task::spawn_blocking(move || layout.scan(&root))
            .await
            .context("batch scan task failed")?
    }
}
