//! Configuration bundle handed to check components.
//!
//! Properties are layered, highest precedence first:
//! 1. explicit definitions (`-D key=value` on the command line)
//! 2. environment variables, `BATCHQA_` + key upper-cased with `.` as `_`
//! 3. defaults, applied only to keys that are still unset
//!
//! The pipeline core never reads this bundle; components pick out the keys
//! they understand when they are constructed.

use crate::domain::batch::resolve_dir;
use crate::domain::error::{QaError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Recognized property keys.
pub mod keys {
    /// Folder the batches reside in.
    pub const BATCHES_FOLDER: &str = "iterator.filesystem.batches.folder";
    /// Whether the tool runs on the production storage platform.
    pub const AT_NINESTARS: &str = "atNinestars";
    /// Working directory for structure checking.
    pub const STRUCTURE_STORAGE_DIR: &str = "autonomous.batch.structure.storageDir";
    /// Worker concurrency hint for heavy checking work.
    pub const THREADS_PER_BATCH: &str = "threadsPerBatch";
    /// Regex matching data files (files with checksums that go to bit storage).
    pub const DATA_FILE_PATTERN: &str = "iterator.datafilePattern";
    /// Character separating a file group prefix from the rest of the name.
    pub const GROUPING_CHAR: &str = "iterator.filesystem.groupingChar";
    /// Suffix of checksum companion files.
    pub const CHECKSUM_POSTFIX: &str = "iterator.filesystem.checksumPostfix";
    /// Regex of file names to ignore; empty ignores nothing.
    pub const IGNORED_FILES: &str = "iterator.filesystem.ignoredFiles";
}

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "BATCHQA_";

/// Assembled key/value configuration.
#[derive(Debug)]
pub struct QaConfig {
    properties: BTreeMap<String, String>,
    // Removed when the config is dropped
    scratch: Option<TempDir>,
}

impl QaConfig {
    /// Assemble the configuration for the batch at `batch_path`, reading
    /// overrides from the process environment.
    pub fn assemble(batch_path: &Path, defines: &[String]) -> Result<Self> {
        Self::assemble_with(batch_path, defines, |var| std::env::var(var).ok())
    }

    /// Assemble with an explicit environment lookup.
    pub fn assemble_with<F>(batch_path: &Path, defines: &[String], env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            properties: BTreeMap::new(),
            scratch: None,
        };

        for define in defines {
            let (key, value) = parse_define(define)?;
            config.properties.insert(key.to_string(), value.to_string());
        }

        for key in ALL_KEYS {
            if config.properties.contains_key(*key) {
                continue;
            }
            if let Some(value) = env(&env_var_name(key)) {
                config.properties.insert(key.to_string(), value);
            }
        }

        let batch_path = resolve_dir(batch_path)?;
        let parent = batch_path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        config.set_if_not_set(keys::BATCHES_FOLDER, parent);
        config.set_if_not_set(keys::AT_NINESTARS, "true");
        if config.get(keys::STRUCTURE_STORAGE_DIR).is_none() {
            let scratch = tempfile::Builder::new()
                .prefix("batchqa-")
                .tempdir()
                .map_err(|e| QaError::Setup(format!("failed to create scratch directory: {e}")))?;
            config.set_if_not_set(
                keys::STRUCTURE_STORAGE_DIR,
                scratch.path().to_string_lossy().into_owned(),
            );
            config.scratch = Some(scratch);
        }
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        config.set_if_not_set(keys::THREADS_PER_BATCH, threads.to_string());

        // PDFs are data files going to bit storage; everything else is metadata
        config.set_if_not_set(keys::DATA_FILE_PATTERN, r".*\.pdf$");
        config.set_if_not_set(keys::GROUPING_CHAR, ".");
        config.set_if_not_set(keys::CHECKSUM_POSTFIX, ".md5");
        config.set_if_not_set(keys::IGNORED_FILES, "");

        Ok(config)
    }

    /// Store `value` under `key` unless the key already has a value.
    pub fn set_if_not_set(&mut self, key: &str, value: impl Into<String>) {
        match self.properties.get(key) {
            Some(existing) => {
                debug!(key = %key, value = %existing, "Keeping configured property");
            }
            None => {
                self.properties.insert(key.to_string(), value.into());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// All properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn batches_folder(&self) -> Option<PathBuf> {
        self.get(keys::BATCHES_FOLDER).map(PathBuf::from)
    }

    pub fn at_ninestars(&self) -> bool {
        self.get(keys::AT_NINESTARS)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.get(keys::STRUCTURE_STORAGE_DIR).map(PathBuf::from)
    }

    /// Worker concurrency hint, at least 1.
    pub fn threads_per_batch(&self) -> Result<usize> {
        let raw = self.get(keys::THREADS_PER_BATCH).unwrap_or("1");
        let threads: usize = raw.trim().parse().map_err(|_| {
            QaError::Setup(format!("{} must be a positive integer, got '{raw}'", keys::THREADS_PER_BATCH))
        })?;
        Ok(threads.max(1))
    }

    pub fn data_file_pattern(&self) -> &str {
        self.get(keys::DATA_FILE_PATTERN).unwrap_or(r".*\.pdf$")
    }

    pub fn grouping_char(&self) -> &str {
        self.get(keys::GROUPING_CHAR).unwrap_or(".")
    }

    pub fn checksum_postfix(&self) -> &str {
        self.get(keys::CHECKSUM_POSTFIX).unwrap_or(".md5")
    }

    pub fn ignored_files(&self) -> &str {
        self.get(keys::IGNORED_FILES).unwrap_or("")
    }
}

const ALL_KEYS: &[&str] = &[
    keys::BATCHES_FOLDER,
    keys::AT_NINESTARS,
    keys::STRUCTURE_STORAGE_DIR,
    keys::THREADS_PER_BATCH,
    keys::DATA_FILE_PATTERN,
    keys::GROUPING_CHAR,
    keys::CHECKSUM_POSTFIX,
    keys::IGNORED_FILES,
];

/// Environment variable consulted for `key`.
pub fn env_var_name(key: &str) -> String {
    let mut name = String::from(ENV_PREFIX);
    name.extend(key.chars().map(|c| match c {
        '.' => '_',
        c => c.to_ascii_uppercase(),
    }));
    name
}

fn parse_define(define: &str) -> Result<(&str, &str)> {
    match define.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(QaError::InvalidProperty(define.to_string())),
    }
}
