//! Batch structure and checksum checking.
//!
//! Every data file must have a checksum companion holding its MD5, and every
//! checksum file must belong to a data file. Checksums are verified on the
//! blocking pool with at most `threadsPerBatch` files hashed at once.

use crate::layout::{BatchFile, FileKind, FileLayout};
use anyhow::Context;
use async_trait::async_trait;
use batchqa_core::{Batch, CheckableComponent, QaConfig, ResultCollector};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

pub const STRUCTURE_CATEGORY: &str = "filestructure";
pub const CHECKSUM_CATEGORY: &str = "checksum";

const NAME: &str = "batch-structure-checker";

/// Checks file structure and checksums of a batch.
pub struct BatchStructureChecker {
    layout: FileLayout,
    threads: usize,
    verify_content: bool,
    storage_dir: Option<PathBuf>,
}

impl BatchStructureChecker {
    pub fn new(config: &QaConfig) -> anyhow::Result<Self> {
        Ok(Self {
            layout: FileLayout::from_config(config)?,
            threads: config.threads_per_batch()?,
            // Off the storage platform data files are not local; only check
            // that checksums are present and well formed
            verify_content: config.at_ninestars(),
            storage_dir: config.storage_dir(),
        })
    }

    /// Write the scanned file list to the storage directory.
    async fn store_structure(&self, batch: &Batch, files: &[BatchFile]) -> anyhow::Result<()> {
        let Some(dir) = &self.storage_dir else {
            return Ok(());
        };
        let target = dir.join(format!("{}.structure.json", batch.id()));
        let json = serde_json::to_vec_pretty(files)?;
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
        tokio::fs::write(&target, json)
            .await
            .with_context(|| format!("failed to write {}", target.display()))?;
        debug!(path = %target.display(), "Stored batch structure");
        Ok(())
    }
}

#[async_trait]
impl CheckableComponent for BatchStructureChecker {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn execute(&self, batch: &Batch, collector: &mut ResultCollector) -> anyhow::Result<()> {
        let root = self.layout.batch_root(batch);
        let files = self.layout.scan_blocking(root).await?;
        info!(batch_id = %batch.id(), files = files.len(), "Checking batch structure");
        self.store_structure(batch, &files).await?;

        if files.is_empty() {
            collector.add_failure(batch.id(), STRUCTURE_CATEGORY, NAME, "batch contains no files", "");
            return Ok(());
        }

        let by_name: BTreeMap<&str, &BatchFile> = files.iter().map(|f| (f.relative.as_str(), f)).collect();
        let postfix = self.layout.checksum_postfix();
        let mut to_verify = Vec::new();

        for file in &files {
            if file.size == 0 {
                collector.add_failure(&file.relative, STRUCTURE_CATEGORY, NAME, "file is empty", "");
            }

            match file.kind {
                FileKind::Checksum => {
                    let data = &file.relative[..file.relative.len() - postfix.len()];
                    if !by_name.contains_key(data) {
                        collector.add_failure(
                            &file.relative,
                            STRUCTURE_CATEGORY,
                            NAME,
                            format!("checksum file without data file '{data}'"),
                            "",
                        );
                    }
                }
                FileKind::Data => {
                    let checksum = format!("{}{}", file.relative, postfix);
                    match by_name.get(checksum.as_str()) {
                        Some(checksum_file) => to_verify.push((file, *checksum_file)),
                        None => collector.add_failure(
                            &file.relative,
                            STRUCTURE_CATEGORY,
                            NAME,
                            format!("missing checksum file '{checksum}'"),
                            "",
                        ),
                    }
                }
                FileKind::Other => {}
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.threads));
        let mut handles = Vec::with_capacity(to_verify.len());
        for (data, checksum) in &to_verify {
            let permit = semaphore.clone().acquire_owned().await?;
            let data_path = data.path.clone();
            let checksum_path = checksum.path.clone();
            let verify_content = self.verify_content;
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                verify_checksum(&data_path, &checksum_path, verify_content)
            }));
        }

        // Joined in scan order so findings are reported deterministically
        for ((data, _), handle) in to_verify.iter().zip(handles) {
            match handle.await.context("checksum task failed")? {
                Ok(None) => {}
                Ok(Some(message)) => {
                    collector.add_failure(&data.relative, CHECKSUM_CATEGORY, NAME, message, "");
                }
                Err(err) => collector.add_failure(
                    &data.relative,
                    CHECKSUM_CATEGORY,
                    NAME,
                    format!("cannot verify checksum: {err:#}"),
                    format!("{err:?}"),
                ),
            }
        }

        Ok(())
    }
}

/// Compare a data file against its checksum file.
///
/// Returns a finding message on mismatch or malformed checksum.
fn verify_checksum(data: &Path, checksum: &Path, verify_content: bool) -> anyhow::Result<Option<String>> {
    let recorded = std::fs::read_to_string(checksum)
        .with_context(|| format!("failed to read {}", checksum.display()))?;
    // md5sum style files carry the file name after the digest
    let recorded = recorded.split_whitespace().next().unwrap_or("").to_ascii_lowercase();
    if !matches!(hex::decode(&recorded), Ok(bytes) if bytes.len() == 16) {
        return Ok(Some(format!("malformed checksum '{recorded}'")));
    }
    if !verify_content {
        return Ok(None);
    }

    let mut file = std::fs::File::open(data).with_context(|| format!("failed to open {}", data.display()))?;
    let mut hasher = Md5::new();
    std::io::copy(&mut file, &mut hasher).with_context(|| format!("failed to read {}", data.display()))?;
    let actual = hex::encode(hasher.finalize());

    if actual == recorded {
        Ok(None)
    } else {
        Ok(Some(format!("checksum mismatch: expected {recorded}, got {actual}")))
    }
}
