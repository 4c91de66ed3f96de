//! Metadata presence and sanity checking.

use crate::layout::{BatchFile, FileKind, FileLayout};
use anyhow::Context;
use async_trait::async_trait;
use batchqa_core::{Batch, CheckableComponent, QaConfig, ResultCollector};
use std::collections::BTreeMap;
use tracing::info;

pub const METADATA_CATEGORY: &str = "metadata";

const NAME: &str = "metadata-checker";
const METADATA_EXTENSION: &str = ".xml";

/// Checks that every page group carries a readable XML metadata file.
pub struct MetadataChecker {
    layout: FileLayout,
}

impl MetadataChecker {
    pub fn new(config: &QaConfig) -> anyhow::Result<Self> {
        Ok(Self {
            layout: FileLayout::from_config(config)?,
        })
    }
}

fn is_metadata(file: &BatchFile) -> bool {
    file.kind == FileKind::Other && file.relative.to_ascii_lowercase().ends_with(METADATA_EXTENSION)
}

/// Sanity-check the content of one metadata file, returning a finding.
fn inspect_metadata(content: &[u8]) -> Option<String> {
    let Ok(text) = std::str::from_utf8(content) else {
        return Some("metadata file is not valid UTF-8".to_string());
    };
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Some("metadata file is empty".to_string());
    }
    if !text.starts_with('<') || !text.ends_with('>') {
        return Some("metadata file is not an XML document".to_string());
    }
    None
}

#[async_trait]
impl CheckableComponent for MetadataChecker {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn execute(&self, batch: &Batch, collector: &mut ResultCollector) -> anyhow::Result<()> {
        let root = self.layout.batch_root(batch);
        let files = self.layout.scan_blocking(root).await?;

        let mut groups: BTreeMap<&str, Vec<&BatchFile>> = BTreeMap::new();
        for file in &files {
            groups.entry(self.layout.group_of(&file.relative)).or_default().push(file);
        }
        info!(batch_id = %batch.id(), groups = groups.len(), "Checking batch metadata");

        for (group, members) in &groups {
            let has_data = members.iter().any(|f| f.kind == FileKind::Data);
            if has_data && !members.iter().any(|f| is_metadata(f)) {
                for data in members.iter().filter(|f| f.kind == FileKind::Data) {
                    collector.add_failure(
                        &data.relative,
                        METADATA_CATEGORY,
                        NAME,
                        format!("no metadata file for group '{group}'"),
                        "",
                    );
                }
            }
        }

        for file in files.iter().filter(|f| is_metadata(f)) {
            let content = tokio::fs::read(&file.path)
                .await
                .with_context(|| format!("failed to read metadata file {}", file.relative))?;
            if let Some(message) = inspect_metadata(&content) {
                collector.add_failure(&file.relative, METADATA_CATEGORY, NAME, message, "");
            }
        }

        Ok(())
    }
}
