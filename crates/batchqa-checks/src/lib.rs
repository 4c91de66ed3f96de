//! batchqa checks - the components run against newspaper batches
//!
//! - `LogNowComponent`: timestamped start/stop markers
//! - `BatchStructureChecker`: file structure and MD5 checksums
//! - `MetadataChecker`: per-page XML metadata presence and sanity

pub mod layout;
pub mod log_now;
pub mod metadata;
pub mod structure;

pub use layout::{BatchFile, FileKind, FileLayout};
pub use log_now::LogNowComponent;
pub use metadata::{MetadataChecker, METADATA_CATEGORY};
pub use structure::{BatchStructureChecker, CHECKSUM_CATEGORY, STRUCTURE_CATEGORY};

use batchqa_core::{CheckableComponent, QaConfig};

/// The fixed pipeline run against every batch, in execution order.
pub fn standard_pipeline(config: &QaConfig) -> anyhow::Result<Vec<Box<dyn CheckableComponent>>> {
    let components: Vec<Box<dyn CheckableComponent>> = vec![
        Box::new(LogNowComponent::new("Start")),
        Box::new(BatchStructureChecker::new(config)?),
        Box::new(MetadataChecker::new(config)?),
        Box::new(LogNowComponent::new("Stop")),
    ];
    Ok(components)
}
