//! Marker component logging when the pipeline passes a point.

use async_trait::async_trait;
use batchqa_core::{Batch, CheckableComponent, ResultCollector};
use chrono::{SecondsFormat, Utc};
use tracing::info;

/// Logs `<label>: <timestamp>` and records nothing.
pub struct LogNowComponent {
    label: String,
}

impl LogNowComponent {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[async_trait]
impl CheckableComponent for LogNowComponent {
    fn name(&self) -> &str {
        &self.label
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn execute(&self, batch: &Batch, _collector: &mut ResultCollector) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        info!(batch_id = %batch.id(), "{}: {}", self.label, now);
        Ok(())
    }
}
