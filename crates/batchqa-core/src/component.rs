//! The contract every pluggable check implements.

use crate::collector::ResultCollector;
use crate::domain::Batch;
use async_trait::async_trait;

/// A check that can be run against a batch as one pipeline step.
///
/// Substantive findings go into `collector`. Returning an error (or
/// panicking) does not abort the pipeline: the runner records it as a single
/// `exception` failure and moves on to the next component.
#[async_trait]
pub trait CheckableComponent: Send + Sync {
    /// Name under which results are reported.
    fn name(&self) -> &str;

    /// Component version, usually the crate version.
    fn version(&self) -> &str;

    /// Implementation type name, used as the failure detail when the
    /// component itself fails.
    fn implementation_name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Check `batch`, recording failures into `collector`.
    async fn execute(&self, batch: &Batch, collector: &mut ResultCollector) -> anyhow::Result<()>;
}
