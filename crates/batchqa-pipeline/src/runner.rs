//! Sequential pipeline execution with per-component failure isolation.

use batchqa_core::{Batch, CheckableComponent, ResultCollector, EXCEPTION_CATEGORY};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Name of the cumulative collector.
pub const PIPELINE_NAME: &str = "batch";

/// Runs a fixed, ordered list of components against one batch.
pub struct PipelineRunner {
    name: String,
    version: String,
    components: Vec<Box<dyn CheckableComponent>>,
}

impl PipelineRunner {
    /// Create a runner reporting as `batch` at the crate version.
    pub fn new(components: Vec<Box<dyn CheckableComponent>>) -> Self {
        Self::with_identity(PIPELINE_NAME, batchqa_core::VERSION, components)
    }

    /// Create a runner whose cumulative collector carries the given identity.
    pub fn with_identity(
        name: impl Into<String>,
        version: impl Into<String>,
        components: Vec<Box<dyn CheckableComponent>>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            components,
        }
    }

    /// Component names in execution order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Run every component in order and fold their results.
    ///
    /// Never short-circuits: a failing component is recorded and the next one
    /// still runs.
    pub async fn process_batch(&self, batch: &Batch) -> ResultCollector {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("batchqa.run", run_id = %run_id, batch_id = %batch.id());

        async {
            info!(components = self.components.len(), "Starting pipeline");
            let start = Instant::now();

            let mut total = ResultCollector::new(self.name.clone(), self.version.clone());
            for component in &self.components {
                let step = run_component(batch, component.as_ref()).await;
                total = total.merge(step);
            }

            info!(
                duration_ms = start.elapsed().as_millis() as u64,
                failures = total.failure_count(),
                success = total.is_success(),
                "Pipeline finished"
            );
            total
        }
        .instrument(span)
        .await
    }
}

/// Run one component against `batch` in a fresh collector.
///
/// An error or panic from the component is converted into one `exception`
/// failure appended after whatever the component recorded before failing.
pub async fn run_component(batch: &Batch, component: &dyn CheckableComponent) -> ResultCollector {
    info!(component = %component.name(), version = %component.version(), "Running component");
    let start = Instant::now();

    let mut collector = ResultCollector::new(component.name(), component.version());
    let outcome = AssertUnwindSafe(component.execute(batch, &mut collector))
        .catch_unwind()
        .await;

    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some((format!("{err:#}"), format!("{err:?}"))),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let trace = format!("{} panicked: {message}", component.implementation_name());
            Some((format!("panicked: {message}"), trace))
        }
    };

    if let Some((message, trace)) = failure {
        warn!(component = %component.name(), error = %message, "Component failed");
        collector.add_failure(
            batch.id(),
            EXCEPTION_CATEGORY,
            component.implementation_name(),
            format!("Unexpected error in component: {message}"),
            trace,
        );
    }

    info!(
        component = %component.name(),
        duration_ms = start.elapsed().as_millis() as u64,
        failures = collector.failure_count(),
        "Component finished"
    );
    collector
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Findings(usize);

    #[async_trait]
    impl CheckableComponent for Findings {
        fn name(&self) -> &str {
            "findings"
        }

        fn version(&self) -> &str {
            "2.0"
        }

        async fn execute(&self, batch: &Batch, collector: &mut ResultCollector) -> anyhow::Result<()> {
            for i in 0..self.0 {
                collector.add_failure(batch.id(), "metadata", "findings", format!("finding {i}"), "");
            }
            Ok(())
        }
    }

    struct FailsAfterFinding;

    #[async_trait]
    impl CheckableComponent for FailsAfterFinding {
        fn name(&self) -> &str {
            "partial"
        }

        fn version(&self) -> &str {
            "1.0"
        }

        async fn execute(&self, batch: &Batch, collector: &mut ResultCollector) -> anyhow::Result<()> {
            collector.add_failure(batch.id(), "checksum", "partial", "first finding", "");
            Err(anyhow::anyhow!("disk vanished").context("reading page 2"))
        }
    }

    struct Panics;

    #[async_trait]
    impl CheckableComponent for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn version(&self) -> &str {
            "1.0"
        }

        async fn execute(&self, _batch: &Batch, _collector: &mut ResultCollector) -> anyhow::Result<()> {
            panic!("index out of range");
        }
    }

    fn batch() -> (tempfile::TempDir, Batch) {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("B-1");
        std::fs::create_dir(&dir).expect("mkdir");
        let batch = Batch::identify(&dir).expect("identify");
        (root, batch)
    }

    #[tokio::test]
    async fn test_collector_named_after_component() {
        let (_root, batch) = batch();
        let collector = run_component(&batch, &Findings(2)).await;
        assert_eq!(collector.component_name(), "findings");
        assert_eq!(collector.component_version(), "2.0");
        assert_eq!(collector.failure_count(), 2);
    }

    #[tokio::test]
    async fn test_error_appended_after_partial_entries() {
        let (_root, batch) = batch();
        let collector = run_component(&batch, &FailsAfterFinding).await;

        assert_eq!(collector.failure_count(), 2);
        assert_eq!(collector.failures()[0].message, "first finding");

        let failure = &collector.failures()[1];
        assert_eq!(failure.subject_id, "B-1");
        assert_eq!(failure.category, EXCEPTION_CATEGORY);
        assert_eq!(failure.detail, "FailsAfterFinding");
        assert!(failure.message.starts_with("Unexpected error in component:"));
        assert!(failure.message.contains("reading page 2"));
        assert!(failure.message.contains("disk vanished"));
        assert!(failure.trace.contains("disk vanished"));
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let (_root, batch) = batch();
        let collector = run_component(&batch, &Panics).await;

        assert_eq!(collector.failure_count(), 1);
        let failure = &collector.failures()[0];
        assert_eq!(failure.detail, "Panics");
        assert!(failure.message.contains("index out of range"));
    }

    #[tokio::test]
    async fn test_runner_identity() {
        let (_root, batch) = batch();
        let runner = PipelineRunner::new(vec![Box::new(Findings(0))]);
        let total = runner.process_batch(&batch).await;

        assert_eq!(total.component_name(), PIPELINE_NAME);
        assert_eq!(total.component_version(), batchqa_core::VERSION);
        assert!(total.is_success());
        assert_eq!(runner.component_names(), vec!["findings"]);
    }

    #[test]
    fn test_panic_message_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic payload");
    }
}
