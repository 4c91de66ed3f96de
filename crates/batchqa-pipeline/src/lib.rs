//! batchqa pipeline - running checks against a batch
//!
//! Provides the pipeline runner that:
//! - Executes a fixed, ordered list of components one at a time
//! - Isolates component errors and panics as `exception` failures
//! - Folds per-component results into one cumulative collector
//!
//! and the verdict mapper turning that collector into a report and an exit
//! status.

pub mod runner;
pub mod verdict;

// Re-export key types
pub use runner::{run_component, PipelineRunner, PIPELINE_NAME};
pub use verdict::{ExitStatus, ReportFormat, Verdict};
