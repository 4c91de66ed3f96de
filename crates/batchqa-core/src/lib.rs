//! batchqa Core Library
//!
//! Domain types shared by the pipeline, the checks and the binary:
//! - `Batch`: identity of the batch directory under test
//! - `ResultCollector`: failure aggregation and report rendering
//! - `CheckableComponent`: the contract every check implements
//! - `QaConfig`: the configuration bundle handed to checks

pub mod collector;
pub mod component;
pub mod config;
pub mod domain;
pub mod telemetry;

pub use collector::{Failure, Provenance, ResultCollector, EXCEPTION_CATEGORY};
pub use component::CheckableComponent;
pub use config::{keys, QaConfig};
pub use domain::{Batch, BatchEvent, QaError, Result};
pub use telemetry::init_tracing;

/// batchqa version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
