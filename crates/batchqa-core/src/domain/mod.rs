//! Domain models for batch QA.
//!
//! - `Batch`: identity of the unit under test
//! - `QaError`: fatal setup errors

pub mod batch;
pub mod error;

pub use batch::{Batch, BatchEvent};
pub use error::{QaError, Result};
