//! Entity type definitions
//!
//! - [`TestCase`] - a test case definition, keyed by its external case ID
//! - [`ExecutionRecord`] - one run of a case, with its ordered screenshots

pub mod case;
pub mod record;

pub use case::TestCase;
pub use record::{ExecutionRecord, RecordWithImages, Status};
