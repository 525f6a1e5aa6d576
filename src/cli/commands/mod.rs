//! CLI command implementations

pub mod utils;

pub mod case;
pub mod collection;
pub mod completions;
pub mod fetch;
pub mod history;
pub mod import;
pub mod latest;
pub mod record;
pub mod report;
pub mod stats;
