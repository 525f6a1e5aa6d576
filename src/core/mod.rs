//! Core module - store, configuration and shared utilities

pub mod config;
pub mod dates;
pub mod error;
pub mod logging;
pub mod remote;
pub mod rows;
pub mod search;
pub mod settings;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult, ValidationError};
pub use store::TestStore;
