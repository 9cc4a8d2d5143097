//! Core utilities and types shared across all Hublift crates

pub mod config;
pub mod error;
pub mod jobs;
pub mod types;

// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use jobs::*;
pub use types::*;

// Re-export external dependencies
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;

// Re-export standard datetime type for use across all crates
pub use types::UtcDateTime;
