//! Common error types used across all Hublift services

use std::time::Duration;
use thiserror::Error;

/// Outcome of a paginated fetch against the external platform API.
///
/// The platform client collaborator maps its transport-level failures onto
/// this taxonomy; the scheduling driver only ever sees these three shapes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The platform is throttling us. Carries the server-provided retry
    /// window when one was given.
    #[error("Rate limited by platform API (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Recoverable failure (network hiccup, 5xx, truncated body).
    #[error("Transient fetch failure: {0}")]
    Transient(String),

    /// Non-recoverable failure (bad credentials, repository gone).
    #[error("Fatal fetch failure: {0}")]
    Fatal(String),
}
