//! Error taxonomy for import task execution.

use hublift_state::StateError;
use sea_orm::DbErr;
use thiserror::Error;

/// Failures while importing a single dispatched object or a bulk page.
///
/// Only `Database` and `State` threaten progress tracking; the rest are
/// per-object conditions that never cascade to sibling tasks.
#[derive(Error, Debug)]
pub enum ImportTaskError {
    /// The representation payload did not match the adapter's schema.
    #[error("Invalid representation payload: {0}")]
    InvalidPayload(String),

    /// The object references a parent record that does not exist locally,
    /// e.g. a note whose issue was never imported. The object is skipped.
    #[error("Parent record not found: {0}")]
    UnresolvedParent(String),

    /// Recoverable failure; the task layer retries a bounded number of times.
    #[error("Transient import failure: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("State store error: {0}")]
    State(#[from] StateError),
}
