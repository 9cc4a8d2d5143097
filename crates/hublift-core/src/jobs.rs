//! Job payloads and the task-dispatch contract.
//!
//! Jobs are the unit of at-least-once work handed to the queue collaborator.
//! Everything a job needs travels in its payload; workers share no in-process
//! state with the driver that dispatched them.

use crate::types::{ObjectRepresentation, ObjectType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Import one fetched object into the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportObjectJob {
    pub project_id: i64,
    /// Adapter task identifier, e.g. `import_issue`.
    pub task_type: String,
    pub representation: ObjectRepresentation,
}

/// Why a driver run handed control back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescheduleReason {
    RateLimited,
    TransientFetch,
    BudgetExhausted,
}

impl fmt::Display for RescheduleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RescheduleReason::RateLimited => "rate_limited",
            RescheduleReason::TransientFetch => "transient_fetch",
            RescheduleReason::BudgetExhausted => "budget_exhausted",
        };
        write!(f, "{}", s)
    }
}

/// Re-invoke a suspended driver run for one (project, object type) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeImportJob {
    pub project_id: i64,
    pub object_type: ObjectType,
    pub reason: RescheduleReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Job {
    ImportObject(ImportObjectJob),
    ResumeImport(ResumeImportJob),
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::ImportObject(job) => write!(
                f,
                "ImportObject({}/{} #{})",
                job.project_id, job.task_type, job.representation.external_id
            ),
            Job::ResumeImport(job) => write!(
                f,
                "ResumeImport({}/{} after {})",
                job.project_id, job.object_type, job.reason
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to send job: {0}")]
    SendError(String),

    #[error("Failed to receive job: {0}")]
    ReceiveError(String),

    #[error("Queue channel closed")]
    ChannelClosed,
}

/// Task-dispatch collaborator.
///
/// Implementations guarantee eventual at-least-once delivery to a subscriber.
/// Delayed delivery is how a `Reschedule(delay)` instruction becomes a later
/// re-invocation; the sender never sleeps itself.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn send(&self, job: Job) -> Result<(), QueueError>;

    async fn send_delayed(&self, job: Job, delay: Duration) -> Result<(), QueueError>;

    fn subscribe(&self) -> Box<dyn JobReceiver>;
}

#[async_trait]
pub trait JobReceiver: Send {
    async fn recv(&mut self) -> Result<Job, QueueError>;
}
