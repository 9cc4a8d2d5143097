//! Task-dispatch collaborator for import runs.
//!
//! Wraps a tokio broadcast channel behind the `JobQueue` trait from
//! `hublift-core`. Delayed delivery backs the driver's `Reschedule(delay)`
//! instruction: the sender returns immediately and a spawned timer re-enqueues
//! the job when the delay elapses. The import core itself never sleeps.

pub mod queue;

pub use queue::{BroadcastJobReceiver, BroadcastQueueService};
