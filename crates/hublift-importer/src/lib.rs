//! Resumable parallel import engine.
//!
//! The scheduling driver fetches pages of an external collection, checks each
//! object against the deduplication cache, and dispatches import tasks for
//! unseen objects. Progress (dedup sets, page cursors, counters) lives in
//! shared external storage, so a run can be interrupted at any point and
//! re-invoked safely: no duplicate dispatch, no skipped object.
//!
//! # Architecture
//!
//! - **client**: the external platform API collaborator (paginated fetches,
//!   typed failure outcomes)
//! - **adapter**: the per-object-type plugin contract and its static registry
//! - **driver**: the fetch → dedup-check → dispatch cycle per object type
//! - **governor**: converts throttling signals into whole-run reschedules
//! - **persister**: validated, pre-filtered batched inserts
//! - **ledger**: durable placeholder references for unresolved identities
//! - **worker**: executes dispatched import tasks with bounded retry

pub mod adapter;
pub mod adapters;
pub mod client;
pub mod context;
pub mod driver;
pub mod error;
pub mod governor;
pub mod ledger;
pub mod persister;
pub mod report;
pub mod test_support;
pub mod user_finder;
pub mod worker;

pub use adapter::{AdapterRegistry, ImportStrategy, ObjectAdapter, RepresentationError};
pub use client::{CollectionRef, Page, PlatformClient};
pub use context::RunContext;
pub use driver::{DriverError, RunOutcome, SchedulingDriver};
pub use error::ImportTaskError;
pub use governor::{RateLimitGovernor, Reschedule};
pub use ledger::{PlaceholderReference, PlaceholderReferenceLedger};
pub use persister::{BulkMapper, BulkOutcome, BulkPersister, RowValidationError};
pub use report::{project_summary, ObjectTypeSummary, ProjectImportSummary};
pub use user_finder::{MapUserResolver, UserFinder, UserResolver};
pub use worker::{run_with_reschedule, ImportWorker};
