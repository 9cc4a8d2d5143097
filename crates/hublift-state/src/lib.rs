//! Externally shared, atomically updatable import state.
//!
//! Every piece of progress a driver run makes lives here rather than in
//! process memory, so redundant or at-least-once re-executions of the same
//! run are safe by construction. The store exposes single-key idempotent
//! reads and writes only; no multi-key transactions are required.

pub mod counters;
pub mod cursor;
pub mod dedup;
pub mod error;
pub mod redis_store;
pub mod scope;
pub mod store;

pub use counters::{ImportCounter, ImportTallies};
pub use cursor::PageCursor;
pub use dedup::DeduplicationCache;
pub use error::StateError;
pub use redis_store::RedisStateStore;
pub use scope::{CursorScope, ImportScope};
pub use store::{MemoryStateStore, StateStore};
