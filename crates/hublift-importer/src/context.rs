//! Per-run execution context.
//!
//! Everything an import run needs is carried here by value and passed by
//! reference through the call chain; nothing is memoized on ambient global
//! state. Cloning is cheap (all members are handles).

use crate::client::PlatformClient;
use crate::ledger::PlaceholderReferenceLedger;
use crate::user_finder::{UserFinder, UserResolver};
use hublift_core::{ImportSettings, JobQueue, ObjectType};
use hublift_state::{DeduplicationCache, ImportCounter, ImportScope, PageCursor, StateStore};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct RunContext {
    pub project_id: i64,
    /// Repository path on the external platform, e.g. `acme/widgets`.
    pub repo: String,
    pub settings: ImportSettings,
    pub db: DatabaseConnection,
    pub client: Arc<dyn PlatformClient>,
    pub queue: Arc<dyn JobQueue>,
    pub users: Arc<dyn UserResolver>,
    store: Arc<dyn StateStore>,
    dedup: DeduplicationCache,
    cursors: PageCursor,
    counters: ImportCounter,
}

impl RunContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project_id: i64,
        repo: impl Into<String>,
        settings: ImportSettings,
        db: DatabaseConnection,
        client: Arc<dyn PlatformClient>,
        queue: Arc<dyn JobQueue>,
        users: Arc<dyn UserResolver>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let ttl = settings.state_ttl();
        Self {
            project_id,
            repo: repo.into(),
            settings,
            db,
            client,
            queue,
            users,
            dedup: DeduplicationCache::new(store.clone(), ttl),
            cursors: PageCursor::new(store.clone(), ttl),
            counters: ImportCounter::new(store.clone()),
            store,
        }
    }

    pub fn dedup(&self) -> &DeduplicationCache {
        &self.dedup
    }

    pub fn cursors(&self) -> &PageCursor {
        &self.cursors
    }

    pub fn counters(&self) -> &ImportCounter {
        &self.counters
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn scope_for(&self, object_type: ObjectType) -> ImportScope {
        ImportScope::new(self.project_id, object_type)
    }

    /// Author resolution for this run. Construction is handle clones only.
    pub fn user_finder(&self) -> UserFinder {
        UserFinder::new(
            self.project_id,
            self.settings.fallback_user_id,
            self.users.clone(),
            self.store.clone(),
            self.settings.state_ttl(),
        )
    }

    pub fn ledger(&self) -> PlaceholderReferenceLedger {
        PlaceholderReferenceLedger::new(self.db.clone())
    }
}
