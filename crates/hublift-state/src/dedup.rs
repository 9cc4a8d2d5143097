//! Deduplication cache: the persisted membership set that prevents duplicate
//! import dispatch across repeated or resumed fetch loops.

use crate::error::StateError;
use crate::scope::ImportScope;
use crate::store::StateStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const ENTITY: &str = "already-imported";

/// Persisted set of externally-sourced object ids already handled, scoped per
/// (project, object type).
///
/// Once an id is marked, a later `contains` call returns true even from a
/// different process after a restart. Entries carry a bounded TTL so state
/// from abandoned imports eventually disappears.
#[derive(Clone)]
pub struct DeduplicationCache {
    store: Arc<dyn StateStore>,
    ttl: Duration,
}

impl DeduplicationCache {
    pub fn new(store: Arc<dyn StateStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn contains(&self, scope: &ImportScope, id: &str) -> Result<bool, StateError> {
        self.store.set_includes(&scope.key(ENTITY), id).await
    }

    /// Mark an id as imported. Idempotent; calling twice is safe.
    pub async fn mark_imported(&self, scope: &ImportScope, id: &str) -> Result<(), StateError> {
        self.store
            .set_add(&scope.key(ENTITY), id, Some(self.ttl))
            .await?;
        Ok(())
    }

    /// Which of `ids` are already marked. One round trip per page instead of
    /// one per object.
    pub async fn bulk_contains(
        &self,
        scope: &ImportScope,
        ids: &[String],
    ) -> Result<HashSet<String>, StateError> {
        self.store.set_includes_many(&scope.key(ENTITY), ids).await
    }

    pub async fn members(&self, scope: &ImportScope) -> Result<HashSet<String>, StateError> {
        self.store.set_members(&scope.key(ENTITY)).await
    }

    /// Drop the whole set, used when an import run is finalized.
    pub async fn expire(&self, scope: &ImportScope) -> Result<(), StateError> {
        self.store.delete(&scope.key(ENTITY)).await
    }
}
