//! Page cursor: persisted pagination progress per (parent, collection) pair.

use crate::error::StateError;
use crate::scope::CursorScope;
use crate::store::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Monotonic page-number marker. Values only increase; replayed pages are
/// rejected by `advance`.
#[derive(Clone)]
pub struct PageCursor {
    store: Arc<dyn StateStore>,
    ttl: Duration,
}

impl PageCursor {
    pub fn new(store: Arc<dyn StateStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Last fully processed page, 0 when the collection has not been fetched
    /// yet. The next page to fetch is always `current + 1`.
    pub async fn current(&self, scope: &CursorScope) -> Result<u64, StateError> {
        let key = scope.key();
        match self.store.get(&key).await? {
            Some(value) => value.parse::<u64>().map_err(|e| StateError::CorruptValue {
                key,
                details: e.to_string(),
            }),
            None => Ok(0),
        }
    }

    /// Record that `page` was fully processed. Returns false without writing
    /// when `page` is not greater than the stored value, guarding against
    /// replayed pages.
    pub async fn advance(&self, scope: &CursorScope, page: u64) -> Result<bool, StateError> {
        let advanced = self
            .store
            .set_if_greater(&scope.key(), page as i64, Some(self.ttl))
            .await?;
        if !advanced {
            debug!(key = %scope.key(), page, "Rejected non-monotonic cursor advance");
        }
        Ok(advanced)
    }

    /// Remove the cursor once its collection is fully drained.
    pub async fn expire(&self, scope: &CursorScope) -> Result<(), StateError> {
        self.store.delete(&scope.key()).await
    }
}
