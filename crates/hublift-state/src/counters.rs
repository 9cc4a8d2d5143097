//! Per (project, object type) import tallies.

use crate::error::StateError;
use crate::scope::ImportScope;
use crate::store::StateStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot of the fetched/imported/failed tallies for one object type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTallies {
    pub fetched: i64,
    pub imported: i64,
    pub failed: i64,
}

/// Monotonically incremented counters in shared storage, used for completion
/// detection and project-level reporting.
#[derive(Clone)]
pub struct ImportCounter {
    store: Arc<dyn StateStore>,
}

impl ImportCounter {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn add_fetched(&self, scope: &ImportScope, n: i64) -> Result<i64, StateError> {
        self.store.increment(&scope.key("fetched"), n).await
    }

    pub async fn add_imported(&self, scope: &ImportScope, n: i64) -> Result<i64, StateError> {
        self.store.increment(&scope.key("imported"), n).await
    }

    pub async fn add_failed(&self, scope: &ImportScope, n: i64) -> Result<i64, StateError> {
        self.store.increment(&scope.key("failed"), n).await
    }

    pub async fn tallies(&self, scope: &ImportScope) -> Result<ImportTallies, StateError> {
        Ok(ImportTallies {
            fetched: self.read(&scope.key("fetched")).await?,
            imported: self.read(&scope.key("imported")).await?,
            failed: self.read(&scope.key("failed")).await?,
        })
    }

    async fn read(&self, key: &str) -> Result<i64, StateError> {
        match self.store.get(key).await? {
            Some(value) => value.parse::<i64>().map_err(|e| StateError::CorruptValue {
                key: key.to_string(),
                details: e.to_string(),
            }),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStateStore;
    use hublift_core::ObjectType;

    #[tokio::test]
    async fn tallies_default_to_zero() {
        let counter = ImportCounter::new(Arc::new(MemoryStateStore::new()));
        let scope = ImportScope::new(1, ObjectType::Issue);
        assert_eq!(counter.tallies(&scope).await.unwrap(), ImportTallies::default());
    }

    #[tokio::test]
    async fn increments_accumulate_per_scope() {
        let counter = ImportCounter::new(Arc::new(MemoryStateStore::new()));
        let issues = ImportScope::new(1, ObjectType::Issue);
        let notes = ImportScope::new(1, ObjectType::Note);

        counter.add_fetched(&issues, 100).await.unwrap();
        counter.add_fetched(&issues, 50).await.unwrap();
        counter.add_imported(&issues, 149).await.unwrap();
        counter.add_failed(&issues, 1).await.unwrap();
        counter.add_fetched(&notes, 7).await.unwrap();

        let tallies = counter.tallies(&issues).await.unwrap();
        assert_eq!(
            tallies,
            ImportTallies {
                fetched: 150,
                imported: 149,
                failed: 1
            }
        );
        assert_eq!(counter.tallies(&notes).await.unwrap().fetched, 7);
    }
}
