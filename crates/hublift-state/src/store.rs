//! The `StateStore` trait and the in-memory implementation.

use crate::error::StateError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Key/value and key/set operations over shared storage.
///
/// Every operation is a single-key idempotent read or write; callers never
/// need locks or transactions across keys. `set_if_greater` is the one
/// compare-and-set primitive, used for monotonic page cursors.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StateError>;

    /// Store `value` only if it is greater than the current integer value (or
    /// the key is absent). Returns whether the write happened.
    async fn set_if_greater(
        &self,
        key: &str,
        value: i64,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError>;

    async fn increment(&self, key: &str, by: i64) -> Result<i64, StateError>;

    async fn delete(&self, key: &str) -> Result<(), StateError>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StateError>;

    /// Add a member to a set. Returns true if the member was newly added,
    /// false if it was already present (idempotent).
    async fn set_add(&self, key: &str, member: &str, ttl: Option<Duration>)
        -> Result<bool, StateError>;

    async fn set_includes(&self, key: &str, member: &str) -> Result<bool, StateError>;

    /// Which of `members` are present in the set at `key`.
    async fn set_includes_many(
        &self,
        key: &str,
        members: &[String],
    ) -> Result<HashSet<String>, StateError>;

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StateError>;
}

enum Stored {
    Scalar(String),
    Set(HashSet<String>),
}

struct Entry {
    value: Stored,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// In-memory `StateStore` for tests and single-process deployments.
///
/// TTLs are honored lazily: expired entries are dropped on the next access.
#[derive(Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, Entry>) -> T) -> T {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| !entry.expired());
        f(&mut entries)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.with_entries(|entries| match entries.get(key) {
            Some(Entry {
                value: Stored::Scalar(v),
                ..
            }) => Some(v.clone()),
            _ => None,
        }))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StateError> {
        self.with_entries(|entries| {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Stored::Scalar(value.to_string()),
                    expires_at: ttl.map(|ttl| Instant::now() + ttl),
                },
            );
        });
        Ok(())
    }

    async fn set_if_greater(
        &self,
        key: &str,
        value: i64,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError> {
        Ok(self.with_entries(|entries| {
            let current = match entries.get(key) {
                Some(Entry {
                    value: Stored::Scalar(v),
                    ..
                }) => v.parse::<i64>().ok(),
                _ => None,
            };
            if current.is_none_or(|current| value > current) {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Stored::Scalar(value.to_string()),
                        expires_at: ttl.map(|ttl| Instant::now() + ttl),
                    },
                );
                true
            } else {
                false
            }
        }))
    }

    async fn increment(&self, key: &str, by: i64) -> Result<i64, StateError> {
        self.with_entries(|entries| {
            let current = match entries.get(key) {
                Some(Entry {
                    value: Stored::Scalar(v),
                    ..
                }) => v
                    .parse::<i64>()
                    .map_err(|e| StateError::CorruptValue {
                        key: key.to_string(),
                        details: e.to_string(),
                    })?,
                _ => 0,
            };
            let next = current + by;
            entries.insert(
                key.to_string(),
                Entry {
                    value: Stored::Scalar(next.to_string()),
                    expires_at: None,
                },
            );
            Ok(next)
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StateError> {
        self.with_entries(|entries| {
            entries.remove(key);
        });
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StateError> {
        self.with_entries(|entries| {
            if let Some(entry) = entries.get_mut(key) {
                entry.expires_at = Some(Instant::now() + ttl);
            }
        });
        Ok(())
    }

    async fn set_add(
        &self,
        key: &str,
        member: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError> {
        Ok(self.with_entries(|entries| {
            let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
                value: Stored::Set(HashSet::new()),
                expires_at: None,
            });
            if let Some(ttl) = ttl {
                entry.expires_at = Some(Instant::now() + ttl);
            }
            match &mut entry.value {
                Stored::Set(set) => set.insert(member.to_string()),
                Stored::Scalar(_) => {
                    entry.value = Stored::Set(HashSet::from([member.to_string()]));
                    true
                }
            }
        }))
    }

    async fn set_includes(&self, key: &str, member: &str) -> Result<bool, StateError> {
        Ok(self.with_entries(|entries| match entries.get(key) {
            Some(Entry {
                value: Stored::Set(set),
                ..
            }) => set.contains(member),
            _ => false,
        }))
    }

    async fn set_includes_many(
        &self,
        key: &str,
        members: &[String],
    ) -> Result<HashSet<String>, StateError> {
        Ok(self.with_entries(|entries| match entries.get(key) {
            Some(Entry {
                value: Stored::Set(set),
                ..
            }) => members
                .iter()
                .filter(|m| set.contains(*m))
                .cloned()
                .collect(),
            _ => HashSet::new(),
        }))
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StateError> {
        Ok(self.with_entries(|entries| match entries.get(key) {
            Some(Entry {
                value: Stored::Set(set),
                ..
            }) => set.clone(),
            _ => HashSet::new(),
        }))
    }
}
