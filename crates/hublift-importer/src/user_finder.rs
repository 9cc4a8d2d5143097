//! User finder: maps external author identities onto local user ids.
//!
//! Resolution is attempted through the pluggable `UserResolver`; misses fall
//! back to a configured import user and are reported so callers can record a
//! placeholder reference. Resolved mappings are cached in shared state to
//! avoid re-resolving the same author on every object.

use crate::error::ImportTaskError;
use async_trait::async_trait;
use hublift_core::ExternalUser;
use hublift_state::StateStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Looks up the local user id for an external identity. Implementations talk
/// to whatever identity source the deployment has (contributor mapping table,
/// SSO directory, email match).
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn resolve(&self, user: &ExternalUser) -> Result<Option<i64>, ImportTaskError>;
}

/// Fixed-map resolver, for tests and single-tenant deployments with a
/// pre-built mapping.
pub struct MapUserResolver {
    mapping: HashMap<i64, i64>,
}

impl MapUserResolver {
    pub fn new(mapping: HashMap<i64, i64>) -> Self {
        Self { mapping }
    }

    pub fn empty() -> Self {
        Self {
            mapping: HashMap::new(),
        }
    }
}

#[async_trait]
impl UserResolver for MapUserResolver {
    async fn resolve(&self, user: &ExternalUser) -> Result<Option<i64>, ImportTaskError> {
        Ok(self.mapping.get(&user.id).copied())
    }
}

pub struct UserFinder {
    project_id: i64,
    fallback_user_id: i64,
    resolver: Arc<dyn UserResolver>,
    store: Arc<dyn StateStore>,
    cache_ttl: Duration,
}

impl UserFinder {
    pub fn new(
        project_id: i64,
        fallback_user_id: i64,
        resolver: Arc<dyn UserResolver>,
        store: Arc<dyn StateStore>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            project_id,
            fallback_user_id,
            resolver,
            store,
            cache_ttl,
        }
    }

    pub fn fallback_user_id(&self) -> i64 {
        self.fallback_user_id
    }

    /// Local user id for an authored object, plus whether the identity was
    /// actually found. `(fallback, false)` tells the caller to record a
    /// placeholder reference.
    ///
    /// A missing author (deleted account upstream) maps to the fallback user
    /// with `found = true`: there is no identity left to reconcile.
    pub async fn author_id_for(
        &self,
        author: Option<&ExternalUser>,
    ) -> Result<(i64, bool), ImportTaskError> {
        let user = match author {
            Some(user) => user,
            None => return Ok((self.fallback_user_id, true)),
        };

        let cache_key = self.cache_key(user.id);
        if let Some(cached) = self.store.get(&cache_key).await? {
            let id = cached
                .parse::<i64>()
                .map_err(|e| ImportTaskError::InvalidPayload(e.to_string()))?;
            return Ok((id, true));
        }

        match self.resolver.resolve(user).await? {
            Some(id) => {
                self.store
                    .set(&cache_key, &id.to_string(), Some(self.cache_ttl))
                    .await?;
                Ok((id, true))
            }
            None => {
                debug!(
                    external_user_id = user.id,
                    login = %user.login,
                    "Unresolved author, substituting fallback user"
                );
                Ok((self.fallback_user_id, false))
            }
        }
    }

    fn cache_key(&self, external_user_id: i64) -> String {
        format!("import:{}:user-mapping:{}", self.project_id, external_user_id)
    }
}

/// Pull the author identity out of a raw object's `user`/`author` field.
pub fn external_author(data: &serde_json::Value, field: &str) -> Option<ExternalUser> {
    let user = data.get(field)?;
    Some(ExternalUser {
        id: user.get("id")?.as_i64()?,
        login: user.get("login")?.as_str()?.to_string(),
    })
}
