//! Redis-backed `StateStore` implementation.

use crate::error::StateError;
use crate::store::StateStore;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Stores an integer only when it is greater than the current value, applying
/// a TTL when one is given. Evaluated atomically server-side.
const SET_IF_GREATER: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]))
local new = tonumber(ARGV[1])
if current == nil or new > current then
  redis.call('SET', KEYS[1], ARGV[1])
  if tonumber(ARGV[2]) > 0 then
    redis.call('EXPIRE', KEYS[1], ARGV[2])
  end
  return 1
end
return 0
"#;

/// Shared state store over Redis, used when import runs are spread across
/// processes. Connection management mirrors the rest of the platform: one
/// `ConnectionManager` cloned per operation.
pub struct RedisStateStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStateStore {
    pub async fn connect(url: &str) -> Result<Self, StateError> {
        let client = redis::Client::open(url)
            .map_err(|e| StateError::ConnectionFailed(e.to_string()))?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| StateError::ConnectionFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }

    fn connection(&self) -> redis::aio::ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let mut conn = self.connection();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StateError> {
        let mut conn = self.connection();
        debug!("state SET {}", key);
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn set_if_greater(
        &self,
        key: &str,
        value: i64,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError> {
        let mut conn = self.connection();
        let ttl_secs = ttl.map(|t| t.as_secs() as i64).unwrap_or(0);
        let updated: i64 = redis::Script::new(SET_IF_GREATER)
            .key(key)
            .arg(value)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(updated == 1)
    }

    async fn increment(&self, key: &str, by: i64) -> Result<i64, StateError> {
        let mut conn = self.connection();
        let value: i64 = conn.incr(key, by).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), StateError> {
        let mut conn = self.connection();
        debug!("state DEL {}", key);
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StateError> {
        let mut conn = self.connection();
        conn.expire::<_, bool>(key, ttl.as_secs() as i64).await?;
        Ok(())
    }

    async fn set_add(
        &self,
        key: &str,
        member: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError> {
        let mut conn = self.connection();
        let added: i64 = conn.sadd(key, member).await?;
        if let Some(ttl) = ttl {
            conn.expire::<_, bool>(key, ttl.as_secs() as i64).await?;
        }
        Ok(added > 0)
    }

    async fn set_includes(&self, key: &str, member: &str) -> Result<bool, StateError> {
        let mut conn = self.connection();
        let included: bool = conn.sismember(key, member).await?;
        Ok(included)
    }

    async fn set_includes_many(
        &self,
        key: &str,
        members: &[String],
    ) -> Result<HashSet<String>, StateError> {
        if members.is_empty() {
            return Ok(HashSet::new());
        }
        let mut conn = self.connection();
        let mut pipe = redis::pipe();
        for member in members {
            pipe.sismember(key, member);
        }
        let flags: Vec<bool> = pipe.query_async(&mut conn).await?;
        Ok(members
            .iter()
            .zip(flags)
            .filter(|(_, present)| *present)
            .map(|(member, _)| member.clone())
            .collect())
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StateError> {
        let mut conn = self.connection();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members.into_iter().collect())
    }
}
