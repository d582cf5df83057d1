//! Redis-backed identity cache.
//!
//! Every failure here degrades to a cache miss: the store remains
//! authoritative and ingestion must never fail because Redis did.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use boxscore_core::cache::IdentityCache;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Identity cache over a multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis at `url` with automatic reconnection.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the client cannot be created
    /// or the initial connection fails.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl IdentityCache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, key, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, id: &str, ttl: Duration) {
        let mut conn = self.conn.clone();
        if let Err(err) = conn.set_ex::<_, _, ()>(key, id, ttl.as_secs()).await {
            tracing::warn!(error = %err, key, "cache write failed");
        }
    }

    async fn get_many(&self, keys: &[String]) -> HashMap<String, String> {
        if keys.is_empty() {
            return HashMap::new();
        }
        let mut conn = self.conn.clone();
        match conn.mget::<_, Vec<Option<String>>>(keys).await {
            Ok(values) => keys
                .iter()
                .zip(values)
                .filter_map(|(key, value)| value.map(|v| (key.clone(), v)))
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "batched cache read failed, treating as misses");
                HashMap::new()
            }
        }
    }

    async fn set_many(&self, entries: &[(String, String)], ttl: Duration) {
        if entries.is_empty() {
            return;
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for (key, id) in entries {
            pipe.set_ex(key, id, ttl.as_secs()).ignore();
        }
        let result: Result<(), redis::RedisError> = pipe.query_async(&mut conn).await;
        if let Err(err) = result {
            tracing::warn!(error = %err, "batched cache write failed");
        }
    }
}
