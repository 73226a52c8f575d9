//! Redis-backed cache store

use async_trait::async_trait;
use common::models::TrendingProjectSet;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::info;

use crate::{CacheError, CacheStore};

/// Prefix for all trending cache keys
const KEY_PREFIX: &str = "trending:";

/// Cache store backed by Redis. Values are opaque JSON blobs.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis and return a store handle
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        info!("Connecting to Redis...");
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        info!("Redis connected");
        Ok(Self { conn })
    }

    fn full_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<TrendingProjectSet>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::full_key(key)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &TrendingProjectSet) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set(Self::full_key(key), json).await?;
        Ok(())
    }
}
