//! Durable cache for trending data, keyed by language identifier

use async_trait::async_trait;
use common::models::TrendingProjectSet;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value store holding one serialized [`TrendingProjectSet`] per
/// language key (or the sentinel "all" key).
///
/// `get` distinguishes "absent" (`Ok(None)`) from "present but empty"
/// (`Ok(Some(set))` with an empty set); the refresher's stale-data
/// protection depends on that distinction.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<TrendingProjectSet>, CacheError>;
    async fn put(&self, key: &str, value: &TrendingProjectSet) -> Result<(), CacheError>;
}
