//! In-memory cache store for tests and local development

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::models::TrendingProjectSet;
use tokio::sync::RwLock;

use crate::{CacheError, CacheStore};

/// Cache store holding serialized entries in a process-local map.
///
/// Values round-trip through JSON so a serialization failure surfaces the
/// same way it would against Redis.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<TrendingProjectSet>, CacheError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &TrendingProjectSet) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        self.entries.write().await.insert(key.to_string(), json);
        Ok(())
    }
}
