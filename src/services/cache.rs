use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Community, CommunityCounters, Meeting, Member, Rating};
use crate::services::store::{DocumentStore, StoreError};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Two-tier cache for member attribute reads
///
/// L1 is an in-process moka cache. L2 is Redis, shared across instances, and
/// optional: without it the manager runs on L1 alone.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            ..Self::in_memory(l1_size, ttl_secs)
        })
    }

    /// Create an L1-only cache manager
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            redis: None,
            l1_cache,
            ttl_secs,
        }
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache
                    .insert(key.to_string(), json.as_bytes().to_vec())
                    .await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("DEL").arg(key).query_async::<()>(&mut *conn).await?;
        }
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            redis_enabled: self.redis.is_some(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub redis_enabled: bool,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn member(member_id: &str) -> String {
        format!("member:{}", member_id)
    }
}

/// Document store decorator that serves member reads from the cache.
///
/// Only member accounts are cached; communities and meetings are mutated by
/// the engine and always read through. Cache failures fall back to the store.
pub struct CachedStore<S> {
    inner: S,
    cache: Arc<CacheManager>,
}

impl<S: DocumentStore> CachedStore<S> {
    pub fn new(inner: S, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for CachedStore<S> {
    async fn get_member(&self, member_id: &str) -> Result<Option<Member>, StoreError> {
        let key = CacheKey::member(member_id);

        match self.cache.get::<Member>(&key).await {
            Ok(member) => return Ok(Some(member)),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }

        let member = self.inner.get_member(member_id).await?;
        if let Some(member) = &member {
            if let Err(e) = self.cache.set(&key, member).await {
                tracing::warn!("Cache write failed for {}: {}", key, e);
            }
        }
        Ok(member)
    }

    async fn get_community(&self, community_id: &str) -> Result<Option<Community>, StoreError> {
        self.inner.get_community(community_id).await
    }

    async fn update_community_counters(
        &self,
        community_id: &str,
        counters: &CommunityCounters,
    ) -> Result<(), StoreError> {
        self.inner.update_community_counters(community_id, counters).await
    }

    async fn create_meeting(&self, meeting: &Meeting) -> Result<(), StoreError> {
        self.inner.create_meeting(meeting).await
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, StoreError> {
        self.inner.get_meeting(meeting_id).await
    }

    async fn update_meeting(&self, meeting: &Meeting) -> Result<(), StoreError> {
        self.inner.update_meeting(meeting).await
    }

    async fn create_rating(&self, rating: &Rating) -> Result<(), StoreError> {
        self.inner.create_rating(rating).await
    }
}
