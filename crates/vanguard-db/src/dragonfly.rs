//! `Dragonfly` (Redis-compatible) shared cache.
//!
//! Lets several server instances share intel results instead of each
//! holding its own [`MemoryIntelCache`](crate::MemoryIntelCache). Entries
//! are JSON strings written with a millisecond expiry, so the server
//! evicts them; nothing here tracks time.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `intel:{game_id}:{start}:{end}` | JSON | Cached intel range result |

use std::time::Duration;

use fred::prelude::*;
use fred::types::Expiration;
use serde::Serialize;
use serde::de::DeserializeOwned;
use vanguard_types::IntelSnapshot;

use crate::error::DbError;
use crate::intel_cache::{IntelCache, IntelCacheKey};

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Serialize `value` as JSON and store it at `key`, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_json_expiring<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
        let _: () = self
            .client
            .set(key, json.as_str(), Some(Expiration::PX(millis)), None, false)
            .await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize from JSON.
    ///
    /// Returns `None` if the key does not exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if deserialization fails.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        value.map(|s| serde_json::from_str(&s)).transpose().map_err(DbError::from)
    }

    /// Delete a key from `Dragonfly`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }
}

/// Intel cache shared across processes through `Dragonfly`.
#[derive(Clone)]
pub struct DragonflyIntelCache {
    pool: DragonflyPool,
}

impl DragonflyIntelCache {
    /// Wrap a connected pool.
    pub const fn new(pool: DragonflyPool) -> Self {
        Self { pool }
    }
}

impl IntelCache for DragonflyIntelCache {
    async fn get(&self, key: &IntelCacheKey) -> Result<Option<Vec<IntelSnapshot>>, DbError> {
        self.pool.get_json(&key.to_string()).await
    }

    async fn put(
        &self,
        key: IntelCacheKey,
        value: &[IntelSnapshot],
        ttl: Duration,
    ) -> Result<(), DbError> {
        self.pool
            .set_json_expiring(&key.to_string(), value, ttl)
            .await?;
        tracing::debug!(%key, entries = value.len(), "Cached intel in Dragonfly");
        Ok(())
    }
}
