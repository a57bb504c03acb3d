//! Builds the archive's storage from [`VanguardConfig`].
//!
//! The embedding server calls [`connect_history_store`] and
//! [`connect_intel_cache`] once at startup and hands the results to
//! [`HistoryArchive::new`](crate::HistoryArchive::new).

use std::time::Duration;

use vanguard_db::{
    DbError, DragonflyIntelCache, DragonflyPool, IntelCache, IntelCacheKey, MemoryIntelCache,
    PgHistoryStore, PostgresPool, SystemClock,
};
use vanguard_types::IntelSnapshot;

use crate::config::{CacheBackend, VanguardConfig};

/// The intel cache selected by `history.cache_backend`.
pub enum ConfiguredIntelCache {
    /// Process-local cache on the system clock.
    Memory(MemoryIntelCache<SystemClock>),
    /// Cache shared through `Dragonfly`.
    Dragonfly(DragonflyIntelCache),
}

impl IntelCache for ConfiguredIntelCache {
    async fn get(&self, key: &IntelCacheKey) -> Result<Option<Vec<IntelSnapshot>>, DbError> {
        match self {
            Self::Memory(cache) => cache.get(key).await,
            Self::Dragonfly(cache) => cache.get(key).await,
        }
    }

    async fn put(
        &self,
        key: IntelCacheKey,
        value: &[IntelSnapshot],
        ttl: Duration,
    ) -> Result<(), DbError> {
        match self {
            Self::Memory(cache) => cache.put(key, value, ttl).await,
            Self::Dragonfly(cache) => cache.put(key, value, ttl).await,
        }
    }
}

/// Build the configured intel cache, connecting to `Dragonfly` if selected.
///
/// # Errors
///
/// Returns [`DbError`] if the `Dragonfly` connection fails.
pub async fn connect_intel_cache(config: &VanguardConfig) -> Result<ConfiguredIntelCache, DbError> {
    match config.history.cache_backend {
        CacheBackend::Memory => {
            tracing::info!(backend = "memory", "Intel cache configured");
            Ok(ConfiguredIntelCache::Memory(MemoryIntelCache::new(SystemClock)))
        }
        CacheBackend::Dragonfly => {
            let pool = DragonflyPool::connect(&config.infrastructure.dragonfly_url).await?;
            tracing::info!(backend = "dragonfly", "Intel cache configured");
            Ok(ConfiguredIntelCache::Dragonfly(DragonflyIntelCache::new(pool)))
        }
    }
}

/// Connect to `PostgreSQL`, apply migrations, and return the history store.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or a migration fails.
pub async fn connect_history_store(config: &VanguardConfig) -> Result<PgHistoryStore, DbError> {
    let pool = PostgresPool::connect_url(&config.infrastructure.postgres_url).await?;
    Ok(pool.history_store())
}
