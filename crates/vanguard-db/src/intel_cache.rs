//! Time-bounded cache for computed intel results.
//!
//! Intel range queries are cached under an explicit [`IntelCacheKey`]. The
//! in-process [`MemoryIntelCache`] reads time from an injected [`Clock`];
//! the shared `Dragonfly` implementation lives in [`crate::dragonfly`].
//!
//! The memory cache is local to one process. Multiple server instances do
//! not share entries, so a result may be up to one TTL stale elsewhere.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use vanguard_types::{GameId, IntelSnapshot};

use crate::clock::Clock;
use crate::error::DbError;

/// Default lifetime of a cached intel result.
pub const DEFAULT_INTEL_TTL: Duration = Duration::from_secs(3600);

/// Composite key of one intel range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntelCacheKey {
    /// Game queried.
    pub game_id: GameId,
    /// First tick, inclusive.
    pub start_tick: u64,
    /// Last tick, inclusive.
    pub end_tick: u64,
}

impl IntelCacheKey {
    /// Build a key.
    pub const fn new(game_id: GameId, start_tick: u64, end_tick: u64) -> Self {
        Self {
            game_id,
            start_tick,
            end_tick,
        }
    }
}

impl fmt::Display for IntelCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intel:{}:{}:{}", self.game_id, self.start_tick, self.end_tick)
    }
}

/// A key/value cache of intel results with per-entry expiry.
pub trait IntelCache: Send + Sync {
    /// Return the cached value if present and not expired.
    fn get(
        &self,
        key: &IntelCacheKey,
    ) -> impl Future<Output = Result<Option<Vec<IntelSnapshot>>, DbError>> + Send;

    /// Store a value for `ttl`.
    fn put(
        &self,
        key: IntelCacheKey,
        value: &[IntelSnapshot],
        ttl: Duration,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}

#[derive(Debug)]
struct CacheEntry {
    value: Vec<IntelSnapshot>,
    expires_at: DateTime<Utc>,
}

/// Process-local intel cache.
#[derive(Debug)]
pub struct MemoryIntelCache<C> {
    clock: C,
    entries: Mutex<HashMap<IntelCacheKey, CacheEntry>>,
}

impl<C: Clock> MemoryIntelCache<C> {
    /// Create an empty cache reading time from `clock`.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    ///
    /// [`IntelCache::put`] runs the same sweep before every insert.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now)
    }

    /// Number of live or not-yet-purged entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

fn sweep(entries: &mut HashMap<IntelCacheKey, CacheEntry>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before.saturating_sub(entries.len())
}

/// Instant at which an entry written at `now` with `ttl` expires.
pub(crate) fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, DbError> {
    let delta = TimeDelta::from_std(ttl)
        .map_err(|e| DbError::Config(format!("cache TTL out of range: {e}")))?;
    Ok(now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC))
}

impl<C: Clock> IntelCache for MemoryIntelCache<C> {
    async fn get(&self, key: &IntelCacheKey) -> Result<Option<Vec<IntelSnapshot>>, DbError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: IntelCacheKey,
        value: &[IntelSnapshot],
        ttl: Duration,
    ) -> Result<(), DbError> {
        let now = self.clock.now();
        let expires_at = expiry_after(now, ttl)?;
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now);
        entries.insert(
            key,
            CacheEntry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }
}
