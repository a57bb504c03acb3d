//! In-process [`HistoryStore`] backed by a `BTreeMap`.
//!
//! Keys are `(game_id, tick)` so a game's snapshots sit next to each other
//! in tick order and range queries are a map range scan. Used by tests and
//! by single-process deployments that do not need durable history.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use vanguard_types::{GameId, HistorySnapshot, IntelSnapshot};

use crate::error::DbError;
use crate::history_store::HistoryStore;

/// History snapshots held in memory.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    snapshots: RwLock<BTreeMap<(GameId, u64), HistorySnapshot>>,
}

impl MemoryHistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots stored for a game.
    pub async fn count(&self, game_id: GameId) -> usize {
        self.snapshots
            .read()
            .await
            .range((game_id, 0)..=(game_id, u64::MAX))
            .count()
    }
}

impl HistoryStore for MemoryHistoryStore {
    async fn find_one(
        &self,
        game_id: GameId,
        tick: u64,
    ) -> Result<Option<HistorySnapshot>, DbError> {
        Ok(self.snapshots.read().await.get(&(game_id, tick)).cloned())
    }

    async fn upsert(&self, snapshot: &HistorySnapshot) -> Result<(), DbError> {
        self.snapshots
            .write()
            .await
            .insert((snapshot.game_id, snapshot.tick), snapshot.clone());
        Ok(())
    }

    async fn list_intel(
        &self,
        game_id: GameId,
        start_tick: u64,
        end_tick: u64,
    ) -> Result<Vec<IntelSnapshot>, DbError> {
        if start_tick > end_tick {
            return Ok(Vec::new());
        }
        Ok(self
            .snapshots
            .read()
            .await
            .range((game_id, start_tick)..=(game_id, end_tick))
            .map(|(_, snapshot)| snapshot.to_intel())
            .collect())
    }

    async fn compact_before(&self, game_id: GameId, max_tick: u64) -> Result<u64, DbError> {
        let mut snapshots = self.snapshots.write().await;
        let mut compacted: u64 = 0;
        for (_, snapshot) in snapshots.range_mut((game_id, 0)..(game_id, max_tick)) {
            if snapshot.is_compactable() {
                snapshot.compact();
                compacted = compacted.saturating_add(1);
            }
        }
        Ok(compacted)
    }

    async fn delete_by_game(&self, game_id: GameId) -> Result<u64, DbError> {
        let mut snapshots = self.snapshots.write().await;
        let before = snapshots.len();
        snapshots.retain(|(id, _), _| *id != game_id);
        let removed = before.saturating_sub(snapshots.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
