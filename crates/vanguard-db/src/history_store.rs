//! Persistence for per-tick history snapshots.
//!
//! [`HistoryStore`] is the seam the archive talks to. [`PgHistoryStore`]
//! keeps one `game_history` row per `(game_id, tick)`; the in-memory
//! variant lives in [`crate::memory_store`].
//!
//! # Row layout
//!
//! | Column | Type | Contents |
//! |--------|------|----------|
//! | `game_id` | UUID | Game |
//! | `tick` | BIGINT | Tick |
//! | `production_tick` | BIGINT | Production cycle count |
//! | `players` | JSONB | Array of [`PlayerHistory`] |
//! | `galaxy` | JSONB NULL | [`GalaxyHistory`], NULL once compacted |

use std::future::Future;

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;
use vanguard_types::{
    GalaxyHistory, GameId, HistorySnapshot, IntelPlayer, IntelSnapshot, PlayerHistory,
};

use crate::error::DbError;

/// Durable storage for history snapshots.
///
/// Implementations must keep at most one snapshot per `(game_id, tick)`:
/// [`upsert`](HistoryStore::upsert) replaces any existing one wholesale.
pub trait HistoryStore: Send + Sync {
    /// Fetch the snapshot for one tick.
    fn find_one(
        &self,
        game_id: GameId,
        tick: u64,
    ) -> impl Future<Output = Result<Option<HistorySnapshot>, DbError>> + Send;

    /// Insert the snapshot, or replace the existing one for the same key.
    fn upsert(
        &self,
        snapshot: &HistorySnapshot,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Intel projections for `start_tick <= tick <= end_tick`, ascending by tick.
    fn list_intel(
        &self,
        game_id: GameId,
        start_tick: u64,
        end_tick: u64,
    ) -> impl Future<Output = Result<Vec<IntelSnapshot>, DbError>> + Send;

    /// Compact every snapshot of the game with `tick < max_tick` that still
    /// holds a non-empty star list. Returns how many were compacted.
    fn compact_before(
        &self,
        game_id: GameId,
        max_tick: u64,
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Delete every snapshot of the game. Returns how many were removed.
    fn delete_by_game(&self, game_id: GameId) -> impl Future<Output = Result<u64, DbError>> + Send;
}

/// Clamp a tick into the signed range `PostgreSQL` stores.
fn tick_to_db(tick: u64) -> i64 {
    i64::try_from(tick).unwrap_or(i64::MAX)
}

fn tick_from_db(tick: i64) -> Result<u64, DbError> {
    u64::try_from(tick)
        .ok()
        .ok_or(DbError::InvalidTick { value: tick })
}

/// `game_history` operations on a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl HistoryStore for PgHistoryStore {
    async fn find_one(
        &self,
        game_id: GameId,
        tick: u64,
    ) -> Result<Option<HistorySnapshot>, DbError> {
        let row = sqlx::query_as::<_, HistoryRow>(
            r"SELECT game_id, tick, production_tick, players, galaxy
              FROM game_history
              WHERE game_id = $1 AND tick = $2",
        )
        .bind(game_id.into_inner())
        .bind(tick_to_db(tick))
        .fetch_optional(&self.pool)
        .await?;

        row.map(HistoryRow::into_snapshot).transpose()
    }

    async fn upsert(&self, snapshot: &HistorySnapshot) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO game_history (game_id, tick, production_tick, players, galaxy, updated_at)
              VALUES ($1, $2, $3, $4, $5, now())
              ON CONFLICT (game_id, tick) DO UPDATE SET
                production_tick = EXCLUDED.production_tick,
                players = EXCLUDED.players,
                galaxy = EXCLUDED.galaxy,
                updated_at = now()",
        )
        .bind(snapshot.game_id.into_inner())
        .bind(tick_to_db(snapshot.tick))
        .bind(tick_to_db(snapshot.production_tick))
        .bind(Json(&snapshot.players))
        .bind(snapshot.galaxy.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            game_id = %snapshot.game_id,
            tick = snapshot.tick,
            players = snapshot.players.len(),
            "Upserted history snapshot"
        );
        Ok(())
    }

    async fn list_intel(
        &self,
        game_id: GameId,
        start_tick: u64,
        end_tick: u64,
    ) -> Result<Vec<IntelSnapshot>, DbError> {
        // Project in SQL so transient fields and the galaxy never leave the
        // database. Research is reduced to `{tech: level}`.
        let rows = sqlx::query_as::<_, IntelRow>(
            r"SELECT h.game_id, h.tick,
                     COALESCE((
                        SELECT jsonb_agg(
                                 jsonb_build_object(
                                   'player_id', p->'player_id',
                                   'statistics', p->'statistics',
                                   'research', (
                                     SELECT COALESCE(
                                              jsonb_object_agg(r.key, r.value->'level'),
                                              '{}'::jsonb)
                                     FROM jsonb_each(p->'research') AS r
                                   )
                                 ) ORDER BY e.ord)
                        FROM jsonb_array_elements(h.players) WITH ORDINALITY AS e(p, ord)
                     ), '[]'::jsonb) AS players
              FROM game_history h
              WHERE h.game_id = $1 AND h.tick >= $2 AND h.tick <= $3
              ORDER BY h.tick ASC",
        )
        .bind(game_id.into_inner())
        .bind(tick_to_db(start_tick))
        .bind(tick_to_db(end_tick))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(IntelRow::into_intel).collect()
    }

    async fn compact_before(&self, game_id: GameId, max_tick: u64) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"UPDATE game_history SET
                players = COALESCE((
                    SELECT jsonb_agg(e.p - 'transient' ORDER BY e.ord)
                    FROM jsonb_array_elements(players) WITH ORDINALITY AS e(p, ord)
                ), '[]'::jsonb),
                galaxy = NULL,
                updated_at = now()
              WHERE game_id = $1
                AND tick < $2
                AND galaxy IS NOT NULL
                AND jsonb_array_length(galaxy->'stars') > 0",
        )
        .bind(game_id.into_inner())
        .bind(tick_to_db(max_tick))
        .execute(&self.pool)
        .await?;

        let compacted = result.rows_affected();
        tracing::debug!(%game_id, max_tick, compacted, "Compacted history snapshots");
        Ok(compacted)
    }

    async fn delete_by_game(&self, game_id: GameId) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM game_history WHERE game_id = $1")
            .bind(game_id.into_inner())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        tracing::debug!(%game_id, deleted, "Deleted game history");
        Ok(deleted)
    }
}

/// A row from `game_history`.
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    game_id: Uuid,
    tick: i64,
    production_tick: i64,
    players: Json<Vec<PlayerHistory>>,
    galaxy: Option<Json<GalaxyHistory>>,
}

impl HistoryRow {
    fn into_snapshot(self) -> Result<HistorySnapshot, DbError> {
        Ok(HistorySnapshot {
            game_id: GameId::from_uuid(self.game_id),
            tick: tick_from_db(self.tick)?,
            production_tick: tick_from_db(self.production_tick)?,
            players: self.players.0,
            galaxy: self.galaxy.map(|g| g.0),
        })
    }
}

/// A projected intel row.
#[derive(Debug, sqlx::FromRow)]
struct IntelRow {
    game_id: Uuid,
    tick: i64,
    players: Json<Vec<IntelPlayer>>,
}

impl IntelRow {
    fn into_intel(self) -> Result<IntelSnapshot, DbError> {
        Ok(IntelSnapshot {
            game_id: GameId::from_uuid(self.game_id),
            tick: tick_from_db(self.tick)?,
            players: self.players.0,
        })
    }
}
