//! Per-tick history archive and the intel queries served from it.
//!
//! The tick orchestrator calls [`HistoryArchive::log`] once per tick. Each
//! call writes the whole snapshot for `(game, tick)` and then compacts
//! aged snapshots according to the game's retention:
//!
//! - time machine disabled: everything older than the current tick
//! - `history.retention_ticks` set: everything older than `tick - window`
//! - otherwise: nothing
//!
//! Intel range queries go through an [`IntelCache`] keyed on
//! `(game, start, end)` so repeated reads within the TTL skip the store.

use vanguard_db::{DbError, HistoryStore, IntelCache, IntelCacheKey};
use vanguard_types::{
    CarrierHistory, GalaxyHistory, Game, GameDeleted, GameId, HistorySnapshot, IntelSnapshot,
    PlayerHistory, PlayerTransient, StarHistory, TimeMachine,
};

use crate::config::HistoryConfig;
use crate::ports::{GameService, PlayerStatsProvider, ServiceError};

/// Errors from archive operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The store or cache failed.
    #[error("history storage failed: {0}")]
    Db(#[from] DbError),

    /// A collaborator failed.
    #[error("history collaborator failed: {0}")]
    Service(#[from] ServiceError),

    /// The game's dark galaxy mode hides intel entirely.
    #[error("intel is not available in game {game_id}")]
    IntelUnavailable {
        /// The game queried.
        game_id: GameId,
    },

    /// The game does not exist.
    #[error("game {0} not found")]
    GameNotFound(GameId),
}

/// Writes, compacts, and serves per-tick history.
pub struct HistoryArchive<S, C, G, P> {
    store: S,
    cache: C,
    games: G,
    stats: P,
    config: HistoryConfig,
}

impl<S, C, G, P> HistoryArchive<S, C, G, P>
where
    S: HistoryStore,
    C: IntelCache,
    G: GameService,
    P: PlayerStatsProvider,
{
    /// Create an archive over its store, cache, and collaborators.
    pub const fn new(store: S, cache: C, games: G, stats: P, config: HistoryConfig) -> Self {
        Self {
            store,
            cache,
            games,
            stats,
            config,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The intel cache.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Record the current tick of `game`, then compact aged history.
    ///
    /// Logging the same tick again replaces the earlier snapshot's lists
    /// entirely. The first write's `production_tick` is kept.
    pub async fn log(&self, game: &Game) -> Result<HistorySnapshot, HistoryError> {
        let tick = game.state.tick;
        let production_tick = self
            .store
            .find_one(game.id, tick)
            .await?
            .map_or(game.state.production_tick, |existing| existing.production_tick);

        let mut snapshot = HistorySnapshot::new(game.id, tick, production_tick);
        snapshot.players = game
            .galaxy
            .players
            .iter()
            .map(|player| -> Result<PlayerHistory, ServiceError> {
                Ok(PlayerHistory {
                    player_id: player.id,
                    user_id: player.user_id,
                    statistics: self.stats.get_stats(game, player)?,
                    research: player.research,
                    transient: Some(PlayerTransient::from(player)),
                })
            })
            .collect::<Result<_, _>>()?;
        snapshot.galaxy = Some(GalaxyHistory {
            stars: game.galaxy.stars.iter().map(StarHistory::from).collect(),
            carriers: game.galaxy.carriers.iter().map(CarrierHistory::from).collect(),
        });

        self.store.upsert(&snapshot).await?;
        tracing::debug!(
            game_id = %game.id,
            tick,
            players = snapshot.players.len(),
            "Logged history snapshot"
        );

        self.cleanup_time_machine_history(game).await?;
        Ok(snapshot)
    }

    /// The tick before which snapshots of `game` are compacted, if any.
    pub fn compaction_cutoff(&self, game: &Game) -> Option<u64> {
        let tick = game.state.tick;
        if game.settings.general.time_machine == TimeMachine::Disabled {
            return Some(tick);
        }
        self.config
            .retention_ticks
            .map(|window| tick.saturating_sub(window))
    }

    /// Compact snapshots older than the game's retention cutoff.
    ///
    /// Returns how many snapshots were compacted.
    pub async fn cleanup_time_machine_history(&self, game: &Game) -> Result<u64, HistoryError> {
        let Some(max_tick) = self.compaction_cutoff(game) else {
            return Ok(0);
        };
        if max_tick == 0 {
            return Ok(0);
        }

        let compacted = self.store.compact_before(game.id, max_tick).await?;
        if compacted > 0 {
            tracing::debug!(game_id = %game.id, max_tick, compacted, "Compacted history");
        }
        Ok(compacted)
    }

    /// Per-tick statistics for `start..=end`, ascending by tick.
    ///
    /// Missing bounds default to the whole game.
    pub async fn list_intel(
        &self,
        game_id: GameId,
        start_tick: Option<u64>,
        end_tick: Option<u64>,
    ) -> Result<Vec<IntelSnapshot>, HistoryError> {
        let settings = self
            .games
            .get_game_settings(game_id)
            .await?
            .ok_or(HistoryError::GameNotFound(game_id))?;
        if settings.special_galaxy.dark_galaxy.hides_intel() {
            return Err(HistoryError::IntelUnavailable { game_id });
        }

        let key =
            IntelCacheKey::new(game_id, start_tick.unwrap_or(0), end_tick.unwrap_or(u64::MAX));

        match self.cache.get(&key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => tracing::warn!(%key, error = %e, "Intel cache read failed"),
        }

        let intel = self
            .store
            .list_intel(game_id, key.start_tick, key.end_tick)
            .await?;

        if let Err(e) = self
            .cache
            .put(key, &intel, self.config.intel_cache_ttl())
            .await
        {
            tracing::warn!(%key, error = %e, "Intel cache write failed");
        }
        Ok(intel)
    }

    /// The snapshot of one tick, if logged.
    pub async fn get_history_by_tick(
        &self,
        game_id: GameId,
        tick: u64,
    ) -> Result<Option<HistorySnapshot>, HistoryError> {
        Ok(self.store.find_one(game_id, tick).await?)
    }

    /// Remove every snapshot of a game. Returns how many were removed.
    pub async fn delete_by_game_id(&self, game_id: GameId) -> Result<u64, HistoryError> {
        let deleted = self.store.delete_by_game(game_id).await?;
        tracing::info!(%game_id, deleted, "Deleted game history");
        Ok(deleted)
    }

    /// Handle a game deletion.
    pub async fn on_game_deleted(&self, event: &GameDeleted) -> Result<u64, HistoryError> {
        self.delete_by_game_id(event.game_id).await
    }
}
