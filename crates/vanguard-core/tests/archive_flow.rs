//! End-to-end tests for the history archive on the in-memory store and
//! cache.
//!
//! Time is driven by a [`ManualClock`] so cache expiry is asserted at exact
//! instants. A counting store wrapper shows when intel is served from the
//! cache instead of the store.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use vanguard_core::{
    GameService, HistoryArchive, HistoryConfig, HistoryError, Notification, NotificationHandler,
    NotificationRouter, PlayerStatsProvider, ServiceError,
};
use vanguard_db::{DbError, HistoryStore, ManualClock, MemoryHistoryStore, MemoryIntelCache};
use vanguard_types::{
    Carrier, CarrierId, DarkGalaxy, Galaxy, Game, GameDeleted, GameId, GameSettings, GameState,
    HistorySnapshot, IgnoreBulkUpgrade, Infrastructure, IntelSnapshot, Location, Player,
    PlayerId, PlayerStatistics, Research, ResearchProgress, Star, StarId, TimeMachine, Waypoint,
};

// =============================================================================
// Fakes
// =============================================================================

/// Memory store that counts intel range queries.
#[derive(Default)]
struct CountingStore {
    inner: MemoryHistoryStore,
    intel_queries: AtomicUsize,
}

impl CountingStore {
    fn intel_queries(&self) -> usize {
        self.intel_queries.load(Ordering::SeqCst)
    }
}

impl HistoryStore for CountingStore {
    async fn find_one(
        &self,
        game_id: GameId,
        tick: u64,
    ) -> Result<Option<HistorySnapshot>, DbError> {
        self.inner.find_one(game_id, tick).await
    }

    async fn upsert(&self, snapshot: &HistorySnapshot) -> Result<(), DbError> {
        self.inner.upsert(snapshot).await
    }

    async fn list_intel(
        &self,
        game_id: GameId,
        start_tick: u64,
        end_tick: u64,
    ) -> Result<Vec<IntelSnapshot>, DbError> {
        self.intel_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.list_intel(game_id, start_tick, end_tick).await
    }

    async fn compact_before(&self, game_id: GameId, max_tick: u64) -> Result<u64, DbError> {
        self.inner.compact_before(game_id, max_tick).await
    }

    async fn delete_by_game(&self, game_id: GameId) -> Result<u64, DbError> {
        self.inner.delete_by_game(game_id).await
    }
}

/// Every game has the same settings, which a test may change mid-way.
struct SharedSettings(Arc<RwLock<GameSettings>>);

impl GameService for SharedSettings {
    async fn get_by_id(&self, _game_id: GameId) -> Result<Option<Game>, ServiceError> {
        Ok(None)
    }

    async fn get_game_settings(
        &self,
        _game_id: GameId,
    ) -> Result<Option<GameSettings>, ServiceError> {
        Ok(Some(*self.0.read().await))
    }
}

/// Counts owned stars and carriers straight from the galaxy.
struct CountingStats;

impl PlayerStatsProvider for CountingStats {
    fn get_stats(&self, game: &Game, player: &Player) -> Result<PlayerStatistics, ServiceError> {
        let stars = game
            .galaxy
            .stars
            .iter()
            .filter(|s| s.owned_by_player_id == Some(player.id))
            .count();
        let carriers = game
            .galaxy
            .carriers
            .iter()
            .filter(|c| c.owned_by_player_id == player.id)
            .count();
        Ok(PlayerStatistics {
            total_stars: u32::try_from(stars).unwrap_or(u32::MAX),
            total_carriers: u32::try_from(carriers).unwrap_or(u32::MAX),
            ..PlayerStatistics::default()
        })
    }
}

type Archive = HistoryArchive<
    CountingStore,
    MemoryIntelCache<Arc<ManualClock>>,
    SharedSettings,
    CountingStats,
>;

// =============================================================================
// Helpers
// =============================================================================

fn archive_with(settings: GameSettings, config: HistoryConfig) -> (Archive, Arc<ManualClock>) {
    let (archive, clock, _) = archive_with_settings_handle(settings, config);
    (archive, clock)
}

fn archive_with_settings_handle(
    settings: GameSettings,
    config: HistoryConfig,
) -> (Archive, Arc<ManualClock>, Arc<RwLock<GameSettings>>) {
    let clock = Arc::new(ManualClock::default());
    let handle = Arc::new(RwLock::new(settings));
    let archive = HistoryArchive::new(
        CountingStore::default(),
        MemoryIntelCache::new(Arc::clone(&clock)),
        SharedSettings(Arc::clone(&handle)),
        CountingStats,
        config,
    );
    (archive, clock, handle)
}

fn settings(time_machine: TimeMachine, dark_galaxy: DarkGalaxy) -> GameSettings {
    let mut settings = GameSettings::default();
    settings.general.time_machine = time_machine;
    settings.special_galaxy.dark_galaxy = dark_galaxy;
    settings
}

fn player(alias: &str) -> Player {
    let mut research = Research::default();
    research.weapons = ResearchProgress {
        level: 3,
        progress: 40,
    };
    Player {
        id: PlayerId::new(),
        user_id: None,
        alias: alias.to_owned(),
        avatar: Some(String::from("owl")),
        credits: Decimal::from(250),
        credits_specialists: 2,
        defeated: false,
        defeated_date: None,
        afk: false,
        ready: true,
        ready_to_quit: false,
        researching_now: None,
        researching_next: None,
        research,
    }
}

fn star(owner: Option<PlayerId>) -> Star {
    Star {
        id: StarId::new(),
        owned_by_player_id: owner,
        natural_resources: Infrastructure {
            economy: 20,
            industry: 20,
            science: 20,
        },
        ships: 10,
        ships_actual: Decimal::new(1050, 2),
        specialist_id: None,
        home_star: owner.is_some(),
        warp_gate: false,
        ignore_bulk_upgrade: IgnoreBulkUpgrade::default(),
        infrastructure: Infrastructure::default(),
        location: Location { x: 0.0, y: 0.0 },
    }
}

fn carrier(owner: PlayerId, legs: u32) -> Carrier {
    let waypoints = (0..legs)
        .map(|i| Waypoint {
            source: StarId::new(),
            destination: StarId::new(),
            delay_ticks: i,
            ticks: 3,
        })
        .collect();
    Carrier {
        id: CarrierId::new(),
        owned_by_player_id: owner,
        name: String::from("Scout"),
        orbiting: None,
        ships: 4,
        specialist_id: None,
        is_gift: false,
        location: Location { x: 1.0, y: 1.0 },
        waypoints,
    }
}

/// A two-player game at `tick` where the first player owns one star and a
/// carrier with three planned legs.
fn game(game_id: GameId, settings: GameSettings, tick: u64) -> Game {
    let alpha = player("Alpha");
    let beta = player("Beta");
    let stars = vec![star(Some(alpha.id)), star(None)];
    let carriers = vec![carrier(alpha.id, 3)];
    Game {
        id: game_id,
        settings,
        state: GameState {
            tick,
            production_tick: 0,
        },
        galaxy: Galaxy {
            players: vec![alpha, beta],
            stars,
            carriers,
        },
    }
}

// =============================================================================
// log
// =============================================================================

#[tokio::test]
async fn relogging_a_tick_replaces_the_snapshot() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();

    let first = game(game_id, settings, 5);
    archive.log(&first).await.unwrap();

    let mut second = game(game_id, settings, 5);
    second.galaxy.players.truncate(1);
    second.galaxy.stars.push(star(Some(second.galaxy.players[0].id)));
    archive.log(&second).await.unwrap();

    assert_eq!(archive.store().inner.count(game_id).await, 1);
    let stored = archive
        .get_history_by_tick(game_id, 5)
        .await
        .unwrap()
        .expect("snapshot exists");
    assert_eq!(stored.players.len(), 1);
    assert_eq!(stored.players[0].player_id, second.galaxy.players[0].id);
    assert_eq!(stored.players[0].statistics.total_stars, 2);
    assert_eq!(stored.galaxy.as_ref().unwrap().stars.len(), 3);
}

#[tokio::test]
async fn relogging_keeps_first_production_tick() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();

    let mut first = game(game_id, settings, 30);
    first.state.production_tick = 1;
    archive.log(&first).await.unwrap();

    let mut second = game(game_id, settings, 30);
    second.state.production_tick = 9;
    let snapshot = archive.log(&second).await.unwrap();

    assert_eq!(snapshot.production_tick, 1);
}

#[tokio::test]
async fn archived_carriers_keep_only_next_waypoint() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game = game(GameId::new(), settings, 2);

    let snapshot = archive.log(&game).await.unwrap();

    let carriers = &snapshot.galaxy.as_ref().unwrap().carriers;
    assert_eq!(carriers.len(), 1);
    assert_eq!(carriers[0].waypoints.len(), 1);
    assert_eq!(carriers[0].waypoints[0], game.galaxy.carriers[0].waypoints[0]);
}

#[tokio::test]
async fn snapshot_records_transient_player_fields() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game = game(GameId::new(), settings, 1);

    let snapshot = archive.log(&game).await.unwrap();

    let alpha = &snapshot.players[0];
    let transient = alpha.transient.as_ref().expect("fresh snapshot has transients");
    assert_eq!(transient.alias, "Alpha");
    assert_eq!(transient.credits, Decimal::from(250));
    assert_eq!(alpha.research.weapons.level, 3);
    assert_eq!(alpha.statistics.total_carriers, 1);
}

// =============================================================================
// Compaction
// =============================================================================

#[tokio::test]
async fn disabled_time_machine_compacts_all_but_current_tick() {
    let settings = settings(TimeMachine::Disabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();

    for tick in 0..4 {
        archive.log(&game(game_id, settings, tick)).await.unwrap();
    }

    for tick in 0..3 {
        let aged = archive.get_history_by_tick(game_id, tick).await.unwrap().unwrap();
        assert!(aged.is_compacted(), "tick {tick} should be compacted");
        assert_eq!(aged.players.len(), 2);
        assert_eq!(aged.players[0].statistics.total_stars, 1);
        assert_eq!(aged.players[0].research.weapons.level, 3);
    }
    let current = archive.get_history_by_tick(game_id, 3).await.unwrap().unwrap();
    assert!(!current.is_compacted());
}

#[tokio::test]
async fn compaction_skips_already_compacted_snapshots() {
    let settings = settings(TimeMachine::Disabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();

    archive.log(&game(game_id, settings, 1)).await.unwrap();
    archive.log(&game(game_id, settings, 2)).await.unwrap();

    let later = game(game_id, settings, 3);
    assert_eq!(archive.cleanup_time_machine_history(&later).await.unwrap(), 1);
    assert_eq!(archive.cleanup_time_machine_history(&later).await.unwrap(), 0);
}

#[tokio::test]
async fn retention_window_compacts_only_older_ticks() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let config = HistoryConfig {
        retention_ticks: Some(2),
        ..HistoryConfig::default()
    };
    let (archive, _) = archive_with(settings, config);
    let game_id = GameId::new();

    for tick in 0..6 {
        archive.log(&game(game_id, settings, tick)).await.unwrap();
    }

    // At tick 5 the cutoff is 3: ticks 0..=2 compacted, 3..=5 intact.
    for tick in 0..6 {
        let snapshot = archive.get_history_by_tick(game_id, tick).await.unwrap().unwrap();
        assert_eq!(snapshot.is_compacted(), tick < 3, "tick {tick}");
    }
}

#[tokio::test]
async fn enabled_time_machine_without_window_keeps_everything() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();

    for tick in 0..5 {
        archive.log(&game(game_id, settings, tick)).await.unwrap();
    }

    for tick in 0..5 {
        let snapshot = archive.get_history_by_tick(game_id, tick).await.unwrap().unwrap();
        assert!(!snapshot.is_compacted());
    }
}

// =============================================================================
// Intel
// =============================================================================

#[tokio::test]
async fn extra_dark_galaxy_hides_intel() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Extra);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();
    archive.log(&game(game_id, settings, 1)).await.unwrap();

    let ranges = [
        (None, None),
        (Some(0), Some(10)),
        (Some(5), Some(1)),
        (Some(u64::MAX), None),
    ];
    for (start, end) in ranges {
        let result = archive.list_intel(game_id, start, end).await;
        assert!(
            matches!(result, Err(HistoryError::IntelUnavailable { game_id: id }) if id == game_id),
            "range {start:?}..{end:?} leaked intel"
        );
    }
    assert_eq!(archive.store().intel_queries(), 0);
}

#[tokio::test]
async fn cached_intel_is_hidden_once_dark_galaxy_turns_extra() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _, handle) = archive_with_settings_handle(settings, HistoryConfig::default());
    let game_id = GameId::new();
    archive.log(&game(game_id, settings, 1)).await.unwrap();

    let cached = archive.list_intel(game_id, None, None).await.unwrap();
    assert_eq!(cached.len(), 1);

    handle.write().await.special_galaxy.dark_galaxy = DarkGalaxy::Extra;

    let result = archive.list_intel(game_id, None, None).await;
    assert!(matches!(result, Err(HistoryError::IntelUnavailable { .. })));
    assert_eq!(archive.store().intel_queries(), 1);
}

#[tokio::test]
async fn standard_dark_galaxy_allows_intel() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Standard);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();
    archive.log(&game(game_id, settings, 1)).await.unwrap();

    let intel = archive.list_intel(game_id, None, None).await.unwrap();

    assert_eq!(intel.len(), 1);
}

#[tokio::test]
async fn intel_is_ascending_and_bounded() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();

    for tick in [4, 1, 7, 2, 9] {
        archive.log(&game(game_id, settings, tick)).await.unwrap();
    }

    let intel = archive.list_intel(game_id, Some(2), Some(7)).await.unwrap();
    let ticks: Vec<u64> = intel.iter().map(|i| i.tick).collect();
    assert_eq!(ticks, vec![2, 4, 7]);
    assert_eq!(intel[0].players[0].statistics.total_stars, 1);
    assert_eq!(intel[0].players[0].research.weapons, 3);
}

#[tokio::test]
async fn intel_is_cached_until_ttl_elapses() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, clock) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();
    archive.log(&game(game_id, settings, 1)).await.unwrap();

    let first = archive.list_intel(game_id, None, None).await.unwrap();
    assert_eq!(archive.store().intel_queries(), 1);

    // A new tick lands, but the cached result is still served.
    archive.log(&game(game_id, settings, 2)).await.unwrap();
    clock.advance(Duration::from_secs(30 * 60));
    let cached = archive.list_intel(game_id, None, None).await.unwrap();
    assert_eq!(cached, first);
    assert_eq!(archive.store().intel_queries(), 1);

    clock.advance(Duration::from_secs(31 * 60));
    let fresh = archive.list_intel(game_id, None, None).await.unwrap();
    assert_eq!(archive.store().intel_queries(), 2);
    assert_eq!(fresh.len(), 2);
}

#[tokio::test]
async fn different_ranges_are_cached_separately() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();
    archive.log(&game(game_id, settings, 1)).await.unwrap();

    archive.list_intel(game_id, None, None).await.unwrap();
    archive.list_intel(game_id, Some(0), Some(1)).await.unwrap();
    archive.list_intel(game_id, Some(0), Some(1)).await.unwrap();

    assert_eq!(archive.store().intel_queries(), 2);
}

#[tokio::test]
async fn configured_ttl_is_honored() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let config = HistoryConfig {
        intel_cache_ttl_secs: 60,
        ..HistoryConfig::default()
    };
    let (archive, clock) = archive_with(settings, config);
    let game_id = GameId::new();

    archive.list_intel(game_id, None, None).await.unwrap();
    clock.advance(Duration::from_secs(61));
    archive.list_intel(game_id, None, None).await.unwrap();

    assert_eq!(archive.store().intel_queries(), 2);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn game_deleted_notification_removes_history() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let archive = Arc::new(archive);
    let game_id = GameId::new();
    let other = GameId::new();

    for tick in 0..3 {
        archive.log(&game(game_id, settings, tick)).await.unwrap();
    }
    archive.log(&game(other, settings, 0)).await.unwrap();

    let mut router = NotificationRouter::new();
    let handler: Arc<dyn NotificationHandler> = archive.clone();
    router.register(handler);
    router
        .dispatch(&Notification::from(GameDeleted { game_id }))
        .await
        .unwrap();

    assert_eq!(archive.store().inner.count(game_id).await, 0);
    assert_eq!(archive.store().inner.count(other).await, 1);
}

#[tokio::test]
async fn delete_by_game_id_reports_removed_rows() {
    let settings = settings(TimeMachine::Enabled, DarkGalaxy::Disabled);
    let (archive, _) = archive_with(settings, HistoryConfig::default());
    let game_id = GameId::new();

    for tick in 0..4 {
        archive.log(&game(game_id, settings, tick)).await.unwrap();
    }

    assert_eq!(archive.delete_by_game_id(game_id).await.unwrap(), 4);
    assert!(archive.get_history_by_tick(game_id, 0).await.unwrap().is_none());
}
