//! Per-tick history snapshots and the intel projection served from them.
//!
//! A [`HistorySnapshot`] exists once per `(game_id, tick)`. It is written in
//! full when the tick is logged and later compacted: compaction drops every
//! player's [`PlayerTransient`] and the whole [`GalaxyHistory`], keeping only
//! identifiers, statistics, and research. The two shapes are told apart by
//! those `Option`s rather than by inspecting which JSON keys survive.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::ResearchKind;
use crate::game::{
    Carrier, IgnoreBulkUpgrade, Infrastructure, Location, Player, Research, Star, Waypoint,
};
use crate::ids::{CarrierId, GameId, PlayerId, SpecialistId, StarId, UserId};

/// Counters computed by the player stats provider at log time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatistics {
    /// Stars owned.
    pub total_stars: u32,
    /// Home stars owned.
    pub total_home_stars: u32,
    /// Economy infrastructure across owned stars.
    pub total_economy: u32,
    /// Industry infrastructure across owned stars.
    pub total_industry: u32,
    /// Science infrastructure across owned stars.
    pub total_science: u32,
    /// Ships at stars and aboard carriers.
    pub total_ships: u32,
    /// Carriers owned.
    pub total_carriers: u32,
    /// Specialists assigned anywhere.
    pub total_specialists: u32,
    /// Specialists assigned to stars.
    pub total_star_specialists: u32,
    /// Specialists assigned to carriers.
    pub total_carrier_specialists: u32,
    /// Ships produced in the last production cycle.
    pub new_ships: u32,
    /// Warp gates built.
    pub warpgates: u32,
}

/// Per-tick player fields that are discarded on compaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTransient {
    /// Display name at this tick.
    pub alias: String,
    /// Avatar key at this tick.
    pub avatar: Option<String>,
    /// Technology being researched.
    pub researching_now: Option<ResearchKind>,
    /// Technology queued next.
    pub researching_next: Option<ResearchKind>,
    /// Credit balance.
    pub credits: Decimal,
    /// Specialist tokens.
    pub credits_specialists: u32,
    /// Defeated flag.
    pub defeated: bool,
    /// When the seat was defeated.
    pub defeated_date: Option<DateTime<Utc>>,
    /// Defeated for inactivity.
    pub afk: bool,
    /// Ready for the next turn.
    pub ready: bool,
    /// Ready to end the game.
    pub ready_to_quit: bool,
}

impl From<&Player> for PlayerTransient {
    fn from(player: &Player) -> Self {
        Self {
            alias: player.alias.clone(),
            avatar: player.avatar.clone(),
            researching_now: player.researching_now,
            researching_next: player.researching_next,
            credits: player.credits,
            credits_specialists: player.credits_specialists,
            defeated: player.defeated,
            defeated_date: player.defeated_date,
            afk: player.afk,
            ready: player.ready,
            ready_to_quit: player.ready_to_quit,
        }
    }
}

/// One player's entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerHistory {
    /// Player seat.
    pub player_id: PlayerId,
    /// User occupying the seat at this tick.
    pub user_id: Option<UserId>,
    /// Aggregate statistics.
    pub statistics: PlayerStatistics,
    /// Research levels and progress.
    pub research: Research,
    /// Transient fields; `None` once compacted.
    #[serde(default)]
    pub transient: Option<PlayerTransient>,
}

/// Archived star record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarHistory {
    /// Star identifier.
    pub star_id: StarId,
    /// Owner.
    pub owned_by_player_id: Option<PlayerId>,
    /// Natural resources.
    pub natural_resources: Infrastructure,
    /// Declared ship count.
    pub ships: u32,
    /// Actual ship count including fractional production.
    pub ships_actual: Decimal,
    /// Specialist.
    pub specialist_id: Option<SpecialistId>,
    /// Home star flag.
    pub home_star: bool,
    /// Warp gate flag.
    pub warp_gate: bool,
    /// Bulk upgrade opt-outs.
    pub ignore_bulk_upgrade: IgnoreBulkUpgrade,
    /// Infrastructure levels.
    pub infrastructure: Infrastructure,
    /// Position.
    pub location: Location,
}

impl From<&Star> for StarHistory {
    fn from(star: &Star) -> Self {
        Self {
            star_id: star.id,
            owned_by_player_id: star.owned_by_player_id,
            natural_resources: star.natural_resources,
            ships: star.ships,
            ships_actual: star.ships_actual,
            specialist_id: star.specialist_id,
            home_star: star.home_star,
            warp_gate: star.warp_gate,
            ignore_bulk_upgrade: star.ignore_bulk_upgrade,
            infrastructure: star.infrastructure,
            location: star.location,
        }
    }
}

/// Archived carrier record. Holds at most one waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierHistory {
    /// Carrier identifier.
    pub carrier_id: CarrierId,
    /// Owner.
    pub owned_by_player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Star orbited.
    pub orbiting: Option<StarId>,
    /// Ships aboard.
    pub ships: u32,
    /// Specialist.
    pub specialist_id: Option<SpecialistId>,
    /// Gift flag.
    pub is_gift: bool,
    /// Position.
    pub location: Location,
    /// The next waypoint only.
    pub waypoints: Vec<Waypoint>,
}

impl From<&Carrier> for CarrierHistory {
    fn from(carrier: &Carrier) -> Self {
        Self {
            carrier_id: carrier.id,
            owned_by_player_id: carrier.owned_by_player_id,
            name: carrier.name.clone(),
            orbiting: carrier.orbiting,
            ships: carrier.ships,
            specialist_id: carrier.specialist_id,
            is_gift: carrier.is_gift,
            location: carrier.location,
            waypoints: carrier.waypoints.iter().take(1).copied().collect(),
        }
    }
}

/// Stars and carriers of a snapshot; dropped on compaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalaxyHistory {
    /// Star records.
    pub stars: Vec<StarHistory>,
    /// Carrier records.
    pub carriers: Vec<CarrierHistory>,
}

/// The archived state of one game at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Game.
    pub game_id: GameId,
    /// Tick.
    pub tick: u64,
    /// Production cycle count at this tick.
    pub production_tick: u64,
    /// Per-player records, in seat order.
    pub players: Vec<PlayerHistory>,
    /// Stars and carriers; `None` once compacted.
    pub galaxy: Option<GalaxyHistory>,
}

impl HistorySnapshot {
    /// An empty snapshot seeded with its key.
    pub const fn new(game_id: GameId, tick: u64, production_tick: u64) -> Self {
        Self {
            game_id,
            tick,
            production_tick,
            players: Vec::new(),
            galaxy: None,
        }
    }

    /// Returns `true` if this snapshot has been stripped down to statistics.
    pub fn is_compacted(&self) -> bool {
        self.galaxy.is_none() && self.players.iter().all(|p| p.transient.is_none())
    }

    /// Returns `true` if compaction would change this snapshot.
    ///
    /// Matches the store's selection rule: only snapshots that still carry
    /// a non-empty star list are compacted.
    pub fn is_compactable(&self) -> bool {
        self.galaxy.as_ref().is_some_and(|g| !g.stars.is_empty())
    }

    /// Strip transient player fields and the galaxy in place.
    pub fn compact(&mut self) {
        for player in &mut self.players {
            player.transient = None;
        }
        self.galaxy = None;
    }

    /// Project this snapshot onto the fields intel queries expose.
    pub fn to_intel(&self) -> IntelSnapshot {
        IntelSnapshot {
            game_id: self.game_id,
            tick: self.tick,
            players: self
                .players
                .iter()
                .map(|p| IntelPlayer {
                    player_id: p.player_id,
                    statistics: p.statistics,
                    research: ResearchLevels::from(&p.research),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Intel projection
// ---------------------------------------------------------------------------

/// Research levels without progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchLevels {
    /// Weapons level.
    pub weapons: u32,
    /// Banking level.
    pub banking: u32,
    /// Manufacturing level.
    pub manufacturing: u32,
    /// Hyperspace level.
    pub hyperspace: u32,
    /// Scanning level.
    pub scanning: u32,
    /// Experimentation level.
    pub experimentation: u32,
    /// Terraforming level.
    pub terraforming: u32,
    /// Specialists level.
    pub specialists: u32,
}

impl From<&Research> for ResearchLevels {
    fn from(research: &Research) -> Self {
        Self {
            weapons: research.weapons.level,
            banking: research.banking.level,
            manufacturing: research.manufacturing.level,
            hyperspace: research.hyperspace.level,
            scanning: research.scanning.level,
            experimentation: research.experimentation.level,
            terraforming: research.terraforming.level,
            specialists: research.specialists.level,
        }
    }
}

/// A player's statistics at one tick, as served to intel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelPlayer {
    /// Player seat.
    pub player_id: PlayerId,
    /// Aggregate statistics.
    pub statistics: PlayerStatistics,
    /// Research levels.
    pub research: ResearchLevels,
}

/// One tick of intel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntelSnapshot {
    /// Game.
    pub game_id: GameId,
    /// Tick.
    pub tick: u64,
    /// Per-player statistics.
    pub players: Vec<IntelPlayer>,
}
