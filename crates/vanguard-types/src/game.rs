//! Live game model as seen by the decision and archival core.
//!
//! These structs mirror the parts of the game document this workspace reads.
//! The game service owns them; the core only reads them, except for
//! [`Player::credits`] which the AI policy clamps after spending.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{DarkGalaxy, ResearchKind, TimeMachine};
use crate::ids::{CarrierId, GameId, PlayerId, SpecialistId, StarId, UserId};

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A game in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// The game identifier.
    pub id: GameId,
    /// Settings fixed at game creation.
    pub settings: GameSettings,
    /// Mutable tick state.
    pub state: GameState,
    /// Everything that lives in the galaxy.
    pub galaxy: Galaxy,
}

impl Game {
    /// Build the tick context used by the AI policy.
    pub const fn tick_context(&self) -> GameTickContext {
        GameTickContext {
            game_id: self.id,
            tick: self.state.tick,
            production_tick: self.state.production_tick,
            production_ticks: self.settings.galaxy.production_ticks,
        }
    }

    /// Look up a player by ID.
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.galaxy.players.iter().find(|p| p.id == player_id)
    }
}

/// Tick counters of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Current tick (0 before the game starts).
    pub tick: u64,
    /// Number of production cycles completed.
    pub production_tick: u64,
}

/// The tick fields needed to classify a tick's phase within a production cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTickContext {
    /// The game being processed.
    pub game_id: GameId,
    /// Current tick.
    pub tick: u64,
    /// Number of production cycles completed.
    pub production_tick: u64,
    /// Length of one production cycle in ticks.
    pub production_ticks: u64,
}

/// The galaxy contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Galaxy {
    /// Player seats, in seat order.
    pub players: Vec<Player>,
    /// All stars.
    pub stars: Vec<Star>,
    /// All carriers.
    pub carriers: Vec<Carrier>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Game settings relevant to this core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// General settings.
    #[serde(default)]
    pub general: GeneralSettings,
    /// Special galaxy settings.
    #[serde(default)]
    pub special_galaxy: SpecialGalaxySettings,
    /// Galaxy timing settings.
    #[serde(default)]
    pub galaxy: GalaxySettings,
}

/// General game settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Whether past ticks may be replayed.
    #[serde(default)]
    pub time_machine: TimeMachine,
}

/// Special galaxy settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialGalaxySettings {
    /// Galaxy visibility mode.
    #[serde(default)]
    pub dark_galaxy: DarkGalaxy,
}

/// Galaxy timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalaxySettings {
    /// Ticks per production cycle.
    #[serde(default = "default_production_ticks")]
    pub production_ticks: u64,
}

impl Default for GalaxySettings {
    fn default() -> Self {
        Self {
            production_ticks: default_production_ticks(),
        }
    }
}

const fn default_production_ticks() -> u64 {
    24
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player seat.
///
/// A seat whose human was defeated (or left) is taken over by the AI, so
/// `defeated == true` is the marker for AI control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Seat identifier.
    pub id: PlayerId,
    /// Owning user account, absent for empty seats.
    pub user_id: Option<UserId>,
    /// Display name.
    pub alias: String,
    /// Avatar key.
    pub avatar: Option<String>,
    /// Spendable credits. Fractional amounts accrue from banking.
    pub credits: Decimal,
    /// Specialist tokens.
    pub credits_specialists: u32,
    /// Whether the seat is defeated (and therefore AI controlled).
    pub defeated: bool,
    /// When the seat was defeated.
    pub defeated_date: Option<DateTime<Utc>>,
    /// Whether the seat was defeated for inactivity.
    pub afk: bool,
    /// Ready for the next turn.
    pub ready: bool,
    /// Ready to end the game.
    pub ready_to_quit: bool,
    /// Technology being researched now.
    pub researching_now: Option<ResearchKind>,
    /// Technology queued next.
    pub researching_next: Option<ResearchKind>,
    /// Research progress.
    pub research: Research,
}

impl Player {
    /// Returns `true` if the AI controls this seat.
    pub const fn is_ai(&self) -> bool {
        self.defeated
    }
}

/// Level and progress of one technology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchProgress {
    /// Current level.
    pub level: u32,
    /// Points toward the next level.
    pub progress: u32,
}

/// Research state across every technology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Research {
    /// Weapons.
    pub weapons: ResearchProgress,
    /// Banking.
    pub banking: ResearchProgress,
    /// Manufacturing.
    pub manufacturing: ResearchProgress,
    /// Hyperspace range.
    pub hyperspace: ResearchProgress,
    /// Scanning range.
    pub scanning: ResearchProgress,
    /// Experimentation.
    pub experimentation: ResearchProgress,
    /// Terraforming.
    pub terraforming: ResearchProgress,
    /// Specialists.
    pub specialists: ResearchProgress,
}

// ---------------------------------------------------------------------------
// Stars & carriers
// ---------------------------------------------------------------------------

/// A position in galaxy space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// Per-category amounts for economy, industry, and science.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infrastructure {
    /// Economy.
    pub economy: u32,
    /// Industry.
    pub industry: u32,
    /// Science.
    pub science: u32,
}

/// Per-category opt-out flags for bulk upgrades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreBulkUpgrade {
    /// Skip economy.
    pub economy: bool,
    /// Skip industry.
    pub industry: bool,
    /// Skip science.
    pub science: bool,
}

/// A star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    /// Star identifier.
    pub id: StarId,
    /// Owner, if captured.
    pub owned_by_player_id: Option<PlayerId>,
    /// Natural resources per category.
    pub natural_resources: Infrastructure,
    /// Garrisoned ships as displayed.
    pub ships: u32,
    /// Garrisoned ships including fractional production.
    pub ships_actual: Decimal,
    /// Assigned specialist.
    pub specialist_id: Option<SpecialistId>,
    /// Whether this is a starting home star.
    pub home_star: bool,
    /// Whether a warp gate is built.
    pub warp_gate: bool,
    /// Bulk upgrade opt-outs.
    pub ignore_bulk_upgrade: IgnoreBulkUpgrade,
    /// Built infrastructure.
    pub infrastructure: Infrastructure,
    /// Position.
    pub location: Location,
}

/// One leg of a carrier's route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Departure star.
    pub source: StarId,
    /// Arrival star.
    pub destination: StarId,
    /// Ticks to wait before departing.
    pub delay_ticks: u32,
    /// Ticks remaining in transit.
    pub ticks: u32,
}

/// A carrier fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    /// Carrier identifier.
    pub id: CarrierId,
    /// Owner.
    pub owned_by_player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Star currently orbited, if not in transit.
    pub orbiting: Option<StarId>,
    /// Ships aboard.
    pub ships: u32,
    /// Assigned specialist.
    pub specialist_id: Option<SpecialistId>,
    /// Whether the carrier is being gifted to another player.
    pub is_gift: bool,
    /// Position.
    pub location: Location,
    /// Planned route, first leg first.
    pub waypoints: Vec<Waypoint>,
}
