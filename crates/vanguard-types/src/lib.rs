//! Shared type definitions for the Vanguard game core.
//!
//! This crate is the single source of truth for the game model the AI and
//! archive components read, and for the history records they persist.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for games, players, stars, carriers
//! - [`enums`] -- Research, infrastructure, and settings enumerations
//! - [`game`] -- Live game model (players, stars, carriers, settings)
//! - [`history`] -- Per-tick history snapshots and the intel projection
//! - [`diplomacy`] -- Reputation, tradeable technologies, notifications

pub mod diplomacy;
pub mod enums;
pub mod game;
pub mod history;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use diplomacy::{GameDeleted, Reputation, ReputationIncreased, TradeableTechnology};
pub use enums::{DarkGalaxy, FundingSource, InfrastructureKind, ResearchKind, TimeMachine};
pub use game::{
    Carrier, Galaxy, GalaxySettings, Game, GameSettings, GameState, GameTickContext,
    GeneralSettings, IgnoreBulkUpgrade, Infrastructure, Location, Player, Research,
    ResearchProgress, SpecialGalaxySettings, Star, Waypoint,
};
pub use history::{
    CarrierHistory, GalaxyHistory, HistorySnapshot, IntelPlayer, IntelSnapshot, PlayerHistory,
    PlayerStatistics, PlayerTransient, ResearchLevels, StarHistory,
};
pub use ids::{CarrierId, GameId, PlayerId, SpecialistId, StarId, UserId};
