//! AI decisions and history archival for the Vanguard game server.
//!
//! The external tick orchestrator drives two of the components here once
//! per tick; the third reacts to reputation notifications:
//!
//! ```text
//! tick orchestrator --+-- per AI player --> AiPolicyEngine::apply_policy
//!                     +-- per game -------> HistoryArchive::log
//!
//! reputation / game services --> NotificationRouter::dispatch
//!                                    +--> TradeNegotiationEngine
//!                                    +--> HistoryArchive (game deleted)
//! ```
//!
//! # Modules
//!
//! - [`policy`] -- Tick-phase budget allocation for AI players.
//! - [`negotiation`] -- Reputation-driven technology gifting.
//! - [`archive`] -- Snapshot logging, compaction, and cached intel queries.
//! - [`notifications`] -- [`Notification`] routing to registered handlers.
//! - [`ports`] -- Traits for the collaborators this crate calls.
//! - [`config`] -- Configuration loading from `vanguard-config.yaml` into
//!   strongly-typed structs.
//! - [`bootstrap`] -- Store and cache construction from configuration.
//!
//! [`Notification`]: notifications::Notification

pub mod archive;
pub mod bootstrap;
pub mod config;
pub mod negotiation;
pub mod notifications;
pub mod policy;
pub mod ports;

pub use archive::{HistoryArchive, HistoryError};
pub use bootstrap::{ConfiguredIntelCache, connect_history_store, connect_intel_cache};
pub use config::{
    CacheBackend, ConfigError, HistoryConfig, InfrastructureConfig, PolicyConfig, TradeConfig,
    TradeGate, VanguardConfig,
};
pub use negotiation::{TradeError, TradeNegotiationEngine, TradeOutcome};
pub use notifications::{DispatchError, Notification, NotificationHandler, NotificationRouter};
pub use policy::{AiPolicyEngine, PolicyError, PolicyOutcome, TickPhase};
pub use ports::{
    BulkUpgradeRequest, GameService, PlayerStatsProvider, RandomNumberProvider,
    ReputationTracker, SeededRandom, ServiceError, ThreadRandom, TradeCatalog,
    UpgradeBudgetExecutor,
};
