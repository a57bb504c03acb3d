//! Data layer for the Vanguard history archive (`PostgreSQL` + `Dragonfly`).
//!
//! `PostgreSQL` holds one history snapshot per game per tick. Intel range
//! results are cached for an hour, either in-process or in `Dragonfly`
//! when several server instances should share them.
//!
//! # Architecture
//!
//! ```text
//! HistoryArchive
//!     |
//!     +-- log / compact / delete --> HistoryStore (PgHistoryStore | MemoryHistoryStore)
//!     |
//!     +-- list_intel ------------> IntelCache  (MemoryIntelCache | DragonflyIntelCache)
//!                                      | miss
//!                                      +------> HistoryStore::list_intel
//! ```
//!
//! # Modules
//!
//! - [`history_store`] -- [`HistoryStore`] trait and the `PostgreSQL` store
//! - [`memory_store`] -- In-process [`HistoryStore`]
//! - [`intel_cache`] -- [`IntelCache`] trait, composite key, in-process TTL cache
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) shared cache
//! - [`clock`] -- Injectable time source for cache expiry
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`error`] -- Shared error types

pub mod clock;
pub mod dragonfly;
pub mod error;
pub mod history_store;
pub mod intel_cache;
pub mod memory_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use clock::{Clock, ManualClock, SystemClock};
pub use dragonfly::{DragonflyIntelCache, DragonflyPool};
pub use error::DbError;
pub use history_store::{HistoryStore, PgHistoryStore};
pub use intel_cache::{DEFAULT_INTEL_TTL, IntelCache, IntelCacheKey, MemoryIntelCache};
pub use memory_store::MemoryHistoryStore;
pub use postgres::{PostgresConfig, PostgresPool};
