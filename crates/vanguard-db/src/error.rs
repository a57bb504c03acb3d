//! Failures of the history store and intel cache.
//!
//! Both backends report through [`DbError`]. The archive does not retry;
//! a failed query reaches the caller unchanged.

/// A history store or intel cache failure.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `game_history` query failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Applying the `game_history` schema failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A `Dragonfly` command failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A snapshot or intel payload did not round-trip through JSON.
    #[error("JSON encoding error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored tick is outside the range ticks can take.
    #[error("stored tick {value} is not a valid tick")]
    InvalidTick {
        /// The raw column value.
        value: i64,
    },

    /// A connection string or cache TTL could not be used.
    #[error("configuration error: {0}")]
    Config(String),
}
