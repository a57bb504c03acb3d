//! Interfaces to the collaborators this core calls but does not own.
//!
//! The game service, reputation subsystem, trade catalog, upgrade
//! purchasing, and stats computation all live elsewhere. Each is a trait
//! here so engines can be driven by production adapters or by recording
//! fakes in tests. Failures come back as [`ServiceError`] and are passed
//! through unchanged.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use vanguard_types::{
    FundingSource, Game, GameId, GameSettings, GameTickContext, InfrastructureKind, Player,
    PlayerId, PlayerStatistics, Reputation, TradeableTechnology,
};

/// A failure reported by an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The collaborator could not be reached or timed out.
    #[error("{service} unavailable: {message}")]
    Unavailable {
        /// Which collaborator failed.
        service: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// The collaborator refused the request.
    #[error("{service} rejected request: {message}")]
    Rejected {
        /// Which collaborator refused.
        service: &'static str,
        /// Reason given.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// One bulk-upgrade purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkUpgradeRequest {
    /// Balance to draw from.
    pub funding_source: FundingSource,
    /// Infrastructure category to buy.
    pub infrastructure: InfrastructureKind,
    /// Credits to spend.
    pub budget: u64,
    /// Only upgrade stars the player is actively developing.
    pub restrict_to_active: bool,
}

/// Spends a credit budget on infrastructure.
pub trait UpgradeBudgetExecutor: Send + Sync {
    /// Buy as many levels of `request.infrastructure` as `request.budget`
    /// affords, deducting the spend from `player.credits`.
    fn upgrade_bulk(
        &self,
        ctx: &GameTickContext,
        player: &mut Player,
        request: &BulkUpgradeRequest,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

// ---------------------------------------------------------------------------
// Diplomacy & trade
// ---------------------------------------------------------------------------

/// Read access to reputation scores.
pub trait ReputationTracker: Send + Sync {
    /// `player`'s reputation toward `counterpart`.
    fn get_reputation(&self, player: &Player, counterpart: &Player) -> Reputation;
}

/// Technology trading between players.
pub trait TradeCatalog: Send + Sync {
    /// Technologies `player` knows at a higher level than `counterpart_id`.
    fn get_tradeable_technologies(
        &self,
        game: &Game,
        player: &Player,
        counterpart_id: PlayerId,
    ) -> impl Future<Output = Result<Vec<TradeableTechnology>, ServiceError>> + Send;

    /// Transfer a technology level from `player` to `counterpart_id`.
    fn send_technology(
        &self,
        game: &Game,
        player: &Player,
        counterpart_id: PlayerId,
        name: &str,
        level: u32,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// Game lookup.
pub trait GameService: Send + Sync {
    /// Load a game.
    fn get_by_id(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<Option<Game>, ServiceError>> + Send;

    /// Load only a game's settings.
    fn get_game_settings(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<Option<GameSettings>, ServiceError>> + Send;
}

/// Computes a player's aggregate statistics.
pub trait PlayerStatsProvider: Send + Sync {
    /// Statistics for `player` in `game`.
    fn get_stats(&self, game: &Game, player: &Player) -> Result<PlayerStatistics, ServiceError>;
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

/// Uniform random integers.
pub trait RandomNumberProvider: Send + Sync {
    /// A uniform integer in `[0, max_inclusive]`.
    fn next(&self, max_inclusive: u32) -> u32;
}

/// Thread-local OS-seeded randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomNumberProvider for ThreadRandom {
    fn next(&self, max_inclusive: u32) -> u32 {
        rand::rng().random_range(0..=max_inclusive)
    }
}

/// Reproducible randomness from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<SmallRng>,
}

impl SeededRandom {
    /// Create a generator from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl RandomNumberProvider for SeededRandom {
    fn next(&self, max_inclusive: u32) -> u32 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(0..=max_inclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_range() {
        let random = ThreadRandom;
        for _ in 0..200 {
            assert!(random.next(7) <= 7);
        }
        assert_eq!(random.next(0), 0);
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let first: Vec<u32> = (0..16).map(|_| a.next(100)).collect();
        let second: Vec<u32> = (0..16).map(|_| b.next(100)).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|&n| n <= 100));
    }
}
