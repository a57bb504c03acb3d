//! AI technology trading driven by reputation changes.
//!
//! When the reputation subsystem reports that an AI player's reputation
//! toward a counterpart rose, the AI may gift the counterpart one
//! technology it can afford:
//!
//! 1. Human acting players are ignored.
//! 2. Reputation below the minimum (default 1) ends the attempt.
//! 3. A roll in `[0, 100]` is drawn against `50 + 5 * score`.
//! 4. Tradeable technologies priced above `floor(credits)` are dropped.
//! 5. One of the rest is picked uniformly and sent.
//!
//! Nothing is retried. Collaborator failures propagate to the caller.

use vanguard_types::{GameId, ReputationIncreased, TradeableTechnology};

use crate::config::{TradeConfig, TradeGate};
use crate::ports::{
    GameService, RandomNumberProvider, ReputationTracker, ServiceError, TradeCatalog,
};

/// Upper bound of the trade roll.
const ROLL_MAX: u32 = 100;

/// Errors from a trade attempt.
#[derive(Debug, thiserror::Error)]
pub enum TradeError {
    /// The game named in the notification does not exist.
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// A collaborator failed.
    #[error("trade collaborator failed: {0}")]
    Service(#[from] ServiceError),

    /// The random provider returned an index outside the candidate list.
    #[error("random index {index} out of range for {len} candidates")]
    RandomOutOfRange {
        /// Index returned.
        index: u32,
        /// Number of candidates.
        len: usize,
    },
}

/// How a trade attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// The acting player is human.
    NotAiControlled,
    /// Reputation has not reached the trading threshold.
    ReputationTooLow {
        /// Current score.
        score: i32,
    },
    /// The roll exceeded the trade chance under a probabilistic gate.
    RollFailed {
        /// Value rolled.
        roll: u32,
        /// Chance it had to beat.
        chance: u32,
    },
    /// No tradeable technology fits the acting player's credits.
    NothingAffordable,
    /// A technology was sent.
    Sent {
        /// Technology name.
        name: String,
        /// Level sent.
        level: u32,
    },
}

/// Decides whether an AI player gifts a technology when reputation rises.
pub struct TradeNegotiationEngine<R, N, C, G> {
    reputation: R,
    random: N,
    catalog: C,
    games: G,
    config: TradeConfig,
}

impl<R, N, C, G> TradeNegotiationEngine<R, N, C, G>
where
    R: ReputationTracker,
    N: RandomNumberProvider,
    C: TradeCatalog,
    G: GameService,
{
    /// Create an engine over its collaborators.
    pub const fn new(reputation: R, random: N, catalog: C, games: G, config: TradeConfig) -> Self {
        Self {
            reputation,
            random,
            catalog,
            games,
            config,
        }
    }

    /// The trade catalog in use.
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Trade chance for a reputation score, clamped to `[0, 100]`.
    pub fn trade_chance(&self, score: i32) -> u32 {
        let chance = self
            .config
            .chance_step
            .saturating_mul(score)
            .saturating_add(self.config.chance_base)
            .clamp(0, 100);
        u32::try_from(chance).unwrap_or(0)
    }

    /// React to a reputation increase.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::GameNotFound`] if the game is gone,
    /// [`TradeError::Service`] if a collaborator fails, and
    /// [`TradeError::RandomOutOfRange`] if the random provider breaks its
    /// contract.
    pub async fn on_reputation_increased(
        &self,
        event: &ReputationIncreased,
    ) -> Result<TradeOutcome, TradeError> {
        let acting = &event.acting_player;
        let counterpart = &event.counterpart_player;

        if !acting.is_ai() {
            return Ok(TradeOutcome::NotAiControlled);
        }

        let score = self.reputation.get_reputation(acting, counterpart).score;
        if score < self.config.min_reputation {
            return Ok(TradeOutcome::ReputationTooLow { score });
        }

        let chance = self.trade_chance(score);
        let roll = self.random.next(ROLL_MAX);
        if self.config.gate == TradeGate::Probabilistic && roll > chance {
            tracing::debug!(
                game_id = %event.game_id,
                player_id = %acting.id,
                roll,
                chance,
                "Trade roll failed"
            );
            return Ok(TradeOutcome::RollFailed { roll, chance });
        }

        let game = self
            .games
            .get_by_id(event.game_id)
            .await?
            .ok_or(TradeError::GameNotFound(event.game_id))?;

        let budget = acting.credits.floor();
        let affordable: Vec<TradeableTechnology> = self
            .catalog
            .get_tradeable_technologies(&game, acting, counterpart.id)
            .await?
            .into_iter()
            .filter(|tech| tech.cost <= budget)
            .collect();

        let Some(last) = affordable.len().checked_sub(1) else {
            return Ok(TradeOutcome::NothingAffordable);
        };

        let tech = self.pick(&affordable, last)?;
        self.catalog
            .send_technology(&game, acting, counterpart.id, &tech.name, tech.level)
            .await?;

        tracing::debug!(
            game_id = %event.game_id,
            player_id = %acting.id,
            counterpart_id = %counterpart.id,
            tech = %tech.name,
            level = tech.level,
            "AI sent technology"
        );

        Ok(TradeOutcome::Sent {
            name: tech.name.clone(),
            level: tech.level,
        })
    }

    /// Pick uniformly from a non-empty list whose last index is `last`.
    fn pick<'a>(
        &self,
        candidates: &'a [TradeableTechnology],
        last: usize,
    ) -> Result<&'a TradeableTechnology, TradeError> {
        let max = u32::try_from(last).unwrap_or(u32::MAX);
        let index = self.random.next(max);
        usize::try_from(index)
            .ok()
            .and_then(|i| candidates.get(i))
            .ok_or(TradeError::RandomOutOfRange {
                index,
                len: candidates.len(),
            })
    }
}

impl TradeOutcome {
    /// Returns `true` if a technology changed hands.
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}
