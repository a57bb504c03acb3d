//! Budget allocation for AI-controlled players.
//!
//! Once per tick per AI player the orchestrator calls
//! [`AiPolicyEngine::apply_policy`]. What the AI buys depends on where the
//! tick falls in the production cycle:
//!
//! | Phase | Condition | Spend |
//! |-------|-----------|-------|
//! | First | `tick % n == 1` | 20% science, 30% industry |
//! | Last | `tick % n == n - 1` | 100% economy |
//! | Mid | otherwise | nothing |
//!
//! Budgets are whole credits: `floor(floor(credits) / 100 * pct)`. On the
//! first tick both budgets come from the balance *before* either purchase.
//!
//! After every run the player's credits are clamped to zero or more. The
//! upgrade executor has been seen leaving balances slightly negative; the
//! clamp hides that from everything downstream without signalling it.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use vanguard_types::{FundingSource, GameTickContext, InfrastructureKind, Player, PlayerId};

use crate::config::PolicyConfig;
use crate::ports::{BulkUpgradeRequest, ServiceError, UpgradeBudgetExecutor};

/// Errors from running the AI policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy was invoked for a human-controlled player.
    #[error("player {player_id} is not under AI control")]
    NotAiControlled {
        /// The offending player.
        player_id: PlayerId,
    },

    /// A budget computation over- or underflowed.
    #[error("arithmetic overflow in budget computation: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: String,
    },

    /// The upgrade executor failed.
    #[error("bulk upgrade failed: {source}")]
    Upgrade {
        /// The underlying collaborator error.
        #[from]
        source: ServiceError,
    },
}

/// Where a tick sits in its production cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// The tick right after production.
    First,
    /// The tick right before production.
    Last,
    /// Any other tick.
    Mid,
}

impl TickPhase {
    /// Classify `tick` within a cycle of `production_ticks`.
    ///
    /// First wins when a cycle is so short that both conditions hold. A
    /// zero-length cycle never matches either.
    pub const fn classify(tick: u64, production_ticks: u64) -> Self {
        let Some(position) = tick.checked_rem(production_ticks) else {
            return Self::Mid;
        };
        if position == 1 {
            return Self::First;
        }
        match production_ticks.checked_sub(1) {
            Some(last) if position == last => Self::Last,
            _ => Self::Mid,
        }
    }

    /// Classify the tick described by `ctx`.
    pub const fn of(ctx: &GameTickContext) -> Self {
        Self::classify(ctx.tick, ctx.production_ticks)
    }
}

/// What one policy run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOutcome {
    /// Phase of the tick.
    pub phase: TickPhase,
    /// Upgrade orders issued, in order.
    pub requests: Vec<BulkUpgradeRequest>,
}

/// Decides how much an AI player spends, and on what, each tick.
pub struct AiPolicyEngine<E> {
    executor: E,
    config: PolicyConfig,
}

impl<E: UpgradeBudgetExecutor> AiPolicyEngine<E> {
    /// Create an engine that places orders through `executor`.
    pub const fn new(executor: E, config: PolicyConfig) -> Self {
        Self { executor, config }
    }

    /// The executor orders are placed through.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Run the policy for one AI player on one tick.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotAiControlled`] without touching the player
    /// if `player` is human. Executor failures are returned after the
    /// credit clamp has been applied.
    pub async fn apply_policy(
        &self,
        ctx: &GameTickContext,
        player: &mut Player,
    ) -> Result<PolicyOutcome, PolicyError> {
        if !player.is_ai() {
            tracing::warn!(
                game_id = %ctx.game_id,
                player_id = %player.id,
                "AI policy invoked for a human player"
            );
            return Err(PolicyError::NotAiControlled {
                player_id: player.id,
            });
        }

        let phase = TickPhase::of(ctx);
        let result = match phase {
            TickPhase::First => self.play_first_tick(ctx, player).await,
            TickPhase::Last => self.play_last_tick(ctx, player).await,
            TickPhase::Mid => Ok(Vec::new()),
        };

        player.credits = player.credits.max(Decimal::ZERO);

        let requests = result?;
        Ok(PolicyOutcome { phase, requests })
    }

    async fn play_first_tick(
        &self,
        ctx: &GameTickContext,
        player: &mut Player,
    ) -> Result<Vec<BulkUpgradeRequest>, PolicyError> {
        let credits = player.credits.floor();
        if credits <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        // Both budgets from one balance; the science purchase must not
        // shrink the industry budget.
        let science = budget(credits, self.config.first_tick_science_percentage)?;
        let industry = budget(credits, self.config.first_tick_industry_percentage)?;

        let mut issued = Vec::new();
        for (infrastructure, amount) in [
            (InfrastructureKind::Science, science),
            (InfrastructureKind::Industry, industry),
        ] {
            if let Some(request) = self.upgrade(ctx, player, infrastructure, amount).await? {
                issued.push(request);
            }
        }
        Ok(issued)
    }

    async fn play_last_tick(
        &self,
        ctx: &GameTickContext,
        player: &mut Player,
    ) -> Result<Vec<BulkUpgradeRequest>, PolicyError> {
        let credits = player.credits.floor();
        if credits <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let economy = budget(credits, self.config.last_tick_economy_percentage)?;
        let issued = self
            .upgrade(ctx, player, InfrastructureKind::Economy, economy)
            .await?;
        Ok(issued.into_iter().collect())
    }

    /// Place one order unless the budget is zero.
    async fn upgrade(
        &self,
        ctx: &GameTickContext,
        player: &mut Player,
        infrastructure: InfrastructureKind,
        amount: u64,
    ) -> Result<Option<BulkUpgradeRequest>, PolicyError> {
        if amount == 0 {
            return Ok(None);
        }

        let request = BulkUpgradeRequest {
            funding_source: FundingSource::TotalCredits,
            infrastructure,
            budget: amount,
            restrict_to_active: false,
        };
        self.executor.upgrade_bulk(ctx, player, &request).await?;

        tracing::debug!(
            game_id = %ctx.game_id,
            player_id = %player.id,
            tick = ctx.tick,
            ?infrastructure,
            budget = amount,
            "AI bulk upgrade"
        );
        Ok(Some(request))
    }
}

/// `floor(credits / 100 * percentage)` as whole credits.
///
/// `credits` is already floored by the caller.
fn budget(credits: Decimal, percentage: u32) -> Result<u64, PolicyError> {
    let overflow = || PolicyError::ArithmeticOverflow {
        context: format!("{percentage}% of {credits} credits"),
    };
    credits
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|share| share.checked_mul(Decimal::from(percentage)))
        .map(|amount| amount.floor())
        .and_then(|amount| amount.to_u64())
        .ok_or_else(overflow)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use vanguard_types::{Galaxy, Game, GameId, GameSettings, GameState, Research};

    use super::*;

    /// Records every order and optionally overspends to mimic the
    /// executor's known defect.
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(Decimal, BulkUpgradeRequest)>>,
        overspend: Decimal,
        fail: bool,
    }

    impl RecordingExecutor {
        fn calls(&self) -> Vec<(Decimal, BulkUpgradeRequest)> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl UpgradeBudgetExecutor for RecordingExecutor {
        async fn upgrade_bulk(
            &self,
            _ctx: &GameTickContext,
            player: &mut Player,
            request: &BulkUpgradeRequest,
        ) -> Result<(), ServiceError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((player.credits, *request));
            if self.fail {
                return Err(ServiceError::Unavailable {
                    service: "star-upgrade",
                    message: String::from("timeout"),
                });
            }
            player.credits = player.credits - Decimal::from(request.budget) - self.overspend;
            Ok(())
        }
    }

    fn ctx(tick: u64) -> GameTickContext {
        let mut settings = GameSettings::default();
        settings.galaxy.production_ticks = 24;
        let game = Game {
            id: GameId::new(),
            settings,
            state: GameState {
                tick,
                production_tick: tick / 24,
            },
            galaxy: Galaxy::default(),
        };
        game.tick_context()
    }

    fn ai_player(credits: Decimal) -> Player {
        Player {
            id: PlayerId::new(),
            user_id: None,
            alias: String::from("Bot"),
            avatar: None,
            credits,
            credits_specialists: 0,
            defeated: true,
            defeated_date: None,
            afk: false,
            ready: false,
            ready_to_quit: false,
            researching_now: None,
            researching_next: None,
            research: Research::default(),
        }
    }

    fn engine(executor: RecordingExecutor) -> AiPolicyEngine<RecordingExecutor> {
        AiPolicyEngine::new(executor, PolicyConfig::default())
    }

    // -----------------------------------------------------------------------
    // Phase classification
    // -----------------------------------------------------------------------

    #[test]
    fn classify_first_last_and_mid() {
        assert_eq!(TickPhase::classify(1, 24), TickPhase::First);
        assert_eq!(TickPhase::classify(25, 24), TickPhase::First);
        assert_eq!(TickPhase::classify(23, 24), TickPhase::Last);
        assert_eq!(TickPhase::classify(47, 24), TickPhase::Last);
        assert_eq!(TickPhase::classify(0, 24), TickPhase::Mid);
        assert_eq!(TickPhase::classify(12, 24), TickPhase::Mid);
    }

    #[test]
    fn classify_degenerate_cycles() {
        assert_eq!(TickPhase::classify(5, 0), TickPhase::Mid);
        // Every tick is the last tick of a one-tick cycle.
        assert_eq!(TickPhase::classify(5, 1), TickPhase::Last);
        // In a two-tick cycle both conditions hold; first wins.
        assert_eq!(TickPhase::classify(3, 2), TickPhase::First);
    }

    #[test]
    fn budget_floors_each_step() {
        assert_eq!(budget(Decimal::from(1000), 20).unwrap(), 200);
        assert_eq!(budget(Decimal::from(1000), 30).unwrap(), 300);
        assert_eq!(budget(Decimal::from(999), 100).unwrap(), 999);
        assert_eq!(budget(Decimal::from(4), 20).unwrap(), 0);
        assert_eq!(budget(Decimal::from(17), 30).unwrap(), 5);
    }

    // -----------------------------------------------------------------------
    // apply_policy
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn first_tick_budgets_share_pre_spend_balance() {
        let engine = engine(RecordingExecutor::default());
        let mut player = ai_player(Decimal::from(1000));

        let outcome = engine.apply_policy(&ctx(1), &mut player).await.unwrap();

        assert_eq!(outcome.phase, TickPhase::First);
        let calls = engine.executor().calls();
        assert_eq!(calls.len(), 2);
        let (_, science) = calls[0];
        let (balance_before_industry, industry) = calls[1];
        assert_eq!(science.infrastructure, InfrastructureKind::Science);
        assert_eq!(science.budget, 200);
        assert_eq!(industry.infrastructure, InfrastructureKind::Industry);
        assert_eq!(industry.budget, 300);
        // The executor had already spent the science budget.
        assert_eq!(balance_before_industry, Decimal::from(800));
        assert_eq!(player.credits, Decimal::from(500));
    }

    #[tokio::test]
    async fn orders_draw_from_total_credits_unrestricted() {
        let engine = engine(RecordingExecutor::default());
        let mut player = ai_player(Decimal::from(500));

        let outcome = engine.apply_policy(&ctx(23), &mut player).await.unwrap();

        assert_eq!(outcome.requests.len(), 1);
        let request = outcome.requests[0];
        assert_eq!(request.funding_source, FundingSource::TotalCredits);
        assert!(!request.restrict_to_active);
    }

    #[tokio::test]
    async fn last_tick_spends_everything_on_economy() {
        let engine = engine(RecordingExecutor::default());
        let mut player = ai_player(Decimal::from(999));

        let outcome = engine.apply_policy(&ctx(23), &mut player).await.unwrap();

        assert_eq!(outcome.phase, TickPhase::Last);
        let calls = engine.executor().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.infrastructure, InfrastructureKind::Economy);
        assert_eq!(calls[0].1.budget, 999);
    }

    #[tokio::test]
    async fn fractional_credits_are_floored_before_budgeting() {
        let engine = engine(RecordingExecutor::default());
        let mut player = ai_player(Decimal::new(99_975, 2)); // 999.75

        engine.apply_policy(&ctx(23), &mut player).await.unwrap();

        assert_eq!(engine.executor().calls()[0].1.budget, 999);
    }

    #[tokio::test]
    async fn no_orders_without_positive_credits() {
        let engine = engine(RecordingExecutor::default());

        for credits in [Decimal::ZERO, Decimal::new(5, 1), Decimal::from(-40)] {
            for tick in [1, 23] {
                let mut player = ai_player(credits);
                engine.apply_policy(&ctx(tick), &mut player).await.unwrap();
                assert!(player.credits >= Decimal::ZERO);
            }
        }
        assert!(engine.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn zero_budgets_are_skipped() {
        let engine = engine(RecordingExecutor::default());
        // floor(4 / 100 * 20) = 0, floor(4 / 100 * 30) = 1
        let mut player = ai_player(Decimal::from(4));

        let outcome = engine.apply_policy(&ctx(1), &mut player).await.unwrap();

        assert_eq!(outcome.requests.len(), 1);
        assert_eq!(outcome.requests[0].infrastructure, InfrastructureKind::Industry);
    }

    #[tokio::test]
    async fn mid_cycle_ticks_do_nothing() {
        let engine = engine(RecordingExecutor::default());
        let mut player = ai_player(Decimal::from(1000));

        let outcome = engine.apply_policy(&ctx(12), &mut player).await.unwrap();

        assert_eq!(outcome.phase, TickPhase::Mid);
        assert!(outcome.requests.is_empty());
        assert_eq!(player.credits, Decimal::from(1000));
    }

    #[tokio::test]
    async fn overspend_is_clamped_to_zero() {
        let engine = engine(RecordingExecutor {
            overspend: Decimal::from(25),
            ..RecordingExecutor::default()
        });
        let mut player = ai_player(Decimal::from(999));

        engine.apply_policy(&ctx(23), &mut player).await.unwrap();

        assert_eq!(player.credits, Decimal::ZERO);
    }

    #[tokio::test]
    async fn executor_failure_still_clamps_credits() {
        let engine = engine(RecordingExecutor {
            fail: true,
            ..RecordingExecutor::default()
        });
        let mut player = ai_player(Decimal::from(100));

        let result = engine.apply_policy(&ctx(1), &mut player).await;
        assert!(matches!(result, Err(PolicyError::Upgrade { .. })));
        // Failure on the first order stops the second.
        assert_eq!(engine.executor().calls().len(), 1);
        assert!(player.credits >= Decimal::ZERO);
    }

    #[tokio::test]
    async fn negative_balance_is_clamped_on_idle_tick() {
        let engine = engine(RecordingExecutor::default());
        let mut player = ai_player(Decimal::from(-12));

        engine.apply_policy(&ctx(7), &mut player).await.unwrap();

        assert_eq!(player.credits, Decimal::ZERO);
    }

    #[tokio::test]
    async fn human_player_is_rejected_untouched() {
        let engine = engine(RecordingExecutor::default());
        let mut player = ai_player(Decimal::from(-5));
        player.defeated = false;

        let result = engine.apply_policy(&ctx(1), &mut player).await;

        assert!(matches!(result, Err(PolicyError::NotAiControlled { .. })));
        assert!(engine.executor().calls().is_empty());
        assert_eq!(player.credits, Decimal::from(-5));
    }
}
