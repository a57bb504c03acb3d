//! Explicit routing of domain notifications to their handlers.
//!
//! Components never subscribe themselves. The composition root builds a
//! [`NotificationRouter`], registers each handler once, and feeds every
//! incoming [`Notification`] to [`NotificationRouter::dispatch`]. Handlers
//! run one after another in registration order.

use std::sync::Arc;

use futures::future::BoxFuture;
use vanguard_db::{HistoryStore, IntelCache};
use vanguard_types::{GameDeleted, ReputationIncreased};

use crate::archive::{HistoryArchive, HistoryError};
use crate::negotiation::{TradeError, TradeNegotiationEngine};
use crate::ports::{
    GameService, PlayerStatsProvider, RandomNumberProvider, ReputationTracker, TradeCatalog,
};

/// A notification from another subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A player's reputation toward a counterpart rose.
    ReputationIncreased(Box<ReputationIncreased>),
    /// A game was deleted.
    GameDeleted(GameDeleted),
}

impl From<ReputationIncreased> for Notification {
    fn from(event: ReputationIncreased) -> Self {
        Self::ReputationIncreased(Box::new(event))
    }
}

impl From<GameDeleted> for Notification {
    fn from(event: GameDeleted) -> Self {
        Self::GameDeleted(event)
    }
}

/// A handler failed while processing a notification.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Trade negotiation failed.
    #[error("trade handler failed: {0}")]
    Trade(#[from] TradeError),

    /// History cleanup failed.
    #[error("history handler failed: {0}")]
    History(#[from] HistoryError),
}

/// Something that reacts to notifications.
///
/// Handlers ignore notification kinds they do not care about.
pub trait NotificationHandler: Send + Sync {
    /// Process one notification.
    fn handle<'a>(&'a self, notification: &'a Notification)
    -> BoxFuture<'a, Result<(), DispatchError>>;
}

/// Fans notifications out to registered handlers.
#[derive(Default, Clone)]
pub struct NotificationRouter {
    handlers: Vec<Arc<dyn NotificationHandler>>,
}

impl NotificationRouter {
    /// An empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers run in registration order.
    pub fn register(&mut self, handler: Arc<dyn NotificationHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver `notification` to every handler.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first handler error; later handlers do not
    /// see the notification.
    pub async fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        for handler in &self.handlers {
            handler.handle(notification).await?;
        }
        Ok(())
    }
}

impl<R, N, C, G> NotificationHandler for TradeNegotiationEngine<R, N, C, G>
where
    R: ReputationTracker,
    N: RandomNumberProvider,
    C: TradeCatalog,
    G: GameService,
{
    fn handle<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            if let Notification::ReputationIncreased(event) = notification {
                let outcome = self.on_reputation_increased(event).await?;
                tracing::debug!(game_id = %event.game_id, ?outcome, "Handled reputation increase");
            }
            Ok(())
        })
    }
}

impl<S, C, G, P> NotificationHandler for HistoryArchive<S, C, G, P>
where
    S: HistoryStore,
    C: IntelCache,
    G: GameService,
    P: PlayerStatsProvider,
{
    fn handle<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            if let Notification::GameDeleted(event) = notification {
                self.on_game_deleted(event).await?;
            }
            Ok(())
        })
    }
}
