//! Reputation, tradeable technologies, and the notifications that drive
//! AI trade negotiation and history cleanup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::game::Player;
use crate::ids::GameId;

/// One player's reputation score toward a specific counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reputation {
    /// Trust score. Zero or negative means no goodwill.
    pub score: i32,
}

/// A technology level one player can sell to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeableTechnology {
    /// Technology wire name, e.g. `"weapons"`.
    pub name: String,
    /// Level being offered.
    pub level: u32,
    /// Price in credits.
    pub cost: Decimal,
}

/// Emitted by the reputation subsystem when `acting_player`'s reputation
/// toward `counterpart_player` rises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationIncreased {
    /// Game the players belong to.
    pub game_id: GameId,
    /// The player whose reputation changed.
    pub acting_player: Player,
    /// The player the reputation is held toward.
    pub counterpart_player: Player,
    /// Size of the increase.
    pub amount: i32,
}

/// Emitted by the game service after a game is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDeleted {
    /// The deleted game.
    pub game_id: GameId,
}
