//! Enumeration types shared across the Vanguard workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

/// A researchable technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchKind {
    /// Raises combat strength of ships.
    Weapons,
    /// Raises credits earned per production cycle.
    Banking,
    /// Raises ship production at industry.
    Manufacturing,
    /// Raises carrier travel range.
    Hyperspace,
    /// Raises star scanning range.
    Scanning,
    /// Grants random research bonuses.
    Experimentation,
    /// Raises natural resources of owned stars.
    Terraforming,
    /// Raises specialist token income.
    Specialists,
}

// ---------------------------------------------------------------------------
// Infrastructure & upgrades
// ---------------------------------------------------------------------------

/// A star infrastructure category that can be bulk upgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureKind {
    /// Produces credits.
    Economy,
    /// Produces ships.
    Industry,
    /// Produces research points.
    Science,
}

/// Which balance a bulk upgrade draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSource {
    /// The player's full credit balance.
    TotalCredits,
    /// Only the credits earned this production cycle.
    CreditsPerTick,
}

// ---------------------------------------------------------------------------
// Game settings
// ---------------------------------------------------------------------------

/// Whether the time machine (historical replay) is available in a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMachine {
    /// Past ticks can be inspected.
    #[default]
    Enabled,
    /// Only the current tick is kept in full.
    Disabled,
}

/// Galaxy visibility mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DarkGalaxy {
    /// All stars visible.
    #[default]
    Disabled,
    /// Stars outside scanning range are hidden.
    Standard,
    /// Like `Standard`, only at game start.
    Start,
    /// Stars, players, and intel are all withheld.
    Extra,
}

impl DarkGalaxy {
    /// Returns `true` if this mode withholds historical intel entirely.
    pub const fn hides_intel(self) -> bool {
        matches!(self, Self::Extra)
    }
}
