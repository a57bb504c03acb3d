//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Games, players, users, stars, and carriers each get their own ID type so
//! a star ID can never be handed to an operation expecting a player ID. New
//! IDs use UUID v7 (time-ordered) so history rows index well.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a `Copy` newtype over [`Uuid`] that serializes as the bare UUID.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// A fresh time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID, e.g. one read back from a row.
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// The wrapped UUID.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a game.
    GameId
}

define_id! {
    /// Unique identifier for a player seat within a game.
    PlayerId
}

define_id! {
    /// Unique identifier for the user account occupying a player seat.
    UserId
}

define_id! {
    /// Unique identifier for a star in the galaxy.
    StarId
}

define_id! {
    /// Unique identifier for a carrier fleet.
    CarrierId
}

define_id! {
    /// Identifier of a specialist type assigned to a star or carrier.
    SpecialistId
}
