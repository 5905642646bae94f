//! Canonical battle state: identifiers, participants, rooms and records.
//!
//! Everything in this module is plain data. Mutation helpers keep the two
//! hard invariants local: resource meters never leave `0..=maximum`, and a
//! participant's status flips to `Defeated` exactly when health reaches 0.
mod participant;
mod records;
mod room;

pub use participant::{Participant, ParticipantStatus};
pub use records::{
    ActionLogEntry, ActionType, HistoryRecord, League, RatingKey, RatingRecord,
};
pub use room::{Room, RoomStatus};

use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident($inner:ty)) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of one player's live state within a single room.
    ParticipantId(u64)
);
id_newtype!(
    /// Account-level identifier, stable across rooms and battles.
    UserId(u64)
);
id_newtype!(
    /// Identifier of a battle room.
    RoomId(u64)
);
id_newtype!(
    /// Identifier of a technique in the catalog.
    TechniqueId(u32)
);
id_newtype!(
    /// Identifier of a single effect instance. Unique even for effects that
    /// share a name.
    EffectId(u64)
);
id_newtype!(
    /// Identifier of a reward item in the catalog.
    ItemId(u32)
);

// ============================================================================
// Teams
// ============================================================================

/// Battle side. Every participant belongs to exactly one team per room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Team {
    One,
    Two,
}

impl Team {
    /// Returns the opposing team.
    pub fn opposing(self) -> Self {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }
}

// ============================================================================
// Resource Meter
// ============================================================================

/// Integer resource meter (health, energy) tracked per participant.
///
/// `current` is always within `0..=maximum`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: u32,
    pub maximum: u32,
}

impl ResourceMeter {
    pub fn new(current: u32, maximum: u32) -> Self {
        Self {
            current: current.min(maximum),
            maximum,
        }
    }

    /// Meter filled to its maximum.
    pub fn full(maximum: u32) -> Self {
        Self::new(maximum, maximum)
    }

    /// Applies a signed delta, clamping into `0..=maximum`.
    ///
    /// Returns the delta that was actually applied.
    pub fn apply_delta(&mut self, delta: i64) -> i64 {
        let before = self.current as i64;
        let after = (before + delta).clamp(0, self.maximum as i64);
        self.current = after as u32;
        after - before
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }
}
