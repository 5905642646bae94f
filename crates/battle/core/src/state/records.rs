//! Append-only records and rating state.

use super::{ItemId, ParticipantId, RoomId, Team, TechniqueId, UserId};

// ============================================================================
// Action Log
// ============================================================================

/// Kind of a player-submitted action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionType {
    Attack,
    Defend,
    Technique,
}

/// One committed action. Append-only, ordered by timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionLogEntry {
    pub room: RoomId,
    pub actor: ParticipantId,
    pub action: ActionType,
    /// `None` for self-targeted actions (defend, self buffs).
    pub target: Option<ParticipantId>,
    pub technique: Option<TechniqueId>,
    pub damage: u32,
    pub healing: u32,
    pub timestamp_ms: u64,
}

// ============================================================================
// Ratings
// ============================================================================

/// League tier derived from the rating value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum League {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl League {
    /// Maps a rating value onto its league tier.
    pub fn for_rating(rating: i32) -> Self {
        match rating {
            ..1_100 => League::Bronze,
            1_100..1_300 => League::Silver,
            1_300..1_500 => League::Gold,
            1_500..1_700 => League::Platinum,
            1_700.. => League::Diamond,
        }
    }
}

/// Key of a rating record: one row per user, mode and season.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingKey {
    pub user: UserId,
    pub mode: u32,
    pub season: u32,
}

/// Ranked standing of one user. Mutated only at battle settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingRecord {
    pub key: RatingKey,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub league: League,
}

impl RatingRecord {
    /// Fresh record at the base rating.
    pub fn starting(key: RatingKey, base_rating: i32) -> Self {
        Self {
            key,
            rating: base_rating,
            wins: 0,
            losses: 0,
            draws: 0,
            league: League::for_rating(base_rating),
        }
    }

    /// Applies a rating delta and recomputes the league.
    pub fn apply_delta(&mut self, delta: i32) {
        self.rating += delta;
        self.league = League::for_rating(self.rating);
    }
}

// ============================================================================
// Battle History
// ============================================================================

/// Append-only per-participant battle summary written at settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryRecord {
    pub user: UserId,
    pub room: RoomId,
    pub team: Team,
    /// `None` when the battle ended in a draw.
    pub won: Option<bool>,
    pub opponents: Vec<UserId>,
    pub teammates: Vec<UserId>,
    pub damage_dealt: u64,
    pub duration_ms: u64,
    pub reward: Option<ItemId>,
    pub rating_change: i32,
    pub recorded_at_ms: u64,
}
