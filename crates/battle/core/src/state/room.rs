//! Room state and its monotonic status machine.

use super::{RoomId, Team, UserId};

/// Room-level battle status.
///
/// Transitions are monotonic: `Waiting → InProgress → Completed → Dismissed`,
/// with `Waiting → Closed` when the room never fills. Terminal states never
/// transition again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoomStatus {
    #[default]
    Waiting,
    InProgress,
    Completed,
    Dismissed,
    Closed,
}

impl RoomStatus {
    /// Whether `self → to` is a legal transition.
    pub fn can_transition(self, to: RoomStatus) -> bool {
        use RoomStatus::*;
        matches!(
            (self, to),
            (Waiting, InProgress) | (Waiting, Closed) | (InProgress, Completed) | (Completed, Dismissed)
        )
    }

    /// Terminal states are never left.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoomStatus::Dismissed | RoomStatus::Closed)
    }
}

/// A battle room.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    pub id: RoomId,
    pub status: RoomStatus,
    pub min_level: u32,
    pub max_level: u32,
    pub leader: UserId,
    /// Set exactly once, at the `InProgress → Completed` transition.
    /// `None` on a completed room means the battle ended in a draw.
    pub winner_team: Option<Team>,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    /// Required participants per team before the battle starts.
    pub team_size: u8,
}

impl Room {
    pub fn new(
        id: RoomId,
        leader: UserId,
        min_level: u32,
        max_level: u32,
        team_size: u8,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            status: RoomStatus::Waiting,
            min_level,
            max_level,
            leader,
            winner_team: None,
            created_at_ms: now_ms,
            started_at_ms: None,
            ended_at_ms: None,
            team_size,
        }
    }

    /// Attempts a status transition, returning `false` if it is not legal.
    pub fn transition(&mut self, to: RoomStatus) -> bool {
        if !self.status.can_transition(to) {
            return false;
        }
        self.status = to;
        true
    }

    /// Whether a user of the given level may join.
    pub fn accepts_level(&self, level: u32) -> bool {
        level >= self.min_level && level <= self.max_level
    }

    /// Battle duration, once both endpoints are stamped.
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at_ms, self.ended_at_ms) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }
}
