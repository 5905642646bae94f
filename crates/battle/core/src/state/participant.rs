//! Per-room participant state.

use crate::effect::ActiveEffects;

use super::{ParticipantId, ResourceMeter, RoomId, Team, UserId};

/// Lifecycle status of a participant within a room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParticipantStatus {
    /// Able to act and a valid target.
    #[default]
    Active,
    /// Health reached zero. Counts toward the team wipe check.
    Defeated,
    /// Timed out without acting; still occupies the slot.
    Afk,
    /// Retired from the room (left, or battle settled). Slot is released.
    Inactive,
}

/// One player's live state within a single room.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub id: ParticipantId,
    pub user: UserId,
    pub room: RoomId,
    pub team: Team,
    /// Slot index within the team.
    pub position: u8,
    pub status: ParticipantStatus,
    pub health: ResourceMeter,
    pub energy: ResourceMeter,
    pub level: u32,
    pub effects: ActiveEffects,
    /// Timestamp of the last committed action, if any.
    pub last_action_ms: Option<u64>,
    /// Cooldown cached at the last committed action.
    pub action_cooldown_ms: u64,
    pub total_damage_dealt: u64,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        user: UserId,
        room: RoomId,
        team: Team,
        position: u8,
        level: u32,
        max_hp: u32,
        max_energy: u32,
        base_cooldown_ms: u64,
    ) -> Self {
        Self {
            id,
            user,
            room,
            team,
            position,
            status: ParticipantStatus::Active,
            health: ResourceMeter::full(max_hp),
            energy: ResourceMeter::full(max_energy),
            level,
            effects: ActiveEffects::empty(),
            last_action_ms: None,
            action_cooldown_ms: base_cooldown_ms,
            total_damage_dealt: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticipantStatus::Active
    }

    pub fn is_defeated(&self) -> bool {
        self.status == ParticipantStatus::Defeated
    }

    /// Applies damage and flips the status to `Defeated` when health hits 0.
    ///
    /// Returns `true` if this call defeated the participant.
    pub fn apply_damage(&mut self, damage: u32) -> bool {
        self.health.apply_delta(-(damage as i64));
        self.refresh_defeat()
    }

    /// Applies a signed health delta (periodic ticks, instant heals).
    ///
    /// Returns `true` if this call defeated the participant.
    pub fn apply_health_delta(&mut self, delta: i64) -> bool {
        self.health.apply_delta(delta);
        self.refresh_defeat()
    }

    /// Applies a signed energy delta, clamped into range.
    pub fn apply_energy_delta(&mut self, delta: i64) -> i64 {
        self.energy.apply_delta(delta)
    }

    /// Attempts to spend energy. Fails without mutation if insufficient.
    pub fn spend_energy(&mut self, cost: u32) -> bool {
        if self.energy.current < cost {
            return false;
        }
        self.energy.apply_delta(-(cost as i64));
        true
    }

    /// Marks the participant as retired and releases the slot.
    pub fn retire(&mut self) {
        self.status = ParticipantStatus::Inactive;
    }

    /// Forces defeat regardless of remaining health (forfeit on leave).
    pub fn forfeit(&mut self) {
        self.health.apply_delta(-(self.health.current as i64));
        self.status = ParticipantStatus::Defeated;
    }

    fn refresh_defeat(&mut self) -> bool {
        if self.status == ParticipantStatus::Active && self.health.is_depleted() {
            self.status = ParticipantStatus::Defeated;
            return true;
        }
        false
    }
}
