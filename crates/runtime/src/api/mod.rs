//! Public API surface: request/response types, provider traits, errors.
mod errors;

pub use errors::{EngineError, Result};

use async_trait::async_trait;

use battle_core::{
    ActionLogEntry, AttackOutcome, BattleOutcome, CombinedStats, Participant, ParticipantId, Room,
    TechniqueId, Team, UserId,
};

// ============================================================================
// Providers
// ============================================================================

/// Combined attribute provider.
///
/// Implementations must already merge base attributes, cultivation-derived
/// stats and equipment bonuses; the engine never re-derives that
/// combination. This is the only async collaborator: stats typically live in
/// an external profile service, and they are always fetched before the store
/// transaction begins.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn combined_stats(&self, user: UserId) -> Result<CombinedStats>;

    /// Learned level of a technique for this user. Defaults to level 1 for
    /// providers that do not track technique progression.
    async fn technique_level(&self, user: UserId, technique: TechniqueId) -> Result<u8> {
        let _ = (user, technique);
        Ok(1)
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A player-submitted action, in the shape the transport layer submits it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRequest {
    /// Plain attack against an opposing participant.
    Attack { target: ParticipantId },
    /// Self-targeted guard: protection effect plus an energy refund.
    Defend,
    /// Technique from the catalog; target rules depend on the technique.
    Technique {
        technique: TechniqueId,
        target: Option<ParticipantId>,
    },
}

/// Options for creating a room.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RoomOptions {
    pub min_level: u32,
    pub max_level: u32,
    pub team_size: u8,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: u32::MAX,
            team_size: 1,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Result of one committed action.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionReport {
    pub entry: ActionLogEntry,
    /// Damage resolution, when the action attacked something.
    pub outcome: Option<AttackOutcome>,
    /// Present when this action ended the battle.
    pub completion: Option<BattleOutcome>,
}

/// Read-only snapshot of a room and its participants.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoomSnapshot {
    pub room: Room,
    pub participants: Vec<Participant>,
}

impl RoomSnapshot {
    /// Participants on the given team, slot order preserved.
    pub fn team(&self, team: Team) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(move |p| p.team == team)
    }
}
