//! Validation errors raised by the battle rules.
//!
//! These are pure data: the runtime surfaces them verbatim to the caller and
//! rolls the enclosing transaction back, so no variant here ever corresponds
//! to partially-applied state.

use crate::state::{ParticipantStatus, RoomStatus};

/// A rejected action or room operation. Nothing was mutated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionError {
    /// The acting user has no participant in this room.
    #[error("not a participant of this room")]
    NotAParticipant,

    /// The participant cannot act in its current status.
    #[error("participant is {status}, not active")]
    ParticipantNotActive { status: ParticipantStatus },

    /// The actor was defeated by its own periodic effects before dispatch.
    #[error("actor was defeated before the action could resolve")]
    ActorDefeated,

    /// An active stun or sleep effect covers the action attempt.
    #[error("stunned for another {remaining_ms}ms")]
    Stunned { remaining_ms: u64 },

    /// An active silence effect blocks technique use.
    #[error("silenced for another {remaining_ms}ms")]
    Silenced { remaining_ms: u64 },

    /// The per-participant action cooldown has not elapsed.
    #[error("on cooldown for another {remaining_ms}ms")]
    OnCooldown { remaining_ms: u64 },

    /// The technique costs more energy than the actor has.
    #[error("insufficient energy: need {required}, have {available}")]
    InsufficientEnergy { required: u32, available: u32 },

    /// The action kind requires a target and none was given.
    #[error("action requires a target")]
    TargetRequired,

    /// The given target is not part of this room.
    #[error("target is not a participant of this room")]
    TargetNotFound,

    /// The target cannot be attacked in its current status.
    #[error("target is {status}, not active")]
    TargetNotActive { status: ParticipantStatus },

    /// Offensive actions must target the opposing team.
    #[error("cannot target a member of the same team")]
    SameTeamTarget,

    /// The room is not accepting actions in its current status.
    #[error("room is {status}, not in progress")]
    RoomNotInProgress { status: RoomStatus },

    /// The room cannot be joined in its current status.
    #[error("room is {status} and cannot be joined")]
    RoomNotJoinable { status: RoomStatus },

    /// Both teams are already at the required size.
    #[error("room is full")]
    RoomFull,

    /// The user's level is outside the room's bracket.
    #[error("level {level} outside allowed range {min}..={max}")]
    LevelOutOfRange { level: u32, min: u32, max: u32 },

    /// The user already has a participant in this room.
    #[error("already joined this room")]
    AlreadyInRoom,

    /// Only the room leader may perform this operation.
    #[error("only the room leader may do this")]
    NotRoomLeader,

    /// The room is not in a dismissable state.
    #[error("room is {status} and cannot be dismissed")]
    NotDismissable { status: RoomStatus },
}
