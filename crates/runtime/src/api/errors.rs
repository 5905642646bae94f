//! Unified error types surfaced by the engine API.

use battle_core::{ActionError, ParticipantId, RoomId, TechniqueId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by every engine operation.
///
/// `Validation` surfaces a rejected action verbatim with nothing mutated.
/// The not-found variants abort with the transaction rolled back.
/// `Conflict` means the transaction could not serialize; the caller may
/// retry the whole action, and no partial state survives.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ActionError),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("participant {0} not found")]
    ParticipantNotFound(ParticipantId),

    #[error("technique {0} not found in catalog")]
    TechniqueNotFound(TechniqueId),

    #[error("transaction could not be serialized; retry the action")]
    Conflict,

    #[error("stats provider failed: {0}")]
    StatsProvider(String),
}

impl EngineError {
    /// Whether retrying the same call may succeed without any other change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Conflict)
    }
}
