//! Orchestration layer over the pure battle rules.
//!
//! The runtime owns the transactional store, injected collaborators (stats
//! provider, technique and item catalogs, clock, RNG) and exposes the room
//! and action API the transport layer calls into. Every action runs under
//! one store transaction scoped to its room: either all seven coordination
//! steps commit, or none do.
pub mod api;
pub mod clock;
pub mod engine;
pub mod store;

pub use api::{
    ActionReport, ActionRequest, EngineError, Result, RoomOptions, RoomSnapshot, StatsProvider,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{BattleEngine, BattleEngineBuilder};
pub use store::{BattleStore, MemoryStore, StoreTxn};
