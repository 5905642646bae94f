//! Deterministic PvP battle rules shared across the runtime and tooling.
//!
//! `battle-core` defines the canonical combat model (participants, effects,
//! modifiers, damage resolution, completion detection) and exposes pure APIs
//! that the runtime drives under its store transaction. All temporal logic
//! takes `now` in milliseconds as an explicit argument, and all randomness
//! flows through the [`env::RngOracle`] trait, so every outcome is replayable.
pub mod battle;
pub mod combat;
pub mod config;
pub mod effect;
pub mod env;
pub mod error;
pub mod state;
pub mod stats;

pub use battle::{BattleOutcome, check_completion};
pub use combat::{
    AttackOutcome, AttackStyle, CombatantView, DamageType, effect_duration_multiplier, resolve,
    technique_damage_multiplier,
};
pub use config::BattleConfig;
pub use effect::{
    ActiveEffects, DecayOutcome, Effect, EffectCategory, EffectDuration, EffectSource,
    PeriodicKind, TickOutcome, TickResult, ValueType, action_block_remaining_ms,
    apply_action_triggered, apply_periodic_tick, decay,
};
pub use env::{
    DefendProfile, EffectTemplate, Item, ItemCatalog, PcgRng, Rarity, RngOracle,
    TechniqueCatalog, TechniqueDefinition, TechniqueTarget, TemplateTarget, compute_seed,
};
pub use error::ActionError;
pub use state::{
    ActionLogEntry, ActionType, EffectId, HistoryRecord, ItemId, League, Participant,
    ParticipantId, ParticipantStatus, RatingKey, RatingRecord, ResourceMeter, Room, RoomId,
    RoomStatus, Team, TechniqueId, UserId,
};
pub use stats::{AttributeKey, CombinedStats, ModifierSet, PrimaryStats, SecondaryStats, modifiers};
