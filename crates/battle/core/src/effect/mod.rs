//! Combat effect model and its temporal lifecycle.
//!
//! Effects share a single time-based decay model: any legacy turn-count
//! duration is converted to milliseconds exactly once, at construction, and
//! the turn count never survives in memory. Remaining time is always
//! `max(0, duration_ms − (now − started_at))`; an effect whose remaining
//! time hits zero must be purged before any read of the participant's
//! modifiers.
mod engine;
mod set;

pub use engine::{
    DecayOutcome, TickOutcome, TickResult, action_block_remaining_ms, apply_action_triggered,
    apply_periodic_tick, decay,
};
pub use set::ActiveEffects;

use crate::state::{EffectId, TechniqueId};
use crate::stats::AttributeKey;

// ============================================================================
// Effect Descriptor
// ============================================================================

/// Broad classification of an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectCategory {
    /// Applied once at creation and never persisted (direct heal/damage).
    Instant,
    /// Modifies a base attribute while active.
    StatModifier,
    /// Modifies a combat-layer value (damage%, defense%, crit) while active.
    CombatModifier,
    /// Modifies cultivation-derived values while active.
    CultivationModifier,
    /// Everything else: control impairments, periodic effects.
    Special,
}

impl EffectCategory {
    /// Categories whose value folds into the modifier set.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            EffectCategory::StatModifier
                | EffectCategory::CombatModifier
                | EffectCategory::CultivationModifier
        )
    }
}

/// How an effect's value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Absolute,
    Percentage,
}

/// Cadence of an effect that does something on its own, rather than only
/// modifying reads.
///
/// The kinds are disjoint by construction: an effect is either evaluated per
/// elapsed tick or once per action taken, never both, so nothing can
/// double-apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PeriodicKind {
    /// Restores health each tick evaluation.
    HealOverTime,
    /// Drains health each tick evaluation.
    DamageOverTime,
    /// Restores energy each tick evaluation.
    EnergyRegen,
    /// Restores energy once per action the owner takes.
    EnergyPerAction,
}

impl PeriodicKind {
    /// Whether this kind fires on tick evaluation (vs. per action taken).
    pub fn is_tick_driven(self) -> bool {
        !matches!(self, PeriodicKind::EnergyPerAction)
    }
}

/// Where an effect came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectSource {
    Technique(TechniqueId),
    Equipment,
    System,
}

/// Duration of an effect as supplied by a catalog or template.
///
/// `Turns` is the legacy representation; it is normalized to milliseconds in
/// [`Effect::new`] and nowhere else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectDuration {
    Millis(u64),
    Turns(u32),
    Permanent,
}

/// A timed or permanent modifier attached to a participant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Effect {
    /// Unique per instance, even for effects sharing a name.
    pub id: EffectId,
    pub name: String,
    pub category: EffectCategory,
    pub attribute: AttributeKey,
    pub value: f64,
    pub value_type: ValueType,
    pub periodic: Option<PeriodicKind>,
    /// `None` means permanent.
    pub duration_ms: Option<u64>,
    pub started_at_ms: u64,
    pub source: EffectSource,
}

impl Effect {
    /// Builds an effect, normalizing any turn-count duration into
    /// milliseconds. This is the only place that conversion happens.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EffectId,
        name: impl Into<String>,
        category: EffectCategory,
        attribute: AttributeKey,
        value: f64,
        value_type: ValueType,
        periodic: Option<PeriodicKind>,
        duration: EffectDuration,
        started_at_ms: u64,
        source: EffectSource,
        fixed_tick_seconds: u64,
    ) -> Self {
        let duration_ms = match duration {
            EffectDuration::Millis(ms) => Some(ms),
            EffectDuration::Turns(turns) => Some(turns as u64 * fixed_tick_seconds * 1_000),
            EffectDuration::Permanent => None,
        };
        Self {
            id,
            name: name.into(),
            category,
            attribute,
            value,
            value_type,
            periodic,
            duration_ms,
            started_at_ms,
            source,
        }
    }

    /// Remaining lifetime at `now`: `max(0, duration − elapsed)`.
    /// Permanent effects report `u64::MAX`.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.duration_ms {
            None => u64::MAX,
            Some(duration) => {
                let elapsed = now_ms.saturating_sub(self.started_at_ms);
                duration.saturating_sub(elapsed)
            }
        }
    }

    /// An effect with `duration_ms = 0` is expired from the moment it is
    /// created and must never be persisted as active.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.duration_ms {
            None => false,
            Some(duration) => now_ms.saturating_sub(self.started_at_ms) >= duration,
        }
    }

    /// Control effects gate action attempts while active.
    pub fn is_control(&self) -> bool {
        self.attribute.is_control()
    }
}
