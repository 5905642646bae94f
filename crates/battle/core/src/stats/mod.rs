//! Combined stats and the modifier aggregation layer.
//!
//! Combined primary/secondary attributes are computed upstream (base
//! attributes + cultivation bonuses + equipment) by the stats provider and
//! passed in; nothing here re-derives them. This module only folds a
//! participant's currently-active effects into a [`ModifierSet`].

use crate::effect::{ActiveEffects, ValueType};

// ============================================================================
// Attribute Namespace
// ============================================================================

/// Closed namespace of attributes an effect can target.
///
/// Effects carry one of these instead of a free-text attribute name, so
/// dispatch is a `match` rather than string inspection. The string form
/// (via strum) is only used at serialization boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeKey {
    // Percentage modifiers folded into `ModifierSet`.
    Damage,
    Defense,
    Speed,
    CritChance,
    CritDamage,
    HealingReceived,
    HealingDone,
    DotAmplifier,
    CooldownReduction,
    // Absolute modifier folded into `ModifierSet`.
    EnergyRegen,
    // Resource targets of instant and periodic effects.
    Health,
    Energy,
    // Control impairments. No numeric contribution; presence gates actions.
    Stun,
    Silence,
    Root,
    Sleep,
}

impl AttributeKey {
    /// Control attributes block or restrict actions while active.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            AttributeKey::Stun | AttributeKey::Silence | AttributeKey::Root | AttributeKey::Sleep
        )
    }

    /// Control attributes that block every action attempt.
    pub fn blocks_actions(self) -> bool {
        matches!(self, AttributeKey::Stun | AttributeKey::Sleep)
    }
}

// ============================================================================
// Combined Stats
// ============================================================================

/// Primary combat attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimaryStats {
    pub physical_attack: i64,
    pub spiritual_attack: i64,
    pub physical_defense: i64,
    pub spiritual_defense: i64,
    pub speed: i64,
    pub luck: i64,
}

/// Secondary attributes, largely sourced from equipment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecondaryStats {
    /// Flat critical chance from cultivation (percentage points).
    pub critical_chance: f64,
    /// Extra critical damage (percentage points).
    pub critical_damage: f64,
    /// Flat dodge chance from equipment (percentage points).
    pub dodge_bonus: f64,
    /// Flat critical chance from equipment (percentage points).
    pub crit_bonus: f64,
    pub max_hp: u32,
    pub max_energy: u32,
}

/// Combined attribute snapshot returned by the stats provider.
///
/// Base attributes, cultivation-derived stats and equipment bonuses are
/// already merged here.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombinedStats {
    pub level: u32,
    pub primary: PrimaryStats,
    pub secondary: SecondaryStats,
}

// ============================================================================
// Modifier Set
// ============================================================================

/// Net modifiers from a participant's currently-active effects.
///
/// All percentage fields are additive across effects, not multiplicative.
/// This mirrors the established balance model and is load-bearing for
/// compatibility; do not "fix" it to multiplicative stacking. The defense
/// reduction applied downstream is capped separately.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSet {
    pub damage: f64,
    pub defense: f64,
    pub speed: f64,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub healing_received: f64,
    pub healing_done: f64,
    pub dot_amplifier: f64,
    pub cooldown_reduction: f64,
    /// Absolute energy gain per tick, not a percentage.
    pub energy_regen: i64,
}

impl ModifierSet {
    /// Folds all non-expired effects into a modifier set.
    ///
    /// Contributions whose declared value type does not fit the target field
    /// (an absolute value aimed at a percentage field, or vice versa) are
    /// skipped; the second return value counts them so the caller can log a
    /// data-integrity warning.
    pub fn from_effects(effects: &ActiveEffects, now_ms: u64) -> (Self, usize) {
        let mut set = Self::default();
        let mut malformed = 0usize;

        for effect in effects.active_at(now_ms) {
            if !effect.category.is_modifier() {
                continue;
            }
            let percentage = effect.value_type == ValueType::Percentage;
            match effect.attribute {
                AttributeKey::Damage if percentage => set.damage += effect.value,
                AttributeKey::Defense if percentage => set.defense += effect.value,
                AttributeKey::Speed if percentage => set.speed += effect.value,
                AttributeKey::CritChance if percentage => set.crit_chance += effect.value,
                AttributeKey::CritDamage if percentage => set.crit_damage += effect.value,
                AttributeKey::HealingReceived if percentage => {
                    set.healing_received += effect.value
                }
                AttributeKey::HealingDone if percentage => set.healing_done += effect.value,
                AttributeKey::DotAmplifier if percentage => set.dot_amplifier += effect.value,
                AttributeKey::CooldownReduction if percentage => {
                    set.cooldown_reduction += effect.value
                }
                AttributeKey::EnergyRegen if !percentage => {
                    set.energy_regen += effect.value as i64
                }
                // Control and resource attributes carry no fold-time value.
                key if key.is_control() => {}
                AttributeKey::Health | AttributeKey::Energy => {}
                _ => malformed += 1,
            }
        }

        (set, malformed)
    }
}

/// Convenience wrapper over [`ModifierSet::from_effects`] that drops the
/// malformed count.
pub fn modifiers(effects: &ActiveEffects, now_ms: u64) -> ModifierSet {
    ModifierSet::from_effects(effects, now_ms).0
}
