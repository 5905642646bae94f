//! Technique catalog oracle.
//!
//! Techniques carry structured effect descriptors attached by the catalog at
//! definition time. Nothing downstream ever infers effect semantics from
//! names or descriptions; the descriptor says exactly which attribute is
//! touched, how the value is read, and on what cadence.

use crate::combat::DamageType;
use crate::effect::{EffectCategory, EffectDuration, PeriodicKind, ValueType};
use crate::state::TechniqueId;
use crate::stats::AttributeKey;

/// Who an offensive technique must be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TechniqueTarget {
    /// Self-targeted; no target id may be supplied.
    SelfOnly,
    /// Requires an active participant on the opposing team.
    Opponent,
}

/// Recipient of one effect template when the technique resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemplateTarget {
    /// Buffs land on the caster.
    Caster,
    /// Debuffs and damage-over-time land on the technique's target.
    Opponent,
}

/// Structured effect descriptor carried by a technique definition.
///
/// Durations may still be expressed in legacy turns here; they are
/// normalized to milliseconds when the effect instance is created.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTemplate {
    pub name: String,
    pub category: EffectCategory,
    pub attribute: AttributeKey,
    pub value: f64,
    pub value_type: ValueType,
    pub periodic: Option<PeriodicKind>,
    pub duration: EffectDuration,
    pub target: TemplateTarget,
}

impl EffectTemplate {
    /// Checks internal consistency of the descriptor.
    ///
    /// Periodic kinds must aim at the resource they drain or restore. A
    /// failing template is a data problem in the catalog, not a player
    /// error: the caller skips it and logs, and the rest of the action
    /// proceeds.
    pub fn is_well_formed(&self) -> bool {
        match self.periodic {
            Some(PeriodicKind::HealOverTime | PeriodicKind::DamageOverTime) => {
                self.attribute == AttributeKey::Health
            }
            Some(PeriodicKind::EnergyRegen | PeriodicKind::EnergyPerAction) => {
                self.attribute == AttributeKey::Energy
            }
            None => {
                // Instant effects must aim at a resource; modifiers must not.
                match self.category {
                    EffectCategory::Instant => {
                        matches!(self.attribute, AttributeKey::Health | AttributeKey::Energy)
                    }
                    _ => true,
                }
            }
        }
    }
}

/// A technique definition at a given learned level.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TechniqueDefinition {
    pub id: TechniqueId,
    pub name: String,
    /// Learned level this definition was resolved for.
    pub level: u8,
    /// Base damage before level scaling; 0 for pure utility techniques.
    pub damage: i64,
    /// `None` when the technique deals no direct damage.
    pub damage_type: Option<DamageType>,
    pub energy_cost: u32,
    pub target: TechniqueTarget,
    pub effects: Vec<EffectTemplate>,
}

impl TechniqueDefinition {
    pub fn deals_damage(&self) -> bool {
        self.damage > 0 && self.damage_type.is_some()
    }
}

/// Parameters of the built-in defend action, sourced from the catalog like
/// any other effect rather than hard-coded in the coordinator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefendProfile {
    /// The protection effect granted to the defender.
    pub effect: EffectTemplate,
    /// Flat energy restored by taking the defend action.
    pub energy_restore: u32,
}

/// Read-only technique catalog.
pub trait TechniqueCatalog: Send + Sync {
    /// Resolves a technique at the given learned level.
    fn technique(&self, id: TechniqueId, level: u8) -> Option<TechniqueDefinition>;

    /// Profile of the defend action.
    fn defend_profile(&self) -> DefendProfile;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(
        category: EffectCategory,
        attribute: AttributeKey,
        periodic: Option<PeriodicKind>,
    ) -> EffectTemplate {
        EffectTemplate {
            name: "t".into(),
            category,
            attribute,
            value: 1.0,
            value_type: ValueType::Absolute,
            periodic,
            duration: EffectDuration::Millis(1_000),
            target: TemplateTarget::Opponent,
        }
    }

    #[test]
    fn periodic_templates_must_target_their_resource() {
        assert!(template(
            EffectCategory::Special,
            AttributeKey::Health,
            Some(PeriodicKind::DamageOverTime)
        )
        .is_well_formed());
        assert!(!template(
            EffectCategory::Special,
            AttributeKey::Damage,
            Some(PeriodicKind::DamageOverTime)
        )
        .is_well_formed());
        assert!(!template(
            EffectCategory::Special,
            AttributeKey::Health,
            Some(PeriodicKind::EnergyRegen)
        )
        .is_well_formed());
    }

    #[test]
    fn instant_templates_must_target_a_resource() {
        assert!(template(EffectCategory::Instant, AttributeKey::Health, None).is_well_formed());
        assert!(!template(EffectCategory::Instant, AttributeKey::Damage, None).is_well_formed());
        assert!(
            template(EffectCategory::CombatModifier, AttributeKey::Damage, None).is_well_formed()
        );
    }
}
