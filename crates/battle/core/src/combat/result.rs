//! Outcome types for damage resolution.

/// Damage channel. Physical and spiritual attacks are reduced by the
/// matching defense attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageType {
    Physical,
    Spiritual,
}

/// How the damage was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackStyle {
    /// Plain attack: no technique-level scaling.
    Basic,
    /// Technique at its learned level; raw damage scales with the level.
    Technique { level: u8 },
}

/// Resolution of a single damage attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackOutcome {
    /// Final damage, floored, at least 1 unless dodged.
    pub damage: u32,
    pub is_critical: bool,
    pub is_dodged: bool,
    /// Chances actually used for the rolls, for logging and clients.
    pub crit_chance: f64,
    pub dodge_chance: f64,
}

impl AttackOutcome {
    /// Outcome of a dodged attack: zero damage, no crit.
    pub fn dodged(dodge_chance: f64, crit_chance: f64) -> Self {
        Self {
            damage: 0,
            is_critical: false,
            is_dodged: true,
            crit_chance,
            dodge_chance,
        }
    }
}
