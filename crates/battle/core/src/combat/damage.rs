//! Damage calculation.
//!
//! The resolver is deterministic given its two random draws (dodge, crit),
//! which come from the injected [`RngOracle`] so tests can force either
//! branch.

use crate::config::BattleConfig;
use crate::env::{RngOracle, compute_seed};
use crate::stats::{CombinedStats, ModifierSet};

use super::{AttackOutcome, AttackStyle, DamageType};

/// Seed contexts for the independent rolls within one resolution.
const CTX_DODGE: u32 = 0;
const CTX_CRIT: u32 = 1;

/// One side of a resolution: combined stats plus active-effect modifiers,
/// both computed upstream.
#[derive(Clone, Copy, Debug)]
pub struct CombatantView<'a> {
    pub stats: &'a CombinedStats,
    pub mods: &'a ModifierSet,
}

/// Per-level multiplier for raw technique damage: +10% per level past 1.
pub fn technique_damage_multiplier(level: u8) -> f64 {
    1.0 + 0.10 * level.saturating_sub(1) as f64
}

/// Per-level multiplier for technique effect durations: +5% per level past 1.
///
/// Deliberately shallower than the damage multiplier; the two curves are
/// independent balance knobs.
pub fn effect_duration_multiplier(level: u8) -> f64 {
    1.0 + 0.05 * level.saturating_sub(1) as f64
}

/// Resolves a single damage attempt.
///
/// # Formula
///
/// ```text
/// scaled  = base * (1 + 0.10*(level-1))      (techniques only)
/// raw     = scaled + attack_stat - defense_stat
/// dodge   = base_dodge + luck + speed_mod/2 + equip_dodge
/// crit    = base_crit + crit_stat + equip_crit + crit_mod
/// damage  = raw * (1 + damage%/100) * (1 - min(cap, defense%)/100)
/// damage *= crit_multiplier * (1 + crit_damage%/100)   (on crit)
/// final   = max(1, floor(damage))
/// ```
///
/// A successful dodge short-circuits with zero damage before the crit roll.
pub fn resolve(
    attacker: CombatantView<'_>,
    defender: CombatantView<'_>,
    base_damage: i64,
    damage_type: DamageType,
    style: AttackStyle,
    config: &BattleConfig,
    rng: &(impl RngOracle + ?Sized),
    seed: u64,
) -> AttackOutcome {
    // 1. Technique-level scaling (plain attacks are unscaled).
    let scaled_base = match style {
        AttackStyle::Basic => base_damage as f64,
        AttackStyle::Technique { level } => base_damage as f64 * technique_damage_multiplier(level),
    };

    // 2. Raw damage from the matching attack/defense channel.
    let (attack, defense) = match damage_type {
        DamageType::Physical => (
            attacker.stats.primary.physical_attack,
            defender.stats.primary.physical_defense,
        ),
        DamageType::Spiritual => (
            attacker.stats.primary.spiritual_attack,
            defender.stats.primary.spiritual_defense,
        ),
    };
    let raw = scaled_base + (attack - defense) as f64;

    // 3. Dodge roll.
    let dodge_chance = config.base_dodge_chance
        + defender.stats.primary.luck as f64
        + defender.mods.speed / 2.0
        + defender.stats.secondary.dodge_bonus;
    let crit_chance = config.base_crit_chance
        + attacker.stats.secondary.critical_chance
        + attacker.stats.secondary.crit_bonus
        + attacker.mods.crit_chance;

    if rng.roll_percent(compute_seed(seed, CTX_DODGE)) < dodge_chance {
        return AttackOutcome::dodged(dodge_chance, crit_chance);
    }

    // 4. Crit roll, only for attacks that connect.
    let is_critical = rng.roll_percent(compute_seed(seed, CTX_CRIT)) < crit_chance;

    // 5. Attacker damage% increase, then capped defender defense% decrease.
    // Only the cap clamps: a negative defense modifier (vulnerability debuff)
    // amplifies the hit.
    let mut damage = raw * ((100.0 + attacker.mods.damage) / 100.0);
    let defense_percent = defender.mods.defense.min(config.defense_cap_percent);
    damage *= (100.0 - defense_percent) / 100.0;

    if is_critical {
        let crit_damage =
            attacker.stats.secondary.critical_damage + attacker.mods.crit_damage;
        damage *= config.crit_multiplier * ((100.0 + crit_damage) / 100.0);
    }

    // 6. Floor, minimum 1.
    let damage = (damage.floor() as i64).max(1) as u32;

    AttackOutcome {
        damage,
        is_critical,
        is_dodged: false,
        crit_chance,
        dodge_chance,
    }
}
