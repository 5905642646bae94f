//! Effect lifecycle evaluation: decay, periodic ticks, per-action triggers.

use crate::state::{EffectId, Participant};
use crate::stats::{self, AttributeKey};

use super::{Effect, PeriodicKind, ValueType};

// ============================================================================
// Decay
// ============================================================================

/// Result of one decay pass over a participant's effects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecayOutcome {
    /// Effects removed by this pass, in insertion order.
    pub expired: Vec<Effect>,
    /// True if a control-impairing effect (stun/silence/root/sleep) expired.
    pub control_released: bool,
}

/// Purges every effect whose remaining time at `now` is zero.
///
/// Idempotent: a second call with the same `now` removes nothing and reports
/// no control release.
pub fn decay(participant: &mut Participant, now_ms: u64) -> DecayOutcome {
    let expired = participant.effects.drain_where(|e| e.is_expired(now_ms));
    let control_released = expired.iter().any(Effect::is_control);
    DecayOutcome {
        expired,
        control_released,
    }
}

// ============================================================================
// Periodic Ticks
// ============================================================================

/// One periodic or action-triggered contribution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickResult {
    pub effect: EffectId,
    pub kind: PeriodicKind,
    /// Signed delta actually applied (after clamping).
    pub amount: i64,
}

/// Accumulated outcome of a tick evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub hp_delta: i64,
    pub energy_delta: i64,
    /// True if the tick drove health to zero.
    pub defeated: bool,
    pub log: Vec<TickResult>,
}

/// Evaluates tick-driven effects (healing, damage-over-time, energy regen)
/// for one participant.
///
/// Amounts are summed per category before clamping, so two small heals and
/// one large poison resolve as a single net health delta. Incoming healing is
/// scaled by the participant's own `healing_received` modifier. Health and
/// energy stay within their meters; the status flips to `Defeated` if health
/// reaches zero here.
pub fn apply_periodic_tick(participant: &mut Participant, now_ms: u64) -> TickOutcome {
    let mods = stats::modifiers(&participant.effects, now_ms);
    let heal_scale = 1.0 + mods.healing_received / 100.0;

    let mut healing = 0i64;
    let mut damage = 0i64;
    let mut energy = 0i64;
    let mut log = Vec::new();

    for effect in participant.effects.active_at(now_ms) {
        let Some(kind) = effect.periodic.filter(|k| k.is_tick_driven()) else {
            continue;
        };
        let amount = periodic_amount(effect, kind, participant);
        match kind {
            PeriodicKind::HealOverTime => healing += (amount as f64 * heal_scale) as i64,
            PeriodicKind::DamageOverTime => damage += amount,
            PeriodicKind::EnergyRegen => energy += amount,
            PeriodicKind::EnergyPerAction => unreachable!("filtered above"),
        }
        log.push(TickResult {
            effect: effect.id,
            kind,
            amount,
        });
    }

    let hp_delta = healing - damage;
    let defeated = participant.apply_health_delta(hp_delta);
    let energy_delta = participant.apply_energy_delta(energy);

    TickOutcome {
        hp_delta,
        energy_delta,
        defeated,
        log,
    }
}

/// Evaluates effects that fire once per action taken, e.g. "energy gain per
/// action". Distinct from [`apply_periodic_tick`]: the periodic kinds are
/// disjoint, so an effect can never be applied by both paths.
pub fn apply_action_triggered(participant: &mut Participant, now_ms: u64) -> TickOutcome {
    let mut energy = 0i64;
    let mut log = Vec::new();

    for effect in participant.effects.active_at(now_ms) {
        if effect.periodic != Some(PeriodicKind::EnergyPerAction) {
            continue;
        }
        let amount = periodic_amount(effect, PeriodicKind::EnergyPerAction, participant);
        energy += amount;
        log.push(TickResult {
            effect: effect.id,
            kind: PeriodicKind::EnergyPerAction,
            amount,
        });
    }

    let energy_delta = participant.apply_energy_delta(energy);

    TickOutcome {
        hp_delta: 0,
        energy_delta,
        defeated: false,
        log,
    }
}

/// Contribution of one periodic effect before category summing.
///
/// Percentage values are taken against the relevant resource maximum.
fn periodic_amount(effect: &Effect, kind: PeriodicKind, participant: &Participant) -> i64 {
    let base = match kind {
        PeriodicKind::HealOverTime | PeriodicKind::DamageOverTime => {
            participant.health.maximum as f64
        }
        PeriodicKind::EnergyRegen | PeriodicKind::EnergyPerAction => {
            participant.energy.maximum as f64
        }
    };
    match effect.value_type {
        ValueType::Absolute => effect.value as i64,
        ValueType::Percentage => (base * effect.value / 100.0) as i64,
    }
}

// ============================================================================
// Control Queries
// ============================================================================

/// Remaining stun-like lockout on the participant, if any.
///
/// Stun and sleep block every action attempt until decay removes them.
pub fn action_block_remaining_ms(participant: &Participant, now_ms: u64) -> Option<u64> {
    [AttributeKey::Stun, AttributeKey::Sleep]
        .into_iter()
        .filter_map(|key| participant.effects.control_remaining_ms(key, now_ms))
        .max()
}
