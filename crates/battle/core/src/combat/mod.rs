//! Damage resolution for a single action.
mod damage;
mod result;

pub use damage::{CombatantView, effect_duration_multiplier, resolve, technique_damage_multiplier};
pub use result::{AttackOutcome, AttackStyle, DamageType};
