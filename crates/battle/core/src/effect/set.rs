//! Bounded set of active effects on one participant.
//!
//! Insertion order is preserved but carries no meaning. Expired effects are
//! purged by [`super::decay`]; every read here still filters by expiry so a
//! stale set can never leak a dead modifier.

use arrayvec::ArrayVec;

use crate::config::BattleConfig;
use crate::stats::AttributeKey;

use super::Effect;

/// Active effects attached to a participant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffects {
    effects: ArrayVec<Effect, { BattleConfig::MAX_ACTIVE_EFFECTS }>,
}

impl ActiveEffects {
    /// Creates an empty effect set.
    pub fn empty() -> Self {
        Self {
            effects: ArrayVec::new(),
        }
    }

    /// Adds an effect instance.
    ///
    /// Returns `false` when the set is full; the effect is dropped and the
    /// caller decides whether that warrants a warning.
    pub fn add(&mut self, effect: Effect) -> bool {
        if self.effects.is_full() {
            return false;
        }
        self.effects.push(effect);
        true
    }

    /// Removes every effect matching the predicate, returning the removed
    /// instances in insertion order.
    pub fn drain_where(&mut self, mut predicate: impl FnMut(&Effect) -> bool) -> Vec<Effect> {
        let mut removed = Vec::new();
        let mut kept = ArrayVec::new();
        for effect in self.effects.take() {
            if predicate(&effect) {
                removed.push(effect);
            } else {
                kept.push(effect);
            }
        }
        self.effects = kept;
        removed
    }

    /// Removes a named effect immediately (explicit cleanse).
    pub fn cleanse(&mut self, name: &str) -> usize {
        self.drain_where(|e| e.name == name).len()
    }

    /// Iterates over effects that have not expired at `now`.
    pub fn active_at(&self, now_ms: u64) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(move |e| !e.is_expired(now_ms))
    }

    /// Whether any active effect targets the given control attribute.
    pub fn control_active(&self, attribute: AttributeKey, now_ms: u64) -> bool {
        debug_assert!(attribute.is_control());
        self.active_at(now_ms).any(|e| e.attribute == attribute)
    }

    /// Longest remaining time among active effects with the given control
    /// attribute, or `None` if none is active.
    pub fn control_remaining_ms(&self, attribute: AttributeKey, now_ms: u64) -> Option<u64> {
        self.active_at(now_ms)
            .filter(|e| e.attribute == attribute)
            .map(|e| e.remaining_ms(now_ms))
            .max()
    }

    /// Iterates over all stored effects, expired or not.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
