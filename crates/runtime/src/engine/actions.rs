//! Action coordination: the seven-step pipeline every combat action runs.
//!
//! Stats and catalog lookups happen before the transaction opens; the
//! transaction itself re-validates everything against current state, applies
//! actor upkeep, dispatches the action, applies opponent upkeep and checks
//! for completion. Any error rolls the whole action back.

use battle_core::{
    ActionError, ActionLogEntry, ActionType, AttackOutcome, AttackStyle, AttributeKey,
    BattleConfig, CombatantView, CombinedStats, DamageType, DefendProfile, Effect, EffectCategory,
    EffectDuration, EffectId, EffectSource, EffectTemplate, ModifierSet, ParticipantId,
    PeriodicKind, RngOracle, RoomId, RoomStatus, Team, TechniqueDefinition, TechniqueId,
    TechniqueTarget, TemplateTarget, UserId, ValueType, action_block_remaining_ms,
    apply_action_triggered, apply_periodic_tick, check_completion, decay,
    effect_duration_multiplier, modifiers, resolve,
};
use tracing::{info, warn};

use crate::api::{ActionReport, ActionRequest, EngineError, Result};
use crate::store::{BattleStore, StoreTxn};

use super::BattleEngine;
use super::settlement;

impl ActionRequest {
    fn target(&self) -> Option<ParticipantId> {
        match self {
            ActionRequest::Attack { target } => Some(*target),
            ActionRequest::Defend => None,
            ActionRequest::Technique { target, .. } => *target,
        }
    }
}

impl<S: BattleStore> BattleEngine<S> {
    /// Checks whether the user could act right now, without mutating
    /// anything. The answer is advisory; [`Self::perform_action`] is the
    /// authority.
    pub async fn can_act(&self, room: RoomId, user: UserId) -> Result<()> {
        let now = self.now_ms();

        self.store.transaction(|txn| {
            let status = txn
                .room(room)
                .ok_or(EngineError::RoomNotFound(room))?
                .status;
            if status != RoomStatus::InProgress {
                return Err(ActionError::RoomNotInProgress { status }.into());
            }
            let id = txn
                .participant_of_user(room, user)
                .ok_or(ActionError::NotAParticipant)?;
            let p = txn
                .participant(id)
                .ok_or(EngineError::ParticipantNotFound(id))?;
            if !p.is_active() {
                return Err(ActionError::ParticipantNotActive { status: p.status }.into());
            }
            if let Some(remaining_ms) = action_block_remaining_ms(p, now) {
                return Err(ActionError::Stunned { remaining_ms }.into());
            }
            if let Some(last) = p.last_action_ms {
                let elapsed = now.saturating_sub(last);
                if elapsed < p.action_cooldown_ms {
                    return Err(ActionError::OnCooldown {
                        remaining_ms: p.action_cooldown_ms - elapsed,
                    }
                    .into());
                }
            }
            Ok(())
        })
    }

    /// Performs one combat action for `user` in `room`.
    pub async fn perform_action(
        &self,
        room: RoomId,
        user: UserId,
        request: ActionRequest,
    ) -> Result<ActionReport> {
        let now = self.now_ms();
        let seed = self.next_seed();

        // Resolve the users involved, then fetch stats outside the
        // transaction. The transaction re-validates; a mismatch means the
        // room changed underneath us and the caller should retry.
        let target_user = self.store.transaction(|txn| {
            txn.room(room).ok_or(EngineError::RoomNotFound(room))?;
            Ok(request
                .target()
                .and_then(|id| txn.participant(id))
                .filter(|p| p.room == room)
                .map(|p| p.user))
        })?;

        let actor_stats = self.stats.combined_stats(user).await?;
        let target_stats = match target_user {
            Some(u) if u == user => Some(actor_stats),
            Some(u) => Some(self.stats.combined_stats(u).await?),
            None => None,
        };

        let technique = match request {
            ActionRequest::Technique { technique, .. } => {
                let level = self.stats.technique_level(user, technique).await?;
                Some(
                    self.techniques
                        .technique(technique, level)
                        .ok_or(EngineError::TechniqueNotFound(technique))?,
                )
            }
            _ => None,
        };
        let defend = matches!(request, ActionRequest::Defend)
            .then(|| self.techniques.defend_profile());

        self.store.transaction(|txn| {
            let status = txn
                .room(room)
                .ok_or(EngineError::RoomNotFound(room))?
                .status;
            if status != RoomStatus::InProgress {
                return Err(ActionError::RoomNotInProgress { status }.into());
            }
            let actor_id = txn
                .participant_of_user(room, user)
                .ok_or(ActionError::NotAParticipant)?;

            // Step 1-3: actor upkeep, control gate, cooldown gate.
            let actor_team = {
                let actor = txn
                    .participant_mut(actor_id)
                    .ok_or(EngineError::ParticipantNotFound(actor_id))?;
                if !actor.is_active() {
                    return Err(ActionError::ParticipantNotActive {
                        status: actor.status,
                    }
                    .into());
                }
                decay(actor, now);
                let tick = apply_periodic_tick(actor, now);
                if tick.defeated {
                    return Err(ActionError::ActorDefeated.into());
                }
                if let Some(remaining_ms) = action_block_remaining_ms(actor, now) {
                    return Err(ActionError::Stunned { remaining_ms }.into());
                }
                if let Some(last) = actor.last_action_ms {
                    let elapsed = now.saturating_sub(last);
                    if elapsed < actor.action_cooldown_ms {
                        return Err(ActionError::OnCooldown {
                            remaining_ms: actor.action_cooldown_ms - elapsed,
                        }
                        .into());
                    }
                }
                apply_action_triggered(actor, now);
                actor.team
            };

            let actor_mods = {
                let actor = txn
                    .participant(actor_id)
                    .ok_or(EngineError::ParticipantNotFound(actor_id))?;
                let (mods, malformed) = ModifierSet::from_effects(&actor.effects, now);
                if malformed > 0 {
                    warn!(%room, participant = %actor_id, malformed, "malformed effect contributions skipped");
                }
                mods
            };

            // Step 4: dispatch.
            let dispatch = match &request {
                ActionRequest::Attack { target } => dispatch_attack(
                    txn,
                    &self.config,
                    self.rng.as_ref(),
                    seed,
                    room,
                    actor_team,
                    &actor_stats,
                    &actor_mods,
                    target_stats.as_ref(),
                    *target,
                    now,
                )?,
                ActionRequest::Defend => {
                    let profile = defend.as_ref().ok_or(EngineError::Conflict)?;
                    dispatch_defend(txn, &self.config, actor_id, &actor_mods, profile, now)?
                }
                ActionRequest::Technique { target, .. } => {
                    let definition = technique.as_ref().ok_or(EngineError::Conflict)?;
                    dispatch_technique(
                        txn,
                        &self.config,
                        self.rng.as_ref(),
                        seed,
                        room,
                        actor_id,
                        actor_team,
                        &actor_stats,
                        &actor_mods,
                        target_stats.as_ref(),
                        *target,
                        definition,
                        now,
                    )?
                }
            };

            // Step 5: log and actor bookkeeping.
            let entry = ActionLogEntry {
                room,
                actor: actor_id,
                action: dispatch.action,
                target: dispatch.target,
                technique: dispatch.technique,
                damage: dispatch.damage,
                healing: dispatch.healing,
                timestamp_ms: now,
            };
            txn.append_action(entry.clone());

            {
                let actor = txn
                    .participant_mut(actor_id)
                    .ok_or(EngineError::ParticipantNotFound(actor_id))?;
                // Self-buffs applied this action count toward the new
                // cooldown, so recompute from current effects.
                let mods = modifiers(&actor.effects, now);
                actor.last_action_ms = Some(now);
                actor.action_cooldown_ms = cooldown_ms(&self.config, &mods);
                actor.total_damage_dealt += dispatch.damage as u64;
            }

            // Step 6: upkeep for everyone else in the room.
            for id in txn.room_participants(room) {
                if id == actor_id {
                    continue;
                }
                let Some(p) = txn.participant_mut(id) else { continue };
                if !p.is_active() {
                    continue;
                }
                decay(p, now);
                apply_periodic_tick(p, now);
            }

            // Step 7: completion.
            let roster: Vec<_> = txn
                .room_participants(room)
                .into_iter()
                .filter_map(|id| txn.participant(id).cloned())
                .collect();
            let completion = check_completion(&roster);
            if let Some(outcome) = completion {
                settlement::complete_battle(
                    txn,
                    &self.config,
                    self.items.as_ref(),
                    self.rng.as_ref(),
                    room,
                    outcome,
                    seed,
                    now,
                )?;
            }

            info!(
                %room,
                actor = %actor_id,
                action = %dispatch.action,
                damage = dispatch.damage,
                healing = dispatch.healing,
                completed = completion.is_some(),
                "action committed"
            );

            Ok(ActionReport {
                entry,
                outcome: dispatch.outcome,
                completion,
            })
        })
    }
}

/// Effective cooldown after speed and cooldown-reduction effects, clamped
/// into the configured range.
fn cooldown_ms(config: &BattleConfig, mods: &ModifierSet) -> u64 {
    let reduction_percent = (mods.speed + mods.cooldown_reduction)
        .clamp(0.0, config.max_cooldown_reduction * 100.0);
    let scaled =
        (config.base_cooldown_ms as f64 * (100.0 - reduction_percent) / 100.0) as u64;
    scaled.clamp(config.min_cooldown_ms, config.base_cooldown_ms)
}

/// What one dispatched action produced, for the log entry and report.
struct Dispatch {
    action: ActionType,
    target: Option<ParticipantId>,
    technique: Option<TechniqueId>,
    damage: u32,
    healing: u32,
    outcome: Option<AttackOutcome>,
}

/// Validates an offensive target: in this room, active, on the other team.
fn validated_target(
    txn: &dyn StoreTxn,
    room: RoomId,
    actor_team: Team,
    target: ParticipantId,
) -> Result<()> {
    let p = txn
        .participant(target)
        .filter(|p| p.room == room)
        .ok_or(ActionError::TargetNotFound)?;
    if !p.is_active() {
        return Err(ActionError::TargetNotActive { status: p.status }.into());
    }
    if p.team == actor_team {
        return Err(ActionError::SameTeamTarget.into());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn dispatch_attack(
    txn: &mut dyn StoreTxn,
    config: &BattleConfig,
    rng: &dyn RngOracle,
    seed: u64,
    room: RoomId,
    actor_team: Team,
    actor_stats: &CombinedStats,
    actor_mods: &ModifierSet,
    target_stats: Option<&CombinedStats>,
    target: ParticipantId,
    now: u64,
) -> Result<Dispatch> {
    validated_target(&*txn, room, actor_team, target)?;
    // Stats were prefetched for the target the request named; a miss here
    // means the roster changed between the read and this transaction.
    let target_stats = target_stats.ok_or(EngineError::Conflict)?;

    let target_mods = {
        let p = txn
            .participant(target)
            .ok_or(ActionError::TargetNotFound)?;
        modifiers(&p.effects, now)
    };

    let outcome = resolve(
        CombatantView {
            stats: actor_stats,
            mods: actor_mods,
        },
        CombatantView {
            stats: target_stats,
            mods: &target_mods,
        },
        config.basic_attack_damage,
        DamageType::Physical,
        AttackStyle::Basic,
        config,
        rng,
        seed,
    );

    if outcome.damage > 0 {
        let p = txn
            .participant_mut(target)
            .ok_or(ActionError::TargetNotFound)?;
        p.apply_damage(outcome.damage);
    }

    Ok(Dispatch {
        action: ActionType::Attack,
        target: Some(target),
        technique: None,
        damage: outcome.damage,
        healing: 0,
        outcome: Some(outcome),
    })
}

fn dispatch_defend(
    txn: &mut dyn StoreTxn,
    config: &BattleConfig,
    actor: ParticipantId,
    actor_mods: &ModifierSet,
    profile: &DefendProfile,
    now: u64,
) -> Result<Dispatch> {
    let mut healing = 0u32;

    if profile.energy_restore > 0 {
        let p = txn
            .participant_mut(actor)
            .ok_or(EngineError::ParticipantNotFound(actor))?;
        p.apply_energy_delta(profile.energy_restore as i64);
    }

    match apply_template(
        txn,
        actor,
        &profile.effect,
        EffectSource::System,
        1,
        actor_mods,
        config,
        now,
    )? {
        TemplateOutcome::Applied { healing: h } => healing += h,
        TemplateOutcome::Skipped => {
            warn!(participant = %actor, "defend profile carries a malformed effect template");
        }
        TemplateOutcome::Dropped => {
            warn!(participant = %actor, "defend effect dropped, effect set full");
        }
    }

    Ok(Dispatch {
        action: ActionType::Defend,
        target: None,
        technique: None,
        damage: 0,
        healing,
        outcome: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn dispatch_technique(
    txn: &mut dyn StoreTxn,
    config: &BattleConfig,
    rng: &dyn RngOracle,
    seed: u64,
    room: RoomId,
    actor: ParticipantId,
    actor_team: Team,
    actor_stats: &CombinedStats,
    actor_mods: &ModifierSet,
    target_stats: Option<&CombinedStats>,
    target: Option<ParticipantId>,
    definition: &TechniqueDefinition,
    now: u64,
) -> Result<Dispatch> {
    // Silence gates techniques only; plain attacks and defend still work.
    {
        let p = txn
            .participant(actor)
            .ok_or(EngineError::ParticipantNotFound(actor))?;
        if let Some(remaining_ms) = p
            .effects
            .control_remaining_ms(AttributeKey::Silence, now)
        {
            return Err(ActionError::Silenced { remaining_ms }.into());
        }
    }

    // Target rules. Self-only techniques ignore any supplied target.
    let target = match definition.target {
        TechniqueTarget::SelfOnly => None,
        TechniqueTarget::Opponent => {
            let target = target.ok_or(ActionError::TargetRequired)?;
            validated_target(&*txn, room, actor_team, target)?;
            Some(target)
        }
    };

    // Energy, checked and spent before anything lands.
    {
        let p = txn
            .participant_mut(actor)
            .ok_or(EngineError::ParticipantNotFound(actor))?;
        if !p.spend_energy(definition.energy_cost) {
            return Err(ActionError::InsufficientEnergy {
                required: definition.energy_cost,
                available: p.energy.current,
            }
            .into());
        }
    }

    // Direct damage, if the technique deals any.
    let mut outcome = None;
    let mut total_damage = 0u32;
    if definition.deals_damage() {
        let target = target.ok_or(ActionError::TargetRequired)?;
        let target_stats = target_stats.ok_or(EngineError::Conflict)?;
        let damage_type = definition
            .damage_type
            .ok_or(EngineError::Conflict)?;
        let target_mods = {
            let p = txn
                .participant(target)
                .ok_or(ActionError::TargetNotFound)?;
            modifiers(&p.effects, now)
        };
        let resolved = resolve(
            CombatantView {
                stats: actor_stats,
                mods: actor_mods,
            },
            CombatantView {
                stats: target_stats,
                mods: &target_mods,
            },
            definition.damage,
            damage_type,
            AttackStyle::Technique {
                level: definition.level,
            },
            config,
            rng,
            seed,
        );
        if resolved.damage > 0 {
            let p = txn
                .participant_mut(target)
                .ok_or(ActionError::TargetNotFound)?;
            p.apply_damage(resolved.damage);
        }
        total_damage = resolved.damage;
        outcome = Some(resolved);
    }

    // Attached effects.
    let mut healing = 0u32;
    let mut skipped = 0usize;
    for template in &definition.effects {
        let recipient = match template.target {
            TemplateTarget::Caster => actor,
            TemplateTarget::Opponent => match target {
                Some(target) => target,
                // An opponent-targeted template on a self-only technique is
                // catalog data gone wrong; skip it like a malformed one.
                None => {
                    skipped += 1;
                    continue;
                }
            },
        };
        match apply_template(
            txn,
            recipient,
            template,
            EffectSource::Technique(definition.id),
            definition.level,
            actor_mods,
            config,
            now,
        )? {
            TemplateOutcome::Applied { healing: h } => healing += h,
            TemplateOutcome::Skipped => skipped += 1,
            TemplateOutcome::Dropped => {
                warn!(participant = %recipient, technique = %definition.id, "effect dropped, effect set full");
            }
        }
    }
    if skipped > 0 {
        warn!(technique = %definition.id, skipped, "malformed effect templates skipped");
    }

    Ok(Dispatch {
        action: ActionType::Technique,
        target,
        technique: Some(definition.id),
        damage: total_damage,
        healing,
        outcome,
    })
}

enum TemplateOutcome {
    Applied { healing: u32 },
    /// Malformed descriptor; nothing was applied.
    Skipped,
    /// Effect set was full; the effect was not attached.
    Dropped,
}

/// Applies one effect template to a recipient.
///
/// Instant effects resolve immediately (heals scaled by the caster's
/// healing-done and the recipient's healing-received modifiers). Everything
/// else becomes a persisted effect whose duration scales with the
/// technique's learned level and whose damage-over-time value is amplified
/// by the caster's dot modifier.
#[allow(clippy::too_many_arguments)]
fn apply_template(
    txn: &mut dyn StoreTxn,
    recipient: ParticipantId,
    template: &EffectTemplate,
    source: EffectSource,
    level: u8,
    caster_mods: &ModifierSet,
    config: &BattleConfig,
    now: u64,
) -> Result<TemplateOutcome> {
    if !template.is_well_formed() {
        return Ok(TemplateOutcome::Skipped);
    }

    if template.category == EffectCategory::Instant {
        let recipient_mods = {
            let p = txn
                .participant(recipient)
                .ok_or(EngineError::ParticipantNotFound(recipient))?;
            modifiers(&p.effects, now)
        };
        let p = txn
            .participant_mut(recipient)
            .ok_or(EngineError::ParticipantNotFound(recipient))?;
        let maximum = match template.attribute {
            AttributeKey::Health => p.health.maximum,
            AttributeKey::Energy => p.energy.maximum,
            // Ruled out by is_well_formed.
            _ => return Ok(TemplateOutcome::Skipped),
        };
        let mut amount = match template.value_type {
            ValueType::Absolute => template.value,
            ValueType::Percentage => maximum as f64 * template.value / 100.0,
        };
        let mut healing = 0u32;
        match template.attribute {
            AttributeKey::Health => {
                if amount > 0.0 {
                    amount *= (100.0 + caster_mods.healing_done) / 100.0;
                    amount *= (100.0 + recipient_mods.healing_received) / 100.0;
                    healing = p.health.apply_delta(amount as i64).max(0) as u32;
                } else {
                    p.apply_health_delta(amount as i64);
                }
            }
            AttributeKey::Energy => {
                p.apply_energy_delta(amount as i64);
            }
            _ => unreachable!("filtered above"),
        }
        return Ok(TemplateOutcome::Applied { healing });
    }

    let duration_mult = effect_duration_multiplier(level);
    let duration = match template.duration {
        EffectDuration::Permanent => EffectDuration::Permanent,
        EffectDuration::Millis(ms) => EffectDuration::Millis((ms as f64 * duration_mult) as u64),
        EffectDuration::Turns(turns) => {
            let base_ms = turns as u64 * config.fixed_tick_seconds * 1_000;
            EffectDuration::Millis((base_ms as f64 * duration_mult) as u64)
        }
    };

    let mut value = template.value;
    if template.periodic == Some(PeriodicKind::DamageOverTime) {
        value *= (100.0 + caster_mods.dot_amplifier) / 100.0;
    }

    let effect = Effect::new(
        EffectId(txn.next_effect_id()),
        template.name.clone(),
        template.category,
        template.attribute,
        value,
        template.value_type,
        template.periodic,
        duration,
        now,
        source,
        config.fixed_tick_seconds,
    );

    let p = txn
        .participant_mut(recipient)
        .ok_or(EngineError::ParticipantNotFound(recipient))?;
    if p.effects.add(effect) {
        Ok(TemplateOutcome::Applied { healing: 0 })
    } else {
        Ok(TemplateOutcome::Dropped)
    }
}
