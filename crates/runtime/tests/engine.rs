//! End-to-end engine scenarios: room lifecycle, the action pipeline,
//! completion and settlement, all driven by a manual clock and a fixed RNG
//! so every outcome is exact.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use battle_core::{
    ActionError, ActionType, AttributeKey, BattleOutcome, CombinedStats, DamageType,
    DefendProfile, EffectCategory, EffectDuration, EffectTemplate, Item, ItemCatalog, ItemId,
    League, Participant, ParticipantId, PeriodicKind, PrimaryStats, Rarity, RngOracle, RoomId,
    RoomStatus, SecondaryStats, Team, TechniqueCatalog, TechniqueDefinition, TechniqueId,
    TechniqueTarget, TemplateTarget, UserId, ValueType,
};
use battle_runtime::{
    ActionRequest, BattleEngine, EngineError, ManualClock, MemoryStore, Result, RoomOptions,
    RoomSnapshot, StatsProvider,
};

const STRIKE: TechniqueId = TechniqueId(1);
const POISON: TechniqueId = TechniqueId(2);
const FOCUS: TechniqueId = TechniqueId(3);
const STUN: TechniqueId = TechniqueId(4);
const SILENCE: TechniqueId = TechniqueId(5);
const DRAIN: TechniqueId = TechniqueId(6);

// ============================================================================
// Test Doubles
// ============================================================================

struct TestStats(HashMap<u64, CombinedStats>);

#[async_trait]
impl StatsProvider for TestStats {
    async fn combined_stats(&self, user: UserId) -> Result<CombinedStats> {
        self.0
            .get(&user.0)
            .copied()
            .ok_or_else(|| EngineError::StatsProvider(format!("unknown user {user}")))
    }
}

/// Oracle returning the same percentage for every draw. 50.0 triggers
/// neither dodge (10%) nor crit (5%).
struct FixedRng(f64);

impl RngOracle for FixedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        (self.0 * 100.0) as u32
    }

    fn roll_percent(&self, _seed: u64) -> f64 {
        self.0
    }

    fn pick_index(&self, _seed: u64, _len: usize) -> usize {
        0
    }
}

struct TestTechniques;

impl TechniqueCatalog for TestTechniques {
    fn technique(&self, id: TechniqueId, level: u8) -> Option<TechniqueDefinition> {
        let definition = match id {
            STRIKE => TechniqueDefinition {
                id,
                name: "iron palm".into(),
                level,
                damage: 20,
                damage_type: Some(DamageType::Physical),
                energy_cost: 10,
                target: TechniqueTarget::Opponent,
                effects: vec![],
            },
            POISON => TechniqueDefinition {
                id,
                name: "venom needle".into(),
                level,
                damage: 0,
                damage_type: None,
                energy_cost: 5,
                target: TechniqueTarget::Opponent,
                effects: vec![EffectTemplate {
                    name: "venom".into(),
                    category: EffectCategory::Special,
                    attribute: AttributeKey::Health,
                    value: 10.0,
                    value_type: ValueType::Absolute,
                    periodic: Some(PeriodicKind::DamageOverTime),
                    duration: EffectDuration::Millis(20_000),
                    target: TemplateTarget::Opponent,
                }],
            },
            FOCUS => TechniqueDefinition {
                id,
                name: "lightfoot".into(),
                level,
                damage: 0,
                damage_type: None,
                energy_cost: 5,
                target: TechniqueTarget::SelfOnly,
                effects: vec![EffectTemplate {
                    name: "lightfoot".into(),
                    category: EffectCategory::CombatModifier,
                    attribute: AttributeKey::Speed,
                    value: 40.0,
                    value_type: ValueType::Percentage,
                    periodic: None,
                    duration: EffectDuration::Millis(20_000),
                    target: TemplateTarget::Caster,
                }],
            },
            STUN => TechniqueDefinition {
                id,
                name: "palm seal".into(),
                level,
                damage: 0,
                damage_type: None,
                energy_cost: 5,
                target: TechniqueTarget::Opponent,
                effects: vec![EffectTemplate {
                    name: "sealed".into(),
                    category: EffectCategory::Special,
                    attribute: AttributeKey::Stun,
                    value: 0.0,
                    value_type: ValueType::Absolute,
                    periodic: None,
                    duration: EffectDuration::Millis(3_000),
                    target: TemplateTarget::Opponent,
                }],
            },
            SILENCE => TechniqueDefinition {
                id,
                name: "tongue lock".into(),
                level,
                damage: 0,
                damage_type: None,
                energy_cost: 5,
                target: TechniqueTarget::Opponent,
                effects: vec![EffectTemplate {
                    name: "muted".into(),
                    category: EffectCategory::Special,
                    attribute: AttributeKey::Silence,
                    value: 0.0,
                    value_type: ValueType::Absolute,
                    periodic: None,
                    duration: EffectDuration::Millis(3_000),
                    target: TemplateTarget::Opponent,
                }],
            },
            DRAIN => TechniqueDefinition {
                id,
                name: "blood pact".into(),
                level,
                damage: 10,
                damage_type: Some(DamageType::Spiritual),
                energy_cost: 60,
                target: TechniqueTarget::Opponent,
                effects: vec![],
            },
            _ => return None,
        };
        Some(definition)
    }

    fn defend_profile(&self) -> DefendProfile {
        DefendProfile {
            effect: EffectTemplate {
                name: "guard".into(),
                category: EffectCategory::CombatModifier,
                attribute: AttributeKey::Defense,
                value: 30.0,
                value_type: ValueType::Percentage,
                periodic: None,
                duration: EffectDuration::Millis(5_000),
                target: TemplateTarget::Caster,
            },
            energy_restore: 5,
        }
    }
}

struct TestItems;

impl ItemCatalog for TestItems {
    fn by_rarity(&self, rarity: Rarity) -> Vec<Item> {
        match rarity {
            Rarity::Common => vec![Item {
                id: ItemId(7),
                name: "healing pill".into(),
                rarity,
            }],
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    engine: BattleEngine<Arc<MemoryStore>>,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

fn stats(max_hp: u32) -> CombinedStats {
    CombinedStats {
        level: 10,
        primary: PrimaryStats {
            physical_attack: 25,
            spiritual_attack: 25,
            physical_defense: 10,
            spiritual_defense: 10,
            speed: 0,
            luck: 0,
        },
        secondary: SecondaryStats {
            max_hp,
            max_energy: 50,
            ..Default::default()
        },
    }
}

fn harness(users: &[(u64, u32)], roll: f64) -> Harness {
    let per_user = users
        .iter()
        .map(|(user, hp)| (*user, stats(*hp)))
        .collect();
    harness_with(per_user, roll)
}

fn harness_with(per_user: HashMap<u64, CombinedStats>, roll: f64) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(1_000));
    let engine = BattleEngine::builder(
        store.clone(),
        Arc::new(TestStats(per_user)),
        Arc::new(TestTechniques),
        Arc::new(TestItems),
    )
    .rng(Arc::new(FixedRng(roll)))
    .clock(clock.clone())
    .game_seed(42)
    .build();
    Harness {
        engine,
        store,
        clock,
    }
}

/// Creates a 1v1 room with users 1 and 2 and starts the battle.
async fn start_duel(h: &Harness) -> RoomSnapshot {
    h.engine
        .create_room(UserId(1), RoomOptions::default())
        .await
        .unwrap();
    let snapshot = h.engine.join_room(RoomId(1), UserId(2)).await.unwrap();
    assert_eq!(snapshot.room.status, RoomStatus::InProgress);
    snapshot
}

fn seat<'a>(snapshot: &'a RoomSnapshot, user: UserId) -> &'a Participant {
    snapshot
        .participants
        .iter()
        .find(|p| p.user == user)
        .expect("user is seated")
}

// ============================================================================
// Wire Format
// ============================================================================

#[test]
fn action_requests_parse_from_client_json() {
    let attack: ActionRequest = serde_json::from_str(r#"{"attack":{"target":3}}"#).unwrap();
    assert_eq!(
        attack,
        ActionRequest::Attack {
            target: ParticipantId(3)
        }
    );

    let technique: ActionRequest =
        serde_json::from_str(r#"{"technique":{"technique":2,"target":null}}"#).unwrap();
    assert_eq!(
        technique,
        ActionRequest::Technique {
            technique: POISON,
            target: None,
        }
    );
}

// ============================================================================
// Room Lifecycle
// ============================================================================

#[tokio::test]
async fn filling_the_room_starts_the_battle() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;

    assert_eq!(snapshot.room.started_at_ms, Some(1_000));
    assert_eq!(seat(&snapshot, UserId(1)).team, Team::One);
    assert_eq!(seat(&snapshot, UserId(2)).team, Team::Two);
    assert_eq!(snapshot.team(Team::One).count(), 1);
    assert_eq!(snapshot.team(Team::Two).count(), 1);
}

#[tokio::test]
async fn level_bracket_is_enforced() {
    let mut per_user = HashMap::new();
    per_user.insert(1, stats(100));
    let mut elder = stats(100);
    elder.level = 50;
    per_user.insert(3, elder);
    let h = harness_with(per_user, 50.0);

    // The leader's own level must fit the bracket they open.
    let err = h
        .engine
        .create_room(
            UserId(1),
            RoomOptions {
                min_level: 20,
                max_level: 30,
                team_size: 1,
            },
        )
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::LevelOutOfRange {
            level: 10,
            min: 20,
            max: 30,
        })
    ));

    h.engine
        .create_room(
            UserId(1),
            RoomOptions {
                min_level: 1,
                max_level: 20,
                team_size: 1,
            },
        )
        .await
        .unwrap();
    let err = h.engine.join_room(RoomId(1), UserId(3)).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::LevelOutOfRange { level: 50, .. })
    ));
}

#[tokio::test]
async fn joining_twice_is_rejected() {
    let h = harness(&[(1, 100)], 50.0);
    h.engine
        .create_room(
            UserId(1),
            RoomOptions {
                team_size: 2,
                ..RoomOptions::default()
            },
        )
        .await
        .unwrap();

    let err = h.engine.join_room(RoomId(1), UserId(1)).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::AlreadyInRoom)
    ));
}

#[tokio::test]
async fn leader_leaving_closes_the_waiting_room() {
    let h = harness(&[(1, 100)], 50.0);
    h.engine
        .create_room(UserId(1), RoomOptions::default())
        .await
        .unwrap();

    let outcome = h.engine.leave_room(RoomId(1), UserId(1)).await.unwrap();
    assert_eq!(outcome, None);
    assert!(matches!(
        h.engine.room_state(RoomId(1)).await,
        Err(EngineError::RoomNotFound(_))
    ));
}

#[tokio::test]
async fn stale_waiting_rooms_are_cleaned_up() {
    let h = harness(&[(1, 100)], 50.0);
    h.engine
        .create_room(UserId(1), RoomOptions::default())
        .await
        .unwrap();

    h.clock.advance(59_999);
    assert_eq!(h.engine.cleanup_stale_rooms(60_000).await.unwrap(), 0);

    h.clock.advance(1);
    assert_eq!(h.engine.cleanup_stale_rooms(60_000).await.unwrap(), 1);
    assert!(matches!(
        h.engine.room_state(RoomId(1)).await,
        Err(EngineError::RoomNotFound(_))
    ));
}

// ============================================================================
// Action Pipeline
// ============================================================================

#[tokio::test]
async fn basic_attack_applies_raw_damage() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    let report = h
        .engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();

    // base 10 + attack 25 - defense 10 = 25.
    assert_eq!(report.entry.action, ActionType::Attack);
    assert_eq!(report.entry.damage, 25);
    assert!(report.completion.is_none());

    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(seat(&snapshot, UserId(2)).health.current, 75);

    let log = h.engine.battle_log(RoomId(1)).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].timestamp_ms, 1_000);
}

#[tokio::test]
async fn dodged_attacks_deal_nothing() {
    let h = harness(&[(1, 100), (2, 100)], 5.0); // below the 10% dodge floor
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    let report = h
        .engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();

    let outcome = report.outcome.unwrap();
    assert!(outcome.is_dodged);
    assert_eq!(outcome.damage, 0);

    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(seat(&snapshot, UserId(2)).health.current, 100);
}

#[tokio::test]
async fn actions_respect_the_cooldown() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    h.engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();

    h.clock.advance(500);
    let err = h
        .engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::OnCooldown { remaining_ms: 4_500 })
    ));

    // The rejected attempt must not have mutated anything.
    let log = h.engine.battle_log(RoomId(1)).await.unwrap();
    assert_eq!(log.len(), 1);

    h.clock.advance(4_500);
    h.engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();
}

#[tokio::test]
async fn speed_buff_shortens_the_cooldown() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    start_duel(&h).await;

    h.engine
        .perform_action(
            RoomId(1),
            UserId(1),
            ActionRequest::Technique {
                technique: FOCUS,
                target: None,
            },
        )
        .await
        .unwrap();

    // 40% speed: 5000ms * 0.6 = 3000ms.
    h.clock.advance(2_500);
    let err = h.engine.can_act(RoomId(1), UserId(1)).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::OnCooldown { remaining_ms: 500 })
    ));

    h.clock.advance(500);
    h.engine.can_act(RoomId(1), UserId(1)).await.unwrap();
}

#[tokio::test]
async fn stun_blocks_every_action_until_it_decays() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let (attacker, defender) = (seat(&snapshot, UserId(1)).id, seat(&snapshot, UserId(2)).id);

    h.engine
        .perform_action(
            RoomId(1),
            UserId(1),
            ActionRequest::Technique {
                technique: STUN,
                target: Some(defender),
            },
        )
        .await
        .unwrap();

    let err = h
        .engine
        .perform_action(RoomId(1), UserId(2), ActionRequest::Attack { target: attacker })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::Stunned { remaining_ms: 3_000 })
    ));

    h.clock.advance(3_000);
    h.engine
        .perform_action(RoomId(1), UserId(2), ActionRequest::Attack { target: attacker })
        .await
        .unwrap();
}

#[tokio::test]
async fn silence_blocks_techniques_but_not_attacks() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let (attacker, defender) = (seat(&snapshot, UserId(1)).id, seat(&snapshot, UserId(2)).id);

    h.engine
        .perform_action(
            RoomId(1),
            UserId(1),
            ActionRequest::Technique {
                technique: SILENCE,
                target: Some(defender),
            },
        )
        .await
        .unwrap();

    let err = h
        .engine
        .perform_action(
            RoomId(1),
            UserId(2),
            ActionRequest::Technique {
                technique: STRIKE,
                target: Some(attacker),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::Silenced { .. })
    ));

    h.engine
        .perform_action(RoomId(1), UserId(2), ActionRequest::Attack { target: attacker })
        .await
        .unwrap();
}

#[tokio::test]
async fn defend_reduces_incoming_damage() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    h.engine
        .perform_action(RoomId(1), UserId(2), ActionRequest::Defend)
        .await
        .unwrap();

    let report = h
        .engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();

    // raw 25, 30% guard: floor(25 * 0.7) = 17.
    assert_eq!(report.entry.damage, 17);
    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(seat(&snapshot, UserId(2)).health.current, 83);
}

#[tokio::test]
async fn damage_over_time_ticks_on_every_evaluation() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    h.engine
        .perform_action(
            RoomId(1),
            UserId(1),
            ActionRequest::Technique {
                technique: POISON,
                target: Some(defender),
            },
        )
        .await
        .unwrap();

    // The venom ticked once during the poisoning action's own upkeep pass.
    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(seat(&snapshot, UserId(2)).health.current, 90);

    h.clock.advance(5_000);
    h.engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();

    // 90 - attack 25 - venom tick 10 = 55.
    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(seat(&snapshot, UserId(2)).health.current, 55);
}

#[tokio::test]
async fn techniques_cost_energy_and_reject_when_short() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    let err = h
        .engine
        .perform_action(
            RoomId(1),
            UserId(1),
            ActionRequest::Technique {
                technique: DRAIN,
                target: Some(defender),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::InsufficientEnergy {
            required: 60,
            available: 50,
        })
    ));

    h.engine
        .perform_action(
            RoomId(1),
            UserId(1),
            ActionRequest::Technique {
                technique: STRIKE,
                target: Some(defender),
            },
        )
        .await
        .unwrap();

    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(seat(&snapshot, UserId(1)).energy.current, 40);
    // strike: base 20 + 25 - 10 = 35.
    assert_eq!(seat(&snapshot, UserId(2)).health.current, 65);
}

#[tokio::test]
async fn targeting_a_teammate_is_rejected() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    let snapshot = start_duel(&h).await;
    let own = seat(&snapshot, UserId(1)).id;

    let err = h
        .engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: own })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::SameTeamTarget)
    ));
}

// ============================================================================
// Completion & Settlement
// ============================================================================

#[tokio::test]
async fn victory_settles_ratings_rewards_and_history() {
    let h = harness(&[(1, 100), (2, 30)], 50.0);
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    h.engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();
    h.clock.advance(5_000);
    let report = h
        .engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();

    assert_eq!(
        report.completion,
        Some(BattleOutcome::Victory { winner: Team::One })
    );

    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(snapshot.room.status, RoomStatus::Dismissed);
    assert_eq!(snapshot.room.winner_team, Some(Team::One));
    assert_eq!(snapshot.room.ended_at_ms, Some(6_000));

    let winner = h.engine.rating(UserId(1)).await.unwrap();
    assert_eq!(winner.rating, 1_015);
    assert_eq!(winner.wins, 1);
    assert_eq!(winner.league, League::Bronze);

    let loser = h.engine.rating(UserId(2)).await.unwrap();
    assert_eq!(loser.rating, 990);
    assert_eq!(loser.losses, 1);

    let history = h.store.history();
    assert_eq!(history.len(), 2);
    let won = history.iter().find(|r| r.user == UserId(1)).unwrap();
    assert_eq!(won.won, Some(true));
    assert_eq!(won.rating_change, 15);
    assert_eq!(won.reward, Some(ItemId(7)));
    assert_eq!(won.damage_dealt, 50);
    assert_eq!(won.duration_ms, 5_000);
    let lost = history.iter().find(|r| r.user == UserId(2)).unwrap();
    assert_eq!(lost.won, Some(false));
    assert_eq!(lost.rating_change, -10);
    assert_eq!(lost.reward, None);
}

#[tokio::test]
async fn settled_rooms_reject_further_actions() {
    let h = harness(&[(1, 100), (2, 30)], 50.0);
    let snapshot = start_duel(&h).await;
    let defender = seat(&snapshot, UserId(2)).id;

    h.engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();
    h.clock.advance(5_000);
    h.engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap();

    h.clock.advance(5_000);
    let err = h
        .engine
        .perform_action(RoomId(1), UserId(1), ActionRequest::Attack { target: defender })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ActionError::RoomNotInProgress {
            status: RoomStatus::Dismissed,
        })
    ));
}

#[tokio::test]
async fn leaving_a_battle_forfeits_it() {
    let h = harness(&[(1, 100), (2, 100)], 50.0);
    start_duel(&h).await;

    let outcome = h.engine.leave_room(RoomId(1), UserId(2)).await.unwrap();
    assert_eq!(outcome, Some(BattleOutcome::Victory { winner: Team::One }));

    let winner = h.engine.rating(UserId(1)).await.unwrap();
    assert_eq!(winner.rating, 1_015);
    let loser = h.engine.rating(UserId(2)).await.unwrap();
    assert_eq!(loser.rating, 990);

    let snapshot = h.engine.room_state(RoomId(1)).await.unwrap();
    assert_eq!(snapshot.room.status, RoomStatus::Dismissed);
}
