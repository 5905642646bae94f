//! Battle settlement: ratings, reward rolls and history records.
//!
//! Settlement runs inside the same transaction as the action (or forfeit)
//! that ended the battle, so a settled room can never be observed without
//! its ratings and history in place.

use battle_core::{
    BattleConfig, BattleOutcome, HistoryRecord, Item, ItemCatalog, ItemId, Participant,
    ParticipantStatus, Rarity, RatingKey, RatingRecord, RngOracle, RoomId, RoomStatus, UserId,
    compute_seed,
};
use tracing::info;

use crate::api::{EngineError, Result};
use crate::store::StoreTxn;

/// Seed contexts for the reward draws, disjoint from the dodge/crit
/// contexts used during damage resolution.
const CTX_REWARD_RARITY: u32 = 2;
const CTX_REWARD_PICK: u32 = 3;

/// Rating points per weight point shifted toward rarer reward tiers.
const RATING_PER_SHIFT: i32 = 100;
const MAX_RATING_SHIFT: i32 = 10;
/// Damage dealt per weight point shifted toward rarer reward tiers.
const DAMAGE_PER_SHIFT: u64 = 200;
const MAX_DAMAGE_SHIFT: u64 = 5;

/// Marks the room completed, settles every participant and dismisses the
/// room. Must be called at most once per room; the status machine enforces
/// it.
#[allow(clippy::too_many_arguments)]
pub(super) fn complete_battle(
    txn: &mut dyn StoreTxn,
    config: &BattleConfig,
    items: &dyn ItemCatalog,
    rng: &dyn RngOracle,
    room_id: RoomId,
    outcome: BattleOutcome,
    seed: u64,
    now_ms: u64,
) -> Result<()> {
    let duration_ms = {
        let room = txn
            .room_mut(room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        room.winner_team = outcome.winner();
        room.ended_at_ms = Some(now_ms);
        room.transition(RoomStatus::Completed);
        room.duration_ms().unwrap_or(0)
    };

    let participants: Vec<Participant> = txn
        .room_participants(room_id)
        .into_iter()
        .filter_map(|id| txn.participant(id).cloned())
        .filter(|p| p.status != ParticipantStatus::Inactive)
        .collect();

    for participant in &participants {
        let won = outcome.winner().map(|w| participant.team == w);

        let key = RatingKey {
            user: participant.user,
            mode: config.mode_id,
            season: config.season,
        };
        let mut record = txn
            .rating(key)
            .unwrap_or_else(|| RatingRecord::starting(key, config.base_rating));
        let rating_before = record.rating;
        let rating_change = match won {
            Some(true) => {
                record.wins += 1;
                config.win_rating_delta
            }
            Some(false) => {
                record.losses += 1;
                config.loss_rating_delta
            }
            None => {
                record.draws += 1;
                0
            }
        };
        record.apply_delta(rating_change);
        txn.upsert_rating(record);

        let reward = if won == Some(true) {
            roll_reward(
                items,
                rng,
                seed ^ participant.user.0,
                rating_before - config.base_rating,
                participant.total_damage_dealt,
            )
        } else {
            None
        };

        let (teammates, opponents) = split_roster(&participants, participant);
        txn.append_history(HistoryRecord {
            user: participant.user,
            room: room_id,
            team: participant.team,
            won,
            opponents,
            teammates,
            damage_dealt: participant.total_damage_dealt,
            duration_ms,
            reward,
            rating_change,
            recorded_at_ms: now_ms,
        });

        if let Some(p) = txn.participant_mut(participant.id) {
            p.retire();
        }
    }

    // Settled rooms go straight to dismissed; nothing further can happen.
    if let Some(room) = txn.room_mut(room_id) {
        room.transition(RoomStatus::Dismissed);
    }

    info!(
        room = %room_id,
        winner = ?outcome.winner(),
        participants = participants.len(),
        duration_ms,
        "battle settled"
    );
    Ok(())
}

/// Teammates and opponents of one participant, by user id.
fn split_roster(roster: &[Participant], of: &Participant) -> (Vec<UserId>, Vec<UserId>) {
    let mut teammates = Vec::new();
    let mut opponents = Vec::new();
    for other in roster {
        if other.id == of.id {
            continue;
        }
        if other.team == of.team {
            teammates.push(other.user);
        } else {
            opponents.push(other.user);
        }
    }
    (teammates, opponents)
}

/// Rolls a winner's reward.
///
/// Rating above the base and damage dealt both shift weight away from the
/// common tier, spread evenly across the four rarer tiers. An empty tier
/// falls back toward common until an item is found.
fn roll_reward(
    items: &dyn ItemCatalog,
    rng: &dyn RngOracle,
    seed: u64,
    rating_above_base: i32,
    damage_dealt: u64,
) -> Option<ItemId> {
    let rating_shift = (rating_above_base / RATING_PER_SHIFT).clamp(0, MAX_RATING_SHIFT) as f64;
    let damage_shift = (damage_dealt / DAMAGE_PER_SHIFT).min(MAX_DAMAGE_SHIFT) as f64;
    let shift = rating_shift + damage_shift;

    let weights: Vec<f64> = Rarity::ALL
        .iter()
        .map(|r| match r {
            Rarity::Common => (r.base_weight() - shift).max(0.0),
            _ => r.base_weight() + shift / 4.0,
        })
        .collect();
    let total: f64 = weights.iter().sum();

    let roll = rng.roll_percent(compute_seed(seed, CTX_REWARD_RARITY)) / 100.0 * total;
    let mut cumulative = 0.0;
    let mut chosen = Rarity::ALL.len() - 1;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if roll < cumulative {
            chosen = index;
            break;
        }
    }

    // Fall back toward common when the rolled tier has no items.
    let pool: Vec<Item> = (0..=chosen)
        .rev()
        .map(|index| items.by_rarity(Rarity::ALL[index]))
        .find(|pool| !pool.is_empty())?;

    let index = rng.pick_index(compute_seed(seed, CTX_REWARD_PICK), pool.len());
    Some(pool[index].id)
}

#[cfg(test)]
mod tests {
    use super::*;

    use battle_core::{ParticipantId, Room, Team};

    use crate::store::{BattleStore, MemoryStore};

    /// Oracle returning a fixed percentage for every draw.
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

    struct StubItems {
        rarities: Vec<Rarity>,
    }

    impl ItemCatalog for StubItems {
        fn by_rarity(&self, rarity: Rarity) -> Vec<Item> {
            if self.rarities.contains(&rarity) {
                vec![Item {
                    id: ItemId(rarity as u32),
                    name: rarity.to_string(),
                    rarity,
                }]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn low_roll_lands_in_the_common_tier() {
        let items = StubItems {
            rarities: Rarity::ALL.to_vec(),
        };
        let reward = roll_reward(&items, &FixedRng(10.0), 42, 0, 0);
        assert_eq!(reward, Some(ItemId(Rarity::Common as u32)));
    }

    #[test]
    fn high_roll_lands_in_the_legendary_tier() {
        let items = StubItems {
            rarities: Rarity::ALL.to_vec(),
        };
        let reward = roll_reward(&items, &FixedRng(99.9), 42, 0, 0);
        assert_eq!(reward, Some(ItemId(Rarity::Legendary as u32)));
    }

    #[test]
    fn empty_tier_falls_back_toward_common() {
        // Only common items exist; a legendary roll still rewards something.
        let items = StubItems {
            rarities: vec![Rarity::Common],
        };
        let reward = roll_reward(&items, &FixedRng(99.9), 42, 0, 0);
        assert_eq!(reward, Some(ItemId(Rarity::Common as u32)));
    }

    #[test]
    fn empty_catalog_yields_no_reward() {
        let items = StubItems { rarities: vec![] };
        assert_eq!(roll_reward(&items, &FixedRng(50.0), 42, 0, 0), None);
    }

    #[test]
    fn shifts_move_weight_off_the_common_tier() {
        let items = StubItems {
            rarities: Rarity::ALL.to_vec(),
        };
        // A roll of 59.9 lands in common with base weights (60), but the
        // maximum shift (10 + 5 = 15) pulls common down to 45.
        let unshifted = roll_reward(&items, &FixedRng(59.9), 42, 0, 0);
        assert_eq!(unshifted, Some(ItemId(Rarity::Common as u32)));
        let shifted = roll_reward(&items, &FixedRng(59.9), 42, 2_000, 10_000);
        assert_eq!(shifted, Some(ItemId(Rarity::Uncommon as u32)));
    }

    #[test]
    fn draw_settles_with_no_rating_change_and_no_rewards() {
        let store = MemoryStore::new();
        let config = BattleConfig::default();
        let items = StubItems {
            rarities: Rarity::ALL.to_vec(),
        };

        store
            .transaction(|txn| {
                let mut room = Room::new(RoomId(1), UserId(1), 1, 100, 1, 0);
                room.transition(RoomStatus::InProgress);
                room.started_at_ms = Some(0);
                txn.insert_room(room);
                for (id, user, team) in [(1, 1, Team::One), (2, 2, Team::Two)] {
                    let mut p = Participant::new(
                        ParticipantId(id),
                        UserId(user),
                        RoomId(1),
                        team,
                        0,
                        10,
                        100,
                        50,
                        5_000,
                    );
                    p.apply_damage(100);
                    txn.insert_participant(p);
                }
                complete_battle(
                    txn,
                    &config,
                    &items,
                    &FixedRng(50.0),
                    RoomId(1),
                    BattleOutcome::Draw,
                    42,
                    5_000,
                )
            })
            .unwrap();

        store
            .transaction(|txn| {
                let room = txn.room(RoomId(1)).unwrap();
                assert_eq!(room.status, RoomStatus::Dismissed);
                assert_eq!(room.winner_team, None);

                for user in [UserId(1), UserId(2)] {
                    let record = txn
                        .rating(RatingKey {
                            user,
                            mode: config.mode_id,
                            season: config.season,
                        })
                        .unwrap();
                    assert_eq!(record.rating, config.base_rating);
                    assert_eq!(record.draws, 1);
                    assert_eq!(record.wins, 0);
                    assert_eq!(record.losses, 0);
                }
                Ok(())
            })
            .unwrap();

        for record in store.history() {
            assert_eq!(record.won, None);
            assert_eq!(record.rating_change, 0);
            assert_eq!(record.reward, None);
        }
        assert_eq!(store.history().len(), 2);
    }
}
