//! Room lifecycle: create, join, leave, dismiss, cleanup.

use battle_core::{
    ActionError, BattleOutcome, Participant, ParticipantStatus, Room, RoomId, RoomStatus, Team,
    UserId, check_completion,
};
use tracing::info;

use crate::api::{EngineError, Result, RoomOptions, RoomSnapshot};
use crate::store::{BattleStore, StoreTxn};

use super::BattleEngine;
use super::settlement;

impl<S: BattleStore> BattleEngine<S> {
    /// Creates a room and seats the leader on team one.
    pub async fn create_room(&self, leader: UserId, options: RoomOptions) -> Result<RoomSnapshot> {
        let stats = self.stats.combined_stats(leader).await?;
        let now = self.now_ms();

        self.store.transaction(|txn| {
            if stats.level < options.min_level || stats.level > options.max_level {
                return Err(ActionError::LevelOutOfRange {
                    level: stats.level,
                    min: options.min_level,
                    max: options.max_level,
                }
                .into());
            }

            let room_id = txn.next_room_id();
            let room = Room::new(
                room_id,
                leader,
                options.min_level,
                options.max_level,
                options.team_size,
                now,
            );
            txn.insert_room(room);

            let participant_id = txn.next_participant_id();
            txn.insert_participant(Participant::new(
                participant_id,
                leader,
                room_id,
                Team::One,
                0,
                stats.level,
                stats.secondary.max_hp,
                stats.secondary.max_energy,
                self.config.base_cooldown_ms,
            ));

            info!(room = %room_id, %leader, team_size = options.team_size, "room created");
            Self::snapshot(&*txn, room_id)
        })
    }

    /// Joins a waiting room, auto-balancing onto the smaller team. Filling
    /// the last slot starts the battle.
    pub async fn join_room(&self, room: RoomId, user: UserId) -> Result<RoomSnapshot> {
        let stats = self.stats.combined_stats(user).await?;
        let now = self.now_ms();

        self.store.transaction(|txn| {
            let team_size = {
                let r = txn.room(room).ok_or(EngineError::RoomNotFound(room))?;
                if r.status != RoomStatus::Waiting {
                    return Err(ActionError::RoomNotJoinable { status: r.status }.into());
                }
                if !r.accepts_level(stats.level) {
                    return Err(ActionError::LevelOutOfRange {
                        level: stats.level,
                        min: r.min_level,
                        max: r.max_level,
                    }
                    .into());
                }
                r.team_size
            };

            if txn.participant_of_user(room, user).is_some() {
                return Err(ActionError::AlreadyInRoom.into());
            }

            let (one, two) = team_counts(&*txn, room);
            let capacity = team_size as usize;
            if one >= capacity && two >= capacity {
                return Err(ActionError::RoomFull.into());
            }
            // Smaller team first; ties seat on team one.
            let team = if two < one && two < capacity {
                Team::Two
            } else if one < capacity {
                Team::One
            } else {
                Team::Two
            };
            let position = match team {
                Team::One => one as u8,
                Team::Two => two as u8,
            };

            let participant_id = txn.next_participant_id();
            txn.insert_participant(Participant::new(
                participant_id,
                user,
                room,
                team,
                position,
                stats.level,
                stats.secondary.max_hp,
                stats.secondary.max_energy,
                self.config.base_cooldown_ms,
            ));

            let (one, two) = team_counts(&*txn, room);
            if one >= capacity && two >= capacity {
                let r = txn.room_mut(room).ok_or(EngineError::RoomNotFound(room))?;
                r.transition(RoomStatus::InProgress);
                r.started_at_ms = Some(now);
                info!(%room, "room full, battle started");
            } else {
                info!(%room, %user, %team, "user joined room");
            }

            Self::snapshot(&*txn, room)
        })
    }

    /// Leaves a room.
    ///
    /// Leaving a waiting room frees the slot; the leader leaving closes the
    /// room for everyone. Leaving a battle in progress is a forfeit, and may
    /// end the battle on the spot.
    pub async fn leave_room(&self, room: RoomId, user: UserId) -> Result<Option<BattleOutcome>> {
        let now = self.now_ms();
        let seed = self.next_seed();

        self.store.transaction(|txn| {
            let status = txn
                .room(room)
                .ok_or(EngineError::RoomNotFound(room))?
                .status;
            let participant_id = txn
                .participant_of_user(room, user)
                .ok_or(ActionError::NotAParticipant)?;

            match status {
                RoomStatus::Waiting => {
                    let is_leader = txn
                        .room(room)
                        .is_some_and(|r| r.leader == user);
                    if is_leader {
                        if let Some(r) = txn.room_mut(room) {
                            r.transition(RoomStatus::Closed);
                        }
                        txn.remove_room(room);
                        info!(%room, %user, "leader left, room closed");
                    } else {
                        txn.remove_participant(participant_id);
                        info!(%room, %user, "user left waiting room");
                    }
                    Ok(None)
                }
                RoomStatus::InProgress => {
                    if let Some(p) = txn.participant_mut(participant_id) {
                        p.forfeit();
                    }
                    info!(%room, %user, "user forfeited");

                    let participants: Vec<Participant> = txn
                        .room_participants(room)
                        .into_iter()
                        .filter_map(|id| txn.participant(id).cloned())
                        .collect();
                    let outcome = check_completion(&participants);
                    if let Some(outcome) = outcome {
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
                    Ok(outcome)
                }
                status => Err(ActionError::RoomNotInProgress { status }.into()),
            }
        })
    }

    /// Dismisses a waiting room. Leader only; every seated participant is
    /// released.
    pub async fn dismiss_room(&self, room: RoomId, user: UserId) -> Result<()> {
        self.store.transaction(|txn| {
            let r = txn.room(room).ok_or(EngineError::RoomNotFound(room))?;
            if r.leader != user {
                return Err(ActionError::NotRoomLeader.into());
            }
            if r.status != RoomStatus::Waiting {
                return Err(ActionError::NotDismissable { status: r.status }.into());
            }
            if let Some(r) = txn.room_mut(room) {
                r.transition(RoomStatus::Closed);
            }
            txn.remove_room(room);
            info!(%room, %user, "room dismissed");
            Ok(())
        })
    }

    /// Read-only snapshot of a room and its participants.
    pub async fn room_state(&self, room: RoomId) -> Result<RoomSnapshot> {
        self.store.transaction(|txn| Self::snapshot(&*txn, room))
    }

    /// Removes waiting rooms older than `max_age_ms` and settled rooms kept
    /// past the same age. Returns the number of rooms removed.
    pub async fn cleanup_stale_rooms(&self, max_age_ms: u64) -> Result<usize> {
        let now = self.now_ms();

        self.store.transaction(|txn| {
            let mut removed = 0usize;
            for id in txn.room_ids() {
                let Some(room) = txn.room(id) else { continue };
                let stale = match room.status {
                    RoomStatus::Waiting => now.saturating_sub(room.created_at_ms) >= max_age_ms,
                    RoomStatus::Dismissed | RoomStatus::Closed => {
                        let reference = room.ended_at_ms.unwrap_or(room.created_at_ms);
                        now.saturating_sub(reference) >= max_age_ms
                    }
                    _ => false,
                };
                if !stale {
                    continue;
                }
                if room.status == RoomStatus::Waiting {
                    if let Some(r) = txn.room_mut(id) {
                        r.transition(RoomStatus::Closed);
                    }
                }
                txn.remove_room(id);
                removed += 1;
            }
            if removed > 0 {
                info!(removed, "stale rooms cleaned up");
            }
            Ok(removed)
        })
    }
}

/// Seated (non-retired) participants per team.
fn team_counts(txn: &dyn StoreTxn, room: RoomId) -> (usize, usize) {
    let mut one = 0usize;
    let mut two = 0usize;
    for id in txn.room_participants(room) {
        let Some(p) = txn.participant(id) else { continue };
        if p.status == ParticipantStatus::Inactive {
            continue;
        }
        match p.team {
            Team::One => one += 1,
            Team::Two => two += 1,
        }
    }
    (one, two)
}
