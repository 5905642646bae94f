//! In-memory transactional store.
//!
//! Transactions lock the whole state, run the closure against a working
//! copy, and swap the copy in only on success. Rollback is therefore free
//! and exact, and transactions are fully serialized, which satisfies the
//! room-level ordering guarantee.

use std::collections::HashMap;
use std::sync::Mutex;

use battle_core::{
    ActionLogEntry, HistoryRecord, Participant, ParticipantId, RatingKey, RatingRecord, Room,
    RoomId, UserId,
};

use crate::api::{EngineError, Result};

use super::{BattleStore, StoreTxn};

#[derive(Clone, Debug, Default)]
struct StoreState {
    rooms: HashMap<RoomId, Room>,
    participants: HashMap<ParticipantId, Participant>,
    /// Join order per room, used to keep participant listings stable.
    room_members: HashMap<RoomId, Vec<ParticipantId>>,
    actions: Vec<ActionLogEntry>,
    ratings: HashMap<RatingKey, RatingRecord>,
    history: Vec<HistoryRecord>,
    next_room: u64,
    next_participant: u64,
    next_effect: u64,
}

/// In-memory [`BattleStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All history records written so far (test and inspection helper).
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.inner
            .lock()
            .map(|state| state.history.clone())
            .unwrap_or_default()
    }
}

impl BattleStore for MemoryStore {
    fn transaction<T>(&self, f: impl FnOnce(&mut dyn StoreTxn) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.lock().map_err(|_| EngineError::Conflict)?;
        let mut working = guard.clone();
        let value = f(&mut MemoryTxn {
            state: &mut working,
        })?;
        *guard = working;
        Ok(value)
    }
}

struct MemoryTxn<'a> {
    state: &'a mut StoreState,
}

impl StoreTxn for MemoryTxn<'_> {
    fn room(&self, id: RoomId) -> Option<&Room> {
        self.state.rooms.get(&id)
    }

    fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.state.rooms.get_mut(&id)
    }

    fn insert_room(&mut self, room: Room) {
        self.state.room_members.entry(room.id).or_default();
        self.state.rooms.insert(room.id, room);
    }

    fn remove_room(&mut self, id: RoomId) -> bool {
        if let Some(members) = self.state.room_members.remove(&id) {
            for member in members {
                self.state.participants.remove(&member);
            }
        }
        self.state.rooms.remove(&id).is_some()
    }

    fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<_> = self.state.rooms.keys().copied().collect();
        ids.sort();
        ids
    }

    fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.state.participants.get(&id)
    }

    fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.state.participants.get_mut(&id)
    }

    fn insert_participant(&mut self, participant: Participant) {
        self.state
            .room_members
            .entry(participant.room)
            .or_default()
            .push(participant.id);
        self.state.participants.insert(participant.id, participant);
    }

    fn remove_participant(&mut self, id: ParticipantId) -> bool {
        let Some(participant) = self.state.participants.remove(&id) else {
            return false;
        };
        if let Some(members) = self.state.room_members.get_mut(&participant.room) {
            members.retain(|m| *m != id);
        }
        true
    }

    fn room_participants(&self, room: RoomId) -> Vec<ParticipantId> {
        self.state
            .room_members
            .get(&room)
            .cloned()
            .unwrap_or_default()
    }

    fn participant_of_user(&self, room: RoomId, user: UserId) -> Option<ParticipantId> {
        self.room_participants(room)
            .into_iter()
            .find(|id| self.state.participants.get(id).is_some_and(|p| p.user == user))
    }

    fn append_action(&mut self, entry: ActionLogEntry) {
        self.state.actions.push(entry);
    }

    fn append_history(&mut self, record: HistoryRecord) {
        self.state.history.push(record);
    }

    fn actions_for_room(&self, room: RoomId) -> Vec<ActionLogEntry> {
        self.state
            .actions
            .iter()
            .filter(|e| e.room == room)
            .cloned()
            .collect()
    }

    fn rating(&self, key: RatingKey) -> Option<RatingRecord> {
        self.state.ratings.get(&key).cloned()
    }

    fn upsert_rating(&mut self, record: RatingRecord) {
        self.state.ratings.insert(record.key, record);
    }

    fn next_room_id(&mut self) -> RoomId {
        self.state.next_room += 1;
        RoomId(self.state.next_room)
    }

    fn next_participant_id(&mut self) -> ParticipantId {
        self.state.next_participant += 1;
        ParticipantId(self.state.next_participant)
    }

    fn next_effect_id(&mut self) -> u64 {
        self.state.next_effect += 1;
        self.state.next_effect
    }
}
