//! Store contracts for battle state persistence.
//!
//! A room is the unit of contention: `transaction` serializes closures so
//! that an action which reads and mutates every participant in a room can
//! never interleave with another. The closure either returns `Ok` and the
//! whole mutation commits, or returns `Err` and none of it survives.
mod memory;

pub use memory::MemoryStore;

use battle_core::{
    ActionLogEntry, HistoryRecord, Participant, ParticipantId, RatingKey, RatingRecord, Room,
    RoomId, UserId,
};

use crate::api::Result;

/// Mutable view of the store inside one transaction.
///
/// Id allocation happens here too; a rolled-back transaction also rolls
/// back the counters it advanced.
pub trait StoreTxn {
    // ----- rooms -----
    fn room(&self, id: RoomId) -> Option<&Room>;
    fn room_mut(&mut self, id: RoomId) -> Option<&mut Room>;
    fn insert_room(&mut self, room: Room);
    fn remove_room(&mut self, id: RoomId) -> bool;
    fn room_ids(&self) -> Vec<RoomId>;

    // ----- participants -----
    fn participant(&self, id: ParticipantId) -> Option<&Participant>;
    fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant>;
    fn insert_participant(&mut self, participant: Participant);
    fn remove_participant(&mut self, id: ParticipantId) -> bool;
    /// Participants of a room, in join order.
    fn room_participants(&self, room: RoomId) -> Vec<ParticipantId>;
    fn participant_of_user(&self, room: RoomId, user: UserId) -> Option<ParticipantId>;

    // ----- append-only records -----
    fn append_action(&mut self, entry: ActionLogEntry);
    fn append_history(&mut self, record: HistoryRecord);
    fn actions_for_room(&self, room: RoomId) -> Vec<ActionLogEntry>;

    // ----- ratings -----
    fn rating(&self, key: RatingKey) -> Option<RatingRecord>;
    fn upsert_rating(&mut self, record: RatingRecord);

    // ----- id allocation -----
    fn next_room_id(&mut self) -> RoomId;
    fn next_participant_id(&mut self) -> ParticipantId;
    fn next_effect_id(&mut self) -> u64;
}

/// Transactional battle store.
pub trait BattleStore: Send + Sync {
    /// Runs `f` inside one atomic transaction.
    ///
    /// Transactions are serialized with respect to each other. If `f`
    /// returns an error the transaction is rolled back and the error is
    /// surfaced unchanged; no partial mutation is ever visible.
    fn transaction<T>(&self, f: impl FnOnce(&mut dyn StoreTxn) -> Result<T>) -> Result<T>;
}

impl<S: BattleStore> BattleStore for std::sync::Arc<S> {
    fn transaction<T>(&self, f: impl FnOnce(&mut dyn StoreTxn) -> Result<T>) -> Result<T> {
        S::transaction(self, f)
    }
}
