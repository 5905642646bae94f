//! The battle engine: injected collaborators plus the room and action API.
//!
//! The engine is the only writer of battle state. Room operations and
//! actions each run under one store transaction; stats are fetched from the
//! async provider before the transaction opens, so the closure itself is
//! pure and synchronous.
mod actions;
mod rooms;
mod settlement;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use battle_core::{
    ActionLogEntry, BattleConfig, ItemCatalog, PcgRng, RatingKey, RatingRecord, RngOracle, RoomId,
    TechniqueCatalog, UserId,
};

use crate::api::{EngineError, Result, RoomSnapshot, StatsProvider};
use crate::clock::{Clock, SystemClock};
use crate::store::{BattleStore, StoreTxn};

/// Orchestrates rooms, actions and settlement over a [`BattleStore`].
pub struct BattleEngine<S: BattleStore> {
    store: S,
    stats: Arc<dyn StatsProvider>,
    techniques: Arc<dyn TechniqueCatalog>,
    items: Arc<dyn ItemCatalog>,
    rng: Arc<dyn RngOracle>,
    clock: Arc<dyn Clock>,
    config: BattleConfig,
    /// Base seed every per-action seed is derived from.
    game_seed: u64,
    /// Monotonic per-action counter mixed into the seed so two actions never
    /// share random draws.
    nonce: AtomicU64,
}

impl<S: BattleStore> BattleEngine<S> {
    pub fn builder(
        store: S,
        stats: Arc<dyn StatsProvider>,
        techniques: Arc<dyn TechniqueCatalog>,
        items: Arc<dyn ItemCatalog>,
    ) -> BattleEngineBuilder<S> {
        BattleEngineBuilder::new(store, stats, techniques, items)
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Derives a fresh seed for one action's random draws.
    fn next_seed(&self) -> u64 {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        self.game_seed ^ nonce.wrapping_mul(0x9e3779b97f4a7c15)
    }

    /// Ranked standing of a user for the configured mode and season. Users
    /// without a record yet report the base rating.
    pub async fn rating(&self, user: UserId) -> Result<RatingRecord> {
        self.store.transaction(|txn| {
            let key = RatingKey {
                user,
                mode: self.config.mode_id,
                season: self.config.season,
            };
            Ok(txn
                .rating(key)
                .unwrap_or_else(|| RatingRecord::starting(key, self.config.base_rating)))
        })
    }

    /// Committed action log of a room, oldest first.
    pub async fn battle_log(&self, room: RoomId) -> Result<Vec<ActionLogEntry>> {
        self.store.transaction(|txn| Ok(txn.actions_for_room(room)))
    }

    /// Materializes a read-only snapshot of a room inside a transaction.
    fn snapshot(txn: &dyn StoreTxn, room: RoomId) -> Result<RoomSnapshot> {
        let room_state = txn
            .room(room)
            .cloned()
            .ok_or(EngineError::RoomNotFound(room))?;
        let participants = txn
            .room_participants(room)
            .into_iter()
            .filter_map(|id| txn.participant(id).cloned())
            .collect();
        Ok(RoomSnapshot {
            room: room_state,
            participants,
        })
    }
}

/// Builder for [`BattleEngine`], with sensible defaults for the pieces most
/// callers never customize.
pub struct BattleEngineBuilder<S: BattleStore> {
    store: S,
    stats: Arc<dyn StatsProvider>,
    techniques: Arc<dyn TechniqueCatalog>,
    items: Arc<dyn ItemCatalog>,
    rng: Arc<dyn RngOracle>,
    clock: Arc<dyn Clock>,
    config: BattleConfig,
    game_seed: Option<u64>,
}

impl<S: BattleStore> BattleEngineBuilder<S> {
    pub fn new(
        store: S,
        stats: Arc<dyn StatsProvider>,
        techniques: Arc<dyn TechniqueCatalog>,
        items: Arc<dyn ItemCatalog>,
    ) -> Self {
        Self {
            store,
            stats,
            techniques,
            items,
            rng: Arc::new(PcgRng),
            clock: Arc::new(SystemClock),
            config: BattleConfig::default(),
            game_seed: None,
        }
    }

    pub fn rng(mut self, rng: Arc<dyn RngOracle>) -> Self {
        self.rng = rng;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixes the base seed; battles become fully replayable.
    pub fn game_seed(mut self, seed: u64) -> Self {
        self.game_seed = Some(seed);
        self
    }

    pub fn build(self) -> BattleEngine<S> {
        BattleEngine {
            store: self.store,
            stats: self.stats,
            techniques: self.techniques,
            items: self.items,
            rng: self.rng,
            clock: self.clock,
            config: self.config,
            game_seed: self.game_seed.unwrap_or_else(rand::random),
            nonce: AtomicU64::new(0),
        }
    }
}
