/// Battle configuration constants and tunable parameters.
///
/// Balance numbers live here rather than scattered through the combat code so
/// the runtime can carry a single config value into every transaction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Base cooldown between two actions of the same participant.
    pub base_cooldown_ms: u64,
    /// Lower bound the speed modifier can push the cooldown down to.
    pub min_cooldown_ms: u64,
    /// Wall-clock length of one legacy "turn". Only used when normalizing
    /// turn-count durations into milliseconds at effect creation.
    pub fixed_tick_seconds: u64,
    /// Base damage of a plain attack before attack/defense stats.
    pub basic_attack_damage: i64,
    /// Critical hits multiply the final damage by this factor.
    pub crit_multiplier: f64,
    /// Baseline dodge chance before luck, speed effects and equipment.
    pub base_dodge_chance: f64,
    /// Baseline critical chance before stats and equipment.
    pub base_crit_chance: f64,
    /// Total defense reduction is capped at this percentage.
    pub defense_cap_percent: f64,
    /// Speed modifier can shave off at most this fraction of the cooldown.
    pub max_cooldown_reduction: f64,
    /// Rating delta applied to each winner at settlement.
    pub win_rating_delta: i32,
    /// Rating delta applied to each loser at settlement.
    pub loss_rating_delta: i32,
    /// Rating a user starts from when no record exists yet.
    pub base_rating: i32,
    /// Ranked mode identifier stamped onto rating records.
    pub mode_id: u32,
    /// Current season stamped onto rating records.
    pub season: u32,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum simultaneous effects tracked per participant.
    pub const MAX_ACTIVE_EFFECTS: usize = 32;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_BASE_COOLDOWN_MS: u64 = 5_000;
    pub const DEFAULT_MIN_COOLDOWN_MS: u64 = 1_000;
    pub const DEFAULT_FIXED_TICK_SECONDS: u64 = 5;
    pub const DEFAULT_BASIC_ATTACK_DAMAGE: i64 = 10;

    pub fn new() -> Self {
        Self {
            base_cooldown_ms: Self::DEFAULT_BASE_COOLDOWN_MS,
            min_cooldown_ms: Self::DEFAULT_MIN_COOLDOWN_MS,
            fixed_tick_seconds: Self::DEFAULT_FIXED_TICK_SECONDS,
            basic_attack_damage: Self::DEFAULT_BASIC_ATTACK_DAMAGE,
            crit_multiplier: 1.5,
            base_dodge_chance: 10.0,
            base_crit_chance: 5.0,
            defense_cap_percent: 80.0,
            max_cooldown_reduction: 0.8,
            win_rating_delta: 15,
            loss_rating_delta: -10,
            base_rating: 1_000,
            mode_id: 1,
            season: 1,
        }
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
