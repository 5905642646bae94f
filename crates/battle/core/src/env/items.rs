//! Reward item catalog oracle.

use crate::state::ItemId;

/// Reward rarity tiers, ordered from most to least common.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// All tiers, in weight order. The reward roll iterates this.
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Base weight of the tier in the reward roll (sums to 100).
    pub fn base_weight(self) -> f64 {
        match self {
            Rarity::Common => 60.0,
            Rarity::Uncommon => 25.0,
            Rarity::Rare => 10.0,
            Rarity::Epic => 4.0,
            Rarity::Legendary => 1.0,
        }
    }
}

/// A reward item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub rarity: Rarity,
}

/// Read-only reward item catalog.
pub trait ItemCatalog: Send + Sync {
    /// Items available at the given rarity. May be empty for a tier.
    fn by_rarity(&self, rarity: Rarity) -> Vec<Item>;
}
