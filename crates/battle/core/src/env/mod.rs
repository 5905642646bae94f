//! Traits describing read-only catalog data and randomness.
//!
//! Catalogs expose technique definitions and reward items; the RNG oracle
//! provides deterministic draws. The runtime injects concrete
//! implementations, so the rules here never couple to a data source.
mod items;
mod rng;
mod technique;

pub use items::{Item, ItemCatalog, Rarity};
pub use rng::{PcgRng, RngOracle, compute_seed};
pub use technique::{
    DefendProfile, EffectTemplate, TechniqueCatalog, TechniqueDefinition, TechniqueTarget,
    TemplateTarget,
};
