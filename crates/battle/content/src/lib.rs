//! Data-driven battle content.
//!
//! This crate loads the static data a battle is played with:
//! - Creature catalogs (RON)
//! - Spell catalogs (RON), with effects resolved through the [`EffectRegistry`]
//! - Battle configuration (TOML)
//!
//! Content is handed to `battle-core` as plain core types and never appears
//! in battle state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub mod registry;

#[cfg(feature = "loaders")]
pub use loaders::{Catalog, ConfigLoader, ContentFactory, CreatureLoader, SpellLoader};

#[cfg(feature = "loaders")]
pub use registry::{EffectConstructor, EffectRegistry};
