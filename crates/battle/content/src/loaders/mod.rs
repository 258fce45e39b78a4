//! Content loaders for reading battle data from files.
//!
//! RON files hold creature and spell catalogs, TOML holds the battle
//! configuration. Every loader reports failures with the offending path.

pub mod config;
pub mod creature;
pub mod factory;
pub mod spell;

pub use config::ConfigLoader;
pub use creature::CreatureLoader;
pub use factory::{Catalog, ContentFactory};
pub use spell::SpellLoader;

use std::path::Path;

use anyhow::Context;
use ron::extensions::Extensions;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read file {}", path.display()))
}

/// RON dialect of the data files: ids are written as bare numbers.
pub(crate) fn ron_options() -> ron::Options {
    ron::Options::default().with_default_extension(Extensions::UNWRAP_NEWTYPES | Extensions::IMPLICIT_SOME)
}
