//! Content factory for building catalogs from data files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use battle_core::spell::{SpellDefinition, SpellId};
use battle_core::unit::{CreatureId, CreatureType};
use battle_core::{Battle, BattleConfig};

use crate::loaders::{ConfigLoader, CreatureLoader, LoadResult, SpellLoader};
use crate::registry::EffectRegistry;

/// Creatures and spells of one data set.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub creatures: Vec<Arc<CreatureType>>,
    pub spells: Vec<SpellDefinition>,
}

impl Catalog {
    pub fn creature(&self, id: CreatureId) -> Option<&Arc<CreatureType>> {
        self.creatures.iter().find(|c| c.id == id)
    }

    pub fn creature_named(&self, name: &str) -> Option<&Arc<CreatureType>> {
        self.creatures.iter().find(|c| c.name == name)
    }

    pub fn spell(&self, id: SpellId) -> Option<&SpellDefinition> {
        self.spells.iter().find(|s| s.id == id)
    }

    /// Registers every creature with `battle`, so summons can resolve them.
    pub fn register_creatures(&self, battle: &mut Battle) {
        for creature in &self.creatures {
            battle.register_creature(creature.clone());
        }
    }
}

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── creatures.ron
/// └── spells.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
    registry: EffectRegistry,
}

impl ContentFactory {
    /// Creates a factory using the built-in effect registry.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(data_dir, EffectRegistry::with_core())
    }

    pub fn with_registry(data_dir: impl Into<PathBuf>, registry: EffectRegistry) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry,
        }
    }

    /// Load battle configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        ConfigLoader::load(&self.data_dir.join("config.toml"))
    }

    /// Load creatures from `creatures.ron`.
    pub fn load_creatures(&self) -> LoadResult<Vec<Arc<CreatureType>>> {
        CreatureLoader::load(&self.data_dir.join("creatures.ron"))
    }

    /// Load spells from `spells.ron`.
    pub fn load_spells(&self) -> LoadResult<Vec<SpellDefinition>> {
        SpellLoader::load(&self.data_dir.join("spells.ron"), &self.registry)
    }

    /// Load both catalogs.
    pub fn load_catalog(&self) -> LoadResult<Catalog> {
        let catalog = Catalog {
            creatures: self.load_creatures()?,
            spells: self.load_spells()?,
        };
        tracing::info!(
            dir = %self.data_dir.display(),
            creatures = catalog.creatures.len(),
            spells = catalog.spells.len(),
            "battle content loaded"
        );
        Ok(catalog)
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
        assert!(factory.registry().contains("core:heal"));
    }

    #[test]
    fn missing_directory_fails_with_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let factory = ContentFactory::new(dir.path().join("nowhere"));
        let err = factory.load_catalog().expect_err("no files");
        assert!(format!("{err:#}").contains("creatures.ron"));
    }
}
