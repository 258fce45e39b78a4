//! Creature catalog loader.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use battle_core::bonus::{Bonus, BonusSource};
use battle_core::unit::CreatureType;
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file, ron_options};

/// Creature as written in the catalog.
///
/// ```ron
/// (id: 1, name: "Pikeman", level: 1, health: 10, attack: 4, defense: 5,
///  damage: (1, 3), speed: 4)
/// ```
#[derive(Clone, Debug, Deserialize)]
struct CreatureRecord {
    id: u32,
    name: String,
    level: u8,
    health: i64,
    #[serde(default)]
    attack: i32,
    #[serde(default)]
    defense: i32,
    damage: (i32, i32),
    #[serde(default)]
    speed: i32,
    /// Ammunition; zero for melee creatures.
    #[serde(default)]
    shots: i32,
    #[serde(default)]
    double_wide: bool,
    #[serde(default)]
    abilities: Vec<Bonus>,
}

impl CreatureRecord {
    fn into_creature(self) -> CreatureType {
        let id = self.id;
        let mut creature = CreatureType::new(id, self.name, self.level, self.health)
            .with_attack(self.attack)
            .with_defense(self.defense)
            .with_damage(self.damage.0, self.damage.1)
            .with_speed(self.speed);
        if self.shots > 0 {
            creature = creature.with_shots(self.shots);
        }
        if self.double_wide {
            creature = creature.double_wide();
        }
        for mut ability in self.abilities {
            if ability.source == BonusSource::Other {
                ability.source = BonusSource::Creature;
                ability.source_id = id as i32;
            }
            creature = creature.with_ability(ability);
        }
        creature
    }
}

/// Loader for creature catalogs from RON files.
pub struct CreatureLoader;

impl CreatureLoader {
    /// Load a creature catalog. RON format: `Vec<CreatureRecord>`.
    pub fn load(path: &Path) -> LoadResult<Vec<Arc<CreatureType>>> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("failed to load creature catalog {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<Vec<Arc<CreatureType>>> {
        let records: Vec<CreatureRecord> = ron_options()
            .from_str(content)
            .context("failed to parse creature catalog RON")?;

        let mut seen = BTreeSet::new();
        let mut creatures = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id) {
                anyhow::bail!("duplicate creature id {} ('{}')", record.id, record.name);
            }
            if record.health <= 0 {
                anyhow::bail!("creature '{}' must have positive health", record.name);
            }
            creatures.push(Arc::new(record.into_creature()));
        }
        tracing::debug!(count = creatures.len(), "creature catalog loaded");
        Ok(creatures)
    }
}
