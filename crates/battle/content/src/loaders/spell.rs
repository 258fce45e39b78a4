//! Spell catalog loader.
//!
//! Effects are written by registry name with raw RON parameters and built
//! through an [`EffectRegistry`].

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use battle_core::config::BattleConfig;
use battle_core::spell::{
    Effect, MechanicsFamily, Positiveness, SpellDefinition, SpellId, SpellLevel, SpellRange, TargetType,
};
use ron::value::RawValue;
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file, ron_options};
use crate::registry::EffectRegistry;

#[derive(Debug, Deserialize)]
struct EffectRecord {
    /// Registry name, e.g. `"core:damage"`.
    kind: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    params: Option<Box<RawValue>>,
}

#[derive(Debug, Deserialize)]
struct LevelRecord {
    #[serde(default)]
    power: i64,
    #[serde(default)]
    cost: i32,
    #[serde(default)]
    range: SpellRange,
    #[serde(default)]
    effects: Vec<EffectRecord>,
}

#[derive(Debug, Deserialize)]
struct SpellRecord {
    id: i32,
    name: String,
    #[serde(default = "default_spell_level")]
    level: u8,
    #[serde(default)]
    positiveness: Positiveness,
    #[serde(default)]
    target: TargetType,
    #[serde(default)]
    smart: bool,
    #[serde(default)]
    power_coefficient: i64,
    #[serde(default)]
    mechanics: MechanicsFamily,
    #[serde(default)]
    counters: Vec<i32>,
    levels: Vec<LevelRecord>,
}

fn default_spell_level() -> u8 {
    1
}

impl SpellRecord {
    fn into_spell(self, registry: &EffectRegistry) -> LoadResult<SpellDefinition> {
        if self.levels.is_empty() {
            anyhow::bail!("spell '{}' defines no levels", self.name);
        }
        if self.levels.len() > BattleConfig::SPELL_LEVELS {
            anyhow::bail!(
                "spell '{}' defines {} levels, at most {} allowed",
                self.name,
                self.levels.len(),
                BattleConfig::SPELL_LEVELS
            );
        }

        let mut levels = Vec::with_capacity(BattleConfig::SPELL_LEVELS);
        for (index, record) in self.levels.into_iter().enumerate() {
            let mut effects = Vec::with_capacity(record.effects.len());
            for effect in record.effects {
                let params = effect.params.as_deref().map(RawValue::get_ron);
                let kind = registry
                    .create(&effect.kind, params)
                    .with_context(|| format!("spell '{}' level {}", self.name, index))?;
                effects.push(if effect.optional { Effect::optional(kind) } else { Effect::new(kind) });
            }
            levels.push(SpellLevel {
                power: record.power,
                cost: record.cost,
                range: record.range,
                effects,
            });
        }
        // Higher school levels repeat the last one written.
        while levels.len() < BattleConfig::SPELL_LEVELS {
            let last = levels[levels.len() - 1].clone();
            levels.push(last);
        }

        let mut spell = SpellDefinition::new(self.id, self.name);
        spell.level = self.level;
        spell.positiveness = self.positiveness;
        spell.target = self.target;
        spell.smart = self.smart;
        spell.power_coefficient = self.power_coefficient;
        spell.mechanics = self.mechanics;
        spell.counters = self.counters.into_iter().map(SpellId).collect();
        spell.levels = levels;
        Ok(spell)
    }
}

/// Loader for spell catalogs from RON files.
pub struct SpellLoader;

impl SpellLoader {
    /// Load a spell catalog. RON format: `Vec<SpellRecord>`.
    pub fn load(path: &Path, registry: &EffectRegistry) -> LoadResult<Vec<SpellDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content, registry)
            .with_context(|| format!("failed to load spell catalog {}", path.display()))
    }

    pub fn parse(content: &str, registry: &EffectRegistry) -> LoadResult<Vec<SpellDefinition>> {
        let records: Vec<SpellRecord> = ron_options()
            .from_str(content)
            .context("failed to parse spell catalog RON")?;

        let mut seen = BTreeSet::new();
        let mut spells = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id) {
                anyhow::bail!("duplicate spell id {} ('{}')", record.id, record.name);
            }
            spells.push(record.into_spell(registry)?);
        }
        tracing::debug!(count = spells.len(), "spell catalog loaded");
        Ok(spells)
    }
}
