//! String-keyed effect factory.
//!
//! Spell data names its effects (`"core:damage"`, `"core:heal"`, ...) and
//! carries their parameters as raw RON. The registry maps each name to a
//! constructor, so new effect kinds can be plugged in without touching the
//! spell loader.

use std::collections::BTreeMap;

use anyhow::Context;
use battle_core::spell::EffectKind;
use battle_core::spell::effect::{
    CloneEffect, DamageEffect, HealEffect, ObstacleEffect, RemoveObstacleEffect, SacrificeEffect,
    SummonEffect, TeleportEffect, TimedEffect,
};
use serde::de::DeserializeOwned;

use crate::loaders::{LoadResult, ron_options};

/// Builds an effect from its optional RON parameters.
pub type EffectConstructor = fn(Option<&str>) -> LoadResult<EffectKind>;

/// Registry of effect constructors keyed by type name.
#[derive(Clone, Debug, Default)]
pub struct EffectRegistry {
    constructors: BTreeMap<String, EffectConstructor>,
}

impl EffectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in effect under the `core:` namespace.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        registry.register("core:damage", |p| Ok(EffectKind::Damage(params::<DamageEffect>(p)?)));
        registry.register("core:heal", |p| Ok(EffectKind::Heal(params::<HealEffect>(p)?)));
        registry.register("core:sacrifice", |p| Ok(EffectKind::Sacrifice(params::<SacrificeEffect>(p)?)));
        registry.register("core:clone", |p| Ok(EffectKind::Clone(params::<CloneEffect>(p)?)));
        registry.register("core:teleport", |p| Ok(EffectKind::Teleport(params::<TeleportEffect>(p)?)));
        registry.register("core:timed", |p| Ok(EffectKind::Timed(params::<TimedEffect>(p)?)));
        registry.register("core:obstacle", |p| Ok(EffectKind::Obstacle(params::<ObstacleEffect>(p)?)));
        registry.register("core:summon", |p| Ok(EffectKind::Summon(params::<SummonEffect>(p)?)));
        registry.register("core:remove_obstacle", |p| {
            Ok(EffectKind::RemoveObstacle(params::<RemoveObstacleEffect>(p)?))
        });
        registry
    }

    /// Registers `constructor` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, constructor: EffectConstructor) {
        let name = name.into();
        if self.constructors.insert(name.clone(), constructor).is_some() {
            tracing::debug!(effect = %name, "effect constructor replaced");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.constructors.keys().map(String::as_str)
    }

    /// Builds the effect registered as `name`.
    pub fn create(&self, name: &str, params: Option<&str>) -> LoadResult<EffectKind> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("unknown effect type '{}'", name))?;
        constructor(params).with_context(|| format!("invalid parameters for effect '{}'", name))
    }
}

/// Deserializes effect parameters; missing parameters give the defaults.
fn params<T: DeserializeOwned + Default>(raw: Option<&str>) -> LoadResult<T> {
    match raw {
        None => Ok(T::default()),
        Some(text) => Ok(ron_options().from_str(text)?),
    }
}

#[cfg(test)]
mod tests {
    use battle_core::bonus::BonusType;
    use battle_core::unit::{CreatureId, HealLevel, HealPower};

    use super::*;

    #[test]
    fn core_effects_are_registered() {
        let registry = EffectRegistry::with_core();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names.len(), 9);
        assert!(registry.contains("core:damage"));
        assert!(registry.contains("core:sacrifice"));
        assert!(registry.contains("core:remove_obstacle"));
        assert!(!registry.contains("damage"));
    }

    #[test]
    fn creates_effects_from_parameters() {
        let registry = EffectRegistry::with_core();

        let heal = registry
            .create("core:heal", Some("(level: resurrect, min_full_units: 1)"))
            .expect("heal");
        match heal {
            EffectKind::Heal(effect) => {
                assert_eq!(effect.level, HealLevel::Resurrect);
                assert_eq!(effect.min_full_units, 1);
            }
            other => panic!("unexpected effect {:?}", other),
        }

        let summon = registry
            .create("core:summon", Some("(creature: 7, exclusive: true)"))
            .expect("summon");
        assert_eq!(
            summon,
            EffectKind::Summon(SummonEffect {
                creature: CreatureId(7),
                permanent: false,
                exclusive: true,
            })
        );

        let bless = registry
            .create("core:timed", Some("(bonuses: [(kind: creature_damage, subtype: 0, value: 1)])"))
            .expect("timed");
        match bless {
            EffectKind::Timed(effect) => assert_eq!(effect.bonuses[0].kind, BonusType::CreatureDamage),
            other => panic!("unexpected effect {:?}", other),
        }

        assert_eq!(
            registry.create("core:teleport", None).expect("teleport"),
            EffectKind::Teleport(TeleportEffect)
        );

        assert_eq!(
            registry.create("core:sacrifice", None).expect("sacrifice"),
            EffectKind::Sacrifice(SacrificeEffect::default())
        );
        let temporary = registry
            .create("core:sacrifice", Some("(power: one_battle)"))
            .expect("sacrifice");
        assert!(matches!(
            temporary,
            EffectKind::Sacrifice(SacrificeEffect { level: HealLevel::Resurrect, power: HealPower::OneBattle })
        ));
    }

    #[test]
    fn unknown_names_and_bad_parameters_fail() {
        let registry = EffectRegistry::with_core();
        let err = registry.create("mod:meteor", None).expect_err("unknown");
        assert!(err.to_string().contains("mod:meteor"));
        assert!(registry.create("core:damage", Some("(kill_by_count: 3)")).is_err());
    }

    #[test]
    fn custom_constructors_can_be_plugged_in() {
        let mut registry = EffectRegistry::new();
        registry.register("mod:smite", |_| {
            Ok(EffectKind::Damage(DamageEffect {
                kill_by_count: true,
                ..DamageEffect::default()
            }))
        });
        assert!(matches!(
            registry.create("mod:smite", None),
            Ok(EffectKind::Damage(DamageEffect { kill_by_count: true, .. }))
        ));
    }
}
