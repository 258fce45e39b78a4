use std::fmt;

use super::effect::Effect;
use crate::bonus::{BonusSource, Selector};
use crate::config::BattleConfig;

/// Identifier of a spell in the content catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellId(pub i32);

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spell:{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Positiveness {
    Positive,
    Negative,
    #[default]
    Neutral,
}

/// What a spell is aimed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TargetType {
    #[default]
    NoTarget,
    Creature,
    Location,
    Obstacle,
}

/// Area covered around the aimed hex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpellRange {
    #[default]
    Single,
    Radius(u8),
    /// Every unit on the field.
    Mass,
}

/// Mechanics family selecting legality and area rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MechanicsFamily {
    /// Legality and targeting driven entirely by effects.
    #[default]
    Custom,
    /// Obstacle line oriented by caster side; tiles must be clear.
    Wall,
    /// Obstacles scattered over random clear tiles.
    Patch,
}

/// Per-school-level data of a spell.
#[derive(Clone, Debug, Default)]
pub struct SpellLevel {
    /// Flat part of the effect value.
    pub power: i64,
    pub cost: i32,
    pub range: SpellRange,
    /// Effects in application order.
    pub effects: Vec<Effect>,
}

/// Static description of a spell.
#[derive(Clone, Debug)]
pub struct SpellDefinition {
    pub id: SpellId,
    pub name: String,
    /// Spell tier, 1 to 5. Zero marks creature-only abilities.
    pub level: u8,
    pub positiveness: Positiveness,
    pub target: TargetType,
    /// Only affects units whose owner fits the positiveness.
    pub smart: bool,
    /// Effect value gained per point of caster power.
    pub power_coefficient: i64,
    pub mechanics: MechanicsFamily,
    /// Spells whose bonuses this spell dispels from affected units.
    pub counters: Vec<SpellId>,
    /// One entry per school level (none, basic, advanced, expert).
    pub levels: Vec<SpellLevel>,
}

impl SpellDefinition {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id: SpellId(id),
            name: name.into(),
            level: 1,
            positiveness: Positiveness::Neutral,
            target: TargetType::NoTarget,
            smart: false,
            power_coefficient: 0,
            mechanics: MechanicsFamily::Custom,
            counters: Vec::new(),
            levels: vec![SpellLevel::default(); BattleConfig::SPELL_LEVELS],
        }
    }

    /// Data for `level`, clamped to the defined levels.
    pub fn level_info(&self, level: u8) -> Option<&SpellLevel> {
        if self.levels.is_empty() {
            return None;
        }
        let index = usize::from(level).min(self.levels.len() - 1);
        self.levels.get(index)
    }

    pub fn is_positive(&self) -> bool {
        self.positiveness == Positiveness::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.positiveness == Positiveness::Negative
    }

    pub fn range(&self, level: u8) -> SpellRange {
        self.level_info(level).map(|l| l.range).unwrap_or_default()
    }

    pub fn is_massive(&self, level: u8) -> bool {
        self.range(level) == SpellRange::Mass
    }

    pub fn cost(&self, level: u8) -> i32 {
        self.level_info(level).map_or(0, |l| l.cost)
    }

    pub fn effects(&self, level: u8) -> &[Effect] {
        self.level_info(level).map_or(&[], |l| l.effects.as_slice())
    }

    /// Effect value before caster and target adjustments.
    pub fn raw_effect_value(&self, effect_level: u8, effect_power: i64) -> i64 {
        let level_power = self.level_info(effect_level).map_or(0, |l| l.power);
        effect_power * self.power_coefficient + level_power
    }

    /// Bonuses granted by spells this spell counters.
    pub fn countering_selector(&self) -> Option<Selector> {
        if self.counters.is_empty() {
            return None;
        }
        let countered: Vec<i32> = self.counters.iter().map(|s| s.0).collect();
        Some(Selector::new(move |b| {
            b.source == BonusSource::SpellEffect && countered.contains(&b.source_id)
        }))
    }
}
