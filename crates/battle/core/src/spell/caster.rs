use super::{SpellDefinition, SpellId};
use crate::bonus::{BonusBearer, BonusType, Selector};
use crate::unit::{BattleSide, PlayerId, UnitId, UnitSnapshot};

/// Anything that can cast a spell: heroes, spellcasting creatures, and units
/// reflecting a spell back.
pub trait Caster {
    fn caster_name(&self) -> String;

    fn owner(&self) -> PlayerId;

    fn side(&self) -> BattleSide;

    /// Unit performing the cast, if it is a creature.
    fn caster_unit(&self) -> Option<UnitId> {
        None
    }

    /// School level (0-3) the caster knows `spell` at.
    fn spell_school_level(&self, spell: &SpellDefinition) -> u8;

    fn effect_level(&self, spell: &SpellDefinition) -> u8 {
        self.spell_school_level(spell)
    }

    fn effect_power(&self, spell: &SpellDefinition) -> i64;

    /// Duration in rounds for timed effects.
    fn enchant_power(&self, spell: &SpellDefinition) -> i64;

    /// Fixed effect value overriding the spell formula; zero for none.
    fn effect_value(&self, _spell: &SpellDefinition) -> i64 {
        0
    }

    /// Caster-specific adjustment of an effect value against one target.
    fn spell_bonus(&self, _spell: &SpellDefinition, value: i64, _target: Option<&UnitSnapshot>) -> i64 {
        value
    }
}

/// Army commander casting from a spellbook.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hero {
    pub name: String,
    pub owner: PlayerId,
    pub side: BattleSide,
    pub spell_power: i64,
    /// School level known for every spell (0-3).
    pub school_level: u8,
    pub mana: i32,
    pub spellbook: Vec<SpellId>,
}

impl Hero {
    pub fn new(name: impl Into<String>, owner: PlayerId, side: BattleSide) -> Self {
        Self {
            name: name.into(),
            owner,
            side,
            spell_power: 1,
            school_level: 0,
            mana: 0,
            spellbook: Vec::new(),
        }
    }

    pub fn knows(&self, spell: SpellId) -> bool {
        self.spellbook.contains(&spell)
    }
}

impl Caster for Hero {
    fn caster_name(&self) -> String {
        self.name.clone()
    }

    fn owner(&self) -> PlayerId {
        self.owner
    }

    fn side(&self) -> BattleSide {
        self.side
    }

    fn spell_school_level(&self, _spell: &SpellDefinition) -> u8 {
        self.school_level
    }

    fn effect_power(&self, _spell: &SpellDefinition) -> i64 {
        self.spell_power
    }

    fn enchant_power(&self, _spell: &SpellDefinition) -> i64 {
        self.spell_power
    }
}

/// A unit casting an innate spell, or reflecting one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitCaster {
    pub unit: UnitId,
    pub name: String,
    pub owner: PlayerId,
    pub side: BattleSide,
    pub school_level: u8,
    /// Individuals in the stack.
    pub count: i64,
    /// Per-individual effect value granted by `SpecificSpellPower`.
    pub value_per_unit: i64,
}

impl UnitCaster {
    pub fn new(unit: &UnitSnapshot, spell: SpellId, school_level: u8) -> Self {
        let value_per_unit = i64::from(
            unit.value_of(&Selector::type_subtype(BonusType::SpecificSpellPower, spell.0)),
        );
        Self {
            unit: unit.id(),
            name: unit.state.name().to_owned(),
            owner: unit.owner(),
            side: unit.side(),
            school_level,
            count: unit.count(),
            value_per_unit,
        }
    }
}

impl Caster for UnitCaster {
    fn caster_name(&self) -> String {
        self.name.clone()
    }

    fn owner(&self) -> PlayerId {
        self.owner
    }

    fn side(&self) -> BattleSide {
        self.side
    }

    fn caster_unit(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn spell_school_level(&self, _spell: &SpellDefinition) -> u8 {
        self.school_level
    }

    fn effect_power(&self, _spell: &SpellDefinition) -> i64 {
        self.count
    }

    /// Creature enchantments last three rounds.
    fn enchant_power(&self, _spell: &SpellDefinition) -> i64 {
        3
    }

    fn effect_value(&self, _spell: &SpellDefinition) -> i64 {
        self.value_per_unit * self.count
    }
}
