//! Combatant units: static definitions, mutable runtime state and the
//! counters and health accounting they carry.
//!
//! A unit is a stack of identical creatures sharing one [`HealthPool`]. The
//! immutable part ([`UnitDefinition`]) is shared; every live combatant owns
//! exactly one [`UnitState`]. Queries that depend on bonuses go through a
//! [`UnitBonuses`] view supplied by whichever battle state tracks the unit.

mod ammo;
mod health;
mod persist;
mod snapshot;
mod state;

pub use ammo::{Ammo, AmmoKind};
pub use health::{HealLevel, HealPower, HealthPool};
pub use persist::{AmmoRecord, HealthRecord, PersistedUnitState, RetaliationRecord};
pub use snapshot::{UnitBonuses, UnitSnapshot};
pub use state::{UnitFlags, UnitState};

use std::fmt;
use std::sync::Arc;

use crate::bonus::{Bonus, BonusList, BonusType, BonusValueType, damage_subtype, primary_skill};

/// Stable identifier of a unit within one battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a creature type in the content catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreatureId(pub u32);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "creature:{}", self.0)
    }
}

/// Player controlling a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u8);

/// Army slot a unit was drawn from. Summoned and cloned units use
/// [`SlotId::SUMMONED`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotId(pub i32);

impl SlotId {
    pub const SUMMONED: Self = Self(-3);
    pub const WAR_MACHINE: Self = Self(-4);
}

/// Side of the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BattleSide {
    Attacker,
    Defender,
}

impl BattleSide {
    pub const BOTH: [BattleSide; 2] = [BattleSide::Attacker, BattleSide::Defender];

    pub const fn other(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Static description of a creature type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreatureType {
    pub id: CreatureId,
    pub name: String,
    /// Tier, 1 (weakest) to 7.
    pub level: u8,
    /// Health of one individual.
    pub max_health: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub double_wide: bool,
    /// Innate abilities and base stats.
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: BonusList,
}

impl CreatureType {
    pub fn new(id: u32, name: impl Into<String>, level: u8, max_health: i64) -> Self {
        Self {
            id: CreatureId(id),
            name: name.into(),
            level,
            max_health,
            double_wide: false,
            abilities: BonusList::new(),
        }
    }

    pub fn with_ability(mut self, bonus: Bonus) -> Self {
        self.abilities.push(bonus);
        self
    }

    pub fn with_attack(self, attack: i32) -> Self {
        self.with_ability(
            Bonus::ability(BonusType::PrimarySkill, attack)
                .with_subtype(primary_skill::ATTACK)
                .with_value_type(BonusValueType::BaseNumber),
        )
    }

    pub fn with_defense(self, defense: i32) -> Self {
        self.with_ability(
            Bonus::ability(BonusType::PrimarySkill, defense)
                .with_subtype(primary_skill::DEFENSE)
                .with_value_type(BonusValueType::BaseNumber),
        )
    }

    pub fn with_damage(self, min: i32, max: i32) -> Self {
        self.with_ability(
            Bonus::ability(BonusType::CreatureDamage, min)
                .with_subtype(damage_subtype::MIN)
                .with_value_type(BonusValueType::BaseNumber),
        )
        .with_ability(
            Bonus::ability(BonusType::CreatureDamage, max)
                .with_subtype(damage_subtype::MAX)
                .with_value_type(BonusValueType::BaseNumber),
        )
    }

    pub fn with_speed(self, speed: i32) -> Self {
        self.with_ability(
            Bonus::ability(BonusType::StacksSpeed, speed).with_value_type(BonusValueType::BaseNumber),
        )
    }

    /// Ranged unit with the given ammunition.
    pub fn with_shots(self, shots: i32) -> Self {
        self.with_ability(Bonus::ability(BonusType::Shooter, 0))
            .with_ability(Bonus::ability(BonusType::Shots, shots))
    }

    pub fn double_wide(mut self) -> Self {
        self.double_wide = true;
        self
    }
}

/// Immutable identity of a combatant stack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitDefinition {
    pub id: UnitId,
    pub creature: Arc<CreatureType>,
    pub side: BattleSide,
    pub owner: PlayerId,
    /// Stack size at the start of the battle.
    pub base_amount: i64,
    pub slot: SlotId,
}

impl UnitDefinition {
    pub fn max_health(&self) -> i64 {
        self.creature.max_health.max(1)
    }

    pub fn name(&self) -> &str {
        &self.creature.name
    }

    pub fn double_wide(&self) -> bool {
        self.creature.double_wide
    }
}
