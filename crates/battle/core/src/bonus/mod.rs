//! Bonus system: modifiers attached to units and queried through selectors.
//!
//! A bonus is a timed or permanent modifier sourced from creature abilities,
//! spells or heroes. Stats are never stored on units directly; they are
//! aggregated from the bonuses a [`BonusBearer`] exposes. Every mutation of a
//! bearer's bonus set bumps its tree version so derived values can be cached
//! with a [`VersionedCache`].

mod bearer;
mod cache;
mod selector;

pub use bearer::BonusBearer;
pub use cache::VersionedCache;
pub use selector::Selector;

use bitflags::bitflags;

/// Subtype constants for [`BonusType::PrimarySkill`].
pub mod primary_skill {
    pub const ATTACK: i32 = 0;
    pub const DEFENSE: i32 = 1;
}

/// Subtype constants for [`BonusType::CreatureDamage`].
pub mod damage_subtype {
    pub const BOTH: i32 = 0;
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 2;
}

/// What a bonus modifies.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BonusType {
    /// Marker without stat meaning (e.g. clone lifetime).
    None,
    PrimarySkill,
    CreatureDamage,
    StacksSpeed,
    Shots,
    Casts,
    AdditionalRetaliation,
    UnlimitedRetaliations,
    NoRetaliation,
    BlocksRetaliation,
    AdditionalAttack,
    Shooter,
    FreeShooting,
    NoMeleePenalty,
    NoDistancePenalty,
    Flying,
    SiegeWeapon,
    Catapult,
    Healer,
    AmmoCart,
    Hypnotized,
    NotActive,
    GeneralDamageReduction,
    MagicResistance,
    MagicMirror,
    SpellImmunity,
    LevelSpellImmunity,
    SpellDamageReduction,
    MoreDamageFromSpell,
    SpecificSpellPower,
    BindEffect,
}

/// Where a bonus came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BonusSource {
    Creature,
    Artifact,
    SpellEffect,
    SecondarySkill,
    HeroSpecial,
    Terrain,
    Other,
}

/// How a bonus value combines with others of the same kind.
///
/// Aggregation order (see [`BonusList::total_value`]):
/// base numbers → percent to base → additive → percent to all → independent
/// max/min clamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BonusValueType {
    #[default]
    Additive,
    BaseNumber,
    PercentToAll,
    PercentToBase,
    IndependentMax,
    IndependentMin,
}

bitflags! {
    /// Lifetime rules of a bonus. Several flags may be combined; the bonus
    /// ends when any of them expires.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BonusDuration: u16 {
        const PERMANENT = 1 << 0;
        const ONE_BATTLE = 1 << 1;
        const ONE_DAY = 1 << 2;
        const ONE_WEEK = 1 << 3;
        /// Lasts `turns_remain` rounds.
        const N_TURNS = 1 << 4;
        const N_DAYS = 1 << 5;
        const UNTIL_BEING_ATTACKED = 1 << 6;
        const UNTIL_ATTACK = 1 << 7;
        const STACK_GETS_TURN = 1 << 8;
    }
}

impl Default for BonusDuration {
    fn default() -> Self {
        Self::PERMANENT
    }
}

/// A single modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Bonus {
    pub duration: BonusDuration,
    pub kind: BonusType,
    pub subtype: i32,
    pub source: BonusSource,
    /// Identifier within the source (spell id for spell effects).
    pub source_id: i32,
    pub value: i32,
    pub value_type: BonusValueType,
    /// Remaining rounds for [`BonusDuration::N_TURNS`] bonuses.
    pub turns_remain: i32,
    pub additional_info: i32,
}

impl Default for Bonus {
    fn default() -> Self {
        Self {
            duration: BonusDuration::PERMANENT,
            kind: BonusType::None,
            subtype: -1,
            source: BonusSource::Other,
            source_id: -1,
            value: 0,
            value_type: BonusValueType::Additive,
            turns_remain: 0,
            additional_info: -1,
        }
    }
}

impl Bonus {
    pub fn new(duration: BonusDuration, kind: BonusType, source: BonusSource, value: i32) -> Self {
        Self {
            duration,
            kind,
            source,
            value,
            ..Self::default()
        }
    }

    /// Permanent creature ability with the given value.
    pub fn ability(kind: BonusType, value: i32) -> Self {
        Self::new(BonusDuration::PERMANENT, kind, BonusSource::Creature, value)
    }

    pub fn with_subtype(mut self, subtype: i32) -> Self {
        self.subtype = subtype;
        self
    }

    pub fn with_source_id(mut self, source_id: i32) -> Self {
        self.source_id = source_id;
        self
    }

    pub fn with_turns(mut self, turns: i32) -> Self {
        self.duration |= BonusDuration::N_TURNS;
        self.duration.remove(BonusDuration::PERMANENT);
        self.turns_remain = turns;
        self
    }

    pub fn with_value_type(mut self, value_type: BonusValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_additional_info(mut self, info: i32) -> Self {
        self.additional_info = info;
        self
    }

    /// Identity used by removal sets: everything but the remaining turns.
    pub fn key(&self) -> BonusKey {
        BonusKey {
            duration: self.duration,
            kind: self.kind,
            subtype: self.subtype,
            source: self.source,
            source_id: self.source_id,
            value: self.value,
            value_type: self.value_type,
            additional_info: self.additional_info,
        }
    }

    /// True when `other` is the same spell effect (type, subtype and spell),
    /// which a refresh should extend rather than stack.
    pub fn same_effect(&self, other: &Bonus) -> bool {
        self.source == BonusSource::SpellEffect
            && other.source == BonusSource::SpellEffect
            && self.source_id == other.source_id
            && self.kind == other.kind
            && self.subtype == other.subtype
    }
}

/// Bonus identity ignoring `turns_remain`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BonusKey {
    duration: BonusDuration,
    kind: BonusType,
    subtype: i32,
    source: BonusSource,
    source_id: i32,
    value: i32,
    value_type: BonusValueType,
    additional_info: i32,
}

/// Ordered collection of bonuses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BonusList(Vec<Bonus>);

impl BonusList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, bonus: Bonus) {
        self.0.push(bonus);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bonus> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Bonus> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bonuses matching `selector`, in list order.
    pub fn filtered(&self, selector: &Selector) -> BonusList {
        Self(self.0.iter().filter(|b| selector.matches(b)).cloned().collect())
    }

    pub fn any(&self, selector: &Selector) -> bool {
        self.0.iter().any(|b| selector.matches(b))
    }

    /// Removes every bonus matching `selector`, returning how many were removed.
    pub fn remove_matching(&mut self, selector: &Selector) -> usize {
        let before = self.0.len();
        self.0.retain(|b| !selector.matches(b));
        before - self.0.len()
    }

    pub fn retain(&mut self, f: impl FnMut(&Bonus) -> bool) {
        self.0.retain(f);
    }

    /// Adds `bonus`, or extends the matching spell effect already present to
    /// the longer of both durations.
    pub fn refresh_or_push(&mut self, bonus: Bonus) {
        match self.0.iter_mut().find(|b| b.same_effect(&bonus)) {
            Some(existing) => existing.turns_remain = existing.turns_remain.max(bonus.turns_remain),
            None => self.0.push(bonus),
        }
    }

    /// Removes bonuses whose identity is in `keys`, returning how many went.
    pub fn remove_keys(&mut self, keys: &[BonusKey]) -> usize {
        let before = self.0.len();
        self.0.retain(|b| !keys.contains(&b.key()));
        before - self.0.len()
    }

    /// Ages timed bonuses by one round and drops the expired ones. Returns
    /// true when anything changed.
    pub fn age_one_round(&mut self) -> bool {
        let mut changed = false;
        for bonus in self.0.iter_mut() {
            if bonus.duration.contains(BonusDuration::N_TURNS) {
                bonus.turns_remain -= 1;
                changed = true;
            }
        }
        self.0.retain(|b| !b.duration.contains(BonusDuration::N_TURNS) || b.turns_remain > 0);
        changed
    }

    /// Aggregated value of all bonuses in the list.
    ///
    /// ```text
    /// base     = Σ base_number
    /// base    += base × Σ percent_to_base / 100
    /// value    = base + Σ additive
    /// value    = value × (100 + Σ percent_to_all) / 100
    /// value    = max(value, independent_max) then min(value, independent_min)
    /// ```
    ///
    /// # Example
    /// ```
    /// # use battle_core::bonus::{Bonus, BonusList, BonusType, BonusValueType};
    /// let mut list = BonusList::new();
    /// list.push(Bonus::ability(BonusType::PrimarySkill, 10).with_value_type(BonusValueType::BaseNumber));
    /// list.push(Bonus::ability(BonusType::PrimarySkill, 5));
    /// list.push(Bonus::ability(BonusType::PrimarySkill, 20).with_value_type(BonusValueType::PercentToAll));
    /// assert_eq!(list.total_value(), 18);
    /// ```
    pub fn total_value(&self) -> i32 {
        let mut base = 0i64;
        let mut percent_to_base = 0i64;
        let mut additive = 0i64;
        let mut percent_to_all = 0i64;
        let mut independent_max: Option<i64> = None;
        let mut independent_min: Option<i64> = None;

        for bonus in &self.0 {
            let value = i64::from(bonus.value);
            match bonus.value_type {
                BonusValueType::BaseNumber => base += value,
                BonusValueType::PercentToBase => percent_to_base += value,
                BonusValueType::Additive => additive += value,
                BonusValueType::PercentToAll => percent_to_all += value,
                BonusValueType::IndependentMax => {
                    independent_max = Some(independent_max.map_or(value, |m| m.max(value)))
                }
                BonusValueType::IndependentMin => {
                    independent_min = Some(independent_min.map_or(value, |m| m.min(value)))
                }
            }
        }

        let modified_base = base + base * percent_to_base / 100 + additive;
        let mut total = modified_base * (100 + percent_to_all) / 100;
        if let Some(max) = independent_max {
            total = total.max(max);
        }
        if let Some(min) = independent_min {
            total = total.min(min);
        }
        total.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

impl From<Vec<Bonus>> for BonusList {
    fn from(bonuses: Vec<Bonus>) -> Self {
        Self(bonuses)
    }
}

impl FromIterator<Bonus> for BonusList {
    fn from_iter<I: IntoIterator<Item = Bonus>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for BonusList {
    type Item = Bonus;
    type IntoIter = std::vec::IntoIter<Bonus>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BonusList {
    type Item = &'a Bonus;
    type IntoIter = std::slice::Iter<'a, Bonus>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Bonus> for BonusList {
    fn extend<I: IntoIterator<Item = Bonus>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(kind: BonusType, value: i32, spell: i32, turns: i32) -> Bonus {
        Bonus::new(BonusDuration::N_TURNS, kind, BonusSource::SpellEffect, value)
            .with_source_id(spell)
            .with_turns(turns)
    }

    #[test]
    fn total_value_applies_layers_in_order() {
        let mut list = BonusList::new();
        list.push(Bonus::ability(BonusType::StacksSpeed, 6).with_value_type(BonusValueType::BaseNumber));
        list.push(Bonus::ability(BonusType::StacksSpeed, 50).with_value_type(BonusValueType::PercentToBase));
        list.push(Bonus::ability(BonusType::StacksSpeed, 1));
        // (6 + 3 + 1) = 10
        assert_eq!(list.total_value(), 10);

        list.push(Bonus::ability(BonusType::StacksSpeed, 15).with_value_type(BonusValueType::IndependentMax));
        assert_eq!(list.total_value(), 15);
        list.push(Bonus::ability(BonusType::StacksSpeed, 12).with_value_type(BonusValueType::IndependentMin));
        assert_eq!(list.total_value(), 12);
    }

    #[test]
    fn empty_list_totals_zero() {
        assert_eq!(BonusList::new().total_value(), 0);
    }

    #[test]
    fn key_ignores_remaining_turns() {
        let a = spell(BonusType::PrimarySkill, 3, 41, 2);
        let b = spell(BonusType::PrimarySkill, 3, 41, 5);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), spell(BonusType::PrimarySkill, 4, 41, 2).key());
    }

    #[test]
    fn refresh_extends_existing_effect() {
        let mut list = BonusList::new();
        list.refresh_or_push(spell(BonusType::PrimarySkill, 3, 41, 2));
        list.refresh_or_push(spell(BonusType::PrimarySkill, 3, 41, 5));
        assert_eq!(list.len(), 1);
        assert_eq!(list.iter().next().map(|b| b.turns_remain), Some(5));

        list.refresh_or_push(spell(BonusType::PrimarySkill, 3, 41, 1));
        assert_eq!(list.iter().next().map(|b| b.turns_remain), Some(5));

        list.refresh_or_push(spell(BonusType::PrimarySkill, 3, 42, 1));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn aging_expires_timed_bonuses() {
        let mut list = BonusList::new();
        list.push(spell(BonusType::PrimarySkill, 3, 41, 2));
        list.push(Bonus::ability(BonusType::Flying, 0));
        assert!(list.age_one_round());
        assert_eq!(list.len(), 2);
        assert!(list.age_one_round());
        assert_eq!(list.len(), 1);
        assert!(!list.age_one_round());
    }

    #[test]
    fn with_turns_switches_duration() {
        let bonus = Bonus::ability(BonusType::Shots, 4).with_turns(3);
        assert!(bonus.duration.contains(BonusDuration::N_TURNS));
        assert!(!bonus.duration.contains(BonusDuration::PERMANENT));
    }
}
