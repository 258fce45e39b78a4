use super::unit;
use super::{EffectContext, SpellEffect};
use crate::battle::BattleView;
use crate::change::BattleChange;
use crate::rng::BattleRng;
use crate::spell::{CastError, Problem, Target, TargetShape};
use crate::unit::{HealLevel, HealPower, UnitSnapshot};

/// Restores health, optionally bringing back dead individuals.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HealEffect {
    pub level: HealLevel,
    pub power: HealPower,
    /// Resurrection below this many whole individuals is skipped.
    pub min_full_units: i64,
}

impl Default for HealEffect {
    fn default() -> Self {
        Self {
            level: HealLevel::Heal,
            power: HealPower::Permanent,
            min_full_units: 0,
        }
    }
}

impl HealEffect {
    fn can_raise_dead(&self) -> bool {
        self.level != HealLevel::Heal
    }

    /// Whether `unit` would gain anything from this heal.
    pub fn is_valid_target(&self, view: &dyn BattleView, unit: &UnitSnapshot) -> bool {
        if unit.state.is_clone() {
            return false;
        }
        if unit.alive() {
            let missing = match self.level {
                HealLevel::Heal => unit.state.first_hp_left() < unit.state.definition().max_health(),
                HealLevel::Resurrect => unit.state.available_health() < unit.state.total_health(),
                HealLevel::Overheal => true,
            };
            return missing;
        }
        // A corpse can only rise where nothing living stands.
        self.can_raise_dead()
            && unit.state.is_dead()
            && unit
                .state
                .occupied_hexes()
                .iter()
                .all(|hex| view.unit_at(*hex, true).is_none())
    }

    /// Health to restore on `unit`, clamped to what the heal level allows.
    pub fn amount_for(&self, ctx: &EffectContext<'_>, unit: &UnitSnapshot) -> i64 {
        let mut state = unit.state.clone();
        let mut amount = ctx.value_against(Some(unit));
        state.heal(&mut amount, self.level, self.power);
        let max_health = unit.state.definition().max_health();
        if self.min_full_units > 0 && self.can_raise_dead() && amount < max_health * self.min_full_units {
            return 0;
        }
        amount
    }
}

impl SpellEffect for HealEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::Units
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        let check = |v: &dyn BattleView, u: &UnitSnapshot| self.is_valid_target(v, u);
        unit::any_affected(ctx, view, self.can_raise_dead(), &check, problem)
    }

    fn transform_target(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Target {
        let check = |v: &dyn BattleView, u: &UnitSnapshot| self.is_valid_target(v, u);
        unit::resolve(ctx, view, aimed, self.can_raise_dead(), &check)
    }

    fn applicable_on(
        &self,
        _ctx: &EffectContext<'_>,
        _view: &dyn BattleView,
        target: &Target,
        problem: &mut Problem,
    ) -> bool {
        unit::require_units(target, problem)
    }

    fn prepare(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        _rng: &mut dyn BattleRng,
    ) -> Result<Vec<BattleChange>, CastError> {
        let mut changes = Vec::new();
        for mut snapshot in unit::units_of(view, target) {
            if !self.is_valid_target(view, &snapshot) {
                continue;
            }
            let mut amount = self.amount_for(ctx, &snapshot);
            if amount <= 0 {
                continue;
            }
            snapshot.state.heal(&mut amount, self.level, self.power);
            tracing::debug!(
                spell = %ctx.spell_id(),
                unit = %snapshot.id(),
                healed = amount,
                "spell heal"
            );
            changes.push(BattleChange::UnitUpdated {
                unit: snapshot.id(),
                state: snapshot.state.save(),
            });
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::battle::{Battle, BattleState};
    use crate::hex::BattleHex;
    use crate::spell::{CastMode, CastParameters, Hero, SpellDefinition};
    use crate::testing::{creature, snapshot};
    use crate::unit::{BattleSide, PlayerId};

    #[test]
    fn heal_tops_up_leading_individual_only() {
        let spell = SpellDefinition::new(37, "Cure");
        let hero = Hero::new("Caster", PlayerId(0), BattleSide::Attacker);
        let params = CastParameters {
            effect_value: 100,
            ..CastParameters::default()
        };
        let ctx = EffectContext::new(&spell, &hero, CastMode::Hero, params);

        let mut target = snapshot(1, creature("Archer", 10, 2, 3), 5, BattleSide::Attacker, (3, 3));
        let mut damage = 14;
        target.state.damage(&mut damage);
        assert_eq!(target.state.first_hp_left(), 6);

        let heal = HealEffect::default();
        assert_eq!(heal.amount_for(&ctx, &target), 4);
    }

    #[test]
    fn resurrection_respects_minimum_whole_units() {
        let spell = SpellDefinition::new(38, "Resurrection");
        let hero = Hero::new("Caster", PlayerId(0), BattleSide::Attacker);
        let params = CastParameters {
            effect_value: 15,
            ..CastParameters::default()
        };
        let ctx = EffectContext::new(&spell, &hero, CastMode::Hero, params);

        let mut target = snapshot(1, creature("Archer", 10, 2, 3), 5, BattleSide::Attacker, (3, 3));
        let mut damage = 50;
        target.state.damage(&mut damage);
        assert!(!target.alive());

        let raise = HealEffect {
            level: HealLevel::Resurrect,
            power: HealPower::Permanent,
            min_full_units: 2,
        };
        assert_eq!(raise.amount_for(&ctx, &target), 0);

        let weaker = HealEffect {
            min_full_units: 1,
            ..raise
        };
        assert_eq!(weaker.amount_for(&ctx, &target), 15);
    }

    #[test]
    fn living_unit_on_the_corpse_blocks_resurrection() {
        let mut battle = Battle::new(PlayerId(0), PlayerId(1));
        let dead = battle.spawn(Arc::new(creature("Archer", 10, 2, 3)), 5, BattleSide::Attacker, BattleHex::new(3, 3));
        let mut state = battle.unit(dead).expect("archer").state;
        let mut damage = 50;
        state.damage(&mut damage);
        battle.update_unit(dead, &state.save());

        let raise = HealEffect {
            level: HealLevel::Resurrect,
            power: HealPower::Permanent,
            min_full_units: 0,
        };
        let corpse = battle.unit(dead).expect("corpse");
        assert!(raise.is_valid_target(&battle, &corpse));
        assert!(!HealEffect::default().is_valid_target(&battle, &corpse));

        battle.spawn(Arc::new(creature("Goblin", 5, 1, 2)), 3, BattleSide::Defender, BattleHex::new(3, 3));
        let corpse = battle.unit(dead).expect("corpse");
        assert!(!raise.is_valid_target(&battle, &corpse));
    }
}
