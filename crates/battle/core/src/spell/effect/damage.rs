use super::unit;
use super::{EffectContext, SpellEffect};
use crate::battle::BattleView;
use crate::bonus::{BonusBearer, BonusDuration, BonusType, Selector};
use crate::change::BattleChange;
use crate::rng::BattleRng;
use crate::spell::{CastError, Problem, Target, TargetShape};
use crate::unit::UnitSnapshot;

/// Direct damage to units.
///
/// The value is the spell's effect value adjusted per target, or, with one of
/// the kill flags, a share (percent) or number of individuals to kill.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageEffect {
    pub kill_by_percentage: bool,
    pub kill_by_count: bool,
}

impl DamageEffect {
    /// Damage dealt to `target` before clamping to its health.
    pub fn damage_for(&self, ctx: &EffectContext<'_>, target: &UnitSnapshot) -> i64 {
        let max_health = target.state.definition().max_health();
        if self.kill_by_percentage {
            let killed = target.count() * ctx.raw_value() / 100;
            return (killed * max_health).max(0);
        }
        if self.kill_by_count {
            return (ctx.raw_value() * max_health).max(0);
        }

        let mut value = ctx.value_against(Some(target));
        let spell = ctx.spell_id().0;
        let reduction = target
            .value_of(
                &Selector::of_type(BonusType::SpellDamageReduction)
                    .and(Selector::new(move |b| b.subtype == -1 || b.subtype == spell)),
            )
            .clamp(0, 100);
        value = value * i64::from(100 - reduction) / 100;
        let extra = target.value_of_subtype(BonusType::MoreDamageFromSpell, spell);
        if extra > 0 {
            value = value * i64::from(100 + extra) / 100;
        }
        value.max(0)
    }
}

fn damageable(_view: &dyn BattleView, unit: &UnitSnapshot) -> bool {
    unit.alive()
}

impl SpellEffect for DamageEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::Units
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        unit::any_affected(ctx, view, false, &damageable, problem)
    }

    fn transform_target(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Target {
        unit::resolve(ctx, view, aimed, false, &damageable)
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
            if !snapshot.alive() {
                continue;
            }
            let mut amount = self.damage_for(ctx, &snapshot);
            let count_before = snapshot.count();
            snapshot.state.damage(&mut amount);
            tracing::debug!(
                spell = %ctx.spell_id(),
                unit = %snapshot.id(),
                damage = amount,
                killed = count_before - snapshot.count(),
                "spell damage"
            );
            changes.push(BattleChange::UnitUpdated {
                unit: snapshot.id(),
                state: snapshot.state.save(),
            });

            let broken = snapshot.bonuses(&Selector::duration(BonusDuration::UNTIL_BEING_ATTACKED));
            if amount > 0 && !broken.is_empty() {
                changes.push(BattleChange::BonusesRemoved {
                    unit: snapshot.id(),
                    bonuses: broken.into_iter().collect(),
                });
            }
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::Bonus;
    use crate::spell::{CastMode, CastParameters, Hero, SpellDefinition};
    use crate::testing::{creature, snapshot};
    use crate::unit::{BattleSide, PlayerId};

    fn context<'a>(spell: &'a SpellDefinition, hero: &'a Hero, value: i64) -> EffectContext<'a> {
        let params = CastParameters {
            effect_value: value,
            ..CastParameters::default()
        };
        EffectContext::new(spell, hero, CastMode::Hero, params)
    }

    #[test]
    fn reductions_and_vulnerabilities_apply() {
        let spell = SpellDefinition::new(15, "Magic Arrow");
        let hero = Hero::new("Caster", PlayerId(0), BattleSide::Attacker);
        let ctx = context(&spell, &hero, 100);

        let plain = creature("Dummy", 10, 1, 1);
        let target = snapshot(1, plain.clone(), 10, BattleSide::Defender, (5, 5));
        assert_eq!(DamageEffect::default().damage_for(&ctx, &target), 100);

        let resistant = plain
            .clone()
            .with_ability(Bonus::ability(BonusType::SpellDamageReduction, 50));
        let target = snapshot(2, resistant, 10, BattleSide::Defender, (5, 5));
        assert_eq!(DamageEffect::default().damage_for(&ctx, &target), 50);

        let vulnerable = plain.with_ability(Bonus::ability(BonusType::MoreDamageFromSpell, 100).with_subtype(15));
        let target = snapshot(3, vulnerable, 10, BattleSide::Defender, (5, 5));
        assert_eq!(DamageEffect::default().damage_for(&ctx, &target), 200);
    }

    #[test]
    fn kill_flags_scale_with_health() {
        let spell = SpellDefinition::new(24, "Death Ripple");
        let hero = Hero::new("Caster", PlayerId(0), BattleSide::Attacker);
        let ctx = context(&spell, &hero, 50);
        let target = snapshot(1, creature("Dummy", 10, 1, 1), 8, BattleSide::Defender, (5, 5));

        let percent = DamageEffect {
            kill_by_percentage: true,
            kill_by_count: false,
        };
        assert_eq!(percent.damage_for(&ctx, &target), 40);

        let count_ctx = context(&spell, &hero, 3);
        let count = DamageEffect {
            kill_by_percentage: false,
            kill_by_count: true,
        };
        assert_eq!(count.damage_for(&count_ctx, &target), 30);
    }
}
