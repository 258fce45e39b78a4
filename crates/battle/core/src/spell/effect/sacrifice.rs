use super::{EffectContext, HealEffect, SpellEffect, is_triggered, unit};
use crate::battle::BattleView;
use crate::bonus::{BonusBearer, BonusType};
use crate::change::BattleChange;
use crate::rng::BattleRng;
use crate::spell::{CastError, CastProblem, Destination, Problem, ProblemLevel, Target, TargetShape};
use crate::unit::{HealLevel, HealPower, UnitSnapshot};

/// Raises a dead stack by consuming a living allied one.
///
/// The target is the corpse followed by the victim. The heal grows with the
/// size and health of the victim, which leaves the battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SacrificeEffect {
    pub level: HealLevel,
    pub power: HealPower,
}

impl Default for SacrificeEffect {
    fn default() -> Self {
        Self {
            level: HealLevel::Resurrect,
            power: HealPower::Permanent,
        }
    }
}

impl SacrificeEffect {
    fn heal(&self) -> HealEffect {
        HealEffect {
            level: self.level,
            power: self.power,
            min_full_units: 0,
        }
    }

    fn is_corpse(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, unit: &UnitSnapshot) -> bool {
        unit.state.is_dead() && ctx.affects(unit) && self.heal().is_valid_target(view, unit)
    }

    fn is_victim(ctx: &EffectContext<'_>, unit: &UnitSnapshot) -> bool {
        unit.alive()
            && !unit.state.is_clone()
            && unit.position().is_valid()
            && unit.owner() == ctx.caster.owner()
            && !unit.has_bonus_of_type(BonusType::SiegeWeapon)
    }

    /// Health the corpse gets back for consuming `victim`.
    pub fn amount_for(&self, ctx: &EffectContext<'_>, victim: &UnitSnapshot) -> i64 {
        let power = ctx.params.effect_power;
        let per_unit = power + victim.state.definition().max_health() + ctx.spell.raw_effect_value(0, power);
        per_unit * victim.count()
    }

    fn corpse_at(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Destination) -> Option<UnitSnapshot> {
        let hex = aimed.hex;
        let found = match aimed.unit {
            Some(id) => view.unit(id),
            None => view
                .units_if(&|u| u.state.is_dead() && u.covers(hex))
                .into_iter()
                .next(),
        };
        found.filter(|u| self.is_corpse(ctx, view, u))
    }

    fn victim_at(ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Destination) -> Option<UnitSnapshot> {
        aimed
            .unit
            .and_then(|id| view.unit(id))
            .or_else(|| view.unit_at(aimed.hex, true))
            .filter(|u| Self::is_victim(ctx, u))
    }
}

impl SpellEffect for SacrificeEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::UnitPair
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        if is_triggered(ctx.mode) {
            problem.add(CastProblem::WrongMode("sacrifice must be cast deliberately"), ProblemLevel::Critical);
            return false;
        }
        let corpse = |v: &dyn BattleView, u: &UnitSnapshot| self.is_corpse(ctx, v, u);
        if !unit::any_affected(ctx, view, true, &corpse, problem) {
            return false;
        }
        let victims = view.units_if(&|u| Self::is_victim(ctx, u));
        if victims.is_empty() {
            problem.add(CastProblem::NoVictim, ProblemLevel::Normal);
            return false;
        }
        true
    }

    /// Resolves the corpse and the victim; anything less resolves to nothing.
    fn transform_target(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Target {
        let [corpse, victim] = aimed.as_slice() else {
            return Target::new();
        };
        match (self.corpse_at(ctx, view, corpse), Self::victim_at(ctx, view, victim)) {
            (Some(corpse), Some(victim)) if corpse.id() != victim.id() => {
                vec![Destination::unit(&corpse), Destination::unit(&victim)]
            }
            _ => Target::new(),
        }
    }

    fn applicable_on(
        &self,
        _ctx: &EffectContext<'_>,
        _view: &dyn BattleView,
        target: &Target,
        problem: &mut Problem,
    ) -> bool {
        let paired = matches!(target.as_slice(), [corpse, victim] if corpse.unit.is_some() && victim.unit.is_some());
        if !paired {
            problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
        }
        paired
    }

    fn prepare(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        _rng: &mut dyn BattleRng,
    ) -> Result<Vec<BattleChange>, CastError> {
        let [corpse, victim] = target.as_slice() else {
            return Err(CastError::Malformed(format!(
                "sacrifice needs a corpse and a victim, got {} destinations",
                target.len()
            )));
        };
        let Some(mut corpse) = corpse.unit.and_then(|id| view.unit(id)) else {
            return Err(CastError::Malformed("no unit to raise".into()));
        };
        let Some(victim) = victim.unit.and_then(|id| view.unit(id)).filter(|u| u.alive()) else {
            return Err(CastError::Malformed("no unit to sacrifice".into()));
        };

        let mut amount = self.amount_for(ctx, &victim);
        corpse.state.heal(&mut amount, self.level, self.power);
        tracing::debug!(
            spell = %ctx.spell_id(),
            raised = %corpse.id(),
            sacrificed = %victim.id(),
            healed = amount,
            "sacrifice"
        );
        Ok(vec![
            BattleChange::UnitUpdated {
                unit: corpse.id(),
                state: corpse.state.save(),
            },
            BattleChange::UnitRemoved(victim.id()),
        ])
    }
}
