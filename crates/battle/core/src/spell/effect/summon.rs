use super::unit;
use super::{EffectContext, SpellEffect};
use crate::battle::BattleView;
use crate::change::{BattleChange, UnitInfo};
use crate::config::BattleConfig;
use crate::hex::BattleHex;
use crate::rng::BattleRng;
use crate::spell::{CastError, CastProblem, Problem, ProblemLevel, Target, TargetShape};
use crate::unit::{BattleSide, CreatureId, HealLevel, HealPower, UnitSnapshot};

/// Brings a new stack onto the caster's side, or reinforces the stack an
/// earlier summon created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SummonEffect {
    pub creature: CreatureId,
    /// Summoned individuals stay after the battle.
    pub permanent: bool,
    /// Fails while another creature type summoned on the same side lives.
    pub exclusive: bool,
}

impl SummonEffect {
    fn summoned_on_side(view: &dyn BattleView, side: BattleSide) -> Vec<UnitSnapshot> {
        view.units_if(&|u| u.side() == side && u.alive() && u.state.is_summoned() && !u.state.is_clone())
    }

    /// Stack a new summon of this creature would reinforce.
    fn existing(&self, view: &dyn BattleView, side: BattleSide) -> Option<UnitSnapshot> {
        Self::summoned_on_side(view, side)
            .into_iter()
            .find(|u| u.state.definition().creature.id == self.creature)
    }

    /// Individuals one cast brings in.
    pub fn amount(&self, ctx: &EffectContext<'_>) -> i64 {
        ctx.value_against(None)
    }

    fn entry_hex(side: BattleSide) -> BattleHex {
        let row = BattleConfig::FIELD_HEIGHT / 2;
        match side {
            BattleSide::Attacker => BattleHex::new(1, row),
            BattleSide::Defender => BattleHex::new(BattleConfig::FIELD_WIDTH - 2, row),
        }
    }
}

impl SpellEffect for SummonEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::None
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        if view.creature(self.creature).is_none() {
            problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Critical);
            return false;
        }
        if self.exclusive {
            let rival = Self::summoned_on_side(view, ctx.side())
                .iter()
                .any(|u| u.state.definition().creature.id != self.creature);
            if rival {
                problem.add(CastProblem::SummonExclusive, ProblemLevel::Normal);
                return false;
            }
        }
        true
    }

    fn transform_target(&self, _ctx: &EffectContext<'_>, _view: &dyn BattleView, _aimed: &Target) -> Target {
        Target::new()
    }

    fn applicable_on(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        _target: &Target,
        problem: &mut Problem,
    ) -> bool {
        self.applicable(ctx, view, problem)
    }

    fn prepare(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        _target: &Target,
        _rng: &mut dyn BattleRng,
    ) -> Result<Vec<BattleChange>, CastError> {
        let Some(creature) = view.creature(self.creature) else {
            return Err(CastError::Malformed(format!("unknown summoned {}", self.creature)));
        };
        let amount = self.amount(ctx);
        if amount < 1 {
            tracing::debug!(spell = %ctx.spell_id(), "summon too weak to bring anyone");
            return Ok(Vec::new());
        }

        if let Some(mut existing) = self.existing(view, ctx.side()) {
            let power = if self.permanent { HealPower::Permanent } else { HealPower::OneBattle };
            let mut health = amount * creature.max_health.max(1);
            existing.state.heal(&mut health, HealLevel::Overheal, power);
            tracing::debug!(unit = %existing.id(), healed = health, "summoned stack reinforced");
            return Ok(vec![BattleChange::UnitUpdated {
                unit: existing.id(),
                state: existing.state.save(),
            }]);
        }

        let side = ctx.side();
        let Some(position) = unit::free_hex_near(view, Self::entry_hex(side), creature.double_wide, side, &[])
        else {
            tracing::debug!(spell = %ctx.spell_id(), "no room to summon");
            return Ok(Vec::new());
        };
        let info = UnitInfo {
            id: view.next_unit_id(),
            creature: self.creature,
            count: amount,
            side,
            position,
            summoned: !self.permanent,
            cloned: false,
        };
        tracing::debug!(unit = %info.id, creature = %creature.name, count = amount, %position, "stack summoned");
        Ok(vec![BattleChange::UnitAdded(info)])
    }
}
