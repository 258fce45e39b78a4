use super::{Mechanics, check_caster, effects_applicable, effects_applicable_at};
use crate::battle::BattleView;
use crate::spell::effect::EffectContext;
use crate::spell::{CastProblem, MechanicsFamily, Problem, ProblemLevel, Target};

/// Location spells that put obstacles on clear tiles.
///
/// Walls start at the aimed hex and need it to be on the field; patches
/// ignore the destination and scatter over random clear tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstacleMechanics {
    family: MechanicsFamily,
}

impl ObstacleMechanics {
    pub fn new(family: MechanicsFamily) -> Self {
        Self { family }
    }

    pub fn is_patch(&self) -> bool {
        self.family == MechanicsFamily::Patch
    }
}

impl Mechanics for ObstacleMechanics {
    fn can_be_cast(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        check_caster(ctx, view, problem) && effects_applicable(ctx, view, problem)
    }

    fn can_be_cast_at(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        aimed: &Target,
        problem: &mut Problem,
    ) -> bool {
        if !self.is_patch() {
            let Some(start) = aimed.first() else {
                problem.add(CastProblem::NoDestination, ProblemLevel::Normal);
                return false;
            };
            if !start.hex.is_available() {
                problem.add(CastProblem::DestinationBlocked, ProblemLevel::Normal);
                return false;
            }
        }
        let targets = self.effect_targets(ctx, view, aimed);
        effects_applicable_at(ctx, view, &targets, problem)
    }

    fn requires_destination(&self, _ctx: &EffectContext<'_>) -> bool {
        !self.is_patch()
    }
}
