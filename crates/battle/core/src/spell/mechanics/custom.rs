use super::{Mechanics, check_caster, effects_applicable, effects_applicable_at, needs_destination};
use crate::battle::BattleView;
use crate::spell::effect::EffectContext;
use crate::spell::{Problem, Target};

/// Legality and targeting driven entirely by the spell's effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CustomMechanics;

impl Mechanics for CustomMechanics {
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
        let targets = self.effect_targets(ctx, view, aimed);
        effects_applicable_at(ctx, view, &targets, problem)
    }

    fn requires_destination(&self, ctx: &EffectContext<'_>) -> bool {
        needs_destination(ctx)
    }
}
