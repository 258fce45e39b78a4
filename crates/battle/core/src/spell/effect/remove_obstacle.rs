use super::{EffectContext, SpellEffect};
use crate::battle::{BattleView, Obstacle, ObstacleKind};
use crate::change::BattleChange;
use crate::hex::BattleHex;
use crate::rng::BattleRng;
use crate::spell::{CastError, CastProblem, Destination, Problem, ProblemLevel, SpellId, SpellRange, Target, TargetShape};

/// Clears obstacles from the aimed hexes, or from the whole field for mass
/// casts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RemoveObstacleEffect {
    pub remove_absolute: bool,
    pub remove_usual: bool,
    /// Any spell-created obstacle.
    pub remove_all_spells: bool,
    /// Obstacles created by these spells.
    pub remove_spells: Vec<SpellId>,
}

impl RemoveObstacleEffect {
    pub fn can_remove(&self, obstacle: &Obstacle) -> bool {
        if let Some(spell) = obstacle.spell {
            return self.remove_all_spells || self.remove_spells.contains(&spell);
        }
        match obstacle.kind {
            ObstacleKind::Absolute => self.remove_absolute,
            ObstacleKind::Usual => self.remove_usual,
            _ => false,
        }
    }

    fn candidates(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, target: &Target) -> Vec<Obstacle> {
        let side = ctx.side();
        let mut found: Vec<Obstacle> = view
            .obstacles()
            .into_iter()
            .filter(|o| o.visible_to(side) && self.can_remove(o))
            .filter(|o| ctx.range() == SpellRange::Mass || target.iter().any(|d| o.covers(d.hex)))
            .collect();
        found.sort_by_key(|o| o.id);
        found
    }
}

impl SpellEffect for RemoveObstacleEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::Location
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        let side = ctx.side();
        let any = view
            .obstacles()
            .iter()
            .any(|o| o.visible_to(side) && self.can_remove(o));
        if !any {
            problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
        }
        any
    }

    fn transform_target(&self, ctx: &EffectContext<'_>, _view: &dyn BattleView, aimed: &Target) -> Target {
        match ctx.range() {
            SpellRange::Radius(radius) => {
                let mut hexes: Vec<BattleHex> = aimed
                    .iter()
                    .flat_map(|d| d.hex.within(u32::from(radius)))
                    .collect();
                hexes.sort();
                hexes.dedup();
                hexes.into_iter().map(Destination::hex).collect()
            }
            SpellRange::Single | SpellRange::Mass => aimed.clone(),
        }
    }

    fn applicable_on(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        problem: &mut Problem,
    ) -> bool {
        let ok = !self.candidates(ctx, view, target).is_empty();
        if !ok {
            problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
        }
        ok
    }

    fn prepare(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        _rng: &mut dyn BattleRng,
    ) -> Result<Vec<BattleChange>, CastError> {
        Ok(self
            .candidates(ctx, view, target)
            .into_iter()
            .map(|o| {
                tracing::debug!(spell = %ctx.spell_id(), obstacle = o.id, kind = %o.kind, "obstacle removed");
                BattleChange::ObstacleRemoved(o.id)
            })
            .collect())
    }
}
