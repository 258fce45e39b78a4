//! Spell legality and targeting rules.
//!
//! A [`Mechanics`] implementation answers whether a spell can be cast at all
//! and at a given destination, resolves the per-effect targets and describes
//! the cast for the battle log. [`SpellMechanics`] picks the implementation
//! for a spell from its [`MechanicsFamily`].

mod custom;
mod obstacle;

pub use custom::CustomMechanics;
pub use obstacle::ObstacleMechanics;

use super::effect::EffectContext;
use super::{CastMode, CastProblem, Effect, MechanicsFamily, Problem, ProblemLevel, SpellDefinition, Target, TargetShape};
use crate::battle::BattleView;
use crate::unit::UnitId;

/// Rules of one spell family.
pub trait Mechanics {
    /// Whether the spell can be cast at all, ignoring the destination.
    fn can_be_cast(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool;

    /// Whether the spell can be cast at `aimed`.
    fn can_be_cast_at(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        aimed: &Target,
        problem: &mut Problem,
    ) -> bool;

    /// Whether a cast without destination is malformed.
    fn requires_destination(&self, ctx: &EffectContext<'_>) -> bool;

    /// Why `aimed` cannot be interpreted at all, if it cannot.
    ///
    /// A malformed request is complained about instead of being reported as
    /// an ordinary illegal cast.
    fn malformed(&self, ctx: &EffectContext<'_>, aimed: &Target) -> Option<String> {
        if aimed.is_empty() && self.requires_destination(ctx) {
            return Some(format!("{} needs a destination", ctx.spell.name));
        }
        effects_of(ctx)
            .iter()
            .filter(|effect| !effect.optional)
            .find_map(|effect| {
                let expected = effect.shape().exact_destinations()?;
                (aimed.len() != expected).then(|| {
                    format!(
                        "{} requires {} destinations, got {}",
                        ctx.spell.name,
                        expected,
                        aimed.len()
                    )
                })
            })
    }

    /// Effect targets, parallel to the effects of the cast level.
    fn effect_targets(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Vec<Target> {
        effects_of(ctx)
            .iter()
            .map(|effect| effect.transform_target(ctx, view, aimed))
            .collect()
    }

    /// Units any effect of the cast would touch, in id order.
    fn affected_units(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self
            .effect_targets(ctx, view, aimed)
            .iter()
            .flatten()
            .filter_map(|d| d.unit)
            .collect();
        units.sort();
        units.dedup();
        units
    }

    /// Battle log line for the cast.
    fn describe(&self, ctx: &EffectContext<'_>, affected: &[UnitId]) -> String {
        let who = ctx.caster.caster_name();
        let spell = &ctx.spell.name;
        match (ctx.mode, affected.len()) {
            (CastMode::MagicMirror, _) => format!("{who} reflects {spell}"),
            (_, 0) => format!("{who} casts {spell}"),
            (_, 1) => format!("{who} casts {spell} on {}", affected[0]),
            (_, n) => format!("{who} casts {spell} on {n} units"),
        }
    }
}

/// Mechanics dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpellMechanics {
    Custom(CustomMechanics),
    Obstacle(ObstacleMechanics),
}

impl SpellMechanics {
    pub fn for_spell(spell: &SpellDefinition) -> Self {
        match spell.mechanics {
            MechanicsFamily::Custom => Self::Custom(CustomMechanics),
            family @ (MechanicsFamily::Wall | MechanicsFamily::Patch) => {
                Self::Obstacle(ObstacleMechanics::new(family))
            }
        }
    }

    pub fn as_mechanics(&self) -> &dyn Mechanics {
        match self {
            Self::Custom(m) => m,
            Self::Obstacle(m) => m,
        }
    }
}

/// Effects of the cast level.
pub(crate) fn effects_of<'c>(ctx: &EffectContext<'c>) -> &'c [Effect] {
    ctx.spell.effects(ctx.params.effect_level)
}

/// Caster-side checks shared by every family: hero mana, spellbook and
/// once-per-round, or a creature's remaining casts.
pub(crate) fn check_caster(ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
    match ctx.mode {
        CastMode::Hero => {
            let side = ctx.side();
            let Some(hero) = view.hero(side) else {
                problem.add(CastProblem::NoHero, ProblemLevel::Critical);
                return false;
            };
            if !hero.knows(ctx.spell_id()) {
                problem.add(CastProblem::SpellNotKnown, ProblemLevel::Critical);
                return false;
            }
            if view.side_info(side).cast_this_round {
                problem.add(CastProblem::AlreadyCastThisRound, ProblemLevel::Critical);
                return false;
            }
            let required = ctx.spell.cost(ctx.caster.spell_school_level(ctx.spell));
            if hero.mana < required {
                problem.add(
                    CastProblem::NotEnoughMana {
                        required,
                        available: hero.mana,
                    },
                    ProblemLevel::Critical,
                );
                return false;
            }
            true
        }
        CastMode::CreatureActive => {
            let able = ctx
                .caster
                .caster_unit()
                .and_then(|id| view.unit(id))
                .is_some_and(|u| u.alive() && u.can_cast());
            if !able {
                problem.add(CastProblem::CasterCannotCast, ProblemLevel::Critical);
            }
            able
        }
        CastMode::SpellLikeAttack | CastMode::MagicMirror | CastMode::Passive => true,
    }
}

/// Every required effect must be applicable; optional ones never block.
pub(crate) fn effects_applicable(ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
    let mut ok = true;
    for effect in effects_of(ctx) {
        let mut local = Problem::new();
        let applicable = effect.applicable(ctx, view, &mut local);
        if !effect.optional && !applicable {
            for (entry, level) in local.entries() {
                problem.add(entry.clone(), *level);
            }
            ok = false;
        }
    }
    ok
}

/// Every required effect must accept its resolved target.
pub(crate) fn effects_applicable_at(
    ctx: &EffectContext<'_>,
    view: &dyn BattleView,
    targets: &[Target],
    problem: &mut Problem,
) -> bool {
    let mut ok = true;
    for (effect, target) in effects_of(ctx).iter().zip(targets) {
        if effect.optional {
            continue;
        }
        if !effect.applicable_on(ctx, view, target, problem) {
            ok = false;
        }
    }
    ok
}

/// Whether any effect of the cast needs an aimed destination.
pub(crate) fn needs_destination(ctx: &EffectContext<'_>) -> bool {
    !ctx.spell.is_massive(ctx.params.range_level)
        && effects_of(ctx).iter().any(|e| e.shape() != TargetShape::None)
}
