use super::{EffectContext, SpellEffect, is_triggered};
use crate::battle::BattleView;
use crate::change::BattleChange;
use crate::rng::BattleRng;
use crate::spell::{CastError, CastProblem, Problem, ProblemLevel, Target, TargetShape};

/// Moves one unit to a free hex.
///
/// The target is the unit followed by the destination hex.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeleportEffect;

impl SpellEffect for TeleportEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::UnitAndLocation
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        if is_triggered(ctx.mode) {
            problem.add(CastProblem::WrongMode("teleport must be cast deliberately"), ProblemLevel::Critical);
            return false;
        }
        let movable = view
            .alive_units()
            .iter()
            .any(|u| ctx.affects(u) && u.position().is_valid());
        if !movable {
            problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
        }
        movable
    }

    /// The aimed target already names the unit and the destination.
    fn transform_target(&self, _ctx: &EffectContext<'_>, _view: &dyn BattleView, aimed: &Target) -> Target {
        aimed.clone()
    }

    fn applicable_on(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        problem: &mut Problem,
    ) -> bool {
        let [who, to] = target.as_slice() else {
            problem.add(CastProblem::NoDestination, ProblemLevel::Critical);
            return false;
        };
        let Some(unit) = who.unit.and_then(|id| view.unit(id)).filter(|u| u.alive() && ctx.affects(u)) else {
            problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
            return false;
        };
        let fits = to
            .hex
            .occupied_with(unit.state.definition().double_wide(), unit.side())
            .iter()
            .all(|hex| view.is_hex_free(*hex, Some(unit.id())));
        if !fits {
            problem.add(CastProblem::DestinationBlocked, ProblemLevel::Normal);
        }
        fits
    }

    fn prepare(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        _rng: &mut dyn BattleRng,
    ) -> Result<Vec<BattleChange>, CastError> {
        let [who, to] = target.as_slice() else {
            return Err(CastError::Malformed(format!(
                "teleport needs a unit and a destination, got {} destinations",
                target.len()
            )));
        };
        let Some(unit) = who.unit.and_then(|id| view.unit(id)) else {
            return Err(CastError::Malformed("teleport target names no unit".into()));
        };
        if !to.hex.is_available() {
            return Err(CastError::Malformed(format!("invalid teleport destination {}", to.hex)));
        }
        let mut problem = Problem::new();
        if !self.applicable_on(ctx, view, target, &mut problem) {
            return Err(CastError::Illegal(problem));
        }
        tracing::debug!(unit = %unit.id(), from = %unit.position(), to = %to.hex, "teleport");
        Ok(vec![BattleChange::UnitMoved {
            unit: unit.id(),
            destination: to.hex,
        }])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::battle::Battle;
    use crate::hex::BattleHex;
    use crate::spell::{CastMode, CastParameters, Destination, Hero, SpellDefinition};
    use crate::testing::creature;
    use crate::unit::{BattleSide, PlayerId};

    #[test]
    fn triggered_modes_are_rejected() {
        let battle = Battle::new(PlayerId(0), PlayerId(1));
        let spell = SpellDefinition::new(63, "Teleport");
        let hero = Hero::new("Caster", PlayerId(0), BattleSide::Attacker);
        let ctx = EffectContext::new(&spell, &hero, CastMode::MagicMirror, CastParameters::default());
        let mut problem = Problem::new();
        assert!(!TeleportEffect.applicable(&ctx, &battle, &mut problem));
        assert!(problem.is_critical());
    }

    #[test]
    fn destination_must_be_free() {
        let mut battle = Battle::new(PlayerId(0), PlayerId(1));
        let a = battle.spawn(Arc::new(creature("Pikeman", 10, 1, 3)), 5, BattleSide::Attacker, BattleHex::new(2, 2));
        battle.spawn(Arc::new(creature("Goblin", 5, 1, 2)), 5, BattleSide::Defender, BattleHex::new(8, 2));
        let spell = SpellDefinition::new(63, "Teleport");
        let hero = Hero::new("Caster", PlayerId(0), BattleSide::Attacker);
        let ctx = EffectContext::new(&spell, &hero, CastMode::Hero, CastParameters::default());
        let effect = TeleportEffect;
        let unit = Destination::unit_at(a, BattleHex::new(2, 2));

        let blocked = vec![unit, Destination::hex(BattleHex::new(8, 2))];
        let mut problem = Problem::new();
        assert!(!effect.applicable_on(&ctx, &battle, &blocked, &mut problem));

        let free = vec![unit, Destination::hex(BattleHex::new(9, 4))];
        let mut rng = crate::rng::MidpointRng;
        let changes = effect.prepare(&ctx, &battle, &free, &mut rng).expect("legal teleport");
        assert_eq!(
            changes,
            vec![BattleChange::UnitMoved {
                unit: a,
                destination: BattleHex::new(9, 4)
            }]
        );

        let short = vec![unit];
        assert!(matches!(
            effect.prepare(&ctx, &battle, &short, &mut rng),
            Err(CastError::Malformed(_))
        ));
    }
}
