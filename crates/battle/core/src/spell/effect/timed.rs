use super::unit;
use super::{EffectContext, SpellEffect};
use crate::battle::BattleView;
use crate::bonus::{Bonus, BonusDuration, BonusSource, BonusType};
use crate::change::BattleChange;
use crate::rng::BattleRng;
use crate::spell::{CastError, Problem, Target, TargetShape};
use crate::unit::UnitSnapshot;

/// Grants spell bonuses for a number of rounds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimedEffect {
    /// Templates; a zero `turns_remain` takes the cast duration and a
    /// permanent template becomes a timed one.
    pub bonuses: Vec<Bonus>,
    /// Stack a new copy instead of refreshing an existing one.
    pub cumulative: bool,
}

impl TimedEffect {
    /// Concrete bonuses for one cast, stamped with the spell identity, and
    /// the rounds the cast lasts: its longest timed part.
    pub fn convert_bonuses(&self, ctx: &EffectContext<'_>) -> (Vec<Bonus>, i32) {
        let converted: Vec<Bonus> = self
            .bonuses
            .iter()
            .map(|template| {
                let mut bonus = template.clone();
                bonus.source = BonusSource::SpellEffect;
                bonus.source_id = ctx.spell_id().0;
                if bonus.turns_remain == 0 {
                    bonus.turns_remain = ctx.duration();
                }
                if bonus.duration == BonusDuration::PERMANENT {
                    bonus.duration = BonusDuration::N_TURNS;
                }
                match bonus.kind {
                    BonusType::GeneralDamageReduction => bonus.value = 100 - bonus.value,
                    BonusType::BindEffect => {
                        if let Some(caster) = ctx.caster.caster_unit() {
                            bonus.additional_info = caster.0 as i32;
                        }
                    }
                    _ => {}
                }
                bonus
            })
            .collect();

        let lasts = converted
            .iter()
            .filter(|b| b.duration.contains(BonusDuration::N_TURNS))
            .map(|b| b.turns_remain)
            .max()
            .unwrap_or(0);
        (converted, lasts)
    }

    fn receptive(_view: &dyn BattleView, unit: &UnitSnapshot) -> bool {
        unit.alive()
    }
}

impl SpellEffect for TimedEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::Units
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        unit::any_affected(ctx, view, false, &Self::receptive, problem)
    }

    fn transform_target(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Target {
        unit::resolve(ctx, view, aimed, false, &Self::receptive)
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
        let (bonuses, lasts) = self.convert_bonuses(ctx);
        if bonuses.is_empty() {
            return Ok(Vec::new());
        }
        tracing::trace!(spell = %ctx.spell_id(), rounds = lasts, "timed cast");
        let changes = unit::units_of(view, target)
            .into_iter()
            .filter(|u| u.alive())
            .map(|u| {
                tracing::debug!(spell = %ctx.spell_id(), unit = %u.id(), count = bonuses.len(), "bonuses granted");
                if self.cumulative {
                    BattleChange::BonusesAdded {
                        unit: u.id(),
                        bonuses: bonuses.clone(),
                    }
                } else {
                    BattleChange::BonusesUpdated {
                        unit: u.id(),
                        bonuses: bonuses.clone(),
                    }
                }
            })
            .collect();
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spell::{CastMode, CastParameters, Hero, SpellDefinition, UnitCaster};
    use crate::testing::{creature, snapshot};
    use crate::unit::{BattleSide, PlayerId};

    #[test]
    fn conversion_stamps_spell_and_duration() {
        let spell = SpellDefinition::new(27, "Shield");
        let hero = Hero::new("Caster", PlayerId(0), BattleSide::Attacker);
        let params = CastParameters {
            duration: 4,
            ..CastParameters::default()
        };
        let ctx = EffectContext::new(&spell, &hero, CastMode::Hero, params);
        let effect = TimedEffect {
            bonuses: vec![
                Bonus::ability(BonusType::GeneralDamageReduction, 85).with_subtype(0),
                Bonus::ability(BonusType::PrimarySkill, 3).with_turns(6),
            ],
            cumulative: false,
        };

        let (converted, lasts) = effect.convert_bonuses(&ctx);
        assert_eq!(converted.len(), 2);
        assert_eq!(lasts, 6);
        assert!(converted.iter().all(|b| b.source == BonusSource::SpellEffect && b.source_id == 27));
        assert_eq!(converted[0].value, 15);
        assert_eq!(converted[0].turns_remain, 4);
        assert_eq!(converted[0].duration, BonusDuration::N_TURNS);
        assert_eq!(converted[1].turns_remain, 6);
    }

    #[test]
    fn bind_records_the_casting_unit() {
        let spell = SpellDefinition::new(70, "Bind");
        let caster_unit = snapshot(4, creature("Dendroid", 55, 10, 14), 3, BattleSide::Defender, (10, 5));
        let caster = UnitCaster::new(&caster_unit, spell.id, 0);
        let ctx = EffectContext::new(&spell, &caster, CastMode::SpellLikeAttack, CastParameters::default());
        let effect = TimedEffect {
            bonuses: vec![Bonus::new(BonusDuration::UNTIL_BEING_ATTACKED, BonusType::BindEffect, BonusSource::Creature, 0)],
            cumulative: false,
        };
        let (converted, lasts) = effect.convert_bonuses(&ctx);
        assert_eq!(converted[0].additional_info, 4);
        assert_eq!(lasts, 0);
    }
}
