use super::unit;
use super::{EffectContext, SpellEffect};
use crate::battle::BattleView;
use crate::bonus::{Bonus, BonusBearer, BonusDuration, BonusSource, BonusType};
use crate::change::{BattleChange, UnitInfo};
use crate::hex::BattleHex;
use crate::rng::BattleRng;
use crate::spell::{CastError, Problem, Target, TargetShape};
use crate::unit::{UnitId, UnitSnapshot};

/// Creates a fragile copy of a friendly stack.
///
/// The copy lives while its lifetime marker bonus lasts and dies from any
/// damage.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CloneEffect {
    /// Highest creature tier that can be cloned.
    pub max_tier: u8,
}

impl Default for CloneEffect {
    fn default() -> Self {
        Self { max_tier: 7 }
    }
}

impl CloneEffect {
    pub fn is_valid_target(&self, unit: &UnitSnapshot) -> bool {
        unit.alive()
            && !unit.state.is_clone()
            && !unit.state.has_clone()
            && unit.state.creature_level() <= self.max_tier
            && !unit.has_bonus_of_type(BonusType::SiegeWeapon)
    }
}

impl SpellEffect for CloneEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::Units
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        let check = |_: &dyn BattleView, u: &UnitSnapshot| self.is_valid_target(u);
        unit::any_affected(ctx, view, false, &check, problem)
    }

    fn transform_target(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Target {
        let check = |_: &dyn BattleView, u: &UnitSnapshot| self.is_valid_target(u);
        unit::resolve(ctx, view, aimed, false, &check)
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
        let mut next_id = view.next_unit_id().0;
        let mut claimed: Vec<BattleHex> = Vec::new();

        for mut original in unit::units_of(view, target) {
            if !self.is_valid_target(&original) {
                continue;
            }
            let double_wide = original.state.definition().double_wide();
            let Some(hex) = unit::free_hex_near(view, original.position(), double_wide, original.side(), &claimed)
            else {
                tracing::debug!(unit = %original.id(), "no room for clone");
                continue;
            };
            claimed.extend(hex.occupied_with(double_wide, original.side()));

            let clone_id = UnitId(next_id);
            next_id += 1;
            changes.push(BattleChange::UnitAdded(UnitInfo {
                id: clone_id,
                creature: original.state.definition().creature.id,
                count: original.count(),
                side: original.side(),
                position: hex,
                summoned: true,
                cloned: true,
            }));
            let lifetime = Bonus::new(BonusDuration::N_TURNS, BonusType::None, BonusSource::SpellEffect, 0)
                .with_source_id(ctx.spell_id().0)
                .with_turns(ctx.duration().max(1));
            changes.push(BattleChange::BonusesAdded {
                unit: clone_id,
                bonuses: vec![lifetime],
            });

            original.state.clone_id = Some(clone_id);
            changes.push(BattleChange::UnitUpdated {
                unit: original.id(),
                state: original.state.save(),
            });
            tracing::debug!(original = %original.id(), clone = %clone_id, %hex, "stack cloned");
        }
        Ok(changes)
    }
}
