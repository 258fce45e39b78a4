use super::effect::{EffectContext, EffectSink, SenderSink, StateSink};
use super::mechanics::{Mechanics, SpellMechanics, effects_of};
use super::{CastError, Caster, Problem, SpellDefinition, Target, UnitCaster};
use crate::battle::{BattleState, BattleView};
use crate::bonus::{BonusBearer, BonusType};
use crate::change::{BattleChange, ChangeSender};
use crate::config::BattleConfig;
use crate::rng::BattleRng;
use crate::spell::Destination;
use crate::unit::UnitId;

/// What triggered a cast. Changes eligibility rules and whether the cast
/// can be reflected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CastMode {
    /// Hero casting from the spellbook.
    Hero,
    /// Creature using its active spell ability.
    CreatureActive,
    /// Spell riding on a creature attack.
    SpellLikeAttack,
    /// Reflection of another cast.
    MagicMirror,
    /// Effect triggered without a deliberate cast.
    Passive,
}

/// Resolved numeric levels of a cast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CastParameters {
    /// School level selecting the spell range (0-3).
    pub range_level: u8,
    /// School level selecting the effect data (0-3).
    pub effect_level: u8,
    pub effect_power: i64,
    /// Rounds timed effects last.
    pub duration: i64,
    /// Fixed effect value overriding the spell formula; zero for none.
    pub effect_value: i64,
}

/// Outcome of a performed cast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CastReport {
    pub affected: Vec<UnitId>,
    /// Units whose magic resistance blocked the cast.
    pub resisted: Vec<UnitId>,
    /// Units that sent the cast back.
    pub reflected: Vec<UnitId>,
    pub description: String,
}

/// One cast request: spell, caster, mode, aimed destinations and optional
/// overrides of the caster-derived levels.
pub struct BattleCast<'a> {
    spell: &'a SpellDefinition,
    caster: &'a dyn Caster,
    mode: CastMode,
    target: Target,
    range_level: Option<u8>,
    effect_level: Option<u8>,
    effect_power: Option<i64>,
    duration: Option<i64>,
    effect_value: Option<i64>,
}

impl<'a> BattleCast<'a> {
    pub fn new(spell: &'a SpellDefinition, caster: &'a dyn Caster, mode: CastMode) -> Self {
        Self {
            spell,
            caster,
            mode,
            target: Target::new(),
            range_level: None,
            effect_level: None,
            effect_power: None,
            duration: None,
            effect_value: None,
        }
    }

    pub fn aimed_at(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn add_destination(&mut self, destination: Destination) {
        self.target.push(destination);
    }

    /// Overrides both the range and effect level.
    pub fn set_spell_level(&mut self, level: u8) {
        self.range_level = Some(level);
        self.effect_level = Some(level);
    }

    pub fn set_range_level(&mut self, level: u8) {
        self.range_level = Some(level);
    }

    pub fn set_effect_level(&mut self, level: u8) {
        self.effect_level = Some(level);
    }

    pub fn set_effect_power(&mut self, power: i64) {
        self.effect_power = Some(power);
    }

    pub fn set_duration(&mut self, duration: i64) {
        self.duration = Some(duration);
    }

    pub fn set_effect_value(&mut self, value: i64) {
        self.effect_value = Some(value);
    }

    pub fn spell(&self) -> &'a SpellDefinition {
        self.spell
    }

    pub fn mode(&self) -> CastMode {
        self.mode
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Levels for this cast: overrides first, else the caster's values,
    /// clamped to the legal bands.
    pub fn parameters(&self) -> CastParameters {
        let max_level = (BattleConfig::SPELL_LEVELS - 1) as u8;
        let spell = self.spell;
        CastParameters {
            range_level: self
                .range_level
                .unwrap_or_else(|| self.caster.spell_school_level(spell))
                .min(max_level),
            effect_level: self
                .effect_level
                .unwrap_or_else(|| self.caster.effect_level(spell))
                .min(max_level),
            effect_power: self
                .effect_power
                .unwrap_or_else(|| self.caster.effect_power(spell))
                .max(0),
            duration: self
                .duration
                .unwrap_or_else(|| self.caster.enchant_power(spell))
                .max(0),
            effect_value: self
                .effect_value
                .unwrap_or_else(|| self.caster.effect_value(spell))
                .max(0),
        }
    }

    pub fn mechanics(&self) -> SpellMechanics {
        SpellMechanics::for_spell(self.spell)
    }

    pub fn context(&self) -> EffectContext<'a> {
        EffectContext::new(self.spell, self.caster, self.mode, self.parameters())
    }

    /// Whether the spell can be cast at all, ignoring the destination.
    pub fn can_be_cast(&self, view: &dyn BattleView) -> Result<(), Problem> {
        let ctx = self.context();
        let mut problem = Problem::new();
        if self.mechanics().as_mechanics().can_be_cast(&ctx, view, &mut problem) {
            Ok(())
        } else {
            Err(problem)
        }
    }

    /// Whether the spell can be cast at the aimed destinations.
    pub fn can_be_cast_at(&self, view: &dyn BattleView) -> Result<(), Problem> {
        self.can_be_cast(view)?;
        let ctx = self.context();
        let mut problem = Problem::new();
        if self
            .mechanics()
            .as_mechanics()
            .can_be_cast_at(&ctx, view, &self.target, &mut problem)
        {
            Ok(())
        } else {
            Err(problem)
        }
    }

    /// Performs the cast for real: resistance and reflection are rolled and
    /// every change goes through `sender`.
    pub fn cast(&self, sender: &mut dyn ChangeSender, rng: &mut dyn BattleRng) -> Result<CastReport, CastError> {
        let (mut report, reflectors) = {
            let mut sink = SenderSink::new(&mut *sender);
            self.perform(&mut sink, rng, true)?
        };
        tracing::info!(
            spell = %self.spell.id,
            mode = %self.mode,
            affected = report.affected.len(),
            resisted = report.resisted.len(),
            "{}",
            report.description
        );

        for reflector in reflectors {
            let Some(mirror_report) = self.reflect(reflector, sender, rng)? else {
                continue;
            };
            report.affected.extend(mirror_report.affected);
        }
        Ok(report)
    }

    /// Performs the cast against a private state. Nothing is rolled and
    /// nothing is forwarded.
    pub fn cast_evaluation(
        &self,
        state: &mut dyn BattleState,
        rng: &mut dyn BattleRng,
    ) -> Result<CastReport, CastError> {
        let mut sink = StateSink::new(state);
        let (report, _) = self.perform(&mut sink, rng, false)?;
        tracing::debug!(spell = %self.spell.id, affected = report.affected.len(), "evaluated cast");
        Ok(report)
    }

    /// Sends a reflected copy of this cast from `reflector` to a random
    /// valid unit of the original caster's owner.
    fn reflect(
        &self,
        reflector: UnitId,
        sender: &mut dyn ChangeSender,
        rng: &mut dyn BattleRng,
    ) -> Result<Option<CastReport>, CastError> {
        if self.mode == CastMode::MagicMirror {
            tracing::error!(spell = %self.spell.id, unit = %reflector, "reflection of a reflected cast suppressed");
            return Ok(None);
        }
        let view = sender.battle();
        let Some(reflecting) = view.unit(reflector) else {
            return Ok(None);
        };
        let params = self.parameters();
        let mirror_caster = UnitCaster::new(&reflecting, self.spell.id, params.range_level);
        let owner = self.caster.owner();
        let mirror_ctx = EffectContext::new(self.spell, &mirror_caster, CastMode::MagicMirror, params);
        let candidates: Vec<_> = view.units_if(&|u| {
            u.owner() == owner && u.is_valid_target(false) && mirror_ctx.is_receptive(u)
        });
        let Some(index) = rng.pick(candidates.len()) else {
            tracing::debug!(spell = %self.spell.id, "nothing to reflect onto");
            return Ok(None);
        };
        let target = vec![Destination::unit(&candidates[index])];

        let mut mirror = BattleCast::new(self.spell, &mirror_caster, CastMode::MagicMirror).aimed_at(target);
        mirror.set_range_level(params.range_level);
        mirror.set_effect_level(params.effect_level);
        mirror.set_effect_power(params.effect_power);
        mirror.set_duration(params.duration);
        mirror.set_effect_value(params.effect_value);
        match mirror.cast(sender, rng) {
            Ok(report) => Ok(Some(report)),
            Err(CastError::Illegal(problem)) => {
                tracing::debug!(spell = %self.spell.id, %problem, "reflected cast not legal");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Pipeline shared by real and evaluated casts. Returns the report and
    /// the units that reflected the cast.
    fn perform(
        &self,
        sink: &mut dyn EffectSink,
        rng: &mut dyn BattleRng,
        roll: bool,
    ) -> Result<(CastReport, Vec<UnitId>), CastError> {
        let mut ctx = self.context();
        let mechanics = self.mechanics();
        let mechanics = mechanics.as_mechanics();

        let mut problem = Problem::new();
        if !mechanics.can_be_cast(&ctx, sink.view(), &mut problem) {
            return Err(CastError::Illegal(problem));
        }
        if let Some(message) = mechanics.malformed(&ctx, &self.target) {
            sink.complain(&message);
            return Err(CastError::Malformed(message));
        }
        if !mechanics.can_be_cast_at(&ctx, sink.view(), &self.target, &mut problem) {
            return Err(CastError::Illegal(problem));
        }

        let mut report = CastReport::default();
        if roll {
            let (resisted, reflected) = self.roll_defenses(&ctx, mechanics, sink.view(), rng);
            report.resisted = resisted;
            report.reflected = reflected;
            ctx.excluded = report.resisted.iter().chain(&report.reflected).copied().collect();
        }

        let targets = mechanics.effect_targets(&ctx, sink.view(), &self.target);
        let mut affected: Vec<UnitId> = targets.iter().flatten().filter_map(|d| d.unit).collect();
        affected.sort();
        affected.dedup();

        if self.mode == CastMode::Hero {
            let cost = self.spell.cost(self.caster.spell_school_level(self.spell));
            sink.emit(BattleChange::ManaSpent {
                side: ctx.side(),
                amount: cost,
            });
        }

        if let Some(countered) = self.spell.countering_selector() {
            let removals: Vec<BattleChange> = affected
                .iter()
                .filter_map(|id| sink.view().unit(*id))
                .filter_map(|unit| {
                    let bonuses = unit.bonuses(&countered);
                    (!bonuses.is_empty()).then(|| BattleChange::BonusesRemoved {
                        unit: unit.id(),
                        bonuses: bonuses.into_iter().collect(),
                    })
                })
                .collect();
            for change in removals {
                sink.emit(change);
            }
        }

        for (effect, target) in effects_of(&ctx).iter().zip(&targets) {
            let mut skipped = Problem::new();
            if !effect.applicable_on(&ctx, sink.view(), target, &mut skipped) {
                tracing::trace!(effect = effect.kind.name(), reason = %skipped, "effect skipped");
                continue;
            }
            effect.apply_with(&ctx, sink, target, rng)?;
        }

        report.description = mechanics.describe(&ctx, &affected);
        report.affected = affected;
        let reflectors = report.reflected.clone();
        Ok((report, reflectors))
    }

    /// Rolls magic resistance and magic mirror for every unit the cast
    /// touches.
    fn roll_defenses(
        &self,
        ctx: &EffectContext<'_>,
        mechanics: &dyn Mechanics,
        view: &dyn BattleView,
        rng: &mut dyn BattleRng,
    ) -> (Vec<UnitId>, Vec<UnitId>) {
        let mut resisted = Vec::new();
        let mut reflected = Vec::new();
        if self.spell.is_positive() {
            return (resisted, reflected);
        }
        let can_reflect = self.spell.is_negative()
            && !self.spell.is_massive(ctx.params.range_level)
            && self.mode != CastMode::MagicMirror;

        for id in mechanics.affected_units(ctx, view, &self.target) {
            let Some(unit) = view.unit(id) else {
                continue;
            };
            if unit.side() == ctx.side() {
                continue;
            }
            if rng.chance(unit.value_of_type(BonusType::MagicResistance)) {
                tracing::debug!(unit = %id, spell = %self.spell.id, "spell resisted");
                resisted.push(id);
                continue;
            }
            if can_reflect && rng.chance(unit.value_of_type(BonusType::MagicMirror)) {
                tracing::debug!(unit = %id, spell = %self.spell.id, "spell reflected");
                reflected.push(id);
            }
        }
        (resisted, reflected)
    }
}
