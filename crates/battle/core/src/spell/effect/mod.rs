//! Composable spell effects.
//!
//! Every effect turns a resolved target into a list of
//! [`BattleChange`] records. The records are produced once and routed either
//! to a [`ChangeSender`] (real casts) or straight into a [`BattleState`]
//! (evaluation), so both appliers end in the same state for the same inputs.

mod clone;
mod damage;
mod heal;
mod obstacle;
mod remove_obstacle;
mod sacrifice;
mod sink;
mod summon;
mod teleport;
mod timed;
pub(crate) mod unit;

pub use clone::CloneEffect;
pub use damage::DamageEffect;
pub use heal::HealEffect;
pub use obstacle::{ObstacleEffect, ObstaclePlacement};
pub use remove_obstacle::RemoveObstacleEffect;
pub use sacrifice::SacrificeEffect;
pub use sink::{EffectSink, SenderSink, StateSink};
pub use summon::SummonEffect;
pub use teleport::TeleportEffect;
pub use timed::TimedEffect;

use super::{CastError, CastMode, CastParameters, Caster, Positiveness, Problem, SpellDefinition, SpellId, SpellRange, Target, TargetShape};
use crate::battle::{BattleState, BattleView};
use crate::bonus::{BonusBearer, BonusType, Selector};
use crate::change::{BattleChange, ChangeSender};
use crate::rng::BattleRng;
use crate::unit::{BattleSide, UnitId, UnitSnapshot};

/// Everything an effect needs to know about the cast it belongs to.
pub struct EffectContext<'c> {
    pub spell: &'c SpellDefinition,
    pub caster: &'c dyn Caster,
    pub mode: CastMode,
    pub params: CastParameters,
    /// Units that resisted or reflected the cast.
    pub excluded: Vec<UnitId>,
}

impl<'c> EffectContext<'c> {
    pub fn new(spell: &'c SpellDefinition, caster: &'c dyn Caster, mode: CastMode, params: CastParameters) -> Self {
        Self {
            spell,
            caster,
            mode,
            params,
            excluded: Vec::new(),
        }
    }

    pub fn side(&self) -> BattleSide {
        self.caster.side()
    }

    pub fn spell_id(&self) -> SpellId {
        self.spell.id
    }

    pub fn range(&self) -> SpellRange {
        self.spell.range(self.params.range_level)
    }

    /// Rounds timed effects last.
    pub fn duration(&self) -> i32 {
        self.params.duration.clamp(0, i64::from(i32::MAX)) as i32
    }

    /// Effect value before per-target adjustments.
    pub fn raw_value(&self) -> i64 {
        if self.params.effect_value != 0 {
            self.params.effect_value
        } else {
            self.spell
                .raw_effect_value(self.params.effect_level, self.params.effect_power)
        }
    }

    /// Effect value against `target` after caster adjustments. Never negative.
    pub fn value_against(&self, target: Option<&UnitSnapshot>) -> i64 {
        self.caster
            .spell_bonus(self.spell, self.raw_value(), target)
            .max(0)
    }

    /// Smart spells only touch units of the fitting side.
    pub fn is_smart_target(&self, unit: &UnitSnapshot) -> bool {
        if !self.spell.smart {
            return true;
        }
        match self.spell.positiveness {
            Positiveness::Positive => unit.side() == self.side(),
            Positiveness::Negative => unit.side() != self.side(),
            Positiveness::Neutral => true,
        }
    }

    /// Whether `unit` is not immune to the spell.
    pub fn is_receptive(&self, unit: &UnitSnapshot) -> bool {
        let spell = self.spell.id.0;
        if unit.has_bonus(&Selector::type_subtype(BonusType::SpellImmunity, spell)) {
            return false;
        }
        let level = i32::from(self.spell.level);
        !(level > 0
            && unit.has_bonus_of_type(BonusType::LevelSpellImmunity)
            && unit.value_of_type(BonusType::LevelSpellImmunity) >= level)
    }

    /// Combined filter applied to every unit an effect could touch.
    pub fn affects(&self, unit: &UnitSnapshot) -> bool {
        !self.excluded.contains(&unit.id()) && self.is_smart_target(unit) && self.is_receptive(unit)
    }
}

/// Behaviour shared by every effect kind.
pub trait SpellEffect {
    fn shape(&self) -> TargetShape;

    /// Whether the effect could do anything in the battle at all.
    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool;

    /// Converts the aimed destinations into the effect's own target.
    fn transform_target(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Target;

    /// Whether the effect can act on an already transformed target.
    fn applicable_on(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        problem: &mut Problem,
    ) -> bool;

    /// State changes the effect makes on `target`.
    fn prepare(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        rng: &mut dyn BattleRng,
    ) -> Result<Vec<BattleChange>, CastError>;
}

/// Effect kind enum dispatching to the concrete effect types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectKind {
    Damage(DamageEffect),
    Heal(HealEffect),
    Sacrifice(SacrificeEffect),
    Clone(CloneEffect),
    Teleport(TeleportEffect),
    Timed(TimedEffect),
    Obstacle(ObstacleEffect),
    Summon(SummonEffect),
    RemoveObstacle(RemoveObstacleEffect),
}

impl EffectKind {
    pub fn as_effect(&self) -> &dyn SpellEffect {
        match self {
            Self::Damage(e) => e,
            Self::Heal(e) => e,
            Self::Sacrifice(e) => e,
            Self::Clone(e) => e,
            Self::Teleport(e) => e,
            Self::Timed(e) => e,
            Self::Obstacle(e) => e,
            Self::Summon(e) => e,
            Self::RemoveObstacle(e) => e,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Damage(_) => "damage",
            Self::Heal(_) => "heal",
            Self::Sacrifice(_) => "sacrifice",
            Self::Clone(_) => "clone",
            Self::Teleport(_) => "teleport",
            Self::Timed(_) => "timed",
            Self::Obstacle(_) => "obstacle",
            Self::Summon(_) => "summon",
            Self::RemoveObstacle(_) => "remove_obstacle",
        }
    }
}

/// One effect of a spell level.
///
/// Required effects must be applicable for the spell to be cast at all.
/// Optional ones never block a cast and only apply where they can.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Effect {
    pub kind: EffectKind,
    pub optional: bool,
}

impl Effect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    pub fn optional(kind: EffectKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }

    pub fn shape(&self) -> TargetShape {
        self.kind.as_effect().shape()
    }

    pub fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        self.kind.as_effect().applicable(ctx, view, problem)
    }

    pub fn transform_target(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, aimed: &Target) -> Target {
        self.kind.as_effect().transform_target(ctx, view, aimed)
    }

    pub fn applicable_on(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        problem: &mut Problem,
    ) -> bool {
        self.kind.as_effect().applicable_on(ctx, view, target, problem)
    }

    /// Real applier: changes go through the apply-and-send boundary.
    pub fn apply(
        &self,
        ctx: &EffectContext<'_>,
        sender: &mut dyn ChangeSender,
        target: &Target,
        rng: &mut dyn BattleRng,
    ) -> Result<(), CastError> {
        self.apply_with(ctx, &mut SenderSink::new(sender), target, rng)
    }

    /// Evaluation applier: changes land directly in `state`.
    pub fn apply_to_state(
        &self,
        ctx: &EffectContext<'_>,
        state: &mut dyn BattleState,
        target: &Target,
        rng: &mut dyn BattleRng,
    ) -> Result<(), CastError> {
        self.apply_with(ctx, &mut StateSink::new(state), target, rng)
    }

    pub(crate) fn apply_with(
        &self,
        ctx: &EffectContext<'_>,
        sink: &mut dyn EffectSink,
        target: &Target,
        rng: &mut dyn BattleRng,
    ) -> Result<(), CastError> {
        let prepared = self.kind.as_effect().prepare(ctx, sink.view(), target, rng);
        match prepared {
            Ok(changes) => {
                tracing::trace!(effect = self.kind.name(), changes = changes.len(), "effect prepared");
                for change in changes {
                    sink.emit(change);
                }
                Ok(())
            }
            Err(err) => {
                if let CastError::Malformed(message) = &err {
                    sink.complain(message);
                }
                Err(err)
            }
        }
    }
}

/// Cast modes that are triggered by something else than a deliberate cast.
pub(crate) fn is_triggered(mode: CastMode) -> bool {
    matches!(mode, CastMode::SpellLikeAttack | CastMode::MagicMirror | CastMode::Passive)
}
