//! Action submission boundary.

use battle_core::battle::{Battle, BattleView};
use battle_core::change::LocalSender;
use battle_core::rng::PcgRng;
use battle_core::spell::{BattleCast, CastError, CastMode, CastReport, SpellDefinition};
use battle_core::BattleAction;

use crate::error::AiError;

/// What the AI talks to: the battle it reads and the place its decisions
/// go.
///
/// Unit actions are returned from [`BattleAi::active_unit`]; only actions
/// taken before the unit acts (hero casts) are submitted through
/// [`BattleController::submit`].
///
/// [`BattleAi::active_unit`]: crate::BattleAi::active_unit
pub trait BattleController {
    /// Current authoritative state.
    fn battle(&self) -> &(dyn BattleView + Sync);

    fn submit(&mut self, action: BattleAction) -> Result<(), AiError>;
}

/// Controller over a local [`Battle`]: hero casts are performed right away,
/// everything else is recorded.
pub struct LocalController<'a> {
    battle: &'a mut Battle,
    spells: &'a [SpellDefinition],
    rng: PcgRng,
    submitted: Vec<BattleAction>,
    reports: Vec<CastReport>,
}

impl<'a> LocalController<'a> {
    pub fn new(battle: &'a mut Battle, spells: &'a [SpellDefinition], seed: u64) -> Self {
        Self {
            battle,
            spells,
            rng: PcgRng::seeded(seed),
            submitted: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Actions accepted so far, in order.
    pub fn submitted(&self) -> &[BattleAction] {
        &self.submitted
    }

    /// Reports of the hero casts performed so far.
    pub fn reports(&self) -> &[CastReport] {
        &self.reports
    }

    fn cast(&mut self, action: &BattleAction) -> Result<(), AiError> {
        let BattleAction::HeroSpell {
            side,
            spell,
            destination,
        } = action
        else {
            return Ok(());
        };
        let definition = self
            .spells
            .iter()
            .find(|s| s.id == *spell)
            .ok_or_else(|| AiError::HeroSpell {
                spell: *spell,
                source: CastError::Malformed(format!("spell {spell} is not in the catalog")),
            })?;
        let hero = self.battle.hero(*side).ok_or_else(|| AiError::HeroSpell {
            spell: *spell,
            source: CastError::Malformed(format!("no hero on the {side} side")),
        })?;

        let cast = BattleCast::new(definition, &hero, CastMode::Hero).aimed_at(destination.clone());
        let mut sender = LocalSender::new(&mut *self.battle);
        let report = cast
            .cast(&mut sender, &mut self.rng)
            .map_err(|source| AiError::HeroSpell { spell: *spell, source })?;
        tracing::info!(hero = %hero.name, spell = %definition.name, affected = report.affected.len(), "hero cast");
        self.reports.push(report);
        Ok(())
    }
}

impl BattleController for LocalController<'_> {
    fn battle(&self) -> &(dyn BattleView + Sync) {
        &*self.battle
    }

    fn submit(&mut self, action: BattleAction) -> Result<(), AiError> {
        self.cast(&action)?;
        self.submitted.push(action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use battle_core::error::BattleError;
    use battle_core::hex::BattleHex;
    use battle_core::spell::effect::DamageEffect;
    use battle_core::spell::{Destination, Effect, EffectKind, Hero, Positiveness, TargetType};
    use battle_core::unit::{BattleSide, CreatureType, PlayerId, UnitId};

    use super::*;

    fn magic_arrow() -> SpellDefinition {
        let mut spell = SpellDefinition::new(15, "Magic Arrow");
        spell.positiveness = Positiveness::Negative;
        spell.target = TargetType::Creature;
        spell.power_coefficient = 10;
        for (level, data) in spell.levels.iter_mut().enumerate() {
            data.power = 10 * (level as i64 + 1);
            data.cost = 5;
            data.effects = vec![Effect::new(EffectKind::Damage(DamageEffect::default()))];
        }
        spell
    }

    fn battle() -> Battle {
        let mut battle = Battle::new(PlayerId(0), PlayerId(1));
        let pikeman = CreatureType::new(1, "Pikeman", 1, 10).with_damage(1, 3);
        let goblin = CreatureType::new(2, "Goblin", 1, 5).with_damage(1, 2);
        battle.spawn(Arc::new(pikeman), 10, BattleSide::Attacker, BattleHex::new(1, 5));
        battle.spawn(Arc::new(goblin), 20, BattleSide::Defender, BattleHex::new(15, 5));
        battle
    }

    fn arrow_at_goblin() -> BattleAction {
        BattleAction::HeroSpell {
            side: BattleSide::Attacker,
            spell: magic_arrow().id,
            destination: vec![Destination::hex(BattleHex::new(15, 5))],
        }
    }

    #[test]
    fn unit_actions_are_only_recorded() {
        let mut battle = battle();
        let spells = [magic_arrow()];
        let mut controller = LocalController::new(&mut battle, &spells, 1);
        controller.submit(BattleAction::Defend { unit: UnitId(0) }).expect("recorded");
        assert_eq!(controller.submitted(), &[BattleAction::Defend { unit: UnitId(0) }]);
        assert!(controller.reports().is_empty());
    }

    #[test]
    fn hero_spell_is_cast_on_the_battle() {
        let mut battle = battle();
        let mut hero = Hero::new("Orrin", PlayerId(0), BattleSide::Attacker);
        hero.mana = 10;
        hero.spellbook.push(magic_arrow().id);
        battle.set_hero(hero);
        let spells = [magic_arrow()];

        let mut controller = LocalController::new(&mut battle, &spells, 1);
        controller.submit(arrow_at_goblin()).expect("cast");
        assert_eq!(controller.reports().len(), 1);
        assert_eq!(controller.reports()[0].affected, vec![UnitId(1)]);
        assert_eq!(controller.submitted().len(), 1);
        assert_eq!(controller.battle().hero(BattleSide::Attacker).map(|h| h.mana), Some(5));
    }

    #[test]
    fn cast_without_hero_is_rejected() {
        let mut battle = battle();
        let spells = [magic_arrow()];
        let mut controller = LocalController::new(&mut battle, &spells, 1);
        let err = controller.submit(arrow_at_goblin()).expect_err("no hero");
        assert_eq!(err.error_code(), "AI_HERO_SPELL");
        assert!(controller.submitted().is_empty());
    }
}
