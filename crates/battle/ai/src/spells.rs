//! Hero spell planning.
//!
//! Every castable (spell, destination) pair becomes a [`SpellCandidate`].
//! A candidate is scored by casting it on a private [`HypotheticBattle`],
//! letting each unit in the upcoming turn order play its best attack, and
//! comparing the resulting per-unit values with the same replay without the
//! cast. Candidates are independent, so scoring runs on a worker pool.

use std::collections::{BTreeMap, BTreeSet};

use battle_core::battle::{BattleState, BattleView};
use battle_core::bonus::{Bonus, BonusDuration, Selector};
use battle_core::config::BattleConfig;
use battle_core::hex::BattleHex;
use battle_core::rng::MidpointRng;
use battle_core::spell::{BattleCast, CastMode, Caster, Destination, Hero, SpellDefinition, Target, TargetType};
use battle_core::unit::{PlayerId, UnitId, UnitSnapshot};
use rayon::prelude::*;

use crate::attack::AttackPossibility;
use crate::overlay::HypotheticBattle;
use crate::targets::PotentialTargets;

/// Per-unit value of the best attack it can make, from our point of view.
pub type ValueMap = BTreeMap<UnitId, i64>;

/// One hero cast under consideration.
#[derive(Clone, Debug)]
pub struct SpellCandidate<'s> {
    pub spell: &'s SpellDefinition,
    /// Aimed hex; `None` for spells cast without a destination.
    pub destination: Option<BattleHex>,
    /// Total gain of the cast, filled in by [`SpellPlanner::score`].
    pub value: i64,
}

impl SpellCandidate<'_> {
    pub fn target(&self) -> Target {
        self.destination.map(|hex| vec![Destination::hex(hex)]).unwrap_or_default()
    }
}

/// Enumerates and scores hero casts against one battle.
pub struct SpellPlanner<'v> {
    view: &'v (dyn BattleView + Sync),
    player: PlayerId,
    rounds: usize,
    max_units: Option<usize>,
}

impl<'v> SpellPlanner<'v> {
    pub fn new(view: &'v (dyn BattleView + Sync), player: PlayerId, config: &BattleConfig) -> Self {
        Self {
            view,
            player,
            rounds: config.turn_order_rounds,
            max_units: config.max_turn_order_units,
        }
    }

    /// Every castable spell of `hero` paired with every destination it can be
    /// aimed at, in catalog then hex order.
    pub fn candidates<'s>(&self, hero: &Hero, spells: &'s [SpellDefinition]) -> Vec<SpellCandidate<'s>> {
        if self.view.side_info(hero.side).cast_this_round {
            return Vec::new();
        }
        let castable: Vec<&SpellDefinition> = spells
            .iter()
            .filter(|spell| hero.knows(spell.id))
            .filter(|spell| !spell.effects(hero.spell_school_level(spell)).is_empty())
            .filter(|spell| BattleCast::new(spell, hero, CastMode::Hero).can_be_cast(self.view).is_ok())
            .collect();
        tracing::debug!(hero = %hero.name, spells = castable.len(), "castable spells");

        let mut candidates = Vec::new();
        for spell in castable {
            for destination in self.destinations(hero, spell) {
                candidates.push(SpellCandidate {
                    spell,
                    destination,
                    value: 0,
                });
            }
        }
        candidates
    }

    /// Destinations worth trying for `spell`.
    fn destinations(&self, hero: &Hero, spell: &SpellDefinition) -> Vec<Option<BattleHex>> {
        let level = hero.spell_school_level(spell);
        if spell.is_massive(level) || spell.target == TargetType::NoTarget {
            return vec![None];
        }
        match spell.target {
            TargetType::Creature | TargetType::Location => BattleHex::all()
                .filter(|hex| hex.is_available())
                .filter(|hex| {
                    BattleCast::new(spell, hero, CastMode::Hero)
                        .aimed_at(vec![Destination::hex(*hex)])
                        .can_be_cast_at(self.view)
                        .is_ok()
                })
                .map(Some)
                .collect(),
            TargetType::NoTarget | TargetType::Obstacle => Vec::new(),
        }
    }

    /// Unit values when nobody casts anything.
    pub fn baseline(&self) -> ValueMap {
        let mut state = HypotheticBattle::new(self.view);
        self.replay(&mut state)
    }

    /// Total gain of casting `candidate`: the sum over all units of the
    /// change in their value against `baseline`.
    pub fn evaluate(&self, hero: &Hero, candidate: &SpellCandidate<'_>, baseline: &ValueMap) -> i64 {
        let mut state = HypotheticBattle::new(self.view);
        let cast = BattleCast::new(candidate.spell, hero, CastMode::Hero).aimed_at(candidate.target());
        if let Err(err) = cast.cast_evaluation(&mut state, &mut MidpointRng) {
            tracing::debug!(spell = %candidate.spell.id, %err, "candidate cast failed");
            return 0;
        }
        let values = self.replay(&mut state);

        let units: BTreeSet<&UnitId> = baseline.keys().chain(values.keys()).collect();
        let gain: i64 = units
            .into_iter()
            .map(|id| values.get(id).copied().unwrap_or(0) - baseline.get(id).copied().unwrap_or(0))
            .sum();
        tracing::debug!(
            spell = %candidate.spell.id,
            destination = ?candidate.destination,
            gain,
            "candidate scored"
        );
        gain
    }

    /// Scores every candidate in place. Each worker builds its own overlay;
    /// nothing is shared but the read-only battle.
    pub fn score(&self, hero: &Hero, candidates: &mut [SpellCandidate<'_>], pool: Option<&rayon::ThreadPool>) {
        let baseline = self.baseline();
        let evaluate = |candidate: &mut SpellCandidate<'_>| {
            candidate.value = self.evaluate(hero, candidate, &baseline);
        };
        match pool {
            Some(pool) => pool.install(|| candidates.par_iter_mut().for_each(evaluate)),
            None => candidates.iter_mut().for_each(evaluate),
        }
    }

    /// Plays the turn order on `state`: each unit makes its best attack and
    /// records its value. Units already valued are skipped.
    fn replay(&self, state: &mut HypotheticBattle<'_>) -> ValueMap {
        let queue = state.turn_order(self.rounds, self.max_units);
        let mut values = ValueMap::new();
        evaluate_queue(&mut values, &queue, state, self.player);
        values
    }
}

/// Values every unit of `queue` on `state`, applying the best attack of each
/// one before moving on.
pub fn evaluate_queue(
    values: &mut ValueMap,
    queue: &[Vec<UnitSnapshot>],
    state: &mut HypotheticBattle<'_>,
    player: PlayerId,
) {
    for unit in queue.iter().flatten() {
        if values.contains_key(&unit.id()) {
            continue;
        }
        let Some(current) = state.unit(unit.id()).filter(UnitSnapshot::alive) else {
            values.insert(unit.id(), 0);
            continue;
        };

        let targets = PotentialTargets::new(&*state, &current);
        if let Some(best) = targets.best_action() {
            apply_attack(state, best);
        }

        let mut value = targets.best_action_value();
        if state.controlling_player(&current) != player {
            value = -value;
        }
        values.insert(unit.id(), value);
    }
}

/// Writes the outcome of an attack into `state`.
fn apply_attack(state: &mut HypotheticBattle<'_>, attack: &AttackPossibility) {
    let attacker = &attack.attack.attacker;
    let defender = &attack.attack.defender;
    state.update_unit(attacker.id(), &attacker.state.save());
    state.move_unit(attacker.id(), attack.tile);
    state.update_unit(defender.id(), &defender.state.save());

    if defender.state.available_health() < attack.enemy.state.available_health() {
        let broken: Vec<Bonus> = defender
            .bonuses
            .list
            .filtered(&Selector::duration(BonusDuration::UNTIL_BEING_ATTACKED))
            .into_iter()
            .collect();
        if !broken.is_empty() {
            state.remove_bonuses(defender.id(), &broken);
        }
    }
}

/// First candidate with the highest value.
pub fn best_candidate<'c, 's>(candidates: &'c [SpellCandidate<'s>]) -> Option<&'c SpellCandidate<'s>> {
    candidates.iter().fold(None, |best: Option<&SpellCandidate<'s>>, candidate| match best {
        Some(best) if best.value >= candidate.value => Some(best),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(id: i32) -> SpellDefinition {
        SpellDefinition::new(id, format!("Spell {id}"))
    }

    #[test]
    fn best_candidate_prefers_the_first_maximum() {
        let (a, b, c) = (spell(1), spell(2), spell(3));
        let candidates = vec![
            SpellCandidate { spell: &a, destination: None, value: 4 },
            SpellCandidate { spell: &b, destination: None, value: 9 },
            SpellCandidate { spell: &c, destination: None, value: 9 },
        ];
        assert_eq!(best_candidate(&candidates).map(|c| c.spell.id.0), Some(2));
        assert!(best_candidate(&[]).is_none());
    }

    #[test]
    fn target_wraps_the_destination() {
        let a = spell(1);
        let aimed = SpellCandidate { spell: &a, destination: Some(BattleHex::new(3, 3)), value: 0 };
        assert_eq!(aimed.target(), vec![Destination::hex(BattleHex::new(3, 3))]);
        let unaimed = SpellCandidate { spell: &a, destination: None, value: 0 };
        assert!(unaimed.target().is_empty());
    }
}
