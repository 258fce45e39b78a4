//! Decision driver for the active unit.

use std::cmp::Reverse;

use battle_core::battle::{BattleView, Reachability};
use battle_core::bonus::{BonusBearer, BonusType};
use battle_core::config::BattleConfig;
use battle_core::error::BattleError;
use battle_core::hex::BattleHex;
use battle_core::spell::SpellDefinition;
use battle_core::unit::{PlayerId, UnitId, UnitSnapshot};
use battle_core::BattleAction;

use crate::controller::BattleController;
use crate::error::AiError;
use crate::overlay::HypotheticBattle;
use crate::spells::{best_candidate, SpellPlanner};
use crate::targets::PotentialTargets;

/// Battle AI for one player.
///
/// Each activation runs through fixed stages:
///
/// 1. **Special units**: catapults are unsupported, siege healers tend to
///    the most wounded ally.
/// 2. **Hero spell**: every castable (spell, destination) pair is scored on
///    a private overlay; the best one is submitted when it gains anything.
/// 3. **Attack**: the best [`AttackPossibility`](crate::AttackPossibility)
///    on the (possibly changed) battle.
/// 4. **Fallback**: wait once, then walk toward the nearest enemy, else
///    defend.
///
/// A unit is never left without an action: any error along the way is
/// logged and answered with [`BattleAction::Defend`].
pub struct BattleAi {
    player: PlayerId,
    config: BattleConfig,
    spells: Vec<SpellDefinition>,
    pool: Option<rayon::ThreadPool>,
}

impl BattleAi {
    /// Creates the AI of `player`, knowing `spells` as the spell catalog.
    ///
    /// Spell scoring runs on a dedicated pool of
    /// [`BattleConfig::resolved_worker_threads`] workers. When the pool
    /// cannot be built, scoring runs on the calling thread.
    pub fn new(player: PlayerId, config: BattleConfig, spells: Vec<SpellDefinition>) -> Self {
        let threads = config.resolved_worker_threads();
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("spell-eval-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                tracing::warn!(%err, threads, "spell evaluation pool unavailable, scoring sequentially");
                None
            }
        };
        Self {
            player,
            config,
            spells,
            pool,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Picks the action of `unit`, whose turn it is.
    ///
    /// A hero spell chosen on the way is submitted to `controller` before
    /// this returns.
    pub fn active_unit(&self, controller: &mut dyn BattleController, unit: UnitId) -> BattleAction {
        match self.decide(controller, unit) {
            Ok(action) => {
                tracing::debug!(%unit, %action, "unit action");
                action
            }
            Err(err) => {
                tracing::error!(
                    %unit,
                    error = %err,
                    code = err.error_code(),
                    severity = err.severity().as_str(),
                    "decision failed, defending"
                );
                BattleAction::Defend { unit }
            }
        }
    }

    fn decide(&self, controller: &mut dyn BattleController, id: UnitId) -> Result<BattleAction, AiError> {
        let unit = controller.battle().unit(id).ok_or(AiError::UnknownUnit(id))?;
        if unit.has_bonus_of_type(BonusType::Catapult) {
            return Err(AiError::Unimplemented("catapult targeting"));
        }
        if unit.has_bonus_of_type(BonusType::SiegeWeapon) && unit.has_bonus_of_type(BonusType::Healer) {
            return Ok(heal_or_defend(controller.battle(), &unit));
        }

        self.attempt_casting_spell(controller);

        let view = controller.battle();
        if view.is_finished() {
            return Ok(BattleAction::Cancel);
        }
        // The cast may have changed the unit.
        let unit = view.unit(id).ok_or(AiError::UnknownUnit(id))?;

        let state = HypotheticBattle::new(view);
        let targets = PotentialTargets::new(&state, &unit);
        if let Some(best) = targets.best_action() {
            let defender = best.enemy.id();
            return Ok(if best.attack.shooting {
                BattleAction::RangedAttack { attacker: id, defender }
            } else {
                BattleAction::MeleeAttack {
                    attacker: id,
                    defender,
                    origin: best.tile,
                }
            });
        }

        if !unit.state.waited(0) {
            return Ok(BattleAction::Wait { unit: id });
        }

        let reach = view.reachability(&unit);
        let nearest = targets
            .unreachable_enemies
            .iter()
            .map(|enemy| (distance_to_nearest_neighbour(&reach, enemy.position()), enemy))
            .min_by_key(|(distance, _)| *distance);
        Ok(match nearest {
            Some((distance, enemy)) if distance != u32::MAX => go_towards(&unit, &reach, enemy.position()),
            _ => BattleAction::Defend { unit: id },
        })
    }

    /// Scores every hero cast and submits the best one if it is worth
    /// anything.
    fn attempt_casting_spell(&self, controller: &mut dyn BattleController) {
        let action = {
            let view = controller.battle();
            let Some(side) = view.player_side(self.player) else {
                return;
            };
            let Some(hero) = view.hero(side) else {
                return;
            };

            let planner = SpellPlanner::new(view, self.player, &self.config);
            let mut candidates = planner.candidates(&hero, &self.spells);
            if candidates.is_empty() {
                return;
            }
            tracing::debug!(candidates = candidates.len(), "scoring spell candidates");
            planner.score(&hero, &mut candidates, self.pool.as_ref());

            let Some(best) = best_candidate(&candidates) else {
                return;
            };
            if best.value <= 0 {
                tracing::debug!(spell = %best.spell.name, value = best.value, "best spell is useless");
                return;
            }
            tracing::info!(
                spell = %best.spell.name,
                destination = ?best.destination,
                value = best.value,
                "casting hero spell"
            );
            BattleAction::HeroSpell {
                side,
                spell: best.spell.id,
                destination: best.target(),
            }
        };

        if let Err(err) = controller.submit(action) {
            tracing::warn!(
                error = %err,
                code = err.error_code(),
                severity = err.severity().as_str(),
                "hero spell rejected"
            );
        }
    }
}

/// Heal for the most wounded living ally of `healer`, or defend when
/// nobody is hurt. The first unit wins ties.
fn heal_or_defend(view: &dyn BattleView, healer: &UnitSnapshot) -> BattleAction {
    let wound = |unit: &UnitSnapshot| unit.state.definition().max_health() - unit.state.first_hp_left();
    let allies = view.units_if(&|u| u.alive() && u.owner() == healer.owner() && u.id() != healer.id());
    match allies
        .iter()
        .filter(|unit| wound(unit) > 0)
        .min_by_key(|unit| Reverse(wound(unit)))
    {
        Some(target) => BattleAction::Heal {
            caster: healer.id(),
            target: target.id(),
        },
        None => BattleAction::Defend { unit: healer.id() },
    }
}

/// Walking distance to the closest hex next to `hex`.
fn distance_to_nearest_neighbour(reach: &Reachability, hex: BattleHex) -> u32 {
    hex.neighbours()
        .iter()
        .map(|n| reach.distance(*n))
        .min()
        .unwrap_or(u32::MAX)
}

/// Move that brings `unit` as close as it can get to `destination` this
/// turn.
fn go_towards(unit: &UnitSnapshot, reach: &Reachability, destination: BattleHex) -> BattleAction {
    let defend = BattleAction::Defend { unit: unit.id() };
    let available: Vec<BattleHex> = reach
        .reachable(unit.speed(0))
        .into_iter()
        .filter(|hex| *hex != unit.position())
        .collect();
    if available.contains(&destination) {
        return BattleAction::Move {
            unit: unit.id(),
            destination,
        };
    }

    let around = destination.neighbours();
    if around.iter().any(|hex| unit.covers(*hex)) {
        tracing::warn!(unit = %unit.id(), %destination, "already standing next to the destination");
        return defend;
    }
    let neighbours: Vec<BattleHex> = around
        .into_iter()
        .filter(|hex| reach.distance(*hex) != u32::MAX)
        .collect();
    if available.is_empty() || neighbours.is_empty() {
        return defend;
    }

    if unit.is_flying() {
        // Flyers jump, so there is no path to follow back.
        let to_destination = |hex: &BattleHex| {
            neighbours
                .iter()
                .map(|n| BattleHex::distance(*n, *hex))
                .min()
                .unwrap_or(u32::MAX)
        };
        return match available.iter().min_by_key(|hex| to_destination(hex)) {
            Some(hex) => BattleAction::Move {
                unit: unit.id(),
                destination: *hex,
            },
            None => defend,
        };
    }

    let Some(best) = neighbours.iter().copied().min_by_key(|hex| reach.distance(*hex)) else {
        return defend;
    };
    match reach
        .path_to(best)
        .into_iter()
        .rev()
        .find(|hex| available.contains(hex))
    {
        Some(hex) => BattleAction::Move {
            unit: unit.id(),
            destination: hex,
        },
        None => defend,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use battle_core::unit::{BattleSide, CreatureType, UnitFlags};
    use battle_core::{Battle, BattleState};

    use super::*;
    use crate::controller::LocalController;

    fn ai() -> BattleAi {
        let config = BattleConfig {
            worker_threads: Some(1),
            ..BattleConfig::default()
        };
        BattleAi::new(PlayerId(0), config, Vec::new())
    }

    fn battle(goblin_at: BattleHex) -> Battle {
        let mut battle = Battle::new(PlayerId(0), PlayerId(1));
        let pikeman = CreatureType::new(1, "Pikeman", 1, 10).with_damage(1, 3).with_speed(4);
        let goblin = CreatureType::new(2, "Goblin", 1, 5).with_damage(1, 2).with_speed(5);
        battle.spawn(Arc::new(pikeman), 10, BattleSide::Attacker, BattleHex::new(2, 5));
        battle.spawn(Arc::new(goblin), 10, BattleSide::Defender, goblin_at);
        battle
    }

    fn mark_waited(battle: &mut Battle, id: UnitId) {
        let mut state = battle.unit(id).expect("unit").state;
        state.flags.insert(UnitFlags::WAITING);
        battle.update_unit(id, &state.save());
    }

    #[test]
    fn adjacent_enemy_is_attacked() {
        let mut battle = battle(BattleHex::new(4, 5));
        let mut controller = LocalController::new(&mut battle, &[], 1);
        let action = ai().active_unit(&mut controller, UnitId(0));
        assert!(matches!(
            action,
            BattleAction::MeleeAttack {
                attacker: UnitId(0),
                defender: UnitId(1),
                ..
            }
        ));
    }

    #[test]
    fn far_enemy_makes_the_unit_wait_first() {
        let mut battle = battle(BattleHex::new(15, 5));
        let mut controller = LocalController::new(&mut battle, &[], 1);
        let action = ai().active_unit(&mut controller, UnitId(0));
        assert_eq!(action, BattleAction::Wait { unit: UnitId(0) });
    }

    #[test]
    fn waited_unit_walks_toward_the_enemy() {
        let mut battle = battle(BattleHex::new(15, 5));
        mark_waited(&mut battle, UnitId(0));
        let reach = battle.reachability(&battle.unit(UnitId(0)).expect("unit"));
        let mut controller = LocalController::new(&mut battle, &[], 1);
        let action = ai().active_unit(&mut controller, UnitId(0));
        let BattleAction::Move { unit, destination } = action else {
            panic!("expected a move, got {action}");
        };
        assert_eq!(unit, UnitId(0));
        assert_eq!(reach.distance(destination), 4);
        let goblin = BattleHex::new(15, 5);
        assert!(BattleHex::distance(destination, goblin) < BattleHex::distance(BattleHex::new(2, 5), goblin));
    }

    #[test]
    fn unknown_unit_defends() {
        let mut battle = battle(BattleHex::new(15, 5));
        let mut controller = LocalController::new(&mut battle, &[], 1);
        let action = ai().active_unit(&mut controller, UnitId(42));
        assert_eq!(action, BattleAction::Defend { unit: UnitId(42) });
    }

    #[test]
    fn finished_battle_is_cancelled() {
        let mut battle = battle(BattleHex::new(15, 5));
        battle.remove_unit(UnitId(1));
        let mut controller = LocalController::new(&mut battle, &[], 1);
        let action = ai().active_unit(&mut controller, UnitId(0));
        assert_eq!(action, BattleAction::Cancel);
    }

    #[test]
    fn reachable_destination_is_moved_to_directly() {
        let battle = battle(BattleHex::new(15, 5));
        let unit = battle.unit(UnitId(0)).expect("unit");
        let reach = battle.reachability(&unit);
        assert_eq!(
            go_towards(&unit, &reach, BattleHex::new(4, 5)),
            BattleAction::Move {
                unit: UnitId(0),
                destination: BattleHex::new(4, 5)
            }
        );
    }
}
