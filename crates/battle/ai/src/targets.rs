//! Enumeration of the attacks a unit can make this turn.

use battle_core::battle::BattleView;
use battle_core::combat::AttackInfo;
use battle_core::hex::BattleHex;
use battle_core::unit::{PlayerId, UnitSnapshot};

use crate::attack::AttackPossibility;

/// Every attack open to one unit, plus the enemies it cannot hit.
#[derive(Clone, Debug, Default)]
pub struct PotentialTargets {
    pub possible_attacks: Vec<AttackPossibility>,
    pub unreachable_enemies: Vec<UnitSnapshot>,
}

impl PotentialTargets {
    /// Collects attacks of `attacker` against every enemy of the player
    /// commanding it.
    ///
    /// A shooter that is not engaged in melee gets one ranged possibility per
    /// enemy. Everyone else gets one melee possibility per reachable tile
    /// adjacent to the enemy, in hex order.
    pub fn new(view: &dyn BattleView, attacker: &UnitSnapshot) -> Self {
        let owner = view.controlling_player(attacker);
        let reach = view.reachability(attacker);
        let tiles = reach.reachable(attacker.speed(0));
        let enemies = view.units_if(&|u| {
            u.id() != attacker.id() && u.is_valid_target(false) && view.controlling_player(u) != owner
        });
        let shooting = attacker.can_shoot() && !is_engaged(view, attacker, owner);

        let mut targets = Self::default();
        for enemy in enemies {
            let before = targets.possible_attacks.len();
            if shooting {
                let info = AttackInfo::new(attacker.clone(), enemy.clone(), true);
                targets
                    .possible_attacks
                    .push(AttackPossibility::evaluate(view, &info, attacker.position()));
            } else {
                for tile in tiles.iter().copied().filter(|t| can_strike_from(attacker, &enemy, *t)) {
                    let mut moved = attacker.clone();
                    moved.state.position = tile;
                    let mut info = AttackInfo::new(moved, enemy.clone(), false);
                    info.charged_fields = reach.distance(tile);
                    targets
                        .possible_attacks
                        .push(AttackPossibility::evaluate(view, &info, tile));
                }
            }
            if targets.possible_attacks.len() == before {
                targets.unreachable_enemies.push(enemy);
            }
        }

        tracing::debug!(
            unit = %attacker.id(),
            attacks = targets.possible_attacks.len(),
            unreachable = targets.unreachable_enemies.len(),
            "potential targets"
        );
        targets
    }

    /// Highest-valued attack. On ties the first one found wins.
    pub fn best_action(&self) -> Option<&AttackPossibility> {
        self.possible_attacks
            .iter()
            .fold(None, |best: Option<&AttackPossibility>, candidate| match best {
                Some(best) if best.attack_value() >= candidate.attack_value() => Some(best),
                _ => Some(candidate),
            })
    }

    /// Value of [`Self::best_action`], zero when nothing can be attacked.
    pub fn best_action_value(&self) -> i64 {
        self.best_action().map_or(0, AttackPossibility::attack_value)
    }
}

/// Whether an enemy of `owner` stands next to `unit`.
fn is_engaged(view: &dyn BattleView, unit: &UnitSnapshot, owner: PlayerId) -> bool {
    let around = unit.state.occupied_hexes();
    !view
        .units_if(&|u| {
            u.alive()
                && view.controlling_player(u) != owner
                && u.state
                    .occupied_hexes()
                    .iter()
                    .any(|hex| around.iter().any(|mine| mine.is_adjacent(*hex)))
        })
        .is_empty()
}

/// Whether `attacker` standing on `tile` touches `defender`.
fn can_strike_from(attacker: &UnitSnapshot, defender: &UnitSnapshot, tile: BattleHex) -> bool {
    let footprint = tile.occupied_with(attacker.state.definition().double_wide(), attacker.side());
    let target = defender.state.occupied_hexes();
    footprint
        .iter()
        .any(|hex| target.iter().any(|other| hex.is_adjacent(*other)))
}
