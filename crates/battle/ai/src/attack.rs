//! Scoring of one attack exchange.

use battle_core::battle::BattleView;
use battle_core::bonus::{BonusBearer, BonusType};
use battle_core::combat::{AttackInfo, DamageRange};
use battle_core::hex::BattleHex;
use battle_core::unit::{BattleSide, UnitSnapshot};

/// Outcome of attacking `enemy` from `tile`.
///
/// `attack` holds the attacker and defender as they would be after the
/// exchange. Damage is counted in health points.
#[derive(Clone, Debug)]
pub struct AttackPossibility {
    pub enemy: UnitSnapshot,
    pub tile: BattleHex,
    pub attack: AttackInfo,
    pub damage_dealt: i64,
    pub damage_received: i64,
    pub tactic_impact: i64,
    /// Side of the player actually commanding the attacker.
    controlled_by: Option<BattleSide>,
}

impl AttackPossibility {
    /// Simulates every strike of the attacker and the retaliations it draws.
    ///
    /// Each strike takes the midpoint of the estimated range, clamped to the
    /// health the target still has. The exchange stops as soon as either
    /// unit dies.
    pub fn evaluate(view: &dyn BattleView, info: &AttackInfo, tile: BattleHex) -> Self {
        let defender = &info.defender;
        let remaining_retaliations = if defender.state.retaliations.is_limited(&defender.bonuses) {
            defender.retaliations_available()
        } else {
            i32::MAX
        };
        let retaliation_blocked = info.attacker.has_bonus_of_type(BonusType::BlocksRetaliation);
        let total_attacks = info.attacker.total_attacks(info.shooting);

        let mut possibility = Self {
            enemy: info.defender.clone(),
            tile,
            attack: info.clone(),
            damage_dealt: 0,
            damage_received: 0,
            tactic_impact: 0,
            controlled_by: view.player_side(view.controlling_player(&info.attacker)),
        };

        let current = &mut possibility.attack;
        for strike in 0..total_attacks {
            let estimate = view.estimate_damage(current);
            let mut dealt = clamped(estimate.damage, current.defender.state.available_health()).midpoint();
            let mut received = if remaining_retaliations > strike && !retaliation_blocked {
                clamped(estimate.retaliation, current.attacker.state.available_health()).midpoint()
            } else {
                0
            };
            possibility.damage_dealt += dealt;
            possibility.damage_received += received;

            current.attacker.state.damage(&mut received);
            current.defender.state.damage(&mut dealt);
            if !current.attacker.alive() || !current.defender.alive() {
                break;
            }
        }
        possibility
    }

    /// Damage balance from the attacker's point of view.
    ///
    /// Hitting an ally counts both directions as losses. A mind-controlled
    /// attacker is scored for the player commanding it.
    pub fn damage_diff(&self) -> i64 {
        let attacker = &self.attack.attacker;
        let mut diff = if attacker.side() == self.enemy.side() {
            -self.damage_dealt - self.damage_received
        } else {
            self.damage_dealt - self.damage_received
        };
        if self.controlled_by.is_some_and(|side| side != attacker.side()) {
            diff = -diff;
        }
        diff
    }

    pub fn attack_value(&self) -> i64 {
        self.damage_diff() + self.tactic_impact
    }
}

fn clamped(range: DamageRange, health: i64) -> DamageRange {
    let health = health.max(0);
    DamageRange::new(range.min.min(health), range.max.min(health))
}
