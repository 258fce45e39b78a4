//! Damage estimation for attacks between two units.
//!
//! Estimates are pure functions of the attacker and defender snapshots; no
//! randomness is involved. Callers that need a single number take the
//! midpoint of the returned range.

use crate::bonus::{BonusBearer, BonusType, Selector, damage_subtype, primary_skill};
use crate::config::BattleConfig;
use crate::hex::BattleHex;
use crate::unit::UnitSnapshot;

/// Inclusive damage interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageRange {
    pub min: i64,
    pub max: i64,
}

impl DamageRange {
    pub const ZERO: Self = Self { min: 0, max: 0 };

    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Deterministic representative used for evaluation.
    pub fn midpoint(&self) -> i64 {
        (self.min + self.max) / 2
    }
}

/// Damage dealt by an attack and the expected retaliation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageEstimate {
    pub damage: DamageRange,
    pub retaliation: DamageRange,
}

/// One hypothetical attack.
#[derive(Clone, Debug)]
pub struct AttackInfo {
    pub attacker: UnitSnapshot,
    pub defender: UnitSnapshot,
    pub shooting: bool,
    /// Hexes travelled before a melee strike.
    pub charged_fields: u32,
}

impl AttackInfo {
    pub fn new(attacker: UnitSnapshot, defender: UnitSnapshot, shooting: bool) -> Self {
        Self {
            attacker,
            defender,
            shooting,
            charged_fields: 0,
        }
    }

    /// The retaliation: roles swapped, always melee.
    pub fn reverse(&self) -> Self {
        Self {
            attacker: self.defender.clone(),
            defender: self.attacker.clone(),
            shooting: false,
            charged_fields: 0,
        }
    }
}

/// Damage range of one strike, ignoring retaliation.
pub fn strike_range(info: &AttackInfo) -> DamageRange {
    let attacker = &info.attacker;
    let defender = &info.defender;
    let count = attacker.count();
    if count <= 0 {
        return DamageRange::ZERO;
    }

    let both = i64::from(attacker.value_of_subtype(BonusType::CreatureDamage, damage_subtype::BOTH));
    let base_min = i64::from(attacker.value_of_subtype(BonusType::CreatureDamage, damage_subtype::MIN)) + both;
    let base_max = i64::from(attacker.value_of_subtype(BonusType::CreatureDamage, damage_subtype::MAX)) + both;

    let attack = i64::from(attacker.value_of_subtype(BonusType::PrimarySkill, primary_skill::ATTACK));
    let defense = i64::from(defender.value_of_subtype(BonusType::PrimarySkill, primary_skill::DEFENSE));

    // Per-mille multiplier: +5% per point of attack advantage (cap +300%),
    // -2.5% per point of defense advantage (cap -70%).
    let mut factor = 1000;
    if attack > defense {
        factor += ((attack - defense) * 50).min(3000);
    } else {
        factor -= ((defense - attack) * 25).min(700);
    }

    let mut divisor = 1;
    if info.shooting {
        let distance = BattleHex::distance(attacker.position(), defender.position());
        if distance > BattleConfig::DISTANCE_PENALTY_RANGE
            && !attacker.has_bonus_of_type(BonusType::NoDistancePenalty)
        {
            divisor *= 2;
        }
    } else if attacker.is_shooter() && !attacker.has_bonus_of_type(BonusType::NoMeleePenalty) {
        divisor *= 2;
    }

    let reduction_subtype = if info.shooting { 1 } else { 0 };
    let reduction = defender
        .value_of(
            &Selector::of_type(BonusType::GeneralDamageReduction)
                .and(Selector::new(move |b| b.subtype == -1 || b.subtype == reduction_subtype)),
        )
        .clamp(0, 100);
    let reduction = i64::from(reduction);

    let scale = |base: i64| -> i64 {
        let raw = base.max(0) * count * factor / 1000 / divisor;
        let reduced = raw * (100 - reduction) / 100;
        if base > 0 && reduction < 100 { reduced.max(1) } else { reduced.max(0) }
    };

    DamageRange::new(scale(base_min), scale(base_max))
}

/// Full estimate of an attack: strike range plus retaliation range.
///
/// Retaliation is computed against the defender after it took the strike:
/// its lower bound after the maximum strike, its upper bound after the
/// minimum strike. No retaliation follows a shot or comes from a defender
/// that cannot retaliate.
pub fn estimate(info: &AttackInfo) -> DamageEstimate {
    let damage = strike_range(info);

    if info.shooting || !info.defender.able_to_retaliate() {
        return DamageEstimate {
            damage,
            retaliation: DamageRange::ZERO,
        };
    }

    let retaliation_after = |dealt: i64| -> DamageRange {
        let mut reversed = info.reverse();
        let mut amount = dealt;
        reversed.attacker.state.damage(&mut amount);
        if !reversed.attacker.alive() {
            return DamageRange::ZERO;
        }
        strike_range(&reversed)
    };

    let weakest = retaliation_after(damage.max);
    let strongest = retaliation_after(damage.min);

    DamageEstimate {
        damage,
        retaliation: DamageRange::new(weakest.min, strongest.max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{creature, snapshot};
    use crate::unit::BattleSide;

    fn melee(attacker: &UnitSnapshot, defender: &UnitSnapshot) -> AttackInfo {
        AttackInfo::new(attacker.clone(), defender.clone(), false)
    }

    #[test]
    fn equal_stats_scale_with_count() {
        let attacker = snapshot(1, creature("Pikeman", 10, 1, 3).with_attack(4).with_defense(4), 10, BattleSide::Attacker, (5, 5));
        let defender = snapshot(2, creature("Pikeman", 10, 1, 3).with_attack(4).with_defense(4), 10, BattleSide::Defender, (6, 5));
        let range = strike_range(&melee(&attacker, &defender));
        assert_eq!(range, DamageRange::new(10, 30));
        assert_eq!(range.midpoint(), 20);
    }

    #[test]
    fn attack_advantage_increases_damage() {
        let attacker = snapshot(1, creature("Swordsman", 35, 6, 9).with_attack(14), 2, BattleSide::Attacker, (5, 5));
        let defender = snapshot(2, creature("Peasant", 1, 1, 1), 100, BattleSide::Defender, (6, 5));
        // +70% from 14 points of advantage.
        assert_eq!(strike_range(&melee(&attacker, &defender)), DamageRange::new(20, 30));
    }

    #[test]
    fn shooter_in_melee_is_halved() {
        let archer = creature("Archer", 10, 2, 4).with_shots(12);
        let attacker = snapshot(1, archer, 10, BattleSide::Attacker, (5, 5));
        let defender = snapshot(2, creature("Dummy", 100, 1, 1), 10, BattleSide::Defender, (6, 5));
        assert_eq!(strike_range(&melee(&attacker, &defender)), DamageRange::new(10, 20));
        let shot = AttackInfo::new(attacker, defender, true);
        assert_eq!(strike_range(&shot), DamageRange::new(20, 40));
    }

    #[test]
    fn long_shots_are_halved() {
        let archer = creature("Archer", 10, 2, 4).with_shots(12);
        let attacker = snapshot(1, archer, 10, BattleSide::Attacker, (1, 5));
        let defender = snapshot(2, creature("Dummy", 100, 1, 1), 10, BattleSide::Defender, (15, 5));
        let shot = AttackInfo::new(attacker, defender, true);
        assert_eq!(strike_range(&shot), DamageRange::new(10, 20));
        assert_eq!(estimate(&shot).retaliation, DamageRange::ZERO);
    }

    #[test]
    fn retaliation_shrinks_with_losses() {
        let attacker = snapshot(1, creature("Grunt", 10, 2, 2), 10, BattleSide::Attacker, (5, 5));
        let defender = snapshot(2, creature("Grunt", 10, 2, 2), 10, BattleSide::Defender, (6, 5));
        let estimate = estimate(&melee(&attacker, &defender));
        assert_eq!(estimate.damage, DamageRange::new(20, 20));
        // Two of ten defenders die before striking back.
        assert_eq!(estimate.retaliation, DamageRange::new(16, 16));
    }
}
