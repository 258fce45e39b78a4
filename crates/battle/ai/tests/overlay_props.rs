//! Overlay invariants under arbitrary mutation sequences.

use std::sync::Arc;

use battle_ai::{HypotheticBattle, ShadowUnit};
use battle_core::bonus::{Bonus, BonusType};
use battle_core::unit::{BattleSide, CreatureType, PlayerId, UnitId};
use battle_core::{Battle, BattleHex, BattleState, BattleView};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Add(u32, i32),
    Update(u32, i32),
    Remove(u32, i32),
    Damage(u32, i64),
    Kill(u32),
    NextRound,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..4, 1i32..5).prop_map(|(u, v)| Op::Add(u, v)),
        (0u32..4, 1i32..5).prop_map(|(u, v)| Op::Update(u, v)),
        (0u32..4, 1i32..5).prop_map(|(u, v)| Op::Remove(u, v)),
        (0u32..4, 0i64..60).prop_map(|(u, d)| Op::Damage(u, d)),
        (0u32..4).prop_map(Op::Kill),
        Just(Op::NextRound),
    ]
}

fn battle() -> Battle {
    let mut battle = Battle::new(PlayerId(0), PlayerId(1));
    let creature = Arc::new(CreatureType::new(1, "Pikeman", 1, 10).with_damage(1, 3).with_speed(4));
    battle.spawn(creature.clone(), 5, BattleSide::Attacker, BattleHex::new(2, 2));
    battle.spawn(creature.clone(), 5, BattleSide::Attacker, BattleHex::new(2, 6));
    battle.spawn(creature.clone(), 5, BattleSide::Defender, BattleHex::new(14, 2));
    battle.spawn(creature, 5, BattleSide::Defender, BattleHex::new(14, 6));
    battle
}

fn apply(state: &mut HypotheticBattle<'_>, op: &Op) {
    let bonus = |value| Bonus::ability(BonusType::CreatureDamage, value);
    match *op {
        Op::Add(unit, value) => state.add_bonuses(UnitId(unit), &[bonus(value)]),
        Op::Update(unit, value) => state.update_bonuses(UnitId(unit), &[bonus(value)]),
        Op::Remove(unit, value) => state.remove_bonuses(UnitId(unit), &[bonus(value)]),
        Op::Damage(unit, mut amount) => {
            if let Some(shadow) = state.get_for_update(UnitId(unit)) {
                shadow.state.damage(&mut amount);
            }
        }
        Op::Kill(unit) => state.remove_unit(UnitId(unit)),
        Op::NextRound => state.next_round(),
    }
}

proptest! {
    #[test]
    fn tree_version_never_goes_back(ops in prop::collection::vec(op(), 1..40)) {
        let battle = battle();
        let mut state = HypotheticBattle::new(&battle);
        let mut last = state.tree_version();
        for op in &ops {
            apply(&mut state, op);
            let now = state.tree_version();
            prop_assert!(now >= last, "{op:?} moved the version from {last} to {now}");
            last = now;
        }
    }

    #[test]
    fn the_subject_is_never_touched(ops in prop::collection::vec(op(), 1..40)) {
        let battle = battle();
        let before: Vec<_> = battle.units_if(&|_| true);
        let version = battle.tree_version();
        {
            let mut state = HypotheticBattle::new(&battle);
            for op in &ops {
                apply(&mut state, op);
            }
        }
        prop_assert_eq!(battle.tree_version(), version);
        prop_assert_eq!(battle.units_if(&|_| true), before);
    }

    #[test]
    fn get_for_update_returns_the_same_record(unit in 0u32..4, amount in 1i64..40) {
        let battle = battle();
        let mut state = HypotheticBattle::new(&battle);
        let first = state.get_for_update(UnitId(unit)).map(|s| s as *const ShadowUnit as usize);
        if let Some(shadow) = state.get_for_update(UnitId(unit)) {
            let mut amount = amount;
            shadow.state.damage(&mut amount);
        }
        let second = state.get_for_update(UnitId(unit)).map(|s| s as *const ShadowUnit as usize);
        prop_assert_eq!(first, second);
        prop_assert_eq!(
            state.unit(UnitId(unit)).map(|u| u.state.available_health()),
            Some(50 - amount)
        );
    }
}
