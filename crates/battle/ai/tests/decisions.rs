//! End-to-end decisions against battles built from the shipped content.

use std::path::PathBuf;
use std::sync::Arc;

use battle_ai::{AttackPossibility, BattleAi, BattleController, LocalController};
use battle_content::{Catalog, ContentFactory};
use battle_core::spell::{Destination, Hero, SpellId};
use battle_core::unit::{BattleSide, CreatureType, PlayerId, UnitId};
use battle_core::{AttackInfo, Battle, BattleAction, BattleConfig, BattleHex, BattleState, BattleView};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn catalog() -> Catalog {
    let data = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../content/data");
    ContentFactory::new(data).load_catalog().expect("catalog")
}

fn creature(catalog: &Catalog, name: &str) -> Arc<CreatureType> {
    catalog.creature_named(name).expect(name).clone()
}

fn ai(catalog: &Catalog) -> BattleAi {
    let config = BattleConfig {
        worker_threads: Some(2),
        ..BattleConfig::default()
    };
    BattleAi::new(PlayerId(0), config, catalog.spells.clone())
}

#[test]
fn midpoint_exchange_and_friendly_fire() {
    let mut battle = Battle::new(PlayerId(0), PlayerId(1));
    let hitter = CreatureType::new(1, "Hitter", 1, 1000).with_damage(8, 12);
    let target = CreatureType::new(2, "Target", 1, 1000).with_damage(4, 6);
    let a = battle.spawn(Arc::new(hitter), 1, BattleSide::Attacker, BattleHex::new(5, 5));
    let enemy = battle.spawn(Arc::new(target.clone()), 1, BattleSide::Defender, BattleHex::new(6, 5));
    let ally = battle.spawn(Arc::new(target), 1, BattleSide::Attacker, BattleHex::new(5, 6));

    let attacker = battle.unit(a).expect("attacker");
    let against_enemy = AttackInfo::new(attacker.clone(), battle.unit(enemy).expect("enemy"), false);
    let possibility = AttackPossibility::evaluate(&battle, &against_enemy, attacker.position());
    assert_eq!(possibility.damage_diff(), 5);

    let against_ally = AttackInfo::new(attacker.clone(), battle.unit(ally).expect("ally"), false);
    let possibility = AttackPossibility::evaluate(&battle, &against_ally, attacker.position());
    assert_eq!(possibility.damage_diff(), -15);
}

#[test]
fn catapult_falls_back_to_defend() {
    init_tracing();
    let catalog = catalog();
    let mut battle = Battle::new(PlayerId(0), PlayerId(1));
    catalog.register_creatures(&mut battle);
    let catapult = battle.spawn(creature(&catalog, "Catapult"), 1, BattleSide::Attacker, BattleHex::new(1, 8));
    battle.spawn(creature(&catalog, "Goblin"), 10, BattleSide::Defender, BattleHex::new(15, 5));

    let mut controller = LocalController::new(&mut battle, &catalog.spells, 1);
    let action = ai(&catalog).active_unit(&mut controller, catapult);
    assert_eq!(action, BattleAction::Defend { unit: catapult });
    assert!(controller.submitted().is_empty());
}

#[test]
fn first_aid_tent_heals_the_most_wounded_ally() {
    init_tracing();
    let catalog = catalog();
    let mut battle = Battle::new(PlayerId(0), PlayerId(1));
    catalog.register_creatures(&mut battle);
    let tent = battle.spawn(creature(&catalog, "First Aid Tent"), 1, BattleSide::Attacker, BattleHex::new(1, 1));
    let lightly = battle.spawn(creature(&catalog, "Swordsman"), 5, BattleSide::Attacker, BattleHex::new(3, 3));
    let badly = battle.spawn(creature(&catalog, "Swordsman"), 5, BattleSide::Attacker, BattleHex::new(3, 7));
    let enemy = battle.spawn(creature(&catalog, "Orc"), 5, BattleSide::Defender, BattleHex::new(15, 5));

    let wound = |battle: &mut Battle, id: UnitId, mut amount: i64| {
        let mut state = battle.unit(id).expect("unit").state;
        state.damage(&mut amount);
        battle.update_unit(id, &state.save());
    };
    wound(&mut battle, lightly, 5);
    wound(&mut battle, badly, 20);
    wound(&mut battle, enemy, 14);

    let mut controller = LocalController::new(&mut battle, &catalog.spells, 1);
    let action = ai(&catalog).active_unit(&mut controller, tent);
    assert_eq!(action, BattleAction::Heal { caster: tent, target: badly });
}

#[test]
fn first_aid_tent_defends_when_nobody_is_hurt() {
    let catalog = catalog();
    let mut battle = Battle::new(PlayerId(0), PlayerId(1));
    catalog.register_creatures(&mut battle);
    let tent = battle.spawn(creature(&catalog, "First Aid Tent"), 1, BattleSide::Attacker, BattleHex::new(1, 1));
    battle.spawn(creature(&catalog, "Swordsman"), 5, BattleSide::Attacker, BattleHex::new(3, 3));
    battle.spawn(creature(&catalog, "Orc"), 5, BattleSide::Defender, BattleHex::new(15, 5));

    let mut controller = LocalController::new(&mut battle, &catalog.spells, 1);
    let action = ai(&catalog).active_unit(&mut controller, tent);
    assert_eq!(action, BattleAction::Defend { unit: tent });
}

#[test]
fn hero_casts_magic_arrow_before_attacking() {
    init_tracing();
    let catalog = catalog();
    let arrow = catalog.spell(SpellId(15)).expect("magic arrow").id;
    let mut battle = Battle::new(PlayerId(0), PlayerId(1));
    catalog.register_creatures(&mut battle);
    let pikemen = battle.spawn(creature(&catalog, "Pikeman"), 10, BattleSide::Attacker, BattleHex::new(5, 5));
    let goblins = battle.spawn(creature(&catalog, "Goblin"), 20, BattleSide::Defender, BattleHex::new(7, 5));

    let mut hero = Hero::new("Orrin", PlayerId(0), BattleSide::Attacker);
    hero.mana = 10;
    hero.spellbook.push(arrow);
    battle.set_hero(hero);

    let mut controller = LocalController::new(&mut battle, &catalog.spells, 1);
    let action = ai(&catalog).active_unit(&mut controller, pikemen);

    assert_eq!(
        controller.submitted(),
        &[BattleAction::HeroSpell {
            side: BattleSide::Attacker,
            spell: arrow,
            destination: vec![Destination::hex(BattleHex::new(7, 5))],
        }]
    );
    assert_eq!(controller.reports()[0].affected, vec![goblins]);
    assert!(matches!(
        action,
        BattleAction::MeleeAttack { attacker, defender, .. } if attacker == pikemen && defender == goblins
    ));
    let remaining = controller.battle().unit(goblins).map(|u| u.count());
    assert!(remaining.is_some_and(|count| count < 20));
}

#[test]
fn hero_without_mana_does_not_cast() {
    let catalog = catalog();
    let mut battle = Battle::new(PlayerId(0), PlayerId(1));
    catalog.register_creatures(&mut battle);
    let pikemen = battle.spawn(creature(&catalog, "Pikeman"), 10, BattleSide::Attacker, BattleHex::new(5, 5));
    battle.spawn(creature(&catalog, "Goblin"), 20, BattleSide::Defender, BattleHex::new(7, 5));

    let mut hero = Hero::new("Orrin", PlayerId(0), BattleSide::Attacker);
    hero.spellbook.push(SpellId(15));
    battle.set_hero(hero);

    let mut controller = LocalController::new(&mut battle, &catalog.spells, 1);
    let action = ai(&catalog).active_unit(&mut controller, pikemen);
    assert!(controller.submitted().is_empty());
    assert!(matches!(action, BattleAction::MeleeAttack { .. }));
}
