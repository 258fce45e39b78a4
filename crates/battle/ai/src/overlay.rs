//! Hypothetical battle overlay.
//!
//! [`HypotheticBattle`] answers every [`BattleView`] query from an underlying
//! battle, except for units that were touched: those are served from a
//! private [`ShadowUnit`]. All [`BattleState`] mutations land on shadows, so
//! the AI can replay casts and attacks without affecting the real battle.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use battle_core::battle::{BattleState, BattleView, Obstacle, SideInfo};
use battle_core::bonus::{Bonus, BonusDuration, BonusKey, BonusList, BonusSource, BonusType, Selector};
use battle_core::change::UnitInfo;
use battle_core::combat::AttackInfo;
use battle_core::error::StateError;
use battle_core::hex::BattleHex;
use battle_core::unit::{
    BattleSide, CreatureId, CreatureType, PersistedUnitState, SlotId, UnitBonuses, UnitDefinition,
    UnitFlags, UnitId, UnitSnapshot, UnitState,
};

/// Speculative copy of one unit.
///
/// The bonus set is kept as the list seen when the shadow was created plus
/// three deltas. The effective list is
///
/// ```text
/// effective = (base - removed) ⊕ updated + added
/// ```
///
/// where `⊕` extends an equivalent spell effect instead of stacking it.
#[derive(Clone, Debug)]
pub struct ShadowUnit {
    pub state: UnitState,
    base: BonusList,
    to_add: BonusList,
    to_update: BonusList,
    to_remove: BTreeSet<BonusKey>,
}

impl ShadowUnit {
    fn new(state: UnitState, base: BonusList) -> Self {
        Self {
            state,
            base,
            to_add: BonusList::new(),
            to_update: BonusList::new(),
            to_remove: BTreeSet::new(),
        }
    }

    fn from_snapshot(snapshot: UnitSnapshot) -> Self {
        Self::new(snapshot.state, snapshot.bonuses.list)
    }

    /// Bonuses in effect for the shadowed unit.
    pub fn bonuses(&self) -> BonusList {
        let mut list = self.base.clone();
        if !self.to_remove.is_empty() {
            list.retain(|b| !self.to_remove.contains(&b.key()));
        }
        for bonus in &self.to_update {
            list.refresh_or_push(bonus.clone());
        }
        list.extend(self.to_add.iter().cloned());
        list
    }

    pub fn added_bonuses(&self) -> &BonusList {
        &self.to_add
    }

    pub fn updated_bonuses(&self) -> &BonusList {
        &self.to_update
    }

    pub fn removed_bonuses(&self) -> impl Iterator<Item = &BonusKey> {
        self.to_remove.iter()
    }

    fn add(&mut self, bonuses: &[Bonus]) {
        self.to_add.extend(bonuses.iter().cloned());
    }

    fn update(&mut self, bonuses: &[Bonus]) {
        for bonus in bonuses {
            // An effect added through this overlay is refreshed in place.
            if let Some(existing) = self.to_add.iter_mut().find(|b| b.same_effect(bonus)) {
                existing.turns_remain = existing.turns_remain.max(bonus.turns_remain);
            } else {
                self.to_update.refresh_or_push(bonus.clone());
            }
        }
    }

    fn remove(&mut self, bonuses: &[Bonus]) {
        let keys: Vec<BonusKey> = bonuses.iter().map(Bonus::key).collect();
        self.to_add.remove_keys(&keys);
        self.to_update.remove_keys(&keys);
        self.to_remove.extend(keys);
    }

    /// Removes every effective bonus matching `selector`. Returns how many
    /// went away.
    fn remove_matching(&mut self, selector: &Selector) -> usize {
        let mut removed = self.to_add.remove_matching(selector) + self.to_update.remove_matching(selector);
        for bonus in self.base.iter().filter(|b| selector.matches(b)) {
            if self.to_remove.insert(bonus.key()) {
                removed += 1;
            }
        }
        removed
    }

    fn age_one_round(&mut self) {
        self.base.age_one_round();
        self.to_update.age_one_round();
        self.to_add.age_one_round();
    }
}

/// Copy-on-write view over a battle, private to one evaluation.
pub struct HypotheticBattle<'a> {
    subject: &'a dyn BattleView,
    shadows: BTreeMap<UnitId, Box<ShadowUnit>>,
    obstacles: Option<Vec<Obstacle>>,
    sides: Option<[SideInfo; 2]>,
    rounds_passed: i32,
    /// Local bonus tree version, added to the subject's.
    version: i64,
    next_unit: u32,
    next_obstacle: u32,
}

impl<'a> HypotheticBattle<'a> {
    pub fn new(subject: &'a dyn BattleView) -> Self {
        Self {
            subject,
            shadows: BTreeMap::new(),
            obstacles: None,
            sides: None,
            rounds_passed: 0,
            version: 1,
            next_unit: subject.next_unit_id().0,
            next_obstacle: subject.next_obstacle_id(),
        }
    }

    /// Battle the overlay reads through to.
    pub fn subject(&self) -> &'a dyn BattleView {
        self.subject
    }

    /// Shadow record of `id`, created from the underlying battle on first
    /// access. Later calls return the same record.
    pub fn get_for_update(&mut self, id: UnitId) -> Option<&mut ShadowUnit> {
        if !self.shadows.contains_key(&id) {
            let Some(snapshot) = self.subject.unit(id) else {
                StateError::UnknownUnit(id).log();
                return None;
            };
            self.shadows.insert(id, Box::new(ShadowUnit::from_snapshot(snapshot)));
        }
        self.shadows.get_mut(&id).map(|shadow| &mut **shadow)
    }

    /// Shadow record of `id`, if the unit was touched.
    pub fn shadow(&self, id: UnitId) -> Option<&ShadowUnit> {
        self.shadows.get(&id).map(|shadow| &**shadow)
    }

    /// Deterministic damage of an attack: the midpoint of its range.
    pub fn actual_damage(&self, info: &AttackInfo) -> i64 {
        self.estimate_damage(info).damage.midpoint()
    }

    /// Every non-ghost unit with shadows substituted, in id order.
    fn merged_units(&self) -> Vec<UnitSnapshot> {
        let version = self.tree_version();
        let mut units = self.subject.units_if(&|u| !self.shadows.contains_key(&u.id()));
        for unit in &mut units {
            unit.bonuses.version = version;
        }
        units.extend(
            self.shadows
                .values()
                .filter(|shadow| !shadow.state.is_ghost())
                .map(|shadow| UnitSnapshot::new(shadow.state.clone(), UnitBonuses::new(shadow.bonuses(), version))),
        );
        units.sort_by_key(UnitSnapshot::id);

        let cart = Selector::of_type(BonusType::AmmoCart);
        let carts = BattleSide::BOTH.map(|side| {
            units
                .iter()
                .any(|u| u.side() == side && u.alive() && u.bonuses.list.any(&cart))
        });
        for unit in &mut units {
            unit.bonuses.ammo_cart = carts[unit.side().index()];
        }
        units
    }

    fn sides_mut(&mut self) -> &mut [SideInfo; 2] {
        let subject = self.subject;
        self.sides
            .get_or_insert_with(|| BattleSide::BOTH.map(|side| subject.side_info(side)))
    }

    fn obstacles_mut(&mut self) -> &mut Vec<Obstacle> {
        let subject = self.subject;
        self.obstacles.get_or_insert_with(|| subject.obstacles())
    }

    fn unit_exists(&self, id: UnitId) -> bool {
        self.shadows.contains_key(&id) || self.subject.unit(id).is_some()
    }
}

impl BattleView for HypotheticBattle<'_> {
    fn unit(&self, id: UnitId) -> Option<UnitSnapshot> {
        self.merged_units().into_iter().find(|u| u.id() == id)
    }

    fn units_if(&self, predicate: &dyn Fn(&UnitSnapshot) -> bool) -> Vec<UnitSnapshot> {
        self.merged_units().into_iter().filter(|u| predicate(u)).collect()
    }

    fn obstacles(&self) -> Vec<Obstacle> {
        match &self.obstacles {
            Some(obstacles) => obstacles.clone(),
            None => self.subject.obstacles(),
        }
    }

    fn creature(&self, id: CreatureId) -> Option<Arc<CreatureType>> {
        self.subject.creature(id)
    }

    fn side_info(&self, side: BattleSide) -> SideInfo {
        match &self.sides {
            Some(sides) => sides[side.index()].clone(),
            None => self.subject.side_info(side),
        }
    }

    fn round(&self) -> i32 {
        self.subject.round() + self.rounds_passed
    }

    fn tree_version(&self) -> i64 {
        self.subject.tree_version() + self.version
    }

    fn next_unit_id(&self) -> UnitId {
        UnitId(self.next_unit)
    }

    fn next_obstacle_id(&self) -> u32 {
        self.next_obstacle
    }
}

impl BattleState for HypotheticBattle<'_> {
    fn as_view(&self) -> &dyn BattleView {
        self
    }

    fn next_round(&mut self) {
        self.rounds_passed += 1;
        for side in self.sides_mut().iter_mut() {
            side.cast_this_round = false;
        }

        let lifetime = Selector::of_type(BonusType::None).and(Selector::source_type(BonusSource::SpellEffect));
        let ids: Vec<UnitId> = self.units_if(&|_| true).iter().map(UnitSnapshot::id).collect();
        for id in ids {
            let Some(shadow) = self.get_for_update(id) else {
                continue;
            };
            shadow.state.after_new_round();
            shadow.age_one_round();
            if shadow.state.is_clone() && shadow.state.alive() && !shadow.bonuses().any(&lifetime) {
                let mut amount = 1;
                shadow.state.damage(&mut amount);
            }
        }

        self.obstacles_mut().retain_mut(|o| !o.tick());
        self.version += 1;
    }

    fn next_turn(&mut self, unit: UnitId) {
        let Some(shadow) = self.get_for_update(unit) else {
            return;
        };
        shadow.state.after_gets_turn();
        let removed = shadow.remove_matching(&Selector::duration(BonusDuration::STACK_GETS_TURN));
        if removed > 0 {
            self.version += 1;
        }
    }

    fn add_unit(&mut self, info: &UnitInfo) {
        let Some(creature) = self.subject.creature(info.creature) else {
            StateError::UnknownCreature(info.creature).log();
            return;
        };
        if self.unit_exists(info.id) {
            StateError::DuplicateUnit(info.id).log();
            return;
        }
        let definition = Arc::new(UnitDefinition {
            id: info.id,
            creature: creature.clone(),
            side: info.side,
            owner: self.side_player(info.side),
            base_amount: info.count,
            slot: SlotId::SUMMONED,
        });
        let mut state = UnitState::new(definition).at(info.position);
        state.flags.set(UnitFlags::SUMMONED, info.summoned);
        state.flags.set(UnitFlags::CLONED, info.cloned);

        self.next_unit = self.next_unit.max(info.id.0 + 1);
        self.shadows
            .insert(info.id, Box::new(ShadowUnit::new(state, creature.abilities.clone())));
        self.version += 1;
    }

    fn update_unit(&mut self, id: UnitId, data: &PersistedUnitState) {
        if let Some(shadow) = self.get_for_update(id) {
            shadow.state.load(data);
        }
    }

    fn remove_unit(&mut self, id: UnitId) {
        let Some(shadow) = self.get_for_update(id) else {
            return;
        };
        shadow.state.make_ghost();
        if shadow.state.is_clone() {
            let linked: Vec<UnitId> = self
                .units_if(&|u| u.state.clone_id == Some(id))
                .iter()
                .map(UnitSnapshot::id)
                .collect();
            for other in linked {
                if let Some(shadow) = self.get_for_update(other) {
                    shadow.state.clone_id = None;
                }
            }
        }
        self.version += 1;
    }

    fn move_unit(&mut self, id: UnitId, destination: BattleHex) {
        if let Some(shadow) = self.get_for_update(id) {
            shadow.state.position = destination;
        }
    }

    fn add_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]) {
        if let Some(shadow) = self.get_for_update(id) {
            shadow.add(bonuses);
            self.version += 1;
        }
    }

    fn update_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]) {
        if let Some(shadow) = self.get_for_update(id) {
            shadow.update(bonuses);
            self.version += 1;
        }
    }

    fn remove_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]) {
        if let Some(shadow) = self.get_for_update(id) {
            shadow.remove(bonuses);
            self.version += 1;
        }
    }

    fn add_obstacle(&mut self, obstacle: &Obstacle) {
        self.next_obstacle = self.next_obstacle.max(obstacle.id + 1);
        self.obstacles_mut().push(obstacle.clone());
    }

    fn update_obstacle(&mut self, obstacle: &Obstacle) {
        match self.obstacles_mut().iter_mut().find(|o| o.id == obstacle.id) {
            Some(existing) => *existing = obstacle.clone(),
            None => StateError::UnknownObstacle(obstacle.id).log(),
        }
    }

    fn remove_obstacle(&mut self, id: u32) {
        let obstacles = self.obstacles_mut();
        let before = obstacles.len();
        obstacles.retain(|o| o.id != id);
        if obstacles.len() == before {
            StateError::UnknownObstacle(id).log();
        }
    }

    fn spend_mana(&mut self, side: BattleSide, amount: i32) {
        let info = &mut self.sides_mut()[side.index()];
        if let Some(hero) = info.hero.as_mut() {
            hero.mana = (hero.mana - amount).max(0);
        }
        info.cast_this_round = true;
    }
}

#[cfg(test)]
mod tests {
    use battle_core::bonus::BonusBearer;
    use battle_core::unit::{CreatureType, PlayerId};
    use battle_core::Battle;

    use super::*;

    fn battle() -> (Battle, UnitId, UnitId) {
        let mut battle = Battle::new(PlayerId(0), PlayerId(1));
        let pikeman = CreatureType::new(1, "Pikeman", 1, 10).with_damage(1, 3).with_speed(4);
        let goblin = CreatureType::new(2, "Goblin", 1, 5).with_damage(1, 2).with_speed(5);
        let a = battle.spawn(Arc::new(pikeman), 10, BattleSide::Attacker, BattleHex::new(1, 5));
        let d = battle.spawn(Arc::new(goblin), 20, BattleSide::Defender, BattleHex::new(15, 5));
        (battle, a, d)
    }

    fn bless(turns: i32) -> Bonus {
        Bonus::new(BonusDuration::N_TURNS, BonusType::PrimarySkill, BonusSource::SpellEffect, 3)
            .with_source_id(41)
            .with_turns(turns)
    }

    #[test]
    fn get_for_update_is_memoized() {
        let (battle, a, _) = battle();
        let mut overlay = HypotheticBattle::new(&battle);
        let first: *const ShadowUnit = overlay.get_for_update(a).expect("shadow");
        let second: *const ShadowUnit = overlay.get_for_update(a).expect("shadow");
        assert!(std::ptr::eq(first, second));
        assert!(overlay.get_for_update(UnitId(42)).is_none());
    }

    #[test]
    fn mutations_stay_in_the_overlay() {
        let (battle, a, d) = battle();
        let mut overlay = HypotheticBattle::new(&battle);
        overlay.move_unit(a, BattleHex::new(4, 4));
        let mut state = overlay.unit(d).expect("defender").state;
        let mut amount = 30;
        state.damage(&mut amount);
        overlay.update_unit(d, &state.save());

        assert_eq!(overlay.unit(a).map(|u| u.position()), Some(BattleHex::new(4, 4)));
        assert_eq!(overlay.unit(d).map(|u| u.count()), Some(14));
        assert_eq!(battle.unit(a).map(|u| u.position()), Some(BattleHex::new(1, 5)));
        assert_eq!(battle.unit(d).map(|u| u.count()), Some(20));
    }

    #[test]
    fn ghosts_are_hidden() {
        let (battle, a, d) = battle();
        let mut overlay = HypotheticBattle::new(&battle);
        overlay.remove_unit(d);
        let ids: Vec<UnitId> = overlay.units_if(&|_| true).iter().map(UnitSnapshot::id).collect();
        assert_eq!(ids, vec![a]);
        assert!(overlay.unit(d).is_none());
        assert_eq!(overlay.winner(), Some(BattleSide::Attacker));
        assert_eq!(battle.winner(), None);
    }

    #[test]
    fn bonus_deltas_combine_like_the_store() {
        let (mut battle, a, _) = battle();
        battle.add_bonuses(a, &[bless(2)]);
        let spell = Selector::source(BonusSource::SpellEffect, 41);

        let mut overlay = HypotheticBattle::new(&battle);
        overlay.update_bonuses(a, &[bless(5)]);
        let unit = overlay.unit(a).expect("unit");
        let effects = unit.bonuses(&spell);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.iter().next().map(|b| b.turns_remain), Some(5));

        overlay.remove_bonuses(a, &[bless(1)]);
        assert!(!overlay.unit(a).expect("unit").has_bonus(&spell));
        overlay.add_bonuses(a, &[bless(1)]);
        assert!(overlay.unit(a).expect("unit").has_bonus(&spell));

        let shadow = overlay.shadow(a).expect("shadow");
        assert_eq!(shadow.added_bonuses().len(), 1);
        assert_eq!(shadow.removed_bonuses().count(), 1);
        assert!(battle.unit(a).expect("unit").has_bonus(&spell));
    }

    #[test]
    fn tree_version_layers_on_the_subject() {
        let (battle, a, _) = battle();
        let mut overlay = HypotheticBattle::new(&battle);
        let start = overlay.tree_version();
        assert!(start > battle.tree_version());
        overlay.add_bonuses(a, &[bless(1)]);
        assert_eq!(overlay.tree_version(), start + 1);
        assert_eq!(overlay.unit(a).map(|u| u.bonuses.version), Some(start + 1));
    }

    #[test]
    fn rounds_age_shadowed_bonuses() {
        let (mut battle, a, _) = battle();
        battle.add_bonuses(a, &[bless(1)]);
        let mut overlay = HypotheticBattle::new(&battle);
        overlay.next_round();
        let spell = Selector::source(BonusSource::SpellEffect, 41);
        assert!(!overlay.unit(a).expect("unit").has_bonus(&spell));
        assert_eq!(overlay.round(), battle.round() + 1);
        assert!(battle.unit(a).expect("unit").has_bonus(&spell));
    }

    #[test]
    fn added_units_get_fresh_ids() {
        let (battle, a, _) = battle();
        let mut overlay = HypotheticBattle::new(&battle);
        let id = overlay.next_unit_id();
        let creature = battle.unit(a).expect("unit").state.definition().creature.id;
        overlay.add_unit(&UnitInfo {
            id,
            creature,
            count: 3,
            side: BattleSide::Attacker,
            position: BattleHex::new(2, 2),
            summoned: true,
            cloned: false,
        });
        let summoned = overlay.unit(id).expect("summoned");
        assert!(summoned.state.is_summoned());
        assert_eq!(summoned.owner(), PlayerId(0));
        assert_eq!(overlay.next_unit_id(), UnitId(id.0 + 1));
        assert!(battle.unit(id).is_none());
    }

    #[test]
    fn mana_is_spent_on_the_copy() {
        let (mut battle, _, _) = battle();
        let mut hero = battle_core::spell::Hero::new("Orrin", PlayerId(0), BattleSide::Attacker);
        hero.mana = 10;
        battle.set_hero(hero);
        let mut overlay = HypotheticBattle::new(&battle);
        overlay.spend_mana(BattleSide::Attacker, 4);
        assert_eq!(overlay.hero(BattleSide::Attacker).map(|h| h.mana), Some(6));
        assert!(overlay.side_info(BattleSide::Attacker).cast_this_round);
        assert_eq!(battle.hero(BattleSide::Attacker).map(|h| h.mana), Some(10));
    }
}
