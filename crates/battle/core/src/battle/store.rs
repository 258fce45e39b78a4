use std::collections::BTreeMap;
use std::sync::Arc;

use super::{BattleState, BattleView, Obstacle, SideInfo};
use crate::bonus::{Bonus, BonusDuration, BonusKey, BonusList, BonusSource, BonusType, Selector};
use crate::change::UnitInfo;
use crate::config::BattleConfig;
use crate::error::StateError;
use crate::hex::BattleHex;
use crate::spell::Hero;
use crate::unit::{
    BattleSide, CreatureId, CreatureType, PersistedUnitState, PlayerId, SlotId, UnitBonuses,
    UnitDefinition, UnitFlags, UnitId, UnitSnapshot, UnitState,
};

#[derive(Clone, Debug)]
struct UnitEntry {
    state: UnitState,
    bonuses: BonusList,
}

/// Authoritative battle store.
///
/// Units are keyed by id and never deleted: removal turns them into ghosts so
/// ids stay stable for the whole battle.
#[derive(Clone, Debug)]
pub struct Battle {
    config: BattleConfig,
    units: BTreeMap<UnitId, UnitEntry>,
    obstacles: Vec<Obstacle>,
    sides: [SideInfo; 2],
    creatures: BTreeMap<CreatureId, Arc<CreatureType>>,
    round: i32,
    tree_version: i64,
    next_unit: u32,
    next_obstacle: u32,
}

impl Battle {
    pub fn new(attacker: PlayerId, defender: PlayerId) -> Self {
        Self {
            config: BattleConfig::default(),
            units: BTreeMap::new(),
            obstacles: Vec::new(),
            sides: [SideInfo::new(attacker), SideInfo::new(defender)],
            creatures: BTreeMap::new(),
            round: 0,
            tree_version: 1,
            next_unit: 0,
            next_obstacle: 0,
        }
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn register_creature(&mut self, creature: Arc<CreatureType>) {
        self.creatures.insert(creature.id, creature);
    }

    pub fn set_hero(&mut self, hero: Hero) {
        let side = hero.side.index();
        self.sides[side].hero = Some(hero);
    }

    /// Places a stack from an army slot. The creature is registered if the
    /// catalog does not know it yet.
    pub fn spawn(
        &mut self,
        creature: Arc<CreatureType>,
        count: i64,
        side: BattleSide,
        position: BattleHex,
    ) -> UnitId {
        let id = UnitId(self.next_unit);
        self.creatures.entry(creature.id).or_insert_with(|| creature.clone());
        let slot = self.units.values().filter(|e| e.state.side() == side).count() as i32;
        let definition = Arc::new(UnitDefinition {
            id,
            creature: creature.clone(),
            side,
            owner: self.sides[side.index()].player,
            base_amount: count,
            slot: SlotId(slot),
        });
        self.insert(UnitState::new(definition).at(position), creature.abilities.clone());
        id
    }

    pub fn unit_state(&self, id: UnitId) -> Option<&UnitState> {
        self.units.get(&id).map(|e| &e.state)
    }

    pub fn unit_bonuses(&self, id: UnitId) -> Option<&BonusList> {
        self.units.get(&id).map(|e| &e.bonuses)
    }

    /// Transient units that died and wait for the consistency pass.
    pub fn pending_removals(&self) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|e| e.state.is_ghost_pending())
            .map(|e| e.state.id())
            .collect()
    }

    /// Consistency pass: removes every ghost-pending unit. Returns the ids
    /// that were removed.
    pub fn remove_pending(&mut self) -> Vec<UnitId> {
        let pending = self.pending_removals();
        for id in &pending {
            self.remove_unit(*id);
        }
        pending
    }

    /// Strips individuals restored for this battle only.
    pub fn end_battle(&mut self) {
        for entry in self.units.values_mut() {
            entry.state.take_resurrected();
        }
    }

    fn insert(&mut self, state: UnitState, bonuses: BonusList) {
        let id = state.id();
        if self.units.contains_key(&id) {
            StateError::DuplicateUnit(id).log();
            return;
        }
        self.next_unit = self.next_unit.max(id.0 + 1);
        self.units.insert(id, UnitEntry { state, bonuses });
        self.tree_version += 1;
    }

    fn entry_mut(&mut self, id: UnitId) -> Option<&mut UnitEntry> {
        let entry = self.units.get_mut(&id);
        if entry.is_none() {
            StateError::UnknownUnit(id).log();
        }
        entry
    }

    fn has_ammo_cart(&self, side: BattleSide) -> bool {
        self.units.values().any(|e| {
            e.state.side() == side
                && e.state.alive()
                && e.bonuses.any(&Selector::of_type(BonusType::AmmoCart))
        })
    }

    fn snapshot(&self, entry: &UnitEntry) -> UnitSnapshot {
        let mut bonuses = UnitBonuses::new(entry.bonuses.clone(), self.tree_version);
        bonuses.ammo_cart = self.has_ammo_cart(entry.state.side());
        UnitSnapshot::new(entry.state.clone(), bonuses)
    }
}

impl BattleView for Battle {
    fn unit(&self, id: UnitId) -> Option<UnitSnapshot> {
        self.units
            .get(&id)
            .filter(|e| !e.state.is_ghost())
            .map(|e| self.snapshot(e))
    }

    fn units_if(&self, predicate: &dyn Fn(&UnitSnapshot) -> bool) -> Vec<UnitSnapshot> {
        self.units
            .values()
            .filter(|e| !e.state.is_ghost())
            .map(|e| self.snapshot(e))
            .filter(|u| predicate(u))
            .collect()
    }

    fn obstacles(&self) -> Vec<Obstacle> {
        self.obstacles.clone()
    }

    fn creature(&self, id: CreatureId) -> Option<Arc<CreatureType>> {
        self.creatures.get(&id).cloned()
    }

    fn side_info(&self, side: BattleSide) -> SideInfo {
        self.sides[side.index()].clone()
    }

    fn round(&self) -> i32 {
        self.round
    }

    fn tree_version(&self) -> i64 {
        self.tree_version
    }

    fn next_unit_id(&self) -> UnitId {
        UnitId(self.next_unit)
    }

    fn next_obstacle_id(&self) -> u32 {
        self.next_obstacle
    }
}

impl BattleState for Battle {
    fn as_view(&self) -> &dyn BattleView {
        self
    }

    fn next_round(&mut self) {
        self.round += 1;
        for side in &mut self.sides {
            side.cast_this_round = false;
        }

        let lifetime = Selector::of_type(BonusType::None).and(Selector::source_type(BonusSource::SpellEffect));
        for entry in self.units.values_mut() {
            entry.state.after_new_round();
            entry.bonuses.age_one_round();
            if entry.state.is_clone() && entry.state.alive() && !entry.bonuses.any(&lifetime) {
                tracing::debug!(unit = %entry.state.id(), "clone expired");
                let mut amount = 1;
                entry.state.damage(&mut amount);
            }
        }

        self.obstacles.retain_mut(|o| !o.tick());
        self.tree_version += 1;
    }

    fn next_turn(&mut self, unit: UnitId) {
        let Some(entry) = self.entry_mut(unit) else {
            return;
        };
        entry.state.after_gets_turn();
        let removed = entry
            .bonuses
            .remove_matching(&Selector::duration(BonusDuration::STACK_GETS_TURN));
        if removed > 0 {
            self.tree_version += 1;
        }
    }

    fn add_unit(&mut self, info: &UnitInfo) {
        let Some(creature) = self.creatures.get(&info.creature).cloned() else {
            StateError::UnknownCreature(info.creature).log();
            return;
        };
        let definition = Arc::new(UnitDefinition {
            id: info.id,
            creature: creature.clone(),
            side: info.side,
            owner: self.sides[info.side.index()].player,
            base_amount: info.count,
            slot: SlotId::SUMMONED,
        });
        let mut state = UnitState::new(definition).at(info.position);
        state.flags.set(UnitFlags::SUMMONED, info.summoned);
        state.flags.set(UnitFlags::CLONED, info.cloned);
        self.insert(state, creature.abilities.clone());
    }

    fn update_unit(&mut self, id: UnitId, data: &PersistedUnitState) {
        if let Some(entry) = self.entry_mut(id) {
            entry.state.load(data);
        }
    }

    fn remove_unit(&mut self, id: UnitId) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        entry.state.make_ghost();
        let was_clone = entry.state.is_clone();
        if was_clone {
            for other in self.units.values_mut() {
                if other.state.clone_id == Some(id) {
                    other.state.clone_id = None;
                }
            }
        }
        self.tree_version += 1;
    }

    fn move_unit(&mut self, id: UnitId, destination: BattleHex) {
        if let Some(entry) = self.entry_mut(id) {
            entry.state.position = destination;
        }
    }

    fn add_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]) {
        if let Some(entry) = self.entry_mut(id) {
            entry.bonuses.extend(bonuses.iter().cloned());
            self.tree_version += 1;
        }
    }

    fn update_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]) {
        if let Some(entry) = self.entry_mut(id) {
            for bonus in bonuses {
                entry.bonuses.refresh_or_push(bonus.clone());
            }
            self.tree_version += 1;
        }
    }

    fn remove_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]) {
        if let Some(entry) = self.entry_mut(id) {
            let keys: Vec<BonusKey> = bonuses.iter().map(Bonus::key).collect();
            entry.bonuses.remove_keys(&keys);
            self.tree_version += 1;
        }
    }

    fn add_obstacle(&mut self, obstacle: &Obstacle) {
        self.next_obstacle = self.next_obstacle.max(obstacle.id + 1);
        self.obstacles.push(obstacle.clone());
    }

    fn update_obstacle(&mut self, obstacle: &Obstacle) {
        match self.obstacles.iter_mut().find(|o| o.id == obstacle.id) {
            Some(existing) => *existing = obstacle.clone(),
            None => StateError::UnknownObstacle(obstacle.id).log(),
        }
    }

    fn remove_obstacle(&mut self, id: u32) {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.id != id);
        if self.obstacles.len() == before {
            StateError::UnknownObstacle(id).log();
        }
    }

    fn spend_mana(&mut self, side: BattleSide, amount: i32) {
        let info = &mut self.sides[side.index()];
        if let Some(hero) = info.hero.as_mut() {
            hero.mana = (hero.mana - amount).max(0);
        }
        info.cast_this_round = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{ObstacleKind, Reachability};
    use crate::bonus::BonusBearer;
    use crate::testing::creature;

    fn battle() -> (Battle, UnitId, UnitId) {
        let mut battle = Battle::new(PlayerId(0), PlayerId(1));
        let a = battle.spawn(Arc::new(creature("Pikeman", 10, 1, 3).with_speed(4)), 10, BattleSide::Attacker, BattleHex::new(1, 5));
        let d = battle.spawn(Arc::new(creature("Goblin", 5, 1, 2).with_speed(5)), 20, BattleSide::Defender, BattleHex::new(15, 5));
        (battle, a, d)
    }

    #[test]
    fn spawn_assigns_sequential_ids() {
        let (battle, a, d) = battle();
        assert_eq!((a, d), (UnitId(0), UnitId(1)));
        assert_eq!(battle.next_unit_id(), UnitId(2));
        let unit = battle.unit(d).expect("spawned");
        assert_eq!(unit.owner(), PlayerId(1));
        assert_eq!(unit.count(), 20);
        assert_eq!(battle.unit_at(BattleHex::new(1, 5), true).map(|u| u.id()), Some(a));
    }

    #[test]
    fn heroes_are_kept_per_side() {
        let (mut battle, _, _) = battle();
        let mut hero = Hero::new("Sandro", PlayerId(1), BattleSide::Defender);
        hero.mana = 20;
        battle.set_hero(hero.clone());
        assert_eq!(battle.hero(BattleSide::Defender), Some(hero));
        assert!(battle.hero(BattleSide::Attacker).is_none());
    }

    #[test]
    fn bonus_changes_bump_tree_version() {
        let (mut battle, a, _) = battle();
        let before = battle.tree_version();
        let bless = Bonus::new(BonusDuration::N_TURNS, BonusType::PrimarySkill, BonusSource::SpellEffect, 3)
            .with_source_id(41)
            .with_turns(2);
        battle.add_bonuses(a, std::slice::from_ref(&bless));
        assert!(battle.tree_version() > before);
        assert!(battle.unit(a).is_some_and(|u| u.has_bonus(&Selector::source(BonusSource::SpellEffect, 41))));

        battle.remove_bonuses(a, &[bless]);
        assert!(!battle.unit(a).is_some_and(|u| u.has_bonus(&Selector::source(BonusSource::SpellEffect, 41))));
    }

    #[test]
    fn next_round_ages_bonuses_and_obstacles() {
        let (mut battle, a, _) = battle();
        let haste = Bonus::new(BonusDuration::N_TURNS, BonusType::StacksSpeed, BonusSource::SpellEffect, 3)
            .with_source_id(53)
            .with_turns(1);
        battle.add_bonuses(a, &[haste]);
        let mut wall = Obstacle::terrain(0, ObstacleKind::FireWall, vec![BattleHex::new(8, 5)]);
        wall.turns_remaining = 2;
        battle.add_obstacle(&wall);

        battle.next_round();
        assert_eq!(battle.unit(a).map(|u| u.speed(0)), Some(4));
        assert_eq!(battle.obstacles().len(), 1);
        battle.next_round();
        assert!(battle.obstacles().is_empty());
        assert_eq!(battle.round(), 2);
    }

    #[test]
    fn removing_clone_clears_link() {
        let (mut battle, a, _) = battle();
        let clone_id = battle.next_unit_id();
        battle.add_unit(&UnitInfo {
            id: clone_id,
            creature: battle.unit(a).map(|u| u.state.definition().creature.id).unwrap_or(CreatureId(0)),
            count: 10,
            side: BattleSide::Attacker,
            position: BattleHex::new(2, 5),
            summoned: false,
            cloned: true,
        });
        let mut source = battle.unit(a).expect("source").state.save();
        source.clone_id = i64::from(clone_id.0);
        battle.update_unit(a, &source);

        let mut hit = 5;
        let mut clone = battle.unit(clone_id).expect("clone").state;
        clone.damage(&mut hit);
        battle.update_unit(clone_id, &clone.save());

        assert_eq!(battle.pending_removals(), vec![clone_id]);
        assert_eq!(battle.remove_pending(), vec![clone_id]);
        assert!(battle.unit(clone_id).is_none());
        assert_eq!(battle.unit(a).and_then(|u| u.state.clone_id), None);
    }

    #[test]
    fn clone_without_lifetime_marker_expires() {
        let (mut battle, a, _) = battle();
        let clone_id = battle.next_unit_id();
        let creature = battle.unit(a).map(|u| u.state.definition().creature.id).unwrap_or(CreatureId(0));
        battle.add_unit(&UnitInfo {
            id: clone_id,
            creature,
            count: 10,
            side: BattleSide::Attacker,
            position: BattleHex::new(2, 5),
            summoned: false,
            cloned: true,
        });
        let marker = Bonus::new(BonusDuration::N_TURNS, BonusType::None, BonusSource::SpellEffect, 0)
            .with_source_id(65)
            .with_turns(1);
        battle.add_bonuses(clone_id, &[marker]);
        battle.next_round();
        assert_eq!(battle.pending_removals(), vec![clone_id]);
    }

    #[test]
    fn unknown_units_are_ignored() {
        let (mut battle, _, _) = battle();
        let version = battle.tree_version();
        battle.add_bonuses(UnitId(99), &[Bonus::ability(BonusType::Flying, 0)]);
        battle.move_unit(UnitId(99), BattleHex::new(3, 3));
        assert_eq!(battle.tree_version(), version);
    }

    #[test]
    fn walkers_route_around_units() {
        let (mut battle, a, _) = battle();
        battle.spawn(Arc::new(creature("Wall", 100, 1, 1)), 1, BattleSide::Defender, BattleHex::new(2, 5));
        let unit = battle.unit(a).expect("unit");
        let reach = Reachability::compute(&battle, &unit);
        assert_eq!(reach.distance(BattleHex::new(2, 5)), u32::MAX);
        assert_eq!(reach.distance(BattleHex::new(3, 5)), 3);
        assert_eq!(reach.path_to(BattleHex::new(3, 5)).len(), 3);
        assert!(reach.is_reachable(BattleHex::new(3, 5), 4));
        assert!(!reach.is_reachable(BattleHex::new(6, 5), 4));
    }

    #[test]
    fn turn_order_sorts_by_initiative() {
        let (battle, a, d) = battle();
        let order = battle.turn_order(2, None);
        assert_eq!(order.len(), 2);
        let ids: Vec<UnitId> = order[0].iter().map(|u| u.id()).collect();
        assert_eq!(ids, vec![d, a]);
        assert_eq!(battle.turn_order(2, Some(3)).iter().map(Vec::len).sum::<usize>(), 3);
    }

    #[test]
    fn winner_once_a_side_is_wiped_out() {
        let (mut battle, _, d) = battle();
        assert_eq!(battle.winner(), None);
        let mut state = battle.unit(d).expect("defender").state;
        let mut amount = i64::MAX;
        state.damage(&mut amount);
        battle.update_unit(d, &state.save());
        assert_eq!(battle.winner(), Some(BattleSide::Attacker));
    }
}
