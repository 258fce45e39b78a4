use std::sync::Arc;

use bitflags::bitflags;

use super::{
    Ammo, AmmoKind, AmmoRecord, BattleSide, HealLevel, HealPower, HealthPool, HealthRecord,
    PersistedUnitState, PlayerId, RetaliationRecord, UnitBonuses, UnitDefinition, UnitId,
};
use crate::bonus::{BonusBearer, BonusType, Selector};
use crate::error::StateError;
use crate::hex::BattleHex;

bitflags! {
    /// Per-unit status flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UnitFlags: u16 {
        const CLONED = 1 << 0;
        const DEFENDING = 1 << 1;
        const DEFENDING_ANIM = 1 << 2;
        const DRAINED_MANA = 1 << 3;
        const FEAR = 1 << 4;
        const HAD_MORALE = 1 << 5;
        /// Removed from the battle.
        const GHOST = 1 << 6;
        /// Dead transient unit awaiting removal.
        const GHOST_PENDING = 1 << 7;
        const MOVED_THIS_TURN = 1 << 8;
        const SUMMONED = 1 << 9;
        const WAITING = 1 << 10;
    }
}

impl UnitFlags {
    /// Flags that only last for the current round.
    pub const ROUND_SCOPED: Self = Self::DEFENDING
        .union(Self::DEFENDING_ANIM)
        .union(Self::DRAINED_MANA)
        .union(Self::FEAR)
        .union(Self::HAD_MORALE)
        .union(Self::MOVED_THIS_TURN)
        .union(Self::WAITING);
}

/// Mutable runtime record of one combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitState {
    definition: Arc<UnitDefinition>,
    pub flags: UnitFlags,
    pub casts: Ammo,
    pub shots: Ammo,
    pub retaliations: Ammo,
    pub health: HealthPool,
    /// Live clone of this unit, at most one.
    pub clone_id: Option<UnitId>,
    pub position: BattleHex,
}

impl UnitState {
    pub fn new(definition: Arc<UnitDefinition>) -> Self {
        let health = HealthPool::new(definition.max_health(), definition.base_amount);
        Self {
            definition,
            flags: UnitFlags::empty(),
            casts: Ammo::new(AmmoKind::Casts),
            shots: Ammo::new(AmmoKind::Shots),
            retaliations: Ammo::new(AmmoKind::Retaliations),
            health,
            clone_id: None,
            position: BattleHex::INVALID,
        }
    }

    pub fn at(mut self, position: BattleHex) -> Self {
        self.position = position;
        self
    }

    // ========================================================================
    // Identity
    // ========================================================================

    pub fn definition(&self) -> &Arc<UnitDefinition> {
        &self.definition
    }

    pub fn id(&self) -> UnitId {
        self.definition.id
    }

    pub fn side(&self) -> BattleSide {
        self.definition.side
    }

    pub fn owner(&self) -> PlayerId {
        self.definition.owner
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn creature_level(&self) -> u8 {
        self.definition.creature.level
    }

    /// Hexes covered by this unit.
    pub fn occupied_hexes(&self) -> arrayvec::ArrayVec<BattleHex, 2> {
        self.position
            .occupied_with(self.definition.double_wide(), self.definition.side)
    }

    pub fn covers(&self, hex: BattleHex) -> bool {
        self.occupied_hexes().contains(&hex)
    }

    // ========================================================================
    // Life cycle
    // ========================================================================

    pub fn alive(&self) -> bool {
        self.health.available() > 0
    }

    pub fn is_ghost(&self) -> bool {
        self.flags.contains(UnitFlags::GHOST)
    }

    pub fn is_ghost_pending(&self) -> bool {
        self.flags.contains(UnitFlags::GHOST_PENDING)
    }

    pub fn is_dead(&self) -> bool {
        !self.alive() && !self.is_ghost()
    }

    pub fn is_clone(&self) -> bool {
        self.flags.contains(UnitFlags::CLONED)
    }

    pub fn has_clone(&self) -> bool {
        self.clone_id.is_some()
    }

    pub fn is_summoned(&self) -> bool {
        self.flags.contains(UnitFlags::SUMMONED)
    }

    /// Whether spells and attacks may pick this unit.
    pub fn is_valid_target(&self, allow_dead: bool) -> bool {
        (self.alive() || (allow_dead && self.is_dead())) && self.position.is_valid()
    }

    pub fn count(&self) -> i64 {
        self.health.count()
    }

    pub fn first_hp_left(&self) -> i64 {
        self.health.first_hp_left()
    }

    pub fn available_health(&self) -> i64 {
        self.health.available()
    }

    pub fn total_health(&self) -> i64 {
        self.health.total()
    }

    /// Individuals lost so far, net of temporary resurrections.
    pub fn killed(&self) -> i64 {
        (self.definition.base_amount - self.health.count() + self.health.resurrected()).max(0)
    }

    /// Marks the unit as removed from the battle.
    pub fn make_ghost(&mut self) {
        self.health.clear();
        self.flags.remove(UnitFlags::GHOST_PENDING);
        self.flags.insert(UnitFlags::GHOST);
    }

    // ========================================================================
    // Capabilities
    // ========================================================================

    pub fn is_shooter(&self, bonuses: &UnitBonuses) -> bool {
        self.shots.total(bonuses) > 0 && bonuses.has_bonus_of_type(BonusType::Shooter)
    }

    pub fn can_shoot(&self, bonuses: &UnitBonuses) -> bool {
        self.shots.can_use(1, bonuses) && bonuses.has_bonus_of_type(BonusType::Shooter)
    }

    pub fn can_cast(&self, bonuses: &UnitBonuses) -> bool {
        self.casts.can_use(1, bonuses)
    }

    pub fn able_to_retaliate(&self, bonuses: &UnitBonuses) -> bool {
        self.alive()
            && self.retaliations.can_use(1, bonuses)
            && !bonuses.has_bonus_of_type(BonusType::SiegeWeapon)
            && !bonuses.has_bonus_of_type(BonusType::Hypnotized)
            && !bonuses.has_bonus_of_type(BonusType::NoRetaliation)
    }

    pub fn can_move(&self, turn: i32, bonuses: &UnitBonuses) -> bool {
        self.alive()
            && !bonuses.has_bonus(&Selector::of_type(BonusType::NotActive).and(Selector::turns(turn)))
    }

    pub fn defended(&self, turn: i32) -> bool {
        turn == 0 && self.flags.contains(UnitFlags::DEFENDING)
    }

    pub fn moved(&self, turn: i32) -> bool {
        turn == 0 && self.flags.contains(UnitFlags::MOVED_THIS_TURN)
    }

    pub fn waited(&self, turn: i32) -> bool {
        turn == 0 && self.flags.contains(UnitFlags::WAITING)
    }

    pub fn will_move(&self, turn: i32, bonuses: &UnitBonuses) -> bool {
        (turn != 0 || !self.flags.contains(UnitFlags::DEFENDING))
            && !self.moved(turn)
            && self.can_move(turn, bonuses)
    }

    /// Ordering bucket within a round: siege engines first, then regular
    /// units, then units that waited (those with morale ahead of the rest).
    pub fn queue_phase(&self, turn: i32, bonuses: &UnitBonuses) -> u8 {
        if turn <= 0 && self.waited(0) {
            if self.flags.contains(UnitFlags::HAD_MORALE) { 2 } else { 3 }
        } else if bonuses.has_bonus_of_type(BonusType::Catapult) {
            0
        } else {
            1
        }
    }

    pub fn initiative(&self, turn: i32, bonuses: &UnitBonuses) -> i32 {
        bonuses.value_of(&Selector::of_type(BonusType::StacksSpeed).and(Selector::turns(turn)))
    }

    /// Hexes the unit may travel this turn.
    pub fn speed(&self, turn: i32, bonuses: &UnitBonuses) -> i32 {
        if !self.can_move(turn, bonuses) {
            return 0;
        }
        self.initiative(turn, bonuses).max(0)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Applies damage; `amount` holds the damage actually dealt on return.
    ///
    /// Any positive damage destroys a clone. Transient units left without
    /// health become ghost-pending.
    pub fn damage(&mut self, amount: &mut i64) {
        if self.is_clone() {
            if *amount > 0 {
                *amount = 1;
                self.health.clear();
            }
        } else {
            self.health.damage(amount);
        }

        if self.health.available() <= 0 && (self.is_clone() || self.is_summoned()) {
            self.flags.insert(UnitFlags::GHOST_PENDING);
        }
    }

    /// Applies healing; `amount` holds the health actually restored on return.
    pub fn heal(&mut self, amount: &mut i64, level: HealLevel, power: HealPower) {
        if level == HealLevel::Heal && power == HealPower::OneBattle {
            StateError::OneBattleHeal(self.id()).log();
            *amount = 0;
        } else if self.is_clone() {
            StateError::HealClone(self.id()).log();
            *amount = 0;
        } else {
            self.health.heal(amount, level, power);
        }
    }

    pub fn after_attack(&mut self, ranged: bool, counter: bool, bonuses: &UnitBonuses) {
        if counter {
            self.retaliations.use_ammo(1, bonuses);
        }
        if ranged {
            self.shots.use_ammo(1, bonuses);
        }
    }

    pub fn after_new_round(&mut self) {
        self.flags.remove(UnitFlags::ROUND_SCOPED);
        self.retaliations.reset();
    }

    /// A unit getting a second turn in one round did so through morale.
    pub fn after_gets_turn(&mut self) {
        if self.flags.contains(UnitFlags::MOVED_THIS_TURN) {
            self.flags.insert(UnitFlags::HAD_MORALE);
        }
    }

    pub fn take_resurrected(&mut self) {
        self.health.take_resurrected();
    }

    /// Restores the starting state: full stack, no flags, no ammo used.
    pub fn reset(&mut self) {
        self.flags = UnitFlags::empty();
        self.casts.reset();
        self.shots.reset();
        self.retaliations.reset();
        self.health.reset();
        self.clone_id = None;
        self.position = BattleHex::INVALID;
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn save(&self) -> PersistedUnitState {
        let flag = |f| self.flags.contains(f);
        PersistedUnitState {
            cloned: flag(UnitFlags::CLONED),
            defending: flag(UnitFlags::DEFENDING),
            defending_anim: flag(UnitFlags::DEFENDING_ANIM),
            drained_mana: flag(UnitFlags::DRAINED_MANA),
            fear: flag(UnitFlags::FEAR),
            had_morale: flag(UnitFlags::HAD_MORALE),
            ghost: flag(UnitFlags::GHOST),
            ghost_pending: flag(UnitFlags::GHOST_PENDING),
            moved_this_turn: flag(UnitFlags::MOVED_THIS_TURN),
            summoned: flag(UnitFlags::SUMMONED),
            waiting: flag(UnitFlags::WAITING),
            casts: AmmoRecord {
                used: self.casts.used(),
            },
            shots: AmmoRecord {
                used: self.shots.used(),
            },
            retaliations: RetaliationRecord {
                used: self.retaliations.used(),
                total_cache: self.retaliations.total_cache(),
            },
            health: HealthRecord {
                first_hp_left: Some(self.health.first_hp_left()),
                full_units: Some(self.health.full_units()),
                resurrected: Some(self.health.resurrected()),
            },
            clone_id: self.clone_id.map_or(-1, |id| i64::from(id.0)),
            position: self.position,
        }
    }

    /// Resets the state, then applies `data` on top of it.
    pub fn load(&mut self, data: &PersistedUnitState) {
        self.reset();

        let pairs = [
            (UnitFlags::CLONED, data.cloned),
            (UnitFlags::DEFENDING, data.defending),
            (UnitFlags::DEFENDING_ANIM, data.defending_anim),
            (UnitFlags::DRAINED_MANA, data.drained_mana),
            (UnitFlags::FEAR, data.fear),
            (UnitFlags::HAD_MORALE, data.had_morale),
            (UnitFlags::GHOST, data.ghost),
            (UnitFlags::GHOST_PENDING, data.ghost_pending),
            (UnitFlags::MOVED_THIS_TURN, data.moved_this_turn),
            (UnitFlags::SUMMONED, data.summoned),
            (UnitFlags::WAITING, data.waiting),
        ];
        for (flag, on) in pairs {
            self.flags.set(flag, on);
        }

        self.casts.restore(data.casts.used, 0);
        self.shots.restore(data.shots.used, 0);
        self.retaliations
            .restore(data.retaliations.used, data.retaliations.total_cache);

        let h = &data.health;
        self.health.restore(
            h.first_hp_left.unwrap_or(self.health.first_hp_left()),
            h.full_units.unwrap_or(self.health.full_units()),
            h.resurrected.unwrap_or(0),
        );

        self.clone_id = u32::try_from(data.clone_id).ok().map(UnitId);
        self.position = data.position;
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.save()).unwrap_or(serde_json::Value::Null)
    }

    #[cfg(feature = "serde")]
    pub fn load_json(&mut self, value: &serde_json::Value) -> Result<(), serde_json::Error> {
        let data: PersistedUnitState = serde_json::from_value(value.clone())?;
        self.load(&data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{Bonus, BonusList};
    use crate::unit::{CreatureType, SlotId};

    fn definition(amount: i64) -> Arc<UnitDefinition> {
        Arc::new(UnitDefinition {
            id: UnitId(3),
            creature: Arc::new(CreatureType::new(1, "Archer", 2, 10).with_shots(12)),
            side: BattleSide::Attacker,
            owner: PlayerId(0),
            base_amount: amount,
            slot: SlotId(0),
        })
    }

    fn bonuses(state: &UnitState) -> UnitBonuses {
        UnitBonuses::new(state.definition().creature.abilities.clone(), 1)
    }

    #[test]
    fn save_load_round_trip() {
        let mut unit = UnitState::new(definition(10)).at(BattleHex::new(3, 4));
        let b = bonuses(&unit);
        let mut amount = 25;
        unit.damage(&mut amount);
        unit.after_attack(true, true, &b);
        unit.flags.insert(UnitFlags::WAITING | UnitFlags::FEAR);
        unit.clone_id = Some(UnitId(9));

        let saved = unit.save();
        let mut fresh = UnitState::new(definition(10));
        fresh.load(&saved);

        assert_eq!(fresh, unit);
        assert_eq!(fresh.available_health(), 75);
        assert_eq!(fresh.shots.used(), 1);
        assert_eq!(fresh.retaliations.used(), 1);
        assert_eq!(fresh.position, BattleHex::new(3, 4));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_and_partial_load() {
        let mut unit = UnitState::new(definition(4)).at(BattleHex::new(2, 2));
        let mut amount = 13;
        unit.damage(&mut amount);
        unit.flags.insert(UnitFlags::DEFENDING);

        let json = unit.to_json();
        let mut fresh = UnitState::new(definition(4));
        fresh.load_json(&json).expect("valid json");
        assert_eq!(fresh, unit);

        let partial = serde_json::json!({ "waiting": true, "shots": { "used": 2 } });
        fresh.load_json(&partial).expect("partial json");
        assert!(fresh.waited(0));
        assert!(!fresh.defended(0));
        assert_eq!(fresh.shots.used(), 2);
        assert_eq!(fresh.available_health(), 40);
        assert_eq!(fresh.position, BattleHex::INVALID);
        assert_eq!(fresh.clone_id, None);
    }

    #[test]
    fn clone_dies_to_any_damage() {
        let mut unit = UnitState::new(definition(10));
        unit.flags.insert(UnitFlags::CLONED);
        let mut amount = 3;
        unit.damage(&mut amount);
        assert_eq!(amount, 1);
        assert!(!unit.alive());
        assert!(unit.is_ghost_pending());

        let mut zero = 0;
        let mut other = UnitState::new(definition(10));
        other.flags.insert(UnitFlags::CLONED);
        other.damage(&mut zero);
        assert!(other.alive());
    }

    #[test]
    fn summoned_unit_becomes_ghost_pending() {
        let mut unit = UnitState::new(definition(2));
        unit.flags.insert(UnitFlags::SUMMONED);
        let mut amount = 100;
        unit.damage(&mut amount);
        assert!(unit.is_ghost_pending());
        assert!(unit.is_dead());
        unit.make_ghost();
        assert!(unit.is_ghost());
        assert!(!unit.is_dead());
        assert!(!unit.is_valid_target(true));
    }

    #[test]
    fn contract_violations_do_not_heal() {
        let mut unit = UnitState::new(definition(5));
        let mut dmg = 15;
        unit.damage(&mut dmg);

        let mut amount = 10;
        unit.heal(&mut amount, HealLevel::Heal, HealPower::OneBattle);
        assert_eq!(amount, 0);
        assert_eq!(unit.available_health(), 35);

        unit.flags.insert(UnitFlags::CLONED);
        let mut amount = 10;
        unit.heal(&mut amount, HealLevel::Resurrect, HealPower::Permanent);
        assert_eq!(unit.available_health(), 35);
    }

    #[test]
    fn retaliation_rules() {
        let unit = UnitState::new(definition(5));
        let b = bonuses(&unit);
        assert!(unit.able_to_retaliate(&b));

        let mut list = BonusList::new();
        list.push(Bonus::ability(BonusType::NoRetaliation, 0));
        assert!(!unit.able_to_retaliate(&UnitBonuses::new(list, 1)));
    }

    #[test]
    fn new_round_clears_round_flags() {
        let mut unit = UnitState::new(definition(5));
        let b = bonuses(&unit);
        unit.flags
            .insert(UnitFlags::DEFENDING | UnitFlags::WAITING | UnitFlags::MOVED_THIS_TURN);
        unit.after_attack(false, true, &b);
        unit.after_gets_turn();
        assert!(unit.flags.contains(UnitFlags::HAD_MORALE));

        unit.after_new_round();
        assert!(unit.flags.is_empty());
        assert_eq!(unit.retaliations.used(), 0);
    }

    #[test]
    fn shooter_capabilities() {
        let mut unit = UnitState::new(definition(5));
        let b = bonuses(&unit);
        assert!(unit.is_shooter(&b));
        assert!(unit.can_shoot(&b));
        for _ in 0..12 {
            unit.after_attack(true, false, &b);
        }
        assert!(!unit.can_shoot(&b));
        assert!(unit.is_shooter(&b));
    }

    #[test]
    fn killed_counts_losses() {
        let mut unit = UnitState::new(definition(5));
        let mut dmg = 21;
        unit.damage(&mut dmg);
        assert_eq!(unit.count(), 3);
        assert_eq!(unit.killed(), 2);
    }
}
