use super::{BattleSide, PlayerId, UnitId, UnitState};
use crate::bonus::{BonusBearer, BonusList, BonusType, Selector};
use crate::hex::BattleHex;

/// Effective bonuses of one unit at one tree version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitBonuses {
    pub list: BonusList,
    pub version: i64,
    /// An allied ammo cart is alive, so shots are unlimited.
    pub ammo_cart: bool,
}

impl UnitBonuses {
    pub fn new(list: BonusList, version: i64) -> Self {
        Self {
            list,
            version,
            ammo_cart: false,
        }
    }
}

impl BonusBearer for UnitBonuses {
    fn bonuses(&self, selector: &Selector) -> BonusList {
        self.list.filtered(selector)
    }

    fn tree_version(&self) -> i64 {
        self.version
    }

    fn has_bonus(&self, selector: &Selector) -> bool {
        self.list.any(selector)
    }
}

/// Owned copy of a unit as seen by one battle state: its runtime state plus
/// the bonuses effective for it.
///
/// Snapshots are what battle views hand out; mutating one never touches the
/// state it was taken from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    pub state: UnitState,
    pub bonuses: UnitBonuses,
}

impl UnitSnapshot {
    pub fn new(state: UnitState, bonuses: UnitBonuses) -> Self {
        Self { state, bonuses }
    }

    pub fn id(&self) -> UnitId {
        self.state.id()
    }

    pub fn side(&self) -> BattleSide {
        self.state.side()
    }

    pub fn owner(&self) -> PlayerId {
        self.state.owner()
    }

    pub fn position(&self) -> BattleHex {
        self.state.position
    }

    pub fn alive(&self) -> bool {
        self.state.alive()
    }

    pub fn count(&self) -> i64 {
        self.state.count()
    }

    pub fn is_valid_target(&self, allow_dead: bool) -> bool {
        self.state.is_valid_target(allow_dead)
    }

    pub fn can_shoot(&self) -> bool {
        self.state.can_shoot(&self.bonuses)
    }

    pub fn is_shooter(&self) -> bool {
        self.state.is_shooter(&self.bonuses)
    }

    pub fn can_cast(&self) -> bool {
        self.state.can_cast(&self.bonuses)
    }

    pub fn able_to_retaliate(&self) -> bool {
        self.state.able_to_retaliate(&self.bonuses)
    }

    pub fn retaliations_available(&self) -> i32 {
        self.state.retaliations.available(&self.bonuses)
    }

    pub fn can_move(&self, turn: i32) -> bool {
        self.state.can_move(turn, &self.bonuses)
    }

    pub fn will_move(&self, turn: i32) -> bool {
        self.state.will_move(turn, &self.bonuses)
    }

    pub fn speed(&self, turn: i32) -> i32 {
        self.state.speed(turn, &self.bonuses)
    }

    pub fn initiative(&self, turn: i32) -> i32 {
        self.state.initiative(turn, &self.bonuses)
    }

    pub fn queue_phase(&self, turn: i32) -> u8 {
        self.state.queue_phase(turn, &self.bonuses)
    }

    pub fn is_flying(&self) -> bool {
        self.bonuses.has_bonus_of_type(BonusType::Flying)
    }

    /// Strikes per attack action. Additional attack bonuses with subtype 1
    /// only apply to shots, subtype 2 only to melee.
    pub fn total_attacks(&self, ranged: bool) -> i32 {
        let excluded = if ranged { 2 } else { 1 };
        let selector = Selector::of_type(BonusType::AdditionalAttack)
            .and(Selector::new(move |b| b.subtype != excluded));
        1 + self.bonuses.value_of(&selector).max(0)
    }

    pub fn covers(&self, hex: BattleHex) -> bool {
        self.state.covers(hex)
    }

    /// Consumes ammunition for one attack or retaliation.
    pub fn after_attack(&mut self, ranged: bool, counter: bool) {
        self.state.after_attack(ranged, counter, &self.bonuses);
    }
}

impl BonusBearer for UnitSnapshot {
    fn bonuses(&self, selector: &Selector) -> BonusList {
        self.bonuses.bonuses(selector)
    }

    fn tree_version(&self) -> i64 {
        self.bonuses.version
    }

    fn has_bonus(&self, selector: &Selector) -> bool {
        self.bonuses.has_bonus(selector)
    }
}
