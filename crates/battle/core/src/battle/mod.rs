//! Battle state access.
//!
//! [`BattleView`] is the read-only query surface shared by the authoritative
//! [`Battle`] store and every hypothetical overlay built on top of it.
//! [`BattleState`] adds the mutation primitives that state-change records are
//! applied through. Nothing outside this module mutates a battle directly.

mod obstacle;
mod queue;
mod reach;
mod store;

pub use obstacle::{Obstacle, ObstacleKind};
pub use queue::turn_order;
pub use reach::Reachability;
pub use store::Battle;

use std::sync::Arc;

use crate::bonus::{Bonus, BonusBearer, BonusType};
use crate::change::UnitInfo;
use crate::combat::{self, AttackInfo, DamageEstimate};
use crate::hex::BattleHex;
use crate::spell::Hero;
use crate::unit::{BattleSide, CreatureId, CreatureType, PersistedUnitState, PlayerId, UnitId, UnitSnapshot};

/// Per-side battle participants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideInfo {
    pub player: PlayerId,
    pub hero: Option<Hero>,
    /// The side's hero already cast a spell this round.
    pub cast_this_round: bool,
}

impl SideInfo {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            hero: None,
            cast_this_round: false,
        }
    }
}

/// Read-only battle queries.
///
/// Units come back as owned [`UnitSnapshot`]s. Removed (ghost) units are never
/// returned; dead units that are still on the field are.
pub trait BattleView {
    fn unit(&self, id: UnitId) -> Option<UnitSnapshot>;

    /// Every non-ghost unit matching `predicate`, in id order.
    fn units_if(&self, predicate: &dyn Fn(&UnitSnapshot) -> bool) -> Vec<UnitSnapshot>;

    fn obstacles(&self) -> Vec<Obstacle>;

    fn creature(&self, id: CreatureId) -> Option<Arc<CreatureType>>;

    fn side_info(&self, side: BattleSide) -> SideInfo;

    fn round(&self) -> i32;

    /// Version of the battle-wide bonus tree.
    fn tree_version(&self) -> i64;

    /// Id the next added unit will receive.
    fn next_unit_id(&self) -> UnitId;

    fn next_obstacle_id(&self) -> u32;

    // ------------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------------

    fn side_player(&self, side: BattleSide) -> PlayerId {
        self.side_info(side).player
    }

    fn player_side(&self, player: PlayerId) -> Option<BattleSide> {
        BattleSide::BOTH
            .into_iter()
            .find(|side| self.side_player(*side) == player)
    }

    fn hero(&self, side: BattleSide) -> Option<Hero> {
        self.side_info(side).hero
    }

    /// Player actually commanding `unit`: the opponent while it is hypnotized.
    fn controlling_player(&self, unit: &UnitSnapshot) -> PlayerId {
        if unit.has_bonus_of_type(BonusType::Hypnotized) {
            self.side_player(unit.side().other())
        } else {
            unit.owner()
        }
    }

    fn alive_units(&self) -> Vec<UnitSnapshot> {
        self.units_if(&|u| u.alive())
    }

    /// Unit covering `hex`. Living units take precedence over corpses.
    fn unit_at(&self, hex: BattleHex, only_alive: bool) -> Option<UnitSnapshot> {
        let mut found = self.units_if(&|u| u.covers(hex) && (u.alive() || !only_alive));
        found.sort_by_key(|u| !u.alive());
        found.into_iter().next()
    }

    fn obstacles_at(&self, hex: BattleHex) -> Vec<Obstacle> {
        self.obstacles()
            .into_iter()
            .filter(|o| o.covers(hex))
            .collect()
    }

    /// Whether a unit other than `ignoring` could stand on `hex`.
    fn is_hex_free(&self, hex: BattleHex, ignoring: Option<UnitId>) -> bool {
        hex.is_available()
            && self
                .unit_at(hex, true)
                .is_none_or(|u| Some(u.id()) == ignoring)
            && !self.obstacles_at(hex).iter().any(Obstacle::blocks_movement)
    }

    /// Per-hex mask of hexes a unit other than `ignoring` could not enter,
    /// indexed by hex.
    fn blocked_hexes(&self, ignoring: Option<UnitId>) -> Vec<bool> {
        let mut blocked: Vec<bool> = BattleHex::all().map(|hex| !hex.is_available()).collect();
        let mut mark = |hex: BattleHex| {
            if hex.is_valid() {
                blocked[hex.0 as usize] = true;
            }
        };
        for unit in self.units_if(&|u| u.alive() && Some(u.id()) != ignoring) {
            for hex in unit.state.occupied_hexes() {
                mark(hex);
            }
        }
        for obstacle in self.obstacles().iter().filter(|o| o.blocks_movement()) {
            for hex in &obstacle.area {
                mark(*hex);
            }
        }
        blocked
    }

    /// Damage ranges of a hypothetical attack.
    fn estimate_damage(&self, info: &AttackInfo) -> DamageEstimate {
        combat::estimate(info)
    }

    fn reachability(&self, unit: &UnitSnapshot) -> Reachability {
        Reachability::compute(self, unit)
    }

    /// Turn order for the current round and the following ones.
    fn turn_order(&self, rounds: usize, max_units: Option<usize>) -> Vec<Vec<UnitSnapshot>> {
        queue::turn_order(self, rounds, max_units)
    }

    /// Side left standing once the other has no living units.
    fn winner(&self) -> Option<BattleSide> {
        let alive = self.alive_units();
        let standing = |side: BattleSide| alive.iter().any(|u| u.side() == side);
        match (standing(BattleSide::Attacker), standing(BattleSide::Defender)) {
            (true, true) => None,
            (true, false) => Some(BattleSide::Attacker),
            // A mutual wipe-out goes to the defender.
            (false, _) => Some(BattleSide::Defender),
        }
    }

    fn is_finished(&self) -> bool {
        self.winner().is_some()
    }
}

/// Mutation primitives of a battle state.
///
/// Implementations never panic on bad input: unknown units or obstacles are
/// logged as [`StateError`](crate::error::StateError)s and ignored.
pub trait BattleState: BattleView {
    fn as_view(&self) -> &dyn BattleView;

    /// Starts a new round: round-scoped flags clear and retaliations reset.
    fn next_round(&mut self);

    /// `unit` gets its turn.
    fn next_turn(&mut self, unit: UnitId);

    fn add_unit(&mut self, info: &UnitInfo);

    /// Replaces the mutable state of a unit.
    fn update_unit(&mut self, id: UnitId, data: &PersistedUnitState);

    /// Removes a unit from the battle (it becomes a ghost).
    fn remove_unit(&mut self, id: UnitId);

    fn move_unit(&mut self, id: UnitId, destination: BattleHex);

    fn add_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]);

    /// Adds bonuses, extending equivalent spell effects already present.
    fn update_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]);

    fn remove_bonuses(&mut self, id: UnitId, bonuses: &[Bonus]);

    fn add_obstacle(&mut self, obstacle: &Obstacle);

    fn update_obstacle(&mut self, obstacle: &Obstacle);

    fn remove_obstacle(&mut self, id: u32);

    /// Charges a hero cast: spends mana and marks the round as used.
    fn spend_mana(&mut self, side: BattleSide, amount: i32);
}
