//! State-change records.
//!
//! Every mutation a spell or action makes is expressed as a [`BattleChange`].
//! The authoritative side hands changes to a [`ChangeSender`], which applies
//! them and forwards them to observers; evaluation applies the very same
//! records to a private [`BattleState`] with [`BattleChange::apply_to`].

mod sender;

pub use sender::{ChangeSender, LocalSender};

use crate::battle::{BattleState, Obstacle};
use crate::bonus::Bonus;
use crate::hex::BattleHex;
use crate::unit::{BattleSide, CreatureId, PersistedUnitState, UnitId};

/// Description of a unit entering the battle mid-fight.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitInfo {
    pub id: UnitId,
    pub creature: CreatureId,
    pub count: i64,
    pub side: BattleSide,
    pub position: BattleHex,
    /// Leaves the battle when it dies instead of leaving a corpse.
    pub summoned: bool,
    pub cloned: bool,
}

/// One replicated state change.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BattleChange {
    UnitAdded(UnitInfo),
    UnitUpdated {
        unit: UnitId,
        state: PersistedUnitState,
    },
    UnitRemoved(UnitId),
    UnitMoved {
        unit: UnitId,
        destination: BattleHex,
    },
    BonusesAdded {
        unit: UnitId,
        bonuses: Vec<Bonus>,
    },
    BonusesUpdated {
        unit: UnitId,
        bonuses: Vec<Bonus>,
    },
    BonusesRemoved {
        unit: UnitId,
        bonuses: Vec<Bonus>,
    },
    ObstacleAdded(Obstacle),
    ObstacleUpdated(Obstacle),
    ObstacleRemoved(u32),
    ManaSpent {
        side: BattleSide,
        amount: i32,
    },
}

impl BattleChange {
    /// Applies the change to `state` without forwarding it anywhere.
    pub fn apply_to<S: BattleState + ?Sized>(&self, state: &mut S) {
        match self {
            Self::UnitAdded(info) => state.add_unit(info),
            Self::UnitUpdated { unit, state: data } => state.update_unit(*unit, data),
            Self::UnitRemoved(unit) => state.remove_unit(*unit),
            Self::UnitMoved { unit, destination } => state.move_unit(*unit, *destination),
            Self::BonusesAdded { unit, bonuses } => state.add_bonuses(*unit, bonuses),
            Self::BonusesUpdated { unit, bonuses } => state.update_bonuses(*unit, bonuses),
            Self::BonusesRemoved { unit, bonuses } => state.remove_bonuses(*unit, bonuses),
            Self::ObstacleAdded(obstacle) => state.add_obstacle(obstacle),
            Self::ObstacleUpdated(obstacle) => state.update_obstacle(obstacle),
            Self::ObstacleRemoved(id) => state.remove_obstacle(*id),
            Self::ManaSpent { side, amount } => state.spend_mana(*side, *amount),
        }
    }

    /// Unit the change is about, if any.
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Self::UnitAdded(info) => Some(info.id),
            Self::UnitUpdated { unit, .. }
            | Self::UnitMoved { unit, .. }
            | Self::BonusesAdded { unit, .. }
            | Self::BonusesUpdated { unit, .. }
            | Self::BonusesRemoved { unit, .. } => Some(*unit),
            Self::UnitRemoved(unit) => Some(*unit),
            Self::ObstacleAdded(_)
            | Self::ObstacleUpdated(_)
            | Self::ObstacleRemoved(_)
            | Self::ManaSpent { .. } => None,
        }
    }
}
