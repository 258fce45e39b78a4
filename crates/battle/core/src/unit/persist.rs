//! Persisted form of a unit's mutable state.
//!
//! Every field is optional on load: anything missing keeps the value of a
//! freshly reset unit.

use crate::hex::BattleHex;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AmmoRecord {
    pub used: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetaliationRecord {
    pub used: i32,
    pub total_cache: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HealthRecord {
    pub first_hp_left: Option<i64>,
    pub full_units: Option<i64>,
    pub resurrected: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PersistedUnitState {
    pub cloned: bool,
    pub defending: bool,
    pub defending_anim: bool,
    pub drained_mana: bool,
    pub fear: bool,
    pub had_morale: bool,
    pub ghost: bool,
    pub ghost_pending: bool,
    pub moved_this_turn: bool,
    pub summoned: bool,
    pub waiting: bool,
    pub casts: AmmoRecord,
    pub shots: AmmoRecord,
    pub retaliations: RetaliationRecord,
    pub health: HealthRecord,
    /// Unit id of the live clone, `-1` for none.
    pub clone_id: i64,
    pub position: BattleHex,
}

impl Default for PersistedUnitState {
    fn default() -> Self {
        Self {
            cloned: false,
            defending: false,
            defending_anim: false,
            drained_mana: false,
            fear: false,
            had_morale: false,
            ghost: false,
            ghost_pending: false,
            moved_this_turn: false,
            summoned: false,
            waiting: false,
            casts: AmmoRecord::default(),
            shots: AmmoRecord::default(),
            retaliations: RetaliationRecord::default(),
            health: HealthRecord::default(),
            clone_id: -1,
            position: BattleHex::INVALID,
        }
    }
}
