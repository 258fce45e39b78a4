//! Actions a controller submits for the active unit.

use std::fmt;

use crate::hex::BattleHex;
use crate::spell::{Destination, SpellId};
use crate::unit::{BattleSide, UnitId};

// ============================================================================
// Battle Action
// ============================================================================

/// One decision for the unit whose turn it is.
///
/// Exactly one action is produced per activation; [`BattleAction::Cancel`]
/// is only emitted when a pre-action hero spell already ended the battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BattleAction {
    /// Walk (or fly) to `destination`.
    Move { unit: UnitId, destination: BattleHex },

    /// Walk to `origin` if needed and strike `defender`.
    MeleeAttack {
        attacker: UnitId,
        defender: UnitId,
        origin: BattleHex,
    },

    RangedAttack { attacker: UnitId, defender: UnitId },

    Wait { unit: UnitId },

    Defend { unit: UnitId },

    /// A siege healer tends to an allied stack.
    Heal { caster: UnitId, target: UnitId },

    /// The hero of `side` casts before the active unit acts.
    HeroSpell {
        side: BattleSide,
        spell: SpellId,
        destination: Vec<Destination>,
    },

    Cancel,
}

impl BattleAction {
    /// Unit acting, if the action belongs to one.
    pub fn actor(&self) -> Option<UnitId> {
        match self {
            Self::Move { unit, .. } | Self::Wait { unit } | Self::Defend { unit } => Some(*unit),
            Self::MeleeAttack { attacker, .. } | Self::RangedAttack { attacker, .. } => Some(*attacker),
            Self::Heal { caster, .. } => Some(*caster),
            Self::HeroSpell { .. } | Self::Cancel => None,
        }
    }

    /// Whether the action ends the unit's activation.
    pub fn ends_turn(&self) -> bool {
        !matches!(self, Self::HeroSpell { .. })
    }
}

impl fmt::Display for BattleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { unit, destination } => write!(f, "{unit} moves to {destination}"),
            Self::MeleeAttack {
                attacker,
                defender,
                origin,
            } => write!(f, "{attacker} attacks {defender} from {origin}"),
            Self::RangedAttack { attacker, defender } => write!(f, "{attacker} shoots {defender}"),
            Self::Wait { unit } => write!(f, "{unit} waits"),
            Self::Defend { unit } => write!(f, "{unit} defends"),
            Self::Heal { caster, target } => write!(f, "{caster} heals {target}"),
            Self::HeroSpell {
                side,
                spell,
                destination,
            } => {
                write!(f, "{side} hero casts {spell}")?;
                if let Some(first) = destination.first() {
                    write!(f, " at {}", first.hex)?;
                }
                Ok(())
            }
            Self::Cancel => f.write_str("cancel"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_of_each_action() {
        let melee = BattleAction::MeleeAttack {
            attacker: UnitId(3),
            defender: UnitId(7),
            origin: BattleHex::new(4, 4),
        };
        assert_eq!(melee.actor(), Some(UnitId(3)));
        assert_eq!(BattleAction::Heal { caster: UnitId(9), target: UnitId(1) }.actor(), Some(UnitId(9)));
        assert_eq!(BattleAction::Cancel.actor(), None);
        let spell = BattleAction::HeroSpell {
            side: BattleSide::Attacker,
            spell: SpellId(15),
            destination: Vec::new(),
        };
        assert_eq!(spell.actor(), None);
        assert!(!spell.ends_turn());
        assert!(BattleAction::Defend { unit: UnitId(0) }.ends_turn());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_kind_tag() {
        let action = BattleAction::Wait { unit: UnitId(2) };
        let json = serde_json::to_value(&action).expect("serialize");
        assert_eq!(json["kind"], "wait");
        let back: BattleAction = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, action);
    }
}
