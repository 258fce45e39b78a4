use crate::hex::BattleHex;
use crate::unit::{UnitId, UnitSnapshot};

/// One aimed point of a cast: a hex, optionally pinned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destination {
    pub unit: Option<UnitId>,
    pub hex: BattleHex,
}

impl Destination {
    pub fn hex(hex: BattleHex) -> Self {
        Self { unit: None, hex }
    }

    pub fn unit(unit: &UnitSnapshot) -> Self {
        Self {
            unit: Some(unit.id()),
            hex: unit.position(),
        }
    }

    pub fn unit_at(unit: UnitId, hex: BattleHex) -> Self {
        Self {
            unit: Some(unit),
            hex,
        }
    }
}

/// Ordered destinations of a cast or of one effect.
pub type Target = Vec<Destination>;

/// What an effect expects its target to look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetShape {
    /// Applied once, no destination.
    None,
    /// Any number of units.
    Units,
    /// Hexes on the field.
    Location,
    /// A unit followed by a hex.
    UnitAndLocation,
    /// A unit acted on followed by a unit consumed by the effect.
    UnitPair,
}

impl TargetShape {
    /// Number of aimed destinations the shape insists on, if fixed.
    pub fn exact_destinations(self) -> Option<usize> {
        match self {
            Self::UnitAndLocation | Self::UnitPair => Some(2),
            Self::None | Self::Units | Self::Location => None,
        }
    }
}
