//! Hexagonal battlefield coordinates.
//!
//! The field is [`BattleConfig::FIELD_WIDTH`] columns by
//! [`BattleConfig::FIELD_HEIGHT`] rows stored row-major. Odd rows are shifted
//! half a hex to the right. Negative indices are sentinels for positions that
//! are not on the field (structures of a fortified battlefield).

use std::fmt;

use arrayvec::ArrayVec;

use crate::config::BattleConfig;
use crate::unit::BattleSide;

/// Step direction between adjacent hexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HexDirection {
    TopLeft,
    TopRight,
    Right,
    BottomRight,
    BottomLeft,
    Left,
}

/// Index of a hex on the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleHex(pub i16);

impl BattleHex {
    pub const INVALID: Self = Self(-1);
    /// Central keep of a fortified battlefield.
    pub const KEEP: Self = Self(-2);
    pub const LOWER_TOWER: Self = Self(-3);
    pub const UPPER_TOWER: Self = Self(-4);

    /// Builds a hex from column and row. Out-of-field coordinates yield
    /// [`BattleHex::INVALID`].
    pub fn new(x: i16, y: i16) -> Self {
        if (0..BattleConfig::FIELD_WIDTH).contains(&x) && (0..BattleConfig::FIELD_HEIGHT).contains(&y)
        {
            Self(y * BattleConfig::FIELD_WIDTH + x)
        } else {
            Self::INVALID
        }
    }

    pub const fn x(self) -> i16 {
        self.0 % BattleConfig::FIELD_WIDTH
    }

    pub const fn y(self) -> i16 {
        self.0 / BattleConfig::FIELD_WIDTH
    }

    /// Returns true for hexes on the field (sentinels excluded).
    pub const fn is_valid(self) -> bool {
        self.0 >= 0 && self.0 < BattleConfig::FIELD_SIZE
    }

    /// Returns true for hexes a unit may stand on. The outermost columns are
    /// reserved for war machines and cannot be entered.
    pub const fn is_available(self) -> bool {
        self.is_valid() && self.x() > 0 && self.x() < BattleConfig::FIELD_WIDTH - 1
    }

    /// Returns true for tower and keep sentinels.
    pub const fn is_structure(self) -> bool {
        matches!(self.0, -4..=-2)
    }

    /// Adjacent hexes that exist on the field.
    pub fn neighbours(self) -> ArrayVec<BattleHex, 6> {
        let mut out = ArrayVec::new();
        if !self.is_valid() {
            return out;
        }
        let (x, y) = (self.x(), self.y());
        // Odd rows are shifted right, so their diagonal neighbours lean right.
        let shift = if y % 2 == 0 { -1 } else { 0 };
        let candidates = [
            (x + shift, y - 1),
            (x + shift + 1, y - 1),
            (x - 1, y),
            (x + 1, y),
            (x + shift, y + 1),
            (x + shift + 1, y + 1),
        ];
        for (cx, cy) in candidates {
            let hex = Self::new(cx, cy);
            if hex.is_valid() {
                out.push(hex);
            }
        }
        out
    }

    /// Neighbour in `direction`, or [`BattleHex::INVALID`] off the field.
    pub fn step(self, direction: HexDirection) -> BattleHex {
        if !self.is_valid() {
            return Self::INVALID;
        }
        let (x, y) = (self.x(), self.y());
        let shift = if y % 2 == 0 { -1 } else { 0 };
        match direction {
            HexDirection::TopLeft => Self::new(x + shift, y - 1),
            HexDirection::TopRight => Self::new(x + shift + 1, y - 1),
            HexDirection::Right => Self::new(x + 1, y),
            HexDirection::BottomRight => Self::new(x + shift + 1, y + 1),
            HexDirection::BottomLeft => Self::new(x + shift, y + 1),
            HexDirection::Left => Self::new(x - 1, y),
        }
    }

    pub fn is_adjacent(self, other: BattleHex) -> bool {
        self.neighbours().contains(&other)
    }

    /// Cube coordinates (q, r) for distance computations.
    fn axial(self) -> (i32, i32) {
        let (x, y) = (i32::from(self.x()), i32::from(self.y()));
        // Odd-r offset to axial.
        (x - (y - (y & 1)) / 2, y)
    }

    /// Number of steps between two field hexes. Sentinels are infinitely far.
    pub fn distance(a: BattleHex, b: BattleHex) -> u32 {
        if !a.is_valid() || !b.is_valid() {
            return u32::MAX;
        }
        let (aq, ar) = a.axial();
        let (bq, br) = b.axial();
        let dq = aq - bq;
        let dr = ar - br;
        ((dq.abs() + dr.abs() + (dq + dr).abs()) / 2) as u32
    }

    /// Hexes covered by a unit standing here. Double-wide units extend
    /// backwards: left for the attacker side, right for the defender side.
    pub fn occupied_with(self, double_wide: bool, side: BattleSide) -> ArrayVec<BattleHex, 2> {
        let mut out = ArrayVec::new();
        out.push(self);
        if double_wide && self.is_valid() {
            let back = match side {
                BattleSide::Attacker => Self::new(self.x() - 1, self.y()),
                BattleSide::Defender => Self::new(self.x() + 1, self.y()),
            };
            if back.is_valid() {
                out.push(back);
            }
        }
        out
    }

    /// Every hex of the field in index order.
    pub fn all() -> impl Iterator<Item = BattleHex> {
        (0..BattleConfig::FIELD_SIZE).map(BattleHex)
    }

    /// Hexes within `radius` steps of `self` (including `self`).
    pub fn within(self, radius: u32) -> Vec<BattleHex> {
        Self::all()
            .filter(|hex| Self::distance(self, *hex) <= radius)
            .collect()
    }
}

impl Default for BattleHex {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for BattleHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "({}, {})", self.x(), self.y())
        } else {
            write!(f, "hex{}", self.0)
        }
    }
}
