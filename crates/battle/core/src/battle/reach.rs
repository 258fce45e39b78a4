use std::collections::VecDeque;

use super::BattleView;
use crate::config::BattleConfig;
use crate::hex::BattleHex;
use crate::unit::UnitSnapshot;

/// Movement distances of one unit over the field.
///
/// Walkers spread breadth-first around living units and blocking obstacles.
/// Flyers skip intermediate blockers and only need a free destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reachability {
    origin: BattleHex,
    distances: Vec<u32>,
    predecessors: Vec<BattleHex>,
}

impl Reachability {
    pub fn compute<V: BattleView + ?Sized>(view: &V, unit: &UnitSnapshot) -> Self {
        let size = BattleConfig::FIELD_SIZE as usize;
        let mut result = Self {
            origin: unit.position(),
            distances: vec![u32::MAX; size],
            predecessors: vec![BattleHex::INVALID; size],
        };
        let origin = unit.position();
        if !origin.is_valid() {
            return result;
        }

        let double_wide = unit.state.definition().double_wide();
        let side = unit.side();
        let id = unit.id();
        let blocked = view.blocked_hexes(Some(id));
        let free: Vec<bool> = BattleHex::all()
            .map(|hex| {
                hex.occupied_with(double_wide, side)
                    .iter()
                    .all(|h| h.is_valid() && !blocked[h.0 as usize])
            })
            .collect();

        result.distances[origin.0 as usize] = 0;

        if unit.is_flying() {
            for hex in BattleHex::all() {
                if hex != origin && free[hex.0 as usize] {
                    result.distances[hex.0 as usize] = BattleHex::distance(origin, hex);
                    result.predecessors[hex.0 as usize] = origin;
                }
            }
            return result;
        }

        let mut queue = VecDeque::from([origin]);
        while let Some(current) = queue.pop_front() {
            let next_distance = result.distances[current.0 as usize] + 1;
            for neighbour in current.neighbours() {
                let index = neighbour.0 as usize;
                if !free[index] || result.distances[index] != u32::MAX {
                    continue;
                }
                result.distances[index] = next_distance;
                result.predecessors[index] = current;
                queue.push_back(neighbour);
            }
        }
        result
    }

    pub fn origin(&self) -> BattleHex {
        self.origin
    }

    /// Steps needed to reach `hex`, `u32::MAX` when unreachable.
    pub fn distance(&self, hex: BattleHex) -> u32 {
        if !hex.is_valid() {
            return u32::MAX;
        }
        self.distances[hex.0 as usize]
    }

    pub fn is_reachable(&self, hex: BattleHex, speed: i32) -> bool {
        let distance = self.distance(hex);
        distance != u32::MAX && i64::from(distance) <= i64::from(speed)
    }

    /// Hexes reachable with `speed` movement, origin included.
    pub fn reachable(&self, speed: i32) -> Vec<BattleHex> {
        BattleHex::all()
            .filter(|hex| self.is_reachable(*hex, speed))
            .collect()
    }

    /// Path from the origin to `hex`, origin excluded. Empty when unreachable.
    pub fn path_to(&self, hex: BattleHex) -> Vec<BattleHex> {
        if self.distance(hex) == u32::MAX {
            return Vec::new();
        }
        let mut path = Vec::new();
        let mut current = hex;
        while current != self.origin && current.is_valid() {
            path.push(current);
            current = self.predecessors[current.0 as usize];
        }
        path.reverse();
        path
    }

    /// Reachable hex with the smallest distance to `target`, preferring the
    /// shorter walk on ties.
    pub fn closest_to(&self, target: BattleHex) -> Option<BattleHex> {
        BattleHex::all()
            .filter(|hex| self.distance(*hex) != u32::MAX)
            .min_by_key(|hex| (BattleHex::distance(*hex, target), self.distance(*hex), hex.0))
    }
}
