use crate::hex::BattleHex;
use crate::spell::SpellId;
use crate::unit::BattleSide;

/// Obstacle category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObstacleKind {
    /// Terrain feature placed at battle start.
    Usual,
    /// Large terrain feature that cannot be cleared by ordinary spells.
    Absolute,
    Moat,
    FireWall,
    ForceField,
    LandMine,
    Quicksand,
}

/// Obstacle on the field.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub position: BattleHex,
    /// Covered hexes; always contains `position`.
    pub area: Vec<BattleHex>,
    /// Spell that created the obstacle.
    pub spell: Option<SpellId>,
    pub caster_side: Option<BattleSide>,
    pub spell_level: u8,
    pub caster_power: i64,
    /// Rounds left; negative for permanent obstacles.
    pub turns_remaining: i32,
    pub visible_for_other_side: bool,
}

impl Obstacle {
    /// Terrain obstacle covering `area`.
    pub fn terrain(id: u32, kind: ObstacleKind, area: Vec<BattleHex>) -> Self {
        let position = area.first().copied().unwrap_or(BattleHex::INVALID);
        Self {
            id,
            kind,
            position,
            area,
            spell: None,
            caster_side: None,
            spell_level: 0,
            caster_power: 0,
            turns_remaining: -1,
            visible_for_other_side: true,
        }
    }

    pub fn covers(&self, hex: BattleHex) -> bool {
        self.area.contains(&hex)
    }

    /// Whether units may not enter the covered hexes.
    pub fn blocks_movement(&self) -> bool {
        matches!(
            self.kind,
            ObstacleKind::Usual | ObstacleKind::Absolute | ObstacleKind::ForceField
        )
    }

    pub fn is_spell_created(&self) -> bool {
        self.spell.is_some()
    }

    /// Whether `side` knows the obstacle is there.
    pub fn visible_to(&self, side: BattleSide) -> bool {
        self.visible_for_other_side || self.caster_side.is_none_or(|caster| caster == side)
    }

    /// Ages the obstacle by one round. Returns true once it has expired.
    pub fn tick(&mut self) -> bool {
        if self.turns_remaining < 0 {
            return false;
        }
        self.turns_remaining -= 1;
        self.turns_remaining <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_obstacles_never_expire() {
        let mut rock = Obstacle::terrain(1, ObstacleKind::Usual, vec![BattleHex::new(5, 5)]);
        for _ in 0..10 {
            assert!(!rock.tick());
        }
        assert!(rock.blocks_movement());
    }

    #[test]
    fn timed_obstacles_expire() {
        let mut wall = Obstacle::terrain(2, ObstacleKind::FireWall, vec![BattleHex::new(5, 5)]);
        wall.turns_remaining = 2;
        assert!(!wall.tick());
        assert!(wall.tick());
        assert!(!wall.blocks_movement());
    }

    #[test]
    fn hidden_mines_are_visible_to_caster_only() {
        let mut mine = Obstacle::terrain(3, ObstacleKind::LandMine, vec![BattleHex::new(7, 2)]);
        mine.caster_side = Some(BattleSide::Defender);
        mine.visible_for_other_side = false;
        assert!(mine.visible_to(BattleSide::Defender));
        assert!(!mine.visible_to(BattleSide::Attacker));
    }
}
