use super::{EffectContext, SpellEffect};
use crate::battle::{BattleView, Obstacle, ObstacleKind};
use crate::change::BattleChange;
use crate::config::BattleConfig;
use crate::hex::{BattleHex, HexDirection};
use crate::rng::BattleRng;
use crate::spell::{CastError, CastProblem, Destination, Problem, ProblemLevel, SpellRange, Target, TargetShape};
use crate::unit::BattleSide;

/// How the obstacle tiles of one cast are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObstaclePlacement {
    /// One tile on every aimed hex, widened by the spell radius.
    Aimed,
    /// A line of tiles starting at the aimed hex, leaning toward the enemy.
    Wall { length: u8 },
    /// Random clear tiles anywhere on the field.
    Patch,
}

/// Places spell obstacles on the field.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ObstacleEffect {
    pub kind: ObstacleKind,
    pub placement: ObstaclePlacement,
    /// Rounds the obstacle stays; zero takes the cast duration, negative is
    /// permanent.
    pub turns: i32,
    /// Only the caster side sees it.
    pub hidden: bool,
    /// Tiles placed by a patch, per range level.
    pub patch_counts: [u8; BattleConfig::SPELL_LEVELS],
    /// Stack on tiles the same spell already covers instead of refreshing them.
    pub cumulative: bool,
}

impl Default for ObstacleEffect {
    fn default() -> Self {
        Self {
            kind: ObstacleKind::FireWall,
            placement: ObstaclePlacement::Aimed,
            turns: 0,
            hidden: false,
            patch_counts: [4, 4, 6, 8],
            cumulative: false,
        }
    }
}

impl ObstacleEffect {
    /// Whether a new tile of this effect may go on `hex`.
    ///
    /// Tiles left by the same spell do not block; they are refreshed or
    /// stacked on.
    pub fn is_clear(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, hex: BattleHex) -> bool {
        hex.is_available()
            && view.unit_at(hex, true).is_none()
            && view
                .obstacles_at(hex)
                .iter()
                .all(|o| o.spell == Some(ctx.spell_id()) && o.kind == self.kind)
    }

    /// Wall tiles from `start`, leaning toward the side opposite the caster.
    pub fn wall_from(start: BattleHex, length: u8, side: BattleSide) -> Vec<BattleHex> {
        let lean = match side {
            BattleSide::Attacker => HexDirection::BottomRight,
            BattleSide::Defender => HexDirection::BottomLeft,
        };
        let mut tiles = Vec::with_capacity(usize::from(length));
        let mut hex = start;
        for _ in 0..length.max(1) {
            if !hex.is_valid() {
                break;
            }
            tiles.push(hex);
            hex = hex.step(lean);
        }
        tiles
    }

    fn patch_count(&self, ctx: &EffectContext<'_>) -> usize {
        let level = usize::from(ctx.params.range_level).min(self.patch_counts.len() - 1);
        usize::from(self.patch_counts[level])
    }

    fn turns(&self, ctx: &EffectContext<'_>) -> i32 {
        if self.turns != 0 { self.turns } else { ctx.duration() }
    }

    fn make(&self, ctx: &EffectContext<'_>, id: u32, area: Vec<BattleHex>) -> Obstacle {
        let mut obstacle = Obstacle::terrain(id, self.kind, area);
        obstacle.spell = Some(ctx.spell_id());
        obstacle.caster_side = Some(ctx.side());
        obstacle.spell_level = ctx.params.effect_level;
        obstacle.caster_power = ctx.params.effect_power;
        obstacle.turns_remaining = self.turns(ctx);
        obstacle.visible_for_other_side = !self.hidden;
        obstacle
    }
}

impl SpellEffect for ObstacleEffect {
    fn shape(&self) -> TargetShape {
        TargetShape::Location
    }

    fn applicable(&self, ctx: &EffectContext<'_>, view: &dyn BattleView, problem: &mut Problem) -> bool {
        let any_clear = BattleHex::all().any(|hex| self.is_clear(ctx, view, hex));
        if !any_clear {
            problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
        }
        any_clear
    }

    fn transform_target(&self, ctx: &EffectContext<'_>, _view: &dyn BattleView, aimed: &Target) -> Target {
        let mut hexes: Vec<BattleHex> = match self.placement {
            ObstaclePlacement::Patch => Vec::new(),
            ObstaclePlacement::Wall { length } => aimed
                .first()
                .map(|d| Self::wall_from(d.hex, length, ctx.side()))
                .unwrap_or_default(),
            ObstaclePlacement::Aimed => match ctx.range() {
                SpellRange::Radius(radius) => aimed
                    .iter()
                    .flat_map(|d| d.hex.within(u32::from(radius)))
                    .collect(),
                SpellRange::Single | SpellRange::Mass => aimed.iter().map(|d| d.hex).collect(),
            },
        };
        hexes.sort();
        hexes.dedup();
        hexes.into_iter().map(Destination::hex).collect()
    }

    fn applicable_on(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        problem: &mut Problem,
    ) -> bool {
        if self.placement == ObstaclePlacement::Patch {
            return true;
        }
        if target.is_empty() {
            problem.add(CastProblem::NoDestination, ProblemLevel::Normal);
            return false;
        }
        let clear = target.iter().all(|d| self.is_clear(ctx, view, d.hex));
        if !clear {
            problem.add(CastProblem::DestinationBlocked, ProblemLevel::Normal);
        }
        clear
    }

    fn prepare(
        &self,
        ctx: &EffectContext<'_>,
        view: &dyn BattleView,
        target: &Target,
        rng: &mut dyn BattleRng,
    ) -> Result<Vec<BattleChange>, CastError> {
        let mut next_id = view.next_obstacle_id();
        let mut changes = Vec::new();

        let tiles: Vec<Vec<BattleHex>> = match self.placement {
            ObstaclePlacement::Wall { .. } => {
                let area: Vec<BattleHex> = target.iter().map(|d| d.hex).collect();
                if area.is_empty() { Vec::new() } else { vec![area] }
            }
            ObstaclePlacement::Aimed => target.iter().map(|d| vec![d.hex]).collect(),
            ObstaclePlacement::Patch => {
                let mut free: Vec<BattleHex> = BattleHex::all()
                    .filter(|hex| self.is_clear(ctx, view, *hex))
                    .collect();
                let mut picked = Vec::new();
                for _ in 0..self.patch_count(ctx) {
                    let Some(index) = rng.pick(free.len()) else {
                        break;
                    };
                    picked.push(vec![free.swap_remove(index)]);
                }
                picked
            }
        };

        let existing = view.obstacles();
        for area in tiles {
            let previous = existing
                .iter()
                .find(|o| o.spell == Some(ctx.spell_id()) && o.kind == self.kind && o.area == area);
            match previous {
                Some(previous) if !self.cumulative => {
                    let mut refreshed = previous.clone();
                    if refreshed.turns_remaining >= 0 {
                        refreshed.turns_remaining = refreshed.turns_remaining.max(self.turns(ctx));
                    }
                    changes.push(BattleChange::ObstacleUpdated(refreshed));
                }
                _ => {
                    let obstacle = self.make(ctx, next_id, area);
                    next_id += 1;
                    tracing::debug!(spell = %ctx.spell_id(), obstacle = obstacle.id, kind = %obstacle.kind, "obstacle placed");
                    changes.push(BattleChange::ObstacleAdded(obstacle));
                }
            }
        }
        Ok(changes)
    }
}
