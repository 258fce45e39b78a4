//! Target resolution shared by effects that act on units.

use super::EffectContext;
use crate::battle::BattleView;
use crate::hex::BattleHex;
use crate::spell::{CastProblem, Destination, Problem, ProblemLevel, SpellRange, Target};
use crate::unit::{BattleSide, UnitSnapshot};

/// Unit filter specific to one effect kind.
pub(crate) type UnitCheck<'f> = &'f dyn Fn(&dyn BattleView, &UnitSnapshot) -> bool;

fn candidate(unit: &UnitSnapshot, allow_dead: bool) -> bool {
    unit.is_valid_target(allow_dead)
}

/// Units the aimed destinations cover, in id order, filtered through the
/// cast context and `check`.
pub(crate) fn resolve(
    ctx: &EffectContext<'_>,
    view: &dyn BattleView,
    aimed: &Target,
    allow_dead: bool,
    check: UnitCheck<'_>,
) -> Target {
    let mut units: Vec<UnitSnapshot> = match ctx.range() {
        SpellRange::Mass => view.units_if(&|u| candidate(u, allow_dead)),
        SpellRange::Single => aimed
            .iter()
            .filter_map(|d| {
                d.unit
                    .and_then(|id| view.unit(id))
                    .or_else(|| view.unit_at(d.hex, !allow_dead))
            })
            .filter(|u| candidate(u, allow_dead))
            .collect(),
        SpellRange::Radius(radius) => {
            let area: Vec<BattleHex> = aimed
                .iter()
                .flat_map(|d| d.hex.within(u32::from(radius)))
                .collect();
            view.units_if(&|u| {
                candidate(u, allow_dead) && u.state.occupied_hexes().iter().any(|h| area.contains(h))
            })
        }
    };
    units.sort_by_key(|u| u.id());
    units.dedup_by_key(|u| u.id());
    units
        .iter()
        .filter(|u| ctx.affects(u) && check(view, u))
        .map(Destination::unit)
        .collect()
}

/// Whether any unit on the field would pass the filters.
pub(crate) fn any_affected(
    ctx: &EffectContext<'_>,
    view: &dyn BattleView,
    allow_dead: bool,
    check: UnitCheck<'_>,
    problem: &mut Problem,
) -> bool {
    let found = view
        .units_if(&|u| candidate(u, allow_dead))
        .iter()
        .any(|u| ctx.affects(u) && check(view, u));
    if !found {
        problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
    }
    found
}

/// A transformed unit target must name at least one unit.
pub(crate) fn require_units(target: &Target, problem: &mut Problem) -> bool {
    let ok = target.iter().any(|d| d.unit.is_some());
    if !ok {
        problem.add(CastProblem::NoAppropriateTarget, ProblemLevel::Normal);
    }
    ok
}

/// Snapshots of the units a target names, skipping any that vanished.
pub(crate) fn units_of(view: &dyn BattleView, target: &Target) -> Vec<UnitSnapshot> {
    target
        .iter()
        .filter_map(|d| d.unit.and_then(|id| view.unit(id)))
        .collect()
}

/// Closest hex to `near` where a unit of the given footprint fits, skipping
/// hexes in `claimed`.
pub(crate) fn free_hex_near(
    view: &dyn BattleView,
    near: BattleHex,
    double_wide: bool,
    side: BattleSide,
    claimed: &[BattleHex],
) -> Option<BattleHex> {
    let blocked = view.blocked_hexes(None);
    BattleHex::all()
        .filter(|hex| {
            hex.occupied_with(double_wide, side).iter().all(|h| {
                h.is_valid() && !blocked[h.0 as usize] && !claimed.contains(h)
            })
        })
        .min_by_key(|hex| (BattleHex::distance(near, *hex), hex.0))
}
