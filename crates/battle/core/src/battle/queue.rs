use std::cmp::Reverse;

use super::BattleView;
use crate::unit::UnitSnapshot;

/// Units in acting order for `rounds` rounds starting with the current one.
///
/// Within a round units are ordered by queue phase, then initiative
/// (highest first), then id. The current round only lists units that will
/// still act; later rounds list every unit able to move. `max_units` caps the
/// total across all rounds.
pub fn turn_order<V: BattleView + ?Sized>(
    view: &V,
    rounds: usize,
    max_units: Option<usize>,
) -> Vec<Vec<UnitSnapshot>> {
    let units = view.alive_units();
    let mut remaining = max_units.unwrap_or(usize::MAX);
    let mut order = Vec::with_capacity(rounds);

    for round in 0..rounds {
        if remaining == 0 {
            break;
        }
        let turn = round as i32;
        let mut acting: Vec<UnitSnapshot> = units
            .iter()
            .filter(|u| if turn == 0 { u.will_move(0) } else { u.can_move(turn) })
            .cloned()
            .collect();
        acting.sort_by_key(|u| (u.queue_phase(turn), Reverse(u.initiative(turn)), u.id()));
        acting.truncate(remaining);
        remaining -= acting.len();
        order.push(acting);
    }
    order
}
