use std::fmt;
use std::sync::Arc;

use super::{Bonus, BonusDuration, BonusSource, BonusType};

/// Composable bonus filter.
///
/// Selectors are cheap to clone and can be shared across threads.
#[derive(Clone)]
pub struct Selector(Arc<dyn Fn(&Bonus) -> bool + Send + Sync>);

impl Selector {
    pub fn new(f: impl Fn(&Bonus) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn all() -> Self {
        Self::new(|_| true)
    }

    pub fn none() -> Self {
        Self::new(|_| false)
    }

    pub fn of_type(kind: BonusType) -> Self {
        Self::new(move |b| b.kind == kind)
    }

    pub fn type_subtype(kind: BonusType, subtype: i32) -> Self {
        Self::new(move |b| b.kind == kind && b.subtype == subtype)
    }

    /// Bonuses granted by one specific source (e.g. one spell).
    pub fn source(source: BonusSource, source_id: i32) -> Self {
        Self::new(move |b| b.source == source && b.source_id == source_id)
    }

    pub fn source_type(source: BonusSource) -> Self {
        Self::new(move |b| b.source == source)
    }

    /// Bonuses carrying any of the given duration flags.
    pub fn duration(flags: BonusDuration) -> Self {
        Self::new(move |b| b.duration.intersects(flags))
    }

    /// Bonuses still active `turn` rounds from now.
    pub fn turns(turn: i32) -> Self {
        Self::new(move |b| !b.duration.contains(BonusDuration::N_TURNS) || b.turns_remain > turn)
    }

    pub fn and(self, other: Selector) -> Self {
        Self::new(move |b| self.matches(b) && other.matches(b))
    }

    pub fn or(self, other: Selector) -> Self {
        Self::new(move |b| self.matches(b) || other.matches(b))
    }

    pub fn not(self) -> Self {
        Self::new(move |b| !self.matches(b))
    }

    #[inline]
    pub fn matches(&self, bonus: &Bonus) -> bool {
        (self.0)(bonus)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Selector(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinators_compose() {
        let shield = Bonus::new(
            BonusDuration::N_TURNS,
            BonusType::GeneralDamageReduction,
            BonusSource::SpellEffect,
            15,
        )
        .with_source_id(27)
        .with_subtype(0)
        .with_turns(2);

        assert!(Selector::of_type(BonusType::GeneralDamageReduction).matches(&shield));
        assert!(Selector::source(BonusSource::SpellEffect, 27).matches(&shield));
        assert!(!Selector::source(BonusSource::SpellEffect, 28).matches(&shield));
        assert!(
            Selector::of_type(BonusType::GeneralDamageReduction)
                .and(Selector::type_subtype(BonusType::GeneralDamageReduction, 0))
                .matches(&shield)
        );
        assert!(Selector::none().or(Selector::all()).matches(&shield));
        assert!(!Selector::all().not().matches(&shield));
    }

    #[test]
    fn turns_selector_tracks_remaining_rounds() {
        let timed = Bonus::ability(BonusType::NotActive, 0).with_turns(1);
        assert!(Selector::turns(0).matches(&timed));
        assert!(!Selector::turns(1).matches(&timed));
        assert!(Selector::turns(5).matches(&Bonus::ability(BonusType::Flying, 0)));
    }
}
