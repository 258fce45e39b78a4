use super::{BonusList, BonusType, Selector};

/// Anything that exposes an aggregated bonus set.
pub trait BonusBearer {
    /// All effective bonuses matching `selector`.
    fn bonuses(&self, selector: &Selector) -> BonusList;

    /// Version stamp of the bonus set. Changes whenever the set changes.
    fn tree_version(&self) -> i64;

    fn value_of(&self, selector: &Selector) -> i32 {
        self.bonuses(selector).total_value()
    }

    fn has_bonus(&self, selector: &Selector) -> bool {
        !self.bonuses(selector).is_empty()
    }

    fn has_bonus_of_type(&self, kind: BonusType) -> bool {
        self.has_bonus(&Selector::of_type(kind))
    }

    fn value_of_type(&self, kind: BonusType) -> i32 {
        self.value_of(&Selector::of_type(kind))
    }

    fn value_of_subtype(&self, kind: BonusType, subtype: i32) -> i32 {
        self.value_of(&Selector::type_subtype(kind, subtype))
    }
}

impl BonusBearer for BonusList {
    fn bonuses(&self, selector: &Selector) -> BonusList {
        self.filtered(selector)
    }

    fn tree_version(&self) -> i64 {
        0
    }

    fn has_bonus(&self, selector: &Selector) -> bool {
        self.any(selector)
    }
}
