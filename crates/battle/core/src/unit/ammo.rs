use std::sync::atomic::{AtomicI32, Ordering};

use super::UnitBonuses;
use crate::bonus::{BonusBearer, BonusType};
use crate::config::BattleConfig;

/// Counter category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AmmoKind {
    Shots,
    Casts,
    Retaliations,
}

/// Limited-use resource: `used` against a total derived from bonuses.
///
/// Retaliations cache their total: within one round the reported total never
/// drops, even if the granting bonuses are removed. [`Ammo::reset`] clears the
/// cache at the start of the next round.
#[derive(Debug)]
pub struct Ammo {
    kind: AmmoKind,
    used: i32,
    total_cache: AtomicI32,
}

impl Ammo {
    pub fn new(kind: AmmoKind) -> Self {
        Self {
            kind,
            used: 0,
            total_cache: AtomicI32::new(0),
        }
    }

    pub fn kind(&self) -> AmmoKind {
        self.kind
    }

    pub fn used(&self) -> i32 {
        self.used
    }

    pub(crate) fn total_cache(&self) -> i32 {
        self.total_cache.load(Ordering::Relaxed)
    }

    pub(crate) fn restore(&mut self, used: i32, total_cache: i32) {
        self.used = used.max(0);
        *self.total_cache.get_mut() = total_cache.max(0);
    }

    pub fn is_limited(&self, bonuses: &UnitBonuses) -> bool {
        match self.kind {
            AmmoKind::Shots => !bonuses.ammo_cart,
            AmmoKind::Casts => true,
            AmmoKind::Retaliations => !bonuses.has_bonus_of_type(BonusType::UnlimitedRetaliations),
        }
    }

    pub fn total(&self, bonuses: &UnitBonuses) -> i32 {
        match self.kind {
            AmmoKind::Shots => bonuses.value_of_type(BonusType::Shots),
            AmmoKind::Casts => bonuses.value_of_type(BonusType::Casts),
            AmmoKind::Retaliations => {
                let granted = BattleConfig::RETALIATION_BASELINE
                    + bonuses.value_of_type(BonusType::AdditionalRetaliation);
                let previous = self.total_cache.fetch_max(granted, Ordering::Relaxed);
                previous.max(granted)
            }
        }
    }

    pub fn available(&self, bonuses: &UnitBonuses) -> i32 {
        self.total(bonuses) - self.used
    }

    pub fn can_use(&self, amount: i32, bonuses: &UnitBonuses) -> bool {
        !self.is_limited(bonuses) || self.available(bonuses) - amount >= 0
    }

    /// Consumes `amount`. Overuse clamps to what is left and is logged.
    pub fn use_ammo(&mut self, amount: i32, bonuses: &UnitBonuses) {
        if !self.is_limited(bonuses) {
            return;
        }
        let available = self.available(bonuses);
        if available - amount < 0 {
            tracing::warn!(kind = %self.kind, amount, available, "ammo overuse");
            self.used += available.max(0);
        } else {
            self.used += amount;
        }
    }

    pub fn reset(&mut self) {
        self.used = 0;
        *self.total_cache.get_mut() = 0;
    }
}

impl Clone for Ammo {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            used: self.used,
            total_cache: AtomicI32::new(self.total_cache()),
        }
    }
}

impl PartialEq for Ammo {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.used == other.used && self.total_cache() == other.total_cache()
    }
}

impl Eq for Ammo {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{Bonus, BonusList};

    fn bonuses(list: Vec<Bonus>) -> UnitBonuses {
        UnitBonuses::new(BonusList::from(list), 1)
    }

    #[test]
    fn shots_run_out_and_clamp() {
        let b = bonuses(vec![Bonus::ability(BonusType::Shots, 2)]);
        let mut shots = Ammo::new(AmmoKind::Shots);
        assert_eq!(shots.available(&b), 2);
        shots.use_ammo(1, &b);
        assert_eq!(shots.available(&b), 1);
        shots.use_ammo(1, &b);
        assert_eq!(shots.available(&b), 0);
        shots.use_ammo(1, &b);
        assert_eq!(shots.used(), 2);
        assert_eq!(shots.available(&b), 0);
        assert!(!shots.can_use(1, &b));
    }

    #[test]
    fn ammo_cart_makes_shots_unlimited() {
        let mut b = bonuses(vec![Bonus::ability(BonusType::Shots, 1)]);
        b.ammo_cart = true;
        let mut shots = Ammo::new(AmmoKind::Shots);
        shots.use_ammo(1, &b);
        shots.use_ammo(1, &b);
        assert_eq!(shots.used(), 0);
        assert!(shots.can_use(5, &b));
    }

    #[test]
    fn retaliations_default_to_one() {
        let b = bonuses(Vec::new());
        let mut retaliations = Ammo::new(AmmoKind::Retaliations);
        assert!(retaliations.can_use(1, &b));
        retaliations.use_ammo(1, &b);
        assert!(!retaliations.can_use(1, &b));
        retaliations.reset();
        assert!(retaliations.can_use(1, &b));
    }

    #[test]
    fn retaliation_total_survives_debuff_until_reset() {
        let buffed = bonuses(vec![Bonus::ability(BonusType::AdditionalRetaliation, 2)]);
        let plain = bonuses(Vec::new());
        let mut retaliations = Ammo::new(AmmoKind::Retaliations);
        assert_eq!(retaliations.total(&buffed), 3);
        assert_eq!(retaliations.total(&plain), 3);
        retaliations.reset();
        assert_eq!(retaliations.total(&plain), 1);
    }

    #[test]
    fn unlimited_retaliations_ignore_usage() {
        let b = bonuses(vec![Bonus::ability(BonusType::UnlimitedRetaliations, 0)]);
        let mut retaliations = Ammo::new(AmmoKind::Retaliations);
        for _ in 0..5 {
            retaliations.use_ammo(1, &b);
        }
        assert!(retaliations.can_use(1, &b));
    }

    #[test]
    fn casts_come_from_bonus() {
        let b = bonuses(vec![Bonus::ability(BonusType::Casts, 1)]);
        let mut casts = Ammo::new(AmmoKind::Casts);
        assert!(casts.can_use(1, &b));
        casts.use_ammo(1, &b);
        assert!(!casts.can_use(1, &b));
    }
}
