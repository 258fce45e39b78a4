/// How far a heal may go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HealLevel {
    /// Restores the leading individual only.
    Heal,
    /// Restores dead individuals up to the original stack size.
    Resurrect,
    /// Uncapped.
    Overheal,
}

/// Whether healed individuals stay after the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HealPower {
    OneBattle,
    Permanent,
}

/// Shared health of a stack.
///
/// The leading individual carries the partial health (`first_hp_left`), the
/// rest are at full health (`full_units`). `resurrected` counts individuals
/// restored for this battle only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthPool {
    max_per_unit: i64,
    base_amount: i64,
    first_hp_left: i64,
    full_units: i64,
    resurrected: i64,
}

impl HealthPool {
    pub fn new(max_per_unit: i64, base_amount: i64) -> Self {
        let mut pool = Self {
            max_per_unit: max_per_unit.max(1),
            base_amount: base_amount.max(0),
            first_hp_left: 0,
            full_units: 0,
            resurrected: 0,
        };
        pool.reset();
        pool
    }

    /// Restores the stack to its starting size at full health.
    pub fn reset(&mut self) {
        self.full_units = if self.base_amount > 1 { self.base_amount - 1 } else { 0 };
        self.first_hp_left = if self.base_amount > 0 { self.max_per_unit } else { 0 };
        self.resurrected = 0;
    }

    /// Empties the pool.
    pub fn clear(&mut self) {
        self.full_units = 0;
        self.first_hp_left = 0;
        self.resurrected = 0;
    }

    pub fn max_per_unit(&self) -> i64 {
        self.max_per_unit
    }

    pub fn first_hp_left(&self) -> i64 {
        self.first_hp_left
    }

    pub fn full_units(&self) -> i64 {
        self.full_units
    }

    pub fn resurrected(&self) -> i64 {
        self.resurrected
    }

    pub fn available(&self) -> i64 {
        self.first_hp_left + self.max_per_unit * self.full_units
    }

    pub fn total(&self) -> i64 {
        self.max_per_unit * self.base_amount
    }

    /// Living individuals.
    pub fn count(&self) -> i64 {
        self.full_units + i64::from(self.first_hp_left > 0)
    }

    /// Applies damage. `amount` is clamped to the available health and holds
    /// the damage actually dealt on return.
    pub fn damage(&mut self, amount: &mut i64) {
        *amount = (*amount).max(0);
        let old_count = self.count();

        if *amount >= self.first_hp_left {
            let mut remaining = self.available();
            if *amount > remaining {
                *amount = remaining;
            }
            remaining -= *amount;
            if remaining <= 0 {
                self.full_units = 0;
                self.first_hp_left = 0;
            } else {
                self.set_from_total(remaining);
            }
        } else {
            self.first_hp_left -= *amount;
        }

        self.add_resurrected(self.count() - old_count);
    }

    /// Applies healing capped by `level`. `amount` holds the health actually
    /// restored on return.
    pub fn heal(&mut self, amount: &mut i64, level: HealLevel, power: HealPower) {
        let old_count = self.count();

        let cap = match level {
            HealLevel::Heal => (self.max_per_unit - self.first_hp_left).max(0),
            HealLevel::Resurrect => (self.total() - self.available()).max(0),
            HealLevel::Overheal => i64::MAX,
        };
        *amount = (*amount).clamp(0, cap);
        if *amount == 0 {
            return;
        }

        self.set_from_total(self.available() + *amount);

        if power == HealPower::OneBattle {
            self.add_resurrected(self.count() - old_count);
        }
    }

    /// Removes individuals restored for this battle only.
    pub fn take_resurrected(&mut self) {
        if self.resurrected != 0 {
            let remaining = (self.available() - self.resurrected * self.max_per_unit).max(0);
            self.set_from_total(remaining);
            self.resurrected = 0;
        }
    }

    pub(crate) fn restore(&mut self, first_hp_left: i64, full_units: i64, resurrected: i64) {
        self.first_hp_left = first_hp_left.clamp(0, self.max_per_unit);
        self.full_units = full_units.max(0);
        self.resurrected = resurrected.max(0);
    }

    fn add_resurrected(&mut self, amount: i64) {
        self.resurrected = (self.resurrected + amount).max(0);
    }

    fn set_from_total(&mut self, total: i64) {
        self.first_hp_left = total % self.max_per_unit;
        self.full_units = total / self.max_per_unit;
        // The leading individual is always the partial one.
        if self.first_hp_left == 0 && self.full_units >= 1 {
            self.first_hp_left = self.max_per_unit;
            self.full_units -= 1;
        }
    }
}
