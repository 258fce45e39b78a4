/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Number of rounds the turn order looks ahead when the AI scores a spell.
    pub turn_order_rounds: usize,

    /// Upper bound on units listed per turn-order query (`None` = unbounded).
    pub max_turn_order_units: Option<usize>,

    /// Worker threads used for spell candidate scoring.
    /// `None` uses the available hardware concurrency (never less than one).
    pub worker_threads: Option<usize>,
}

impl BattleConfig {
    // ===== field geometry =====
    pub const FIELD_WIDTH: i16 = 17;
    pub const FIELD_HEIGHT: i16 = 11;
    pub const FIELD_SIZE: i16 = Self::FIELD_WIDTH * Self::FIELD_HEIGHT;

    // ===== rules =====
    /// Spell school levels: none, basic, advanced, expert.
    pub const SPELL_LEVELS: usize = 4;
    /// Retaliations every unit gets before bonuses.
    pub const RETALIATION_BASELINE: i32 = 1;
    /// Shots travelling further than this many hexes deal half damage.
    pub const DISTANCE_PENALTY_RANGE: u32 = 10;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TURN_ORDER_ROUNDS: usize = 2;

    pub fn new() -> Self {
        Self {
            turn_order_rounds: Self::DEFAULT_TURN_ORDER_ROUNDS,
            max_turn_order_units: None,
            worker_threads: None,
        }
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Resolves the worker count for candidate scoring.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_size_matches_geometry() {
        assert_eq!(BattleConfig::FIELD_SIZE, 187);
    }

    #[test]
    fn worker_threads_never_zero() {
        let config = BattleConfig::new().with_worker_threads(0);
        assert_eq!(config.resolved_worker_threads(), 1);
        assert!(BattleConfig::new().resolved_worker_threads() >= 1);
    }
}
