//! Battle AI: picks one action for the unit whose turn it is.
//!
//! Decisions are made against what-if copies of the battle:
//! - [`HypotheticBattle`] layers private unit, bonus and side changes over a
//!   read-only [`BattleView`](battle_core::BattleView)
//! - [`PotentialTargets`] enumerates the attacks of one unit, each scored as
//!   an [`AttackPossibility`]
//! - [`SpellPlanner`] scores hero casts by replaying the upcoming turn order
//!   with and without the cast, on a worker pool
//! - [`BattleAi`] ties the stages together and always produces an action
//!
//! The authoritative battle is never touched except through a
//! [`BattleController`].
mod attack;
mod controller;
mod driver;
mod error;
mod overlay;
mod spells;
mod targets;

pub use attack::AttackPossibility;
pub use controller::{BattleController, LocalController};
pub use driver::BattleAi;
pub use error::AiError;
pub use overlay::{HypotheticBattle, ShadowUnit};
pub use spells::{best_candidate, evaluate_queue, SpellCandidate, SpellPlanner, ValueMap};
pub use targets::PotentialTargets;
