//! Spell layer: definitions, casters, cast parameters, legality checks,
//! mechanics and the composable effects that mutate a battle.
//!
//! A cast flows through [`BattleCast`]: parameters are resolved, the
//! [`Mechanics`] check legality, targets are resolved and filtered, then each
//! effect of the spell level turns into [`BattleChange`](crate::change::BattleChange)
//! records. Real casts hand those records to a
//! [`ChangeSender`](crate::change::ChangeSender); evaluation applies them to a
//! private [`BattleState`](crate::battle::BattleState).

mod cast;
mod caster;
mod definition;
pub mod effect;
pub mod mechanics;
mod problem;
mod target;

pub use cast::{BattleCast, CastMode, CastParameters, CastReport};
pub use caster::{Caster, Hero, UnitCaster};
pub use definition::{
    MechanicsFamily, Positiveness, SpellDefinition, SpellId, SpellLevel, SpellRange, TargetType,
};
pub use effect::{Effect, EffectContext, EffectKind};
pub use mechanics::{Mechanics, SpellMechanics};
pub use problem::{CastProblem, Problem, ProblemLevel};
pub use target::{Destination, Target, TargetShape};

use crate::error::{BattleError, ErrorSeverity};

/// Errors raised while performing a cast.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    /// The cast is not legal in the current battle state.
    #[error("cast is not legal: {0}")]
    Illegal(Problem),

    /// The request itself is malformed; the sender was told.
    #[error("malformed cast request: {0}")]
    Malformed(String),
}

impl BattleError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Illegal(_) => ErrorSeverity::Recoverable,
            Self::Malformed(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Illegal(_) => "CAST_ILLEGAL",
            Self::Malformed(_) => "CAST_MALFORMED",
        }
    }
}
