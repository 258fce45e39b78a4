//! Decision-layer errors.

use battle_core::error::{BattleError, ErrorSeverity};
use battle_core::spell::{CastError, SpellId};
use battle_core::unit::UnitId;

/// Errors raised while picking an action.
///
/// None of these reach the caller of [`BattleAi::active_unit`]: the driver
/// logs them and answers with a defend action instead.
///
/// [`BattleAi::active_unit`]: crate::BattleAi::active_unit
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    /// The unit asked to act is not on the field.
    #[error("unit {0} is not on the battlefield")]
    UnknownUnit(UnitId),

    /// The requested decision is not supported for this kind of unit.
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    /// The spell chosen for the hero could not be cast.
    #[error("hero spell {spell} failed: {source}")]
    HeroSpell {
        spell: SpellId,
        #[source]
        source: CastError,
    },
}

impl BattleError for AiError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownUnit(_) => ErrorSeverity::Internal,
            Self::Unimplemented(_) => ErrorSeverity::Fatal,
            Self::HeroSpell { source, .. } => source.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => "AI_UNKNOWN_UNIT",
            Self::Unimplemented(_) => "AI_UNIMPLEMENTED",
            Self::HeroSpell { .. } => "AI_HERO_SPELL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unimplemented_is_fatal() {
        let err = AiError::Unimplemented("catapult targeting");
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert!(!err.severity().is_recoverable());
        assert_eq!(err.to_string(), "catapult targeting is not implemented");
    }
}
