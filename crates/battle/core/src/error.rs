//! Common error infrastructure for battle-core.
//!
//! Domain-specific errors (e.g. [`crate::spell::CastError`]) live next to the
//! operations they describe. This module provides the shared severity taxonomy
//! and the contract-violation error raised by the authoritative store.
//!
//! # Design Principles
//!
//! - **Severity Classification**: errors are categorized for recovery strategies
//! - **Degrade, don't crash**: contract violations are logged and the offending
//!   operation becomes a no-op; a single bad decision never ends a match

use crate::unit::{CreatureId, UnitId};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with same or alternative action.
    ///
    /// Examples: destination blocked, no appropriate target
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: teleport without two destinations, unknown spell
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: update of a unit the battle doesn't know, healing a clone
    Internal,

    /// Fatal error - the requested capability does not exist.
    ///
    /// Examples: siege engine actions
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle errors.
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Contract violations detected by battle state implementations.
///
/// These are never returned across the mutation traits; implementations log
/// them via [`StateError::log`] and continue.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("unit {0} is not part of this battle")]
    UnknownUnit(UnitId),

    #[error("unit {0} already exists")]
    DuplicateUnit(UnitId),

    #[error("cannot heal clone {0}")]
    HealClone(UnitId),

    #[error("plain heal with one-battle power requested for unit {0}")]
    OneBattleHeal(UnitId),

    #[error("obstacle {0} does not exist")]
    UnknownObstacle(u32),

    #[error("creature {0} is not in the catalog")]
    UnknownCreature(CreatureId),
}

impl StateError {
    /// Emits this violation as an error-level log event.
    pub fn log(&self) {
        tracing::error!(code = self.error_code(), "{}", self);
    }
}

impl BattleError for StateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownObstacle(_) | Self::UnknownCreature(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => "STATE_UNKNOWN_UNIT",
            Self::DuplicateUnit(_) => "STATE_DUPLICATE_UNIT",
            Self::HealClone(_) => "STATE_HEAL_CLONE",
            Self::OneBattleHeal(_) => "STATE_ONE_BATTLE_HEAL",
            Self::UnknownObstacle(_) => "STATE_UNKNOWN_OBSTACLE",
            Self::UnknownCreature(_) => "STATE_UNKNOWN_CREATURE",
        }
    }
}
