//! Common error infrastructure for combat-core.
//!
//! Rules lookups that can fail (unknown combatant, empty move slot) surface a
//! [`CombatError`]. The orchestration layer turns these into well-formed
//! no-op attack results, so none of them is fatal to a battle.

use crate::state::CombatantId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Can retry with the same or an alternative action.
    ///
    /// Examples: move out of uses, target already defeated
    Recoverable,

    /// Invalid input that should not be retried without changes.
    ///
    /// Examples: unknown combatant, empty move slot
    Validation,

    /// Unexpected state inconsistency. Indicates a bug.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all combat-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for this error variant, used in logs and tests.
    fn error_code(&self) -> &'static str;
}

/// Errors raised by roster lookups and move bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("combatant {0} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0} has already been defeated")]
    CombatantDefeated(CombatantId),

    #[error("combatant {combatant} has no move in slot {slot}")]
    InvalidMoveSlot { combatant: CombatantId, slot: usize },

    #[error("move {name} has no uses left")]
    MoveExhausted { name: &'static str },

    #[error("move {name} can only be used as a reaction")]
    ReactionOnly { name: &'static str },
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownCombatant(_)
            | Self::InvalidMoveSlot { .. }
            | Self::ReactionOnly { .. } => ErrorSeverity::Validation,
            Self::CombatantDefeated(_) | Self::MoveExhausted { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCombatant(_) => "UNKNOWN_COMBATANT",
            Self::CombatantDefeated(_) => "COMBATANT_DEFEATED",
            Self::InvalidMoveSlot { .. } => "INVALID_MOVE_SLOT",
            Self::MoveExhausted { .. } => "MOVE_EXHAUSTED",
            Self::ReactionOnly { .. } => "REACTION_ONLY",
        }
    }
}

pub type CombatResult<T> = Result<T, CombatError>;
