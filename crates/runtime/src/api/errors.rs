//! Unified error types surfaced by the runtime API.
//!
//! Rules failures never show up here: the orchestrator folds them into a
//! well-formed [`AttackReport`](crate::AttackReport). `RuntimeError` covers the
//! plumbing between handles, the battle worker and spawned attack tasks.
use thiserror::Error;
use tokio::sync::oneshot;

use combat_core::CombatError;

use crate::orchestrator::AttackId;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("battle worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("attack {attack} was abandoned before it completed")]
    AttackAbandoned { attack: AttackId },

    #[error("runtime requires a roster before building")]
    MissingRoster,

    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// Failure reported by a presentation collaborator.
///
/// Presentation failures are logged and never block resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("presentation failed: {message}")]
pub struct PresentationError {
    pub message: String,
}

impl PresentationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
