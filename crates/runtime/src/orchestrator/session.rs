//! Attack sessions and their completion handles.
//!
//! Each attack owns the sending half of a oneshot channel. Completing the
//! session consumes it, so however many paths race to finish an attack the
//! caller's [`AttackHandle`] resolves exactly once.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use combat_core::CombatantId;

use super::phase::AttackPhase;
use super::report::AttackReport;
use crate::api::{Result, RuntimeError};

/// Identifier of one attack instance, unique within a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttackId(pub u64);

impl std::fmt::Display for AttackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attack-{}", self.0)
    }
}

/// State carried by one in-progress attack.
#[derive(Debug)]
pub struct AttackSession {
    id: AttackId,
    attacker: CombatantId,
    target: CombatantId,
    phase: AttackPhase,
    history: Vec<AttackPhase>,
    completion: Option<oneshot::Sender<Result<AttackReport>>>,
}

impl AttackSession {
    /// Opens a session in `Selecting` and returns the caller's handle.
    pub fn open(id: AttackId, attacker: CombatantId, target: CombatantId) -> (Self, AttackHandle) {
        let (tx, rx) = oneshot::channel();
        let session = Self {
            id,
            attacker,
            target,
            phase: AttackPhase::Selecting,
            history: vec![AttackPhase::Selecting],
            completion: Some(tx),
        };
        let handle = AttackHandle {
            id,
            attacker,
            target,
            completion: rx,
        };
        (session, handle)
    }

    pub fn id(&self) -> AttackId {
        self.id
    }

    pub fn attacker(&self) -> CombatantId {
        self.attacker
    }

    pub fn target(&self) -> CombatantId {
        self.target
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn history(&self) -> &[AttackPhase] {
        &self.history
    }

    /// Moves to `next` if the transition is legal.
    pub fn advance(&mut self, next: AttackPhase) -> bool {
        if !self.phase.can_advance_to(next) {
            warn!(
                target: "runtime::orchestrator",
                attack = %self.id,
                from = %self.phase,
                to = %next,
                "rejected phase transition"
            );
            return false;
        }
        trace!(
            target: "runtime::orchestrator",
            attack = %self.id,
            from = %self.phase,
            to = %next,
            "phase"
        );
        self.phase = next;
        self.history.push(next);
        true
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_none()
    }

    /// Resolves the caller's handle. Only the first call has any effect.
    pub fn complete(&mut self, result: Result<AttackReport>) -> bool {
        let Some(completion) = self.completion.take() else {
            debug!(
                target: "runtime::orchestrator",
                attack = %self.id,
                "attack already completed"
            );
            return false;
        };
        if !self.phase.is_terminal() {
            self.advance(AttackPhase::Completed);
        }
        if completion.send(result).is_err() {
            debug!(
                target: "runtime::orchestrator",
                attack = %self.id,
                "completion receiver dropped"
            );
        }
        true
    }
}

/// Caller-side view of a launched attack.
#[derive(Debug)]
pub struct AttackHandle {
    id: AttackId,
    attacker: CombatantId,
    target: CombatantId,
    completion: oneshot::Receiver<Result<AttackReport>>,
}

impl AttackHandle {
    pub fn id(&self) -> AttackId {
        self.id
    }

    pub fn attacker(&self) -> CombatantId {
        self.attacker
    }

    pub fn target(&self) -> CombatantId {
        self.target
    }

    /// Waits for the attack to finish.
    ///
    /// An attack cancelled by quiescence resolves with
    /// [`RuntimeError::AttackAbandoned`].
    pub async fn wait(self) -> Result<AttackReport> {
        match self.completion.await {
            Ok(result) => result,
            Err(_) => Err(RuntimeError::AttackAbandoned { attack: self.id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completion_fires_once() {
        let (mut session, handle) =
            AttackSession::open(AttackId(7), CombatantId(1), CombatantId(2));
        let first = AttackReport::new(AttackId(7), CombatantId(1), CombatantId(2));
        let mut second = first.clone();
        second.presentation_failed = true;

        assert!(session.complete(Ok(first.clone())));
        assert!(!session.complete(Ok(second)));
        assert!(session.is_completed());
        assert_eq!(session.phase(), AttackPhase::Completed);

        let report = handle.wait().await.unwrap();
        assert_eq!(report, first);
    }

    #[tokio::test]
    async fn dropped_session_abandons_the_handle() {
        let (session, handle) = AttackSession::open(AttackId(3), CombatantId(1), CombatantId(2));
        drop(session);
        assert!(matches!(
            handle.wait().await,
            Err(RuntimeError::AttackAbandoned { attack: AttackId(3) })
        ));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let (mut session, _handle) =
            AttackSession::open(AttackId(1), CombatantId(1), CombatantId(2));
        assert!(!session.advance(AttackPhase::Hitting));
        assert!(session.advance(AttackPhase::RollingHit));
        assert!(session.advance(AttackPhase::Dodging));
        assert!(session.advance(AttackPhase::Hitting));
        assert!(session.advance(AttackPhase::Resolved));
        assert!(session.advance(AttackPhase::Completed));
        assert!(!session.advance(AttackPhase::RollingHit));
        assert_eq!(
            session.history(),
            &[
                AttackPhase::Selecting,
                AttackPhase::RollingHit,
                AttackPhase::Dodging,
                AttackPhase::Hitting,
                AttackPhase::Resolved,
                AttackPhase::Completed,
            ]
        );
    }
}
