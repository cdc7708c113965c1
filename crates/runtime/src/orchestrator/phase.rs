//! Per-attack state machine.

use serde::{Deserialize, Serialize};

/// Where an attack is in its lifecycle.
///
/// ```text
/// Selecting -> RollingHit -> Missed ----------------------------> Completed
///                         -> Dodging -> Dodged -----------------> Completed
///                                    -> Hitting -> Resolved ----> Completed
/// ```
///
/// Aborts jump straight to `Completed` from any earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackPhase {
    Selecting,
    RollingHit,
    Missed,
    Dodging,
    Dodged,
    Hitting,
    Resolved,
    Completed,
}

impl AttackPhase {
    pub fn can_advance_to(self, next: AttackPhase) -> bool {
        use AttackPhase::*;
        match (self, next) {
            (Completed, _) => false,
            (_, Completed) => true,
            (Selecting, RollingHit)
            | (RollingHit, Missed)
            | (RollingHit, Dodging)
            | (Dodging, Dodged)
            | (Dodging, Hitting)
            | (Hitting, Resolved) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == AttackPhase::Completed
    }
}

impl std::fmt::Display for AttackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AttackPhase::Selecting => "selecting",
            AttackPhase::RollingHit => "rolling_hit",
            AttackPhase::Missed => "missed",
            AttackPhase::Dodging => "dodging",
            AttackPhase::Dodged => "dodged",
            AttackPhase::Hitting => "hitting",
            AttackPhase::Resolved => "resolved",
            AttackPhase::Completed => "completed",
        };
        write!(f, "{}", label)
    }
}
