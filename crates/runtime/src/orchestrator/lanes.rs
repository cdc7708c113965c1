//! Per-attacker serialization.
//!
//! Every attacker has one lane. An attack holds its attacker's lane from
//! move selection to completion; a second attack by the same attacker waits
//! in FIFO order. Different attackers never block each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as LaneLock, OwnedMutexGuard};

use combat_core::CombatantId;

pub type LaneGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct AttackerLanes {
    lanes: Mutex<HashMap<CombatantId, Arc<LaneLock<()>>>>,
}

impl AttackerLanes {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane(&self, attacker: CombatantId) -> Arc<LaneLock<()>> {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(lanes.entry(attacker).or_default())
    }

    /// Waits until `attacker` has no other attack in progress.
    pub async fn acquire(&self, attacker: CombatantId) -> LaneGuard {
        self.lane(attacker).lock_owned().await
    }

    /// Whether an attack currently holds `attacker`'s lane.
    pub fn is_busy(&self, attacker: CombatantId) -> bool {
        self.lane(attacker).try_lock().is_err()
    }
}
