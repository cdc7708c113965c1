//! Registry of attacks that have been launched but not completed.
//!
//! Attacks register when launched and deregister when their task ends,
//! through an RAII [`InFlightGuard`]. The live count is mirrored into a
//! `watch` channel so quiescence can await "no attacks in flight" without
//! polling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use combat_core::CombatantId;

use super::session::AttackId;

/// Result of waiting for every attack to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quiescence {
    /// Every attack completed within the timeout.
    Idle,
    /// The timeout elapsed; these attacks were cancelled.
    ForceCleared { abandoned: Vec<AttackId> },
}

impl Quiescence {
    pub fn is_clean(&self) -> bool {
        matches!(self, Quiescence::Idle)
    }
}

#[derive(Debug)]
struct InFlightEntry {
    attacker: CombatantId,
    target: CombatantId,
    task: Option<AbortHandle>,
}

#[derive(Debug)]
pub struct InFlightRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<AttackId, InFlightEntry>>,
    count: watch::Sender<usize>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
            count: watch::Sender::new(0),
        }
    }

    pub fn next_id(&self) -> AttackId {
        AttackId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<AttackId, InFlightEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(
        self: &Arc<Self>,
        id: AttackId,
        attacker: CombatantId,
        target: CombatantId,
    ) -> InFlightGuard {
        let mut entries = self.entries();
        entries.insert(
            id,
            InFlightEntry {
                attacker,
                target,
                task: None,
            },
        );
        self.count.send_replace(entries.len());
        debug!(
            target: "runtime::inflight",
            attack = %id,
            attacker = %attacker,
            in_flight = entries.len(),
            "registered"
        );
        InFlightGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Records the task driving `id` so a forced clear can cancel it.
    pub fn attach_task(&self, id: AttackId, task: AbortHandle) {
        if let Some(entry) = self.entries().get_mut(&id) {
            entry.task = Some(task);
        }
    }

    fn release(&self, id: AttackId) {
        let mut entries = self.entries();
        if entries.remove(&id).is_some() {
            self.count.send_replace(entries.len());
            debug!(
                target: "runtime::inflight",
                attack = %id,
                in_flight = entries.len(),
                "released"
            );
        }
    }

    pub fn len(&self) -> usize {
        *self.count.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// In-flight attacks, oldest first.
    pub fn active(&self) -> Vec<AttackId> {
        let mut ids: Vec<AttackId> = self.entries().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Attacks launched by `attacker` that have not completed.
    pub fn by_attacker(&self, attacker: CombatantId) -> Vec<AttackId> {
        let mut ids: Vec<AttackId> = self
            .entries()
            .iter()
            .filter(|(_, entry)| entry.attacker == attacker)
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Waits until no attack is in flight, cancelling stragglers once
    /// `timeout` elapses.
    pub async fn wait_idle(&self, timeout: Duration) -> Quiescence {
        let mut count = self.count.subscribe();
        match tokio::time::timeout(timeout, count.wait_for(|&n| n == 0)).await {
            Ok(_) => Quiescence::Idle,
            Err(_) => Quiescence::ForceCleared {
                abandoned: self.force_clear(),
            },
        }
    }

    /// Drops every entry and cancels the attached tasks.
    pub fn force_clear(&self) -> Vec<AttackId> {
        let drained: Vec<(AttackId, InFlightEntry)> = {
            let mut entries = self.entries();
            let drained = entries.drain().collect();
            self.count.send_replace(0);
            drained
        };

        let mut abandoned = Vec::with_capacity(drained.len());
        for (id, entry) in drained {
            warn!(
                target: "runtime::inflight",
                attack = %id,
                attacker = %entry.attacker,
                defender = %entry.target,
                "force-clearing attack"
            );
            if let Some(task) = entry.task {
                task.abort();
            }
            abandoned.push(id);
        }
        abandoned.sort();
        abandoned
    }
}

impl Default for InFlightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters its attack when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    id: AttackId,
}

impl InFlightGuard {
    pub fn id(&self) -> AttackId {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}
