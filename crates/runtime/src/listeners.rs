//! Damage listeners shipped with the runtime.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use combat_core::{DamageEvent, DamageListener};

/// Logs every damage event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDamageListener;

impl DamageListener for TracingDamageListener {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn priority(&self) -> i32 {
        i32::MAX
    }

    fn on_damage(&self, event: &DamageEvent) {
        debug!(
            target: "runtime::damage",
            defender = %event.target,
            source = ?event.source,
            requested = event.requested,
            applied = event.applied,
            prevented = ?event.prevented,
            hp = event.hp_after,
            max_hp = event.max_hp,
            "damage"
        );
    }
}

/// Keeps a copy of every damage event, in notification order.
#[derive(Debug, Default)]
pub struct DamageRecorder {
    events: Mutex<Vec<DamageEvent>>,
}

impl DamageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DamageEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Health lost by every target so far.
    pub fn total_applied(&self) -> u32 {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|event| event.applied)
            .sum()
    }
}

impl DamageListener for DamageRecorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn on_damage(&self, event: &DamageEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
    }
}
