//! Damage listeners.
//!
//! Subsystems that care about damage (ability triggers, logging, UI health
//! bars) register a [`DamageListener`] with the battle session instead of
//! being called from the pipelines directly. Every damage application emits
//! exactly one [`DamageEvent`], including applications that were prevented.

use std::sync::Arc;

use crate::state::{CombatantId, StatusKind};
use crate::weather::WeatherKind;

/// Where a damage application came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DamageSource {
    Attack {
        attacker: CombatantId,
        move_name: &'static str,
        critical: bool,
    },
    /// Self-inflicted by the attacker's own move.
    Recoil { move_name: &'static str },
    Weather(WeatherKind),
    Status(StatusKind),
}

impl DamageSource {
    /// Attacker credited with a direct hit, if any.
    pub fn attacker(&self) -> Option<CombatantId> {
        match self {
            Self::Attack { attacker, .. } => Some(*attacker),
            _ => None,
        }
    }
}

/// Why requested damage was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PreventionReason {
    TypeImmunity,
    AlreadyDefeated,
    ZeroDamage,
}

/// A single damage application, successful or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DamageEvent {
    pub target: CombatantId,
    pub source: DamageSource,
    pub requested: u32,
    /// Health actually lost; never more than the target had.
    pub applied: u32,
    pub prevented: Option<PreventionReason>,
    pub hp_after: u32,
    pub max_hp: u32,
}

impl DamageEvent {
    pub fn is_lethal(&self) -> bool {
        self.applied > 0 && self.hp_after == 0
    }
}

/// Observer notified after health changes and before defeat checks.
pub trait DamageListener: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    fn on_damage(&self, event: &DamageEvent);
}

/// Listeners ordered by priority.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Vec<Arc<dyn DamageListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Equal priorities keep registration order.
    pub fn register(&mut self, listener: Arc<dyn DamageListener>) {
        let index = self
            .listeners
            .partition_point(|existing| existing.priority() <= listener.priority());
        self.listeners.insert(index, listener);
    }

    pub fn notify(&self, event: &DamageEvent) {
        for listener in &self.listeners {
            listener.on_damage(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listener names and priorities in execution order.
    pub fn listeners(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.listeners.iter().map(|l| (l.name(), l.priority()))
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|l| l.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        priority: i32,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl DamageListener for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn on_damage(&self, _event: &DamageEvent) {
            self.seen.lock().unwrap().push(self.name);
        }
    }

    #[test]
    fn listeners_run_in_priority_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        for (name, priority) in [("late", 10), ("early", -5), ("middle", 0), ("middle-2", 0)] {
            registry.register(Arc::new(Recorder {
                name,
                priority,
                seen: Arc::clone(&seen),
            }));
        }

        registry.notify(&DamageEvent {
            target: CombatantId(1),
            source: DamageSource::Weather(WeatherKind::Hail),
            requested: 3,
            applied: 3,
            prevented: None,
            hp_after: 7,
            max_hp: 10,
        });

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["early", "middle", "middle-2", "late"]
        );
    }
}
