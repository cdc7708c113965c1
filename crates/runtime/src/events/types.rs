//! Event types for different topics.

use serde::{Deserialize, Serialize};

use combat_core::{CombatantId, DefeatOutcome, Side, WeatherChange};

use crate::orchestrator::{AttackId, AttackOutcome};

/// Lifecycle of a single attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackEvent {
    /// The attack was accepted and is waiting for (or holding) its
    /// attacker's lane.
    Started {
        attack: AttackId,
        attacker: CombatantId,
        target: CombatantId,
    },

    /// The attack reached `Completed`.
    Resolved {
        attack: AttackId,
        attacker: CombatantId,
        target: CombatantId,
        move_name: Option<String>,
        outcome: AttackOutcome,
        /// Health lost across every struck target.
        damage: u32,
    },
}

/// Battle-wide state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    CombatantDefeated(DefeatOutcome),

    WeatherChanged(WeatherChange),

    RoundEnded {
        round: u32,
        /// Weather and status damage applications this round.
        damage_events: usize,
    },

    BattleEnded {
        winner: Option<Side>,
        rounds: u32,
    },
}
