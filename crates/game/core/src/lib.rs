//! Deterministic combat rules for a turn-based creature battler.
//!
//! `combat-core` owns the rules: dice pools, hit and dodge resolution, the
//! layered damage pipeline, weather, and the bookkeeping that follows a hit
//! (effects, defeat, luck refunds). It performs no I/O and never suspends.
//! All battle state lives in a [`BattleSession`]; the async orchestration
//! that sequences attacks around animations lives in `combat-runtime`.
pub mod combat;
pub mod config;
pub mod dice;
pub mod error;
pub mod session;
pub mod state;
pub mod typing;
pub mod weather;

pub use combat::{
    DamageApplication, DamageEvent, DamageLayer, DamageListener, DamageResult, DamageSource,
    DefeatCause, DefeatOutcome, DodgeFailure, DodgeResult, HitResolution, ListenerRegistry,
    LuckRefund, PreventionReason, RollKind, SecondaryEffect, StrikePlan, StrikeReport,
};
pub use config::{CombatConfig, ForcingPolicy};
pub use dice::{AttackRoll, DiceSource, ScriptedDice, SeededDice, roll_pool};
pub use error::{CombatError, CombatResult, ErrorSeverity, GameError};
pub use session::{BattleOutcome, BattleSession, RoundSummary};
pub use state::{
    Combatant, CombatantId, Fraction, LuckPolicy, LuckPool, Move, MoveCategory, MoveEffect,
    MoveFlags, MoveSlot, Position, Roster, Side, StatBlock, StatKind, StatusKind, Strategy,
    TrainerClass,
};
pub use typing::{Ability, Effectiveness, EffectivenessTag, TypeTag};
pub use weather::{Weather, WeatherChange, WeatherKind, WeatherState, WeatherTag};
