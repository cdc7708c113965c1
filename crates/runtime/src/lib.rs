//! Async attack orchestration for the combat engine.
//!
//! `combat-core` decides what happens; this crate decides when. A single
//! battle worker owns the [`BattleSession`](combat_core::BattleSession) and
//! runs rules steps one command at a time, while each attack runs on its own
//! task and awaits positioning, reactions and animations between steps.
//! Consumers embed [`Runtime`] and drive the battle through
//! [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the builder and configuration
//! - [`api`] exposes the handle, errors and collaborator contracts
//! - [`orchestrator`] runs attacks: lanes, in-flight tracking, sessions
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`listeners`] holds ready-made damage listeners
//! - `workers` keeps the battle worker internal to the crate
pub mod api;
pub mod events;
pub mod listeners;
pub mod orchestrator;
pub mod runtime;

mod workers;

pub use api::{
    AttackCue, BattleLog, Collaborators, GridPositioning, NoPresentation, NoReactions,
    Positioning, Presentation, PresentationError, ReactionOutcome, ReactionSystem, Result,
    RuntimeError, RuntimeHandle, TracingLog,
};
pub use events::{AttackEvent, BattleEvent, Event, EventBus, Topic};
pub use listeners::{DamageRecorder, TracingDamageListener};
pub use orchestrator::{
    AbortReason, AttackHandle, AttackId, AttackOutcome, AttackPhase, AttackReport,
    AttackRequest, Quiescence, TargetReport,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::BattleSnapshot;
