//! Combat resolution.
//!
//! Pure resolvers ([`resolve_hit`], [`resolve_dodge`], [`calculate_damage`])
//! take a dice source and plain inputs and return immutable results. The
//! session-level steps in [`attack`], [`effects`] and [`defeat`] wire those
//! resolvers to the roster and enforce mutation order.
//!
//! # Data flow
//!
//! ```text
//! choose move -> roll to hit -> (miss | dodge -> (dodged | plan strike -> apply strike))
//!                                                           |
//!                                 damage -> listeners -> defeat check -> secondary effects
//! ```

pub mod attack;
pub mod damage;
pub mod defeat;
pub mod dodge;
pub mod effects;
pub mod hit;
pub mod listeners;

pub use attack::{StrikePlan, StrikeReport};
pub use damage::{
    AbilityModifier, DamageContext, DamageLayer, DamageResult, LayerValue, calculate_damage,
    crit_threshold, stat_pair,
};
pub use defeat::{DefeatCause, DefeatOutcome, LuckRefund};
pub use dodge::{DodgeFailure, DodgeRequest, DodgeResult, resolve_dodge};
pub use effects::{DamageApplication, SecondaryEffect};
pub use hit::{ChainedRoll, HitRequest, HitResolution, RollKind, resolve_hit};
pub use listeners::{DamageEvent, DamageListener, DamageSource, ListenerRegistry, PreventionReason};
