//! Attack orchestration.
//!
//! Each attack runs on its own task:
//!
//! 1. register in the [`InFlightRegistry`] and publish `AttackEvent::Started`
//! 2. wait for the attacker's lane ([`AttackerLanes`])
//! 3. run the [`pipeline`] against the battle worker
//! 4. publish `AttackEvent::Resolved` and complete the [`AttackSession`]
//!
//! Rules failures end the attack with a well-formed [`AttackReport`]; only
//! runtime plumbing failures reach the caller as errors.

mod inflight;
mod lanes;
mod phase;
mod pipeline;
mod report;
mod session;

pub use inflight::{InFlightGuard, InFlightRegistry, Quiescence};
pub use lanes::{AttackerLanes, LaneGuard};
pub use phase::AttackPhase;
pub use report::{AbortReason, AttackOutcome, AttackReport, TargetReport};
pub use session::{AttackHandle, AttackId, AttackSession};

use tracing::{Instrument, error, info_span};

use combat_core::CombatantId;

use crate::api::RuntimeHandle;
use crate::events::AttackEvent;

/// A request for `attacker` to attack `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRequest {
    pub attacker: CombatantId,
    pub target: CombatantId,
    /// Move slot to use; `None` picks the first usable move in range.
    pub slot: Option<usize>,
}

impl AttackRequest {
    pub fn new(attacker: CombatantId, target: CombatantId) -> Self {
        Self {
            attacker,
            target,
            slot: None,
        }
    }

    #[must_use]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }
}

pub(crate) fn spawn_attack(runtime: &RuntimeHandle, request: AttackRequest) -> AttackHandle {
    let inflight = runtime.inflight();
    let id = inflight.next_id();
    let guard = inflight.register(id, request.attacker, request.target);
    let (mut session, handle) = AttackSession::open(id, request.attacker, request.target);

    runtime.event_bus().publish(AttackEvent::Started {
        attack: id,
        attacker: request.attacker,
        target: request.target,
    });

    let task_runtime = runtime.clone();
    let span = info_span!(target: "runtime::orchestrator", "attack", attack = %id);
    let task = tokio::spawn(
        async move {
            let _guard = guard;
            let _lane = task_runtime.lanes().acquire(request.attacker).await;

            let result = pipeline::run(&task_runtime, &mut session, request.slot).await;
            match &result {
                Ok(report) => task_runtime.event_bus().publish(AttackEvent::Resolved {
                    attack: report.id,
                    attacker: report.attacker,
                    target: report.target,
                    move_name: report.move_name.map(str::to_owned),
                    outcome: report.outcome,
                    damage: report.damage_dealt(),
                }),
                Err(error) => {
                    error!(target: "runtime::orchestrator", %error, "attack failed");
                }
            }
            session.complete(result);
        }
        .instrument(span),
    );
    inflight.attach_task(id, task.abort_handle());

    handle
}
