//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! launching attacks, driving rounds and streaming events from specific
//! topics.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};

use combat_core::{
    BattleOutcome, Combatant, CombatantId, DamageListener, RoundSummary, WeatherChange,
    WeatherKind,
};

use super::collaborators::Collaborators;
use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::orchestrator::{
    AttackHandle, AttackId, AttackReport, AttackRequest, AttackerLanes, InFlightRegistry,
    Quiescence, spawn_attack,
};
use crate::runtime::RuntimeConfig;
use crate::workers::{BattleSnapshot, Command};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    collaborators: Collaborators,
    lanes: Arc<AttackerLanes>,
    inflight: Arc<InFlightRegistry>,
    config: Arc<RuntimeConfig>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        collaborators: Collaborators,
        config: Arc<RuntimeConfig>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            collaborators,
            lanes: Arc::new(AttackerLanes::new()),
            inflight: Arc::new(InFlightRegistry::new()),
            config,
        }
    }

    /// Sends one command to the battle worker and waits for its reply.
    pub(crate) async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    // ===== attacks =====

    /// Starts an attack on its own task and returns immediately.
    ///
    /// Attacks by the same attacker resolve one at a time, in launch order.
    pub fn launch(&self, request: AttackRequest) -> AttackHandle {
        spawn_attack(self, request)
    }

    /// Launches an attack and waits for its report.
    pub async fn attack(&self, request: AttackRequest) -> Result<AttackReport> {
        self.launch(request).wait().await
    }

    /// Attacks launched but not yet completed, oldest first.
    pub fn active_attacks(&self) -> Vec<AttackId> {
        self.inflight.active()
    }

    /// Whether `attacker` has an attack queued or in progress.
    pub fn is_attacking(&self, attacker: CombatantId) -> bool {
        !self.inflight.by_attacker(attacker).is_empty()
    }

    /// Waits for every in-flight attack using the configured timeout.
    pub async fn complete_all_active_attacks(&self) -> Quiescence {
        self.complete_all_active_attacks_within(self.config.quiescence_timeout)
            .await
    }

    /// Waits for every in-flight attack, cancelling whatever is still
    /// running once `timeout` elapses. Transient presentation state is
    /// cleared either way.
    pub async fn complete_all_active_attacks_within(&self, timeout: Duration) -> Quiescence {
        let outcome = self.inflight.wait_idle(timeout).await;
        match &outcome {
            Quiescence::Idle => {
                info!(target: "runtime::inflight", "all attacks completed");
            }
            Quiescence::ForceCleared { abandoned } => {
                warn!(
                    target: "runtime::inflight",
                    abandoned = abandoned.len(),
                    timeout_ms = timeout.as_millis() as u64,
                    "quiescence timed out; attacks force-cleared"
                );
            }
        }
        self.collaborators.presentation.clear_transient();
        outcome
    }

    // ===== battle flow =====

    /// Starts a new round and returns the turn order.
    pub async fn begin_round(&self) -> Result<Vec<CombatantId>> {
        self.call(|reply| Command::BeginRound { reply }).await
    }

    /// Runs end-of-round weather and status processing.
    pub async fn end_round(&self) -> Result<RoundSummary> {
        Ok(self.call(|reply| Command::EndRound { reply }).await??)
    }

    /// Changes the weather. `None` uses the configured default duration.
    pub async fn set_weather(
        &self,
        kind: WeatherKind,
        duration: Option<u32>,
    ) -> Result<WeatherChange> {
        self.call(|reply| Command::SetWeather {
            kind,
            duration,
            reply,
        })
        .await
    }

    /// Ends the battle once every in-flight attack has settled.
    pub async fn end_battle(&self) -> Result<BattleOutcome> {
        self.complete_all_active_attacks().await;
        self.call(|reply| Command::EndBattle { reply }).await
    }

    pub async fn add_combatant(&self, combatant: Combatant) -> Result<()> {
        self.call(|reply| Command::AddCombatant {
            combatant: Box::new(combatant),
            reply,
        })
        .await
    }

    /// Registers a listener notified of every damage event.
    pub async fn register_listener(&self, listener: Arc<dyn DamageListener>) -> Result<()> {
        self.call(|reply| Command::RegisterListener { listener, reply })
            .await
    }

    /// Query the current battle state (read-only snapshot)
    pub async fn query_state(&self) -> Result<BattleSnapshot> {
        self.call(|reply| Command::QueryState { reply }).await
    }

    // ===== events =====

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Attack` - Attack started / resolved
    /// - `Topic::Battle` - Defeats, weather, rounds, battle end
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use combat_runtime::Topic;
    ///
    /// let mut battle_rx = handle.subscribe(Topic::Battle);
    /// while let Ok(event) = battle_rx.recv().await {
    ///     // Handle defeats, weather changes, ...
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub(crate) fn lanes(&self) -> &AttackerLanes {
        &self.lanes
    }

    pub(crate) fn inflight(&self) -> &Arc<InFlightRegistry> {
        &self.inflight
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("in_flight", &self.inflight.len())
            .field("event_bus", &self.event_bus)
            .finish_non_exhaustive()
    }
}
