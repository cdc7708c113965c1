//! High-level runtime orchestrator.
//!
//! The runtime owns the battle worker, wires up command/event channels, and
//! exposes a builder-based API for clients to drive a battle.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use combat_core::{
    BattleSession, CombatConfig, DamageListener, DiceSource, ForcingPolicy, Roster, SeededDice,
};

use crate::api::{
    BattleLog, Collaborators, Positioning, Presentation, ReactionSystem, Result, RuntimeError,
    RuntimeHandle,
};
use crate::events::EventBus;
use crate::workers::{BattleWorker, Command};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// How long quiescence waits before force-clearing in-flight attacks.
    pub quiescence_timeout: Duration,
    /// Upper bound on a single animation or projectile wait.
    pub animation_timeout: Duration,
    /// Seed for the battle's dice stream when no dice source is supplied.
    pub seed: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_QUIESCENCE_TIMEOUT: Duration = Duration::from_millis(5_000);
    pub const DEFAULT_ANIMATION_TIMEOUT: Duration = Duration::from_millis(2_000);

    /// Defaults overridden by `COMBAT_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(policy) = read_env::<ForcingPolicy>("COMBAT_FORCING_POLICY") {
            config.combat.forcing_policy = policy;
        }
        if let Some(cap) = read_env::<u32>("COMBAT_MAX_FORCED_REROLLS") {
            config.combat.max_forced_rerolls = cap;
        }
        if let Some(turns) = read_env::<u32>("COMBAT_WEATHER_DURATION") {
            config.combat.weather_duration = turns.max(1);
        }
        if let Some(ms) = read_env::<u64>("COMBAT_QUIESCENCE_TIMEOUT_MS") {
            config.quiescence_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("COMBAT_ANIMATION_TIMEOUT_MS") {
            config.animation_timeout = Duration::from_millis(ms);
        }
        if let Some(seed) = read_env::<u64>("COMBAT_SEED") {
            config.seed = seed;
        }

        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            quiescence_timeout: Self::DEFAULT_QUIESCENCE_TIMEOUT,
            animation_timeout: Self::DEFAULT_ANIMATION_TIMEOUT,
            seed: 0,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

/// Main runtime that owns the battle worker
///
/// Design: Runtime owns the worker task; [`RuntimeHandle`] provides a
/// cloneable façade for clients and attack tasks.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// Waits for in-flight attacks (bounded by the quiescence timeout), then
    /// stops the worker. The worker stops once every handle clone is gone.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.complete_all_active_attacks().await;
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)?;
        info!(target: "runtime", "runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    roster: Option<Roster>,
    dice: Option<Box<dyn DiceSource>>,
    collaborators: Collaborators,
    listeners: Vec<Arc<dyn DamageListener>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            roster: None,
            dice: None,
            collaborators: Collaborators::default(),
            listeners: Vec::new(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the combatants taking part (required)
    pub fn roster(mut self, roster: Roster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Replace the seeded dice stream (scripted scenarios, replays)
    pub fn dice(mut self, dice: impl DiceSource + 'static) -> Self {
        self.dice = Some(Box::new(dice));
        self
    }

    pub fn positioning(mut self, positioning: Arc<dyn Positioning>) -> Self {
        self.collaborators.positioning = positioning;
        self
    }

    pub fn presentation(mut self, presentation: Arc<dyn Presentation>) -> Self {
        self.collaborators.presentation = presentation;
        self
    }

    pub fn reactions(mut self, reactions: Arc<dyn ReactionSystem>) -> Self {
        self.collaborators.reactions = reactions;
        self
    }

    pub fn battle_log(mut self, log: Arc<dyn BattleLog>) -> Self {
        self.collaborators.log = log;
        self
    }

    /// Register a damage listener before the battle starts
    pub fn listener(mut self, listener: Arc<dyn DamageListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Build the runtime and start the battle worker
    pub async fn build(self) -> Result<Runtime> {
        let roster = self.roster.ok_or(RuntimeError::MissingRoster)?;
        let config = Arc::new(self.config);

        let mut session = match self.dice {
            Some(dice) => BattleSession::new(config.combat.clone(), roster, dice),
            None => BattleSession::new(config.combat.clone(), roster, SeededDice::new(config.seed)),
        };
        for listener in self.listeners {
            session.register_listener(listener);
        }

        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size.max(1));
        let event_bus = EventBus::with_capacity(config.event_buffer_size);

        let worker = BattleWorker::new(
            session,
            command_rx,
            event_bus.clone(),
            Arc::clone(&self.collaborators.log),
        );
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        let handle = RuntimeHandle::new(command_tx, event_bus, self.collaborators, config);

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}
