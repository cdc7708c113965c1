//! Battle worker that owns the authoritative [`BattleSession`].
//!
//! Every rules step runs here, one command at a time, so the roster and the
//! weather are only ever mutated from this task. Orchestrators send a
//! command per step and await collaborators between steps; the session is
//! never borrowed across a suspension point.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use combat_core::{
    BattleOutcome, BattleSession, Combatant, CombatResult, CombatantId, DamageListener,
    DodgeResult, HitResolution, Move, Position, Roster, RoundSummary, Side, StrikePlan,
    StrikeReport, WeatherChange, WeatherKind, WeatherState,
};

use crate::api::BattleLog;
use crate::events::{BattleEvent, EventBus};

/// Read-only copy of the battle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleSnapshot {
    pub round: u32,
    pub weather: WeatherState,
    pub turn_order: Vec<CombatantId>,
    pub roster: Roster,
    pub winner: Option<Side>,
}

/// Commands that can be sent to the battle worker
pub enum Command {
    /// Validate both parties and pick a move slot without spending it.
    SelectMove {
        attacker: CombatantId,
        target: CombatantId,
        slot: Option<usize>,
        distance: u32,
        reply: oneshot::Sender<CombatResult<Option<(usize, Move)>>>,
    },
    ConsumeMove {
        attacker: CombatantId,
        slot: usize,
        reply: oneshot::Sender<CombatResult<Move>>,
    },
    RollToHit {
        attacker: CombatantId,
        target: CombatantId,
        reply: oneshot::Sender<CombatResult<HitResolution>>,
    },
    /// Net successes needed to hit a combatant caught after the primary roll.
    EvasionThreshold {
        target: CombatantId,
        reply: oneshot::Sender<CombatResult<i32>>,
    },
    RollDodge {
        target: CombatantId,
        attacker_net: i32,
        tiles: Vec<Position>,
        reaction_triggered: bool,
        ranged: bool,
        reply: oneshot::Sender<CombatResult<DodgeResult>>,
    },
    PlanStrike {
        attacker: CombatantId,
        target: CombatantId,
        mv: Move,
        net_successes: i32,
        reply: oneshot::Sender<CombatResult<StrikePlan>>,
    },
    ApplyStrike {
        plan: StrikePlan,
        reply: oneshot::Sender<CombatResult<StrikeReport>>,
    },
    BeginRound {
        reply: oneshot::Sender<Vec<CombatantId>>,
    },
    EndRound {
        reply: oneshot::Sender<CombatResult<RoundSummary>>,
    },
    SetWeather {
        kind: WeatherKind,
        duration: Option<u32>,
        reply: oneshot::Sender<WeatherChange>,
    },
    EndBattle {
        reply: oneshot::Sender<BattleOutcome>,
    },
    AddCombatant {
        combatant: Box<Combatant>,
        reply: oneshot::Sender<()>,
    },
    RegisterListener {
        listener: Arc<dyn DamageListener>,
        reply: oneshot::Sender<()>,
    },
    /// Query the current battle state (read-only).
    QueryState {
        reply: oneshot::Sender<BattleSnapshot>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::SelectMove { .. } => "SelectMove",
            Command::ConsumeMove { .. } => "ConsumeMove",
            Command::RollToHit { .. } => "RollToHit",
            Command::EvasionThreshold { .. } => "EvasionThreshold",
            Command::RollDodge { .. } => "RollDodge",
            Command::PlanStrike { .. } => "PlanStrike",
            Command::ApplyStrike { .. } => "ApplyStrike",
            Command::BeginRound { .. } => "BeginRound",
            Command::EndRound { .. } => "EndRound",
            Command::SetWeather { .. } => "SetWeather",
            Command::EndBattle { .. } => "EndBattle",
            Command::AddCombatant { .. } => "AddCombatant",
            Command::RegisterListener { .. } => "RegisterListener",
            Command::QueryState { .. } => "QueryState",
        }
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!(target: "runtime::worker", command, "reply channel closed (caller dropped)");
    }
}

/// Background task that processes battle commands.
pub struct BattleWorker {
    session: BattleSession,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    log: Arc<dyn BattleLog>,
}

impl BattleWorker {
    pub fn new(
        session: BattleSession,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        log: Arc<dyn BattleLog>,
    ) -> Self {
        info!(
            target: "runtime::worker",
            combatants = session.roster().len(),
            turn_order = ?session.turn_order(),
            "BattleWorker initialized"
        );

        Self {
            session,
            command_rx,
            event_bus,
            log,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }
        debug!(target: "runtime::worker", "command channel closed, BattleWorker stopping");
    }

    fn handle_command(&mut self, cmd: Command) {
        let name = cmd.name();
        match cmd {
            Command::SelectMove {
                attacker,
                target,
                slot,
                distance,
                reply,
            } => {
                let result = self.select_move(attacker, target, slot, distance);
                respond(reply, result, name);
            }
            Command::ConsumeMove {
                attacker,
                slot,
                reply,
            } => {
                let result = self.session.consume_move(attacker, slot);
                respond(reply, result, name);
            }
            Command::RollToHit {
                attacker,
                target,
                reply,
            } => {
                let result = self.session.roll_to_hit(attacker, target);
                respond(reply, result, name);
            }
            Command::EvasionThreshold { target, reply } => {
                let result = self.session.evasion_threshold(target);
                respond(reply, result, name);
            }
            Command::RollDodge {
                target,
                attacker_net,
                tiles,
                reaction_triggered,
                ranged,
                reply,
            } => {
                let result = self.session.roll_dodge(
                    target,
                    attacker_net,
                    &tiles,
                    reaction_triggered,
                    ranged,
                );
                respond(reply, result, name);
            }
            Command::PlanStrike {
                attacker,
                target,
                mv,
                net_successes,
                reply,
            } => {
                let result = self.session.plan_strike(attacker, target, &mv, net_successes);
                respond(reply, result, name);
            }
            Command::ApplyStrike { plan, reply } => {
                let result = self.session.apply_strike(&plan);
                if let Ok(report) = &result {
                    for defeat in &report.defeats {
                        self.event_bus.publish(BattleEvent::CombatantDefeated(*defeat));
                    }
                }
                respond(reply, result, name);
            }
            Command::BeginRound { reply } => {
                let order = self.session.begin_round().to_vec();
                respond(reply, order, name);
            }
            Command::EndRound { reply } => {
                let result = self.session.end_round();
                if let Ok(summary) = &result {
                    self.publish_round(summary);
                }
                respond(reply, result, name);
            }
            Command::SetWeather {
                kind,
                duration,
                reply,
            } => {
                let change = self.session.set_weather(kind, duration);
                self.event_bus.publish(BattleEvent::WeatherChanged(change.clone()));
                respond(reply, change, name);
            }
            Command::EndBattle { reply } => {
                let outcome = self.session.end_battle();
                if outcome.weather_reset.from != WeatherKind::None {
                    self.event_bus
                        .publish(BattleEvent::WeatherChanged(outcome.weather_reset.clone()));
                }
                self.event_bus.publish(BattleEvent::BattleEnded {
                    winner: outcome.winner,
                    rounds: outcome.rounds,
                });
                respond(reply, outcome, name);
            }
            Command::AddCombatant { combatant, reply } => {
                self.session.add_combatant(*combatant);
                respond(reply, (), name);
            }
            Command::RegisterListener { listener, reply } => {
                debug!(
                    target: "runtime::worker",
                    listener = listener.name(),
                    "registering damage listener"
                );
                self.session.register_listener(listener);
                respond(reply, (), name);
            }
            Command::QueryState { reply } => {
                respond(reply, self.snapshot(), name);
            }
        }
        self.flush_narration();
    }

    fn select_move(
        &self,
        attacker: CombatantId,
        target: CombatantId,
        slot: Option<usize>,
        distance: u32,
    ) -> CombatResult<Option<(usize, Move)>> {
        self.session.roster().active(target)?;
        let Some(index) = self.session.choose_move(attacker, slot, distance)? else {
            return Ok(None);
        };
        let template = self
            .session
            .combatant(attacker)?
            .moves
            .get(index)
            .map(|slot| slot.template);
        Ok(template.map(|mv| (index, mv)))
    }

    fn publish_round(&self, summary: &RoundSummary) {
        for defeat in summary.damage.iter().filter_map(|d| d.defeat) {
            self.event_bus.publish(BattleEvent::CombatantDefeated(defeat));
        }
        if let Some(change) = &summary.weather_change {
            self.event_bus.publish(BattleEvent::WeatherChanged(change.clone()));
        }
        self.event_bus.publish(BattleEvent::RoundEnded {
            round: summary.round,
            damage_events: summary.damage.len(),
        });
    }

    fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            round: self.session.round(),
            weather: self.session.weather().state(),
            turn_order: self.session.turn_order().to_vec(),
            roster: self.session.roster().clone(),
            winner: self.session.winner(),
        }
    }

    /// Forwards queued narration to the battle log, oldest first.
    fn flush_narration(&mut self) {
        for line in self.session.drain_narration() {
            self.log.log_event(&line);
        }
    }
}
