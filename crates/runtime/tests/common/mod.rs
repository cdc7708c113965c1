#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use combat_core::{
    Combatant, CombatantId, LuckPolicy, Move, MoveCategory, MoveEffect, Position, Roster, Side,
    StatBlock, TypeTag,
};
use combat_runtime::{
    AttackCue, AttackId, BattleLog, Presentation, PresentationError, ReactionOutcome,
    ReactionSystem,
};

pub const STRIKER: CombatantId = CombatantId(1);
pub const DUMMY: CombatantId = CombatantId(2);
pub const BYSTANDER: CombatantId = CombatantId(3);

pub const TACKLE: Move = Move::new("Tackle", MoveCategory::Physical, TypeTag::Normal, 4);
pub const ARROW: Move = Move::new("Arrow", MoveCategory::Physical, TypeTag::Normal, 4).ranged(4);
pub const SWEEP: Move =
    Move::new("Sweep", MoveCategory::Physical, TypeTag::Normal, 4).with_effect(MoveEffect::Cone);

/// Accuracy 5, evasion 3, 60 HP; never spends luck.
pub fn striker(moves: impl IntoIterator<Item = Move>) -> Combatant {
    Combatant::new(
        STRIKER,
        "Striker",
        Side::Player,
        60,
        &[TypeTag::Normal],
        StatBlock::new(50, 50, 50, 50, 50, 5, 3),
    )
    .with_luck_policy(LuckPolicy::Never)
    .with_moves(moves)
}

/// Evasion 3, 20 HP.
pub fn dummy(id: CombatantId, name: &str) -> Combatant {
    Combatant::new(
        id,
        name,
        Side::Opponent,
        20,
        &[TypeTag::Normal],
        StatBlock::new(50, 50, 50, 50, 40, 3, 3),
    )
    .with_moves([TACKLE])
}

pub fn roster(combatants: impl IntoIterator<Item = Combatant>) -> Roster {
    combatants.into_iter().collect()
}

pub const fn at(x: i32, y: i32) -> Position {
    Position::new(x, y)
}

/// Collects narration lines.
#[derive(Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl BattleLog for RecordingLog {
    fn log_event(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_owned());
    }
}

/// Reaction system that always answers.
pub struct AlwaysReact;

#[async_trait]
impl ReactionSystem for AlwaysReact {
    async fn try_trigger_reaction(
        &self,
        _target: CombatantId,
        _incoming: &AttackCue,
    ) -> ReactionOutcome {
        ReactionOutcome { triggered: true }
    }
}

/// How a [`ScriptedPresentation`] behaves.
#[derive(Clone, Copy, Debug)]
pub enum Playback {
    Sleep(Duration),
    Fail,
    Hang,
}

/// Presentation that records every animation it plays.
pub struct ScriptedPresentation {
    playback: Playback,
    timeline: Mutex<Vec<(AttackId, &'static str)>>,
    cleared: AtomicBool,
}

impl ScriptedPresentation {
    pub fn new(playback: Playback) -> Arc<Self> {
        Arc::new(Self {
            playback,
            timeline: Mutex::new(Vec::new()),
            cleared: AtomicBool::new(false),
        })
    }

    pub fn timeline(&self) -> Vec<(AttackId, &'static str)> {
        self.timeline.lock().unwrap().clone()
    }

    pub fn position(&self, attack: AttackId, mark: &'static str) -> usize {
        self.timeline()
            .iter()
            .position(|&entry| entry == (attack, mark))
            .unwrap_or_else(|| panic!("{attack} never reached {mark}"))
    }

    pub fn was_cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Presentation for ScriptedPresentation {
    async fn attack_animation(&self, cue: &AttackCue) -> Result<(), PresentationError> {
        self.timeline.lock().unwrap().push((cue.attack, "start"));
        match self.playback {
            Playback::Sleep(delay) => tokio::time::sleep(delay).await,
            Playback::Fail => return Err(PresentationError::new("sprite sheet missing")),
            Playback::Hang => std::future::pending::<()>().await,
        }
        self.timeline.lock().unwrap().push((cue.attack, "end"));
        Ok(())
    }

    fn clear_transient(&self) {
        self.cleared.store(true, Ordering::SeqCst);
    }
}
