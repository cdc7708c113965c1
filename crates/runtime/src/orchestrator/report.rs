//! Attack results handed back to callers.

use serde::{Deserialize, Serialize};

use combat_core::{
    CombatError, CombatantId, DefeatOutcome, DodgeResult, HitResolution, StrikePlan, StrikeReport,
};

use super::phase::AttackPhase;
use super::session::AttackId;

/// Why an attack stopped before touching any state beyond move selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    /// The target is unknown or already defeated.
    InvalidTarget,
    /// The attacker is unknown or was defeated before it could act.
    AttackerUnavailable,
    /// The named move slot is empty or reaction-only.
    InvalidMove,
    /// A ranged attack had no clear line to the target.
    LineOfSightBlocked,
}

/// How an attack ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackOutcome {
    Hit,
    Missed,
    /// Every target dodged.
    Dodged,
    /// The attacker had no usable move at this distance.
    CannotAttack,
    Aborted(AbortReason),
}

impl AttackOutcome {
    /// Folds a rules error into a non-fatal outcome.
    pub fn from_error(error: &CombatError, attacker: CombatantId, target: CombatantId) -> Self {
        match error {
            CombatError::MoveExhausted { .. } => AttackOutcome::CannotAttack,
            CombatError::InvalidMoveSlot { .. } | CombatError::ReactionOnly { .. } => {
                AttackOutcome::Aborted(AbortReason::InvalidMove)
            }
            CombatError::UnknownCombatant(id) | CombatError::CombatantDefeated(id)
                if *id == attacker && *id != target =>
            {
                AttackOutcome::Aborted(AbortReason::AttackerUnavailable)
            }
            CombatError::UnknownCombatant(_) | CombatError::CombatantDefeated(_) => {
                AttackOutcome::Aborted(AbortReason::InvalidTarget)
            }
        }
    }

    pub fn landed(self) -> bool {
        self == AttackOutcome::Hit
    }
}

/// Dodge and damage for one target of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub target: CombatantId,
    /// Caught by a cone or a stray projectile but out of reach of the
    /// attacker's net successes. Neither dodge nor plan is set.
    pub missed: bool,
    pub dodge: Option<DodgeResult>,
    pub plan: Option<StrikePlan>,
    pub strike: Option<StrikeReport>,
}

impl TargetReport {
    pub(crate) fn new(target: CombatantId) -> Self {
        Self {
            target,
            missed: false,
            dodge: None,
            plan: None,
            strike: None,
        }
    }

    pub fn dodged(&self) -> bool {
        self.dodge.as_ref().is_some_and(|d| d.success)
    }

    pub fn damage_dealt(&self) -> u32 {
        self.strike.as_ref().map_or(0, |s| s.dealt)
    }
}

/// Everything that happened during one attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackReport {
    pub id: AttackId,
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub move_name: Option<&'static str>,
    pub outcome: AttackOutcome,
    pub hit: Option<HitResolution>,
    /// The primary target first, then any cone targets.
    pub targets: Vec<TargetReport>,
    /// Every phase the attack passed through, ending in `Completed`.
    pub phases: Vec<AttackPhase>,
    /// Set when an animation failed or timed out; the rules outcome stands.
    pub presentation_failed: bool,
}

impl AttackReport {
    pub(crate) fn new(id: AttackId, attacker: CombatantId, target: CombatantId) -> Self {
        Self {
            id,
            attacker,
            target,
            move_name: None,
            outcome: AttackOutcome::CannotAttack,
            hit: None,
            targets: Vec::new(),
            phases: Vec::new(),
            presentation_failed: false,
        }
    }

    pub fn primary(&self) -> Option<&TargetReport> {
        self.targets.iter().find(|t| t.target == self.target)
    }

    pub fn damage_dealt(&self) -> u32 {
        self.targets.iter().map(TargetReport::damage_dealt).sum()
    }

    pub fn defeats(&self) -> impl Iterator<Item = &DefeatOutcome> {
        self.targets
            .iter()
            .filter_map(|t| t.strike.as_ref())
            .flat_map(|s| s.defeats.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTACKER: CombatantId = CombatantId(1);
    const TARGET: CombatantId = CombatantId(2);

    #[test]
    fn rules_errors_fold_into_outcomes() {
        let outcome = |error: CombatError| AttackOutcome::from_error(&error, ATTACKER, TARGET);

        assert_eq!(
            outcome(CombatError::MoveExhausted { name: "Tackle" }),
            AttackOutcome::CannotAttack
        );
        assert_eq!(
            outcome(CombatError::ReactionOnly { name: "Counter" }),
            AttackOutcome::Aborted(AbortReason::InvalidMove)
        );
        assert_eq!(
            outcome(CombatError::CombatantDefeated(ATTACKER)),
            AttackOutcome::Aborted(AbortReason::AttackerUnavailable)
        );
        assert_eq!(
            outcome(CombatError::UnknownCombatant(TARGET)),
            AttackOutcome::Aborted(AbortReason::InvalidTarget)
        );
    }

    #[test]
    fn self_targeting_blames_the_target() {
        let outcome = AttackOutcome::from_error(
            &CombatError::CombatantDefeated(ATTACKER),
            ATTACKER,
            ATTACKER,
        );
        assert_eq!(outcome, AttackOutcome::Aborted(AbortReason::InvalidTarget));
    }
}
