//! Dodge resolution for a target that has been hit.
//!
//! The target rolls its evasion pool against the attacker's final net
//! successes. Winning the contest only counts when there is somewhere to go:
//! the destination tile is drawn from the candidates the positioning
//! collaborator supplied. A botched dodge (negative net) hands the attacker
//! the shortfall as extra net successes, which feeds into crit checks.

use crate::config::CombatConfig;
use crate::dice::{AttackRoll, DiceSource, roll_pool};
use crate::state::Position;

/// Inputs to dodge resolution.
#[derive(Clone, Copy, Debug)]
pub struct DodgeRequest<'a> {
    /// Target's evasion pool.
    pub evasion: u32,
    /// Attacker's final net successes from hit resolution.
    pub attacker_net: i32,
    /// Unoccupied tiles the target could move to.
    pub tiles: &'a [Position],
    /// Status conditions (sleep, freeze) rule out dodging.
    pub incapacitated: bool,
    /// A reaction fired for this attack; reactions replace the dodge.
    pub reaction_triggered: bool,
    /// Whether the incoming attack is a projectile.
    pub ranged: bool,
}

/// Why a dodge did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DodgeFailure {
    /// The evasion roll did not beat the attacker.
    Outrolled,
    /// The roll won but no tile was free.
    NoDestination,
    /// Asleep or frozen.
    Incapacitated,
    /// A reaction took the dodge's place.
    Reaction,
}

/// Outcome of dodge resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DodgeResult {
    pub success: bool,
    /// `None` when no roll was made (reaction or incapacitated).
    pub roll: Option<AttackRoll>,
    pub chosen_tile: Option<Position>,
    pub reaction_triggered: bool,
    pub failure: Option<DodgeFailure>,
    /// Extra net successes the attacker gains from a botched dodge.
    pub botch_bonus: i32,
    /// The dodged projectile keeps travelling along its path.
    pub projectile_continues: bool,
}

impl DodgeResult {
    fn failed(failure: DodgeFailure, roll: Option<AttackRoll>, reaction_triggered: bool) -> Self {
        Self {
            success: false,
            roll,
            chosen_tile: None,
            reaction_triggered,
            failure: Some(failure),
            botch_bonus: 0,
            projectile_continues: false,
        }
    }
}

/// Resolve a dodge attempt.
pub fn resolve_dodge(
    dice: &mut (impl DiceSource + ?Sized),
    request: DodgeRequest<'_>,
    config: &CombatConfig,
) -> DodgeResult {
    if request.reaction_triggered {
        return DodgeResult::failed(DodgeFailure::Reaction, None, true);
    }
    if request.incapacitated {
        return DodgeResult::failed(DodgeFailure::Incapacitated, None, false);
    }

    let roll = roll_pool(&mut *dice, request.evasion, config);

    if roll.net_successes <= request.attacker_net {
        let botch_bonus = (-roll.net_successes).max(0);
        let mut result = DodgeResult::failed(DodgeFailure::Outrolled, Some(roll), false);
        result.botch_bonus = botch_bonus;
        return result;
    }

    let Some(tile) = choose_tile(&mut *dice, request.tiles) else {
        return DodgeResult::failed(DodgeFailure::NoDestination, Some(roll), false);
    };

    DodgeResult {
        success: true,
        roll: Some(roll),
        chosen_tile: Some(tile),
        reaction_triggered: false,
        failure: None,
        botch_bonus: 0,
        projectile_continues: request.ranged,
    }
}

/// Pick a destination with a die sized to the candidate list.
fn choose_tile(dice: &mut (impl DiceSource + ?Sized), tiles: &[Position]) -> Option<Position> {
    match tiles.len() {
        0 => None,
        1 => Some(tiles[0]),
        n => {
            let sides = n.min(u8::MAX as usize) as u8;
            let face = dice.roll_die(sides) as usize;
            tiles.get(face.saturating_sub(1)).copied()
        }
    }
}
