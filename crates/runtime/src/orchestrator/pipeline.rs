//! The attack pipeline: one rules command per step, collaborators awaited
//! in between.
//!
//! Rules outcomes are fixed before any animation plays. Damage is planned
//! while dodges resolve, the animation is awaited, and only then is the plan
//! applied, so a failed or hung animation can delay a strike but never
//! change it.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use combat_core::{CombatResult, CombatantId, GameError, Move, MoveEffect};

use super::phase::AttackPhase;
use super::report::{AbortReason, AttackOutcome, AttackReport, TargetReport};
use super::session::AttackSession;
use crate::api::{AttackCue, PresentationError, Result, RuntimeError, RuntimeHandle};
use crate::workers::Command;

/// Why [`resolve`] stopped early.
enum Halt {
    /// A rules step refused; the attack ends with this outcome.
    Outcome(AttackOutcome),
    Runtime(RuntimeError),
}

impl From<RuntimeError> for Halt {
    fn from(error: RuntimeError) -> Self {
        Halt::Runtime(error)
    }
}

fn rules<T>(
    step: CombatResult<T>,
    session: &AttackSession,
    defender: CombatantId,
) -> std::result::Result<T, Halt> {
    step.map_err(|error| {
        info!(
            target: "runtime::orchestrator",
            attack = %session.id(),
            attacker = %session.attacker(),
            defender = %defender,
            code = error.error_code(),
            severity = error.severity().as_str(),
            %error,
            "attack stopped by rules"
        );
        Halt::Outcome(AttackOutcome::from_error(&error, session.attacker(), defender))
    })
}

/// Awaits a presentation future, bounded by `timeout`. Returns whether it
/// completed cleanly.
async fn presented(
    step: impl Future<Output = std::result::Result<(), PresentationError>>,
    timeout: Duration,
    cue: &AttackCue,
    what: &'static str,
) -> bool {
    match tokio::time::timeout(timeout, step).await {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            warn!(
                target: "runtime::orchestrator",
                attack = %cue.attack,
                %error,
                "{what} failed; continuing with the rules outcome"
            );
            false
        }
        Err(_) => {
            warn!(
                target: "runtime::orchestrator",
                attack = %cue.attack,
                timeout_ms = timeout.as_millis() as u64,
                "{what} timed out; continuing with the rules outcome"
            );
            false
        }
    }
}

/// Drives one attack from `Selecting` to `Completed`.
pub(crate) async fn run(
    runtime: &RuntimeHandle,
    session: &mut AttackSession,
    slot: Option<usize>,
) -> Result<AttackReport> {
    let mut report = AttackReport::new(session.id(), session.attacker(), session.target());

    let resolved = resolve(runtime, session, slot, &mut report).await;
    report.outcome = match resolved {
        Ok(outcome) | Err(Halt::Outcome(outcome)) => outcome,
        Err(Halt::Runtime(error)) => return Err(error),
    };
    session.advance(AttackPhase::Completed);
    report.phases = session.history().to_vec();

    info!(
        target: "runtime::orchestrator",
        attack = %report.id,
        attacker = %report.attacker,
        defender = %report.target,
        outcome = ?report.outcome,
        damage = report.damage_dealt(),
        "attack completed"
    );
    Ok(report)
}

async fn resolve(
    runtime: &RuntimeHandle,
    session: &mut AttackSession,
    slot: Option<usize>,
    report: &mut AttackReport,
) -> std::result::Result<AttackOutcome, Halt> {
    let attacker = session.attacker();
    let target = session.target();
    let collaborators = runtime.collaborators();
    let positioning = &collaborators.positioning;

    // ===== Selecting =====
    let distance = positioning.min_distance(attacker, target).await;
    let selected = runtime
        .call(|reply| Command::SelectMove {
            attacker,
            target,
            slot,
            distance,
            reply,
        })
        .await?;
    let Some((index, template)) = rules(selected, session, target)? else {
        info!(
            target: "runtime::orchestrator",
            attack = %session.id(),
            attacker = %attacker,
            distance,
            "no usable move in range"
        );
        return Ok(AttackOutcome::CannotAttack);
    };
    report.move_name = Some(template.name);

    if template.is_ranged() && positioning.line_of_sight_blocked(attacker, target).await {
        info!(
            target: "runtime::orchestrator",
            attack = %session.id(),
            attacker = %attacker,
            defender = %target,
            "line of sight blocked"
        );
        return Ok(AttackOutcome::Aborted(AbortReason::LineOfSightBlocked));
    }

    let consumed = runtime
        .call(|reply| Command::ConsumeMove {
            attacker,
            slot: index,
            reply,
        })
        .await?;
    let mv = rules(consumed, session, target)?;

    // ===== RollingHit =====
    session.advance(AttackPhase::RollingHit);
    let rolled = runtime
        .call(|reply| Command::RollToHit {
            attacker,
            target,
            reply,
        })
        .await?;
    let hit = rules(rolled, session, target)?;
    report.hit = Some(hit.clone());

    let mut cue = AttackCue {
        attack: session.id(),
        attacker,
        target,
        move_name: mv.name,
        ranged: mv.is_ranged(),
        landed: false,
    };
    let animation_timeout = runtime.config().animation_timeout;

    if !hit.hit {
        session.advance(AttackPhase::Missed);
        let animation = collaborators.presentation.attack_animation(&cue);
        report.presentation_failed |=
            !presented(animation, animation_timeout, &cue, "miss animation").await;
        return Ok(AttackOutcome::Missed);
    }

    // ===== Dodging =====
    session.advance(AttackPhase::Dodging);
    let net = hit.net_successes();
    let mut defenders = vec![target];
    if mv.effect == MoveEffect::Cone {
        for extra in positioning.cone_targets(attacker, target).await {
            if extra != attacker && !defenders.contains(&extra) {
                defenders.push(extra);
            }
        }
    }

    // a dodged projectile may append the next combatant in its path
    let mut next = 0;
    while let Some(&defender) = defenders.get(next) {
        next += 1;
        let mut entry = TargetReport::new(defender);
        if defender != target {
            match reaches(runtime, session, defender, net).await {
                Ok(true) => {}
                Ok(false) => {
                    entry.missed = true;
                    report.targets.push(entry);
                    continue;
                }
                Err(Halt::Outcome(outcome)) => {
                    skip_secondary(session, defender, outcome);
                    continue;
                }
                Err(halt) => return Err(halt),
            }
        }
        match defend(runtime, session, &mv, defender, net, &cue, &mut entry).await {
            Ok(defence) => {
                report.presentation_failed |= defence.presentation_failed;
                let stray = defence
                    .continuation
                    .filter(|stray| *stray != attacker && !defenders.contains(stray));
                defenders.extend(stray);
            }
            Err(Halt::Outcome(outcome)) if defender != target => {
                skip_secondary(session, defender, outcome);
                continue;
            }
            Err(halt) => return Err(halt),
        }
        report.targets.push(entry);
    }

    if report.targets.iter().all(|entry| entry.plan.is_none()) {
        session.advance(AttackPhase::Dodged);
        let animation = collaborators.presentation.attack_animation(&cue);
        report.presentation_failed |=
            !presented(animation, animation_timeout, &cue, "dodge animation").await;
        return Ok(AttackOutcome::Dodged);
    }

    // ===== Hitting =====
    session.advance(AttackPhase::Hitting);
    cue.landed = true;
    let animation = collaborators.presentation.attack_animation(&cue);
    report.presentation_failed |=
        !presented(animation, animation_timeout, &cue, "attack animation").await;

    for entry in &mut report.targets {
        let Some(plan) = entry.plan.clone() else {
            continue;
        };
        let applied = runtime
            .call(|reply| Command::ApplyStrike { plan, reply })
            .await?;
        match rules(applied, session, entry.target) {
            Ok(strike) => entry.strike = Some(strike),
            Err(Halt::Outcome(_)) if entry.target != target => continue,
            Err(halt) => return Err(halt),
        }
    }

    session.advance(AttackPhase::Resolved);
    Ok(AttackOutcome::Hit)
}

fn skip_secondary(session: &AttackSession, defender: CombatantId, outcome: AttackOutcome) {
    debug!(
        target: "runtime::orchestrator",
        attack = %session.id(),
        defender = %defender,
        outcome = ?outcome,
        "skipping secondary target"
    );
}

/// Whether `net` successes are enough to hit a defender that was not the
/// subject of the hit roll.
async fn reaches(
    runtime: &RuntimeHandle,
    session: &AttackSession,
    defender: CombatantId,
    net: i32,
) -> std::result::Result<bool, Halt> {
    let threshold = runtime
        .call(|reply| Command::EvasionThreshold {
            target: defender,
            reply,
        })
        .await?;
    let threshold = rules(threshold, session, defender)?;
    if net < threshold {
        debug!(
            target: "runtime::orchestrator",
            attack = %session.id(),
            defender = %defender,
            net,
            threshold,
            "secondary target out of reach"
        );
        return Ok(false);
    }
    Ok(true)
}

/// What [`defend`] reports back besides the target entry.
#[derive(Debug, Default)]
struct Defence {
    presentation_failed: bool,
    /// Next combatant in the path of a dodged projectile.
    continuation: Option<CombatantId>,
}

/// Reaction check, dodge roll and damage plan for one defender.
async fn defend(
    runtime: &RuntimeHandle,
    session: &AttackSession,
    mv: &Move,
    defender: CombatantId,
    attacker_net: i32,
    cue: &AttackCue,
    entry: &mut TargetReport,
) -> std::result::Result<Defence, Halt> {
    let attacker = session.attacker();
    let collaborators = runtime.collaborators();
    let positioning = &collaborators.positioning;
    let cue = AttackCue {
        target: defender,
        ..cue.clone()
    };

    let reaction = collaborators
        .reactions
        .try_trigger_reaction(defender, &cue)
        .await;

    let mut tiles = Vec::new();
    for tile in positioning
        .available_dodge_tiles(defender, attacker, cue.ranged)
        .await
    {
        if !positioning.occupies_tile(attacker, tile).await {
            tiles.push(tile);
        }
    }

    let rolled = runtime
        .call(|reply| Command::RollDodge {
            target: defender,
            attacker_net,
            tiles,
            reaction_triggered: reaction.triggered,
            ranged: cue.ranged,
            reply,
        })
        .await?;
    let dodge = rules(rolled, session, defender)?;

    let mut defence = Defence::default();
    if dodge.success {
        if dodge.projectile_continues {
            if let Some(next) = positioning.projectile_continuation(attacker, defender).await {
                if positioning.min_distance(attacker, next).await <= mv.range {
                    defence.continuation = Some(next);
                }
            }
        }
        if let Some(tile) = dodge.chosen_tile {
            positioning.dodge_to(defender, tile).await;
        }
        if dodge.projectile_continues {
            let timeout = runtime.config().animation_timeout;
            let projectile = collaborators.presentation.projectile_resolved(&cue);
            defence.presentation_failed = !presented(projectile, timeout, &cue, "projectile").await;
        }
        entry.dodge = Some(dodge);
        return Ok(defence);
    }

    let net_successes = attacker_net + dodge.botch_bonus;
    entry.dodge = Some(dodge);
    let planned = runtime
        .call(|reply| Command::PlanStrike {
            attacker,
            target: defender,
            mv: *mv,
            net_successes,
            reply,
        })
        .await?;
    entry.plan = Some(rules(planned, session, defender)?);
    Ok(defence)
}
