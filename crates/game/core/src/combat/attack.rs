//! Per-attack rule steps driven by the orchestrator.
//!
//! The runtime orchestrator suspends between steps (reaction checks,
//! positioning queries, animations), so each step is a separate session
//! method that borrows the session only for its own duration:
//!
//! 1. [`BattleSession::choose_move`] / [`BattleSession::consume_move`]
//! 2. [`BattleSession::roll_to_hit`]
//! 3. [`BattleSession::roll_dodge`]
//! 4. [`BattleSession::plan_strike`] (damage is computed, nothing applied)
//! 5. [`BattleSession::apply_strike`] (damage, listeners, defeat, effects)

use crate::error::{CombatError, CombatResult};
use crate::session::BattleSession;
use crate::state::{CombatantId, Move, MoveEffect, Position, StatKind};

use super::damage::{DamageContext, DamageResult, calculate_damage};
use super::defeat::DefeatOutcome;
use super::dodge::{DodgeRequest, DodgeResult, resolve_dodge};
use super::effects::{DamageApplication, SecondaryEffect};
use super::hit::{HitRequest, HitResolution, resolve_hit};
use super::listeners::{DamageSource, PreventionReason};

/// Damage computed for one target, ready to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StrikePlan {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub mv: Move,
    pub net_successes: i32,
    /// One entry per hit; multi-hit moves roll their count up front.
    pub hits: Vec<DamageResult>,
}

impl StrikePlan {
    pub fn is_critical(&self) -> bool {
        self.hits.iter().any(|hit| hit.is_critical)
    }

    pub fn planned_damage(&self) -> u32 {
        self.hits.iter().map(|hit| hit.final_damage).sum()
    }
}

/// What happened when a strike was applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StrikeReport {
    pub hits: Vec<DamageApplication>,
    /// Health the target actually lost.
    pub dealt: u32,
    pub secondary: Vec<SecondaryEffect>,
    pub defeats: Vec<DefeatOutcome>,
}

impl BattleSession {
    /// Pick the move slot to attack with.
    ///
    /// An explicit slot is validated; otherwise the first usable move whose
    /// range covers `distance` is chosen. `Ok(None)` means the attacker has
    /// nothing usable at this distance.
    pub fn choose_move(
        &self,
        attacker: CombatantId,
        slot: Option<usize>,
        distance: u32,
    ) -> CombatResult<Option<usize>> {
        let combatant = self.roster.active(attacker)?;

        let Some(index) = slot else {
            return Ok(combatant
                .moves
                .iter()
                .position(|m| m.is_usable() && m.template.range >= distance));
        };

        let chosen = combatant
            .moves
            .get(index)
            .ok_or(CombatError::InvalidMoveSlot {
                combatant: attacker,
                slot: index,
            })?;
        if chosen.template.is_reaction_only() {
            return Err(CombatError::ReactionOnly {
                name: chosen.template.name,
            });
        }
        if chosen.uses_left == 0 {
            return Err(CombatError::MoveExhausted {
                name: chosen.template.name,
            });
        }
        Ok((chosen.template.range >= distance).then_some(index))
    }

    /// Spend one use of the move in `slot` and return its template.
    pub fn consume_move(&mut self, attacker: CombatantId, slot: usize) -> CombatResult<Move> {
        let combatant = self.roster.get_mut(attacker)?;
        let chosen = combatant
            .moves
            .get_mut(slot)
            .ok_or(CombatError::InvalidMoveSlot {
                combatant: attacker,
                slot,
            })?;
        if !chosen.consume() {
            return Err(CombatError::MoveExhausted {
                name: chosen.template.name,
            });
        }
        let template = chosen.template;
        let name = combatant.name.clone();
        self.narrate(format!("{name} used {}!", template.name));
        Ok(template)
    }

    /// Roll to hit `target`, spending the attacker's luck as its policy allows.
    pub fn roll_to_hit(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
    ) -> CombatResult<HitResolution> {
        let threshold = self.weather.evasion_threshold(self.roster.active(target)?);
        let combatant = self.roster.get_mut(attacker)?;
        let request = HitRequest {
            accuracy: combatant.stat(StatKind::Accuracy),
            threshold,
            luck_policy: combatant.luck_policy,
        };
        let resolution = resolve_hit(&mut *self.dice, request, &mut combatant.luck, &self.config);
        let name = combatant.name.clone();

        if resolution.luck_spent > 0 {
            self.narrate(format!(
                "{name} spent {} luck on a reroll.",
                resolution.luck_spent
            ));
        }
        if resolution.forcing_exhausted {
            self.narrate(format!("{name}'s attack fizzled out."));
        }
        self.narrate(format!(
            "{name} rolled {} net successes (needed {}).",
            resolution.net_successes(),
            threshold
        ));
        if !resolution.hit {
            self.narrate(format!("{name}'s attack missed!"));
        }
        Ok(resolution)
    }

    /// Let `target` try to dodge an attack that rolled `attacker_net`.
    pub fn roll_dodge(
        &mut self,
        target: CombatantId,
        attacker_net: i32,
        tiles: &[Position],
        reaction_triggered: bool,
        ranged: bool,
    ) -> CombatResult<DodgeResult> {
        let combatant = self.roster.active(target)?;
        let request = DodgeRequest {
            evasion: combatant.stat(StatKind::Evasion),
            attacker_net,
            tiles,
            incapacitated: combatant.status.prevents_dodge(),
            reaction_triggered,
            ranged,
        };
        let name = combatant.name.clone();
        let result = resolve_dodge(&mut *self.dice, request, &self.config);

        if result.reaction_triggered {
            self.narrate(format!("{name} reacted instead of dodging!"));
        } else if let Some(tile) = result.chosen_tile {
            self.narrate(format!("{name} dodged to {tile}!"));
        } else if result.botch_bonus > 0 {
            self.narrate(format!("{name} stumbled while dodging!"));
        }
        Ok(result)
    }

    /// Compute damage for every hit of `mv` against `target`.
    pub fn plan_strike(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        mv: &Move,
        net_successes: i32,
    ) -> CombatResult<StrikePlan> {
        let hit_count = match mv.effect {
            MoveEffect::MultiHit { min, max } => {
                let min = min.max(1);
                let span = max.saturating_sub(min);
                if span == 0 {
                    min
                } else {
                    // min >= 1 keeps span + 1 within u8
                    min.saturating_add(self.dice.roll_die(span + 1).saturating_sub(1))
                }
            }
            _ => 1,
        };

        let attacker_ref = self.roster.get(attacker)?;
        let target_ref = self.roster.get(target)?;
        let ctx = DamageContext {
            attacker: attacker_ref,
            target: target_ref,
            mv,
            weather: self.weather.current(),
            weather_tag: self.weather.modifier_for(mv.type_tag),
            net_successes,
        };
        let hits = (0..hit_count)
            .map(|_| calculate_damage(ctx, &mut *self.dice, &self.config))
            .collect();

        Ok(StrikePlan {
            attacker,
            target,
            mv: *mv,
            net_successes,
            hits,
        })
    }

    /// Apply a planned strike: damage per hit, then secondary effects.
    ///
    /// Hits stop landing once the target is defeated.
    pub fn apply_strike(&mut self, plan: &StrikePlan) -> CombatResult<StrikeReport> {
        let mut report = StrikeReport::default();

        for damage in &plan.hits {
            let source = DamageSource::Attack {
                attacker: plan.attacker,
                move_name: plan.mv.name,
                critical: damage.is_critical,
            };
            let application = self.apply_damage(
                plan.target,
                damage.final_damage,
                source,
                plan.mv.power > 0 && damage.effectiveness.is_immune(),
            )?;
            report.dealt += application.event.applied;
            report.defeats.extend(application.defeat);
            let stop = application.event.hp_after == 0
                || application.event.prevented == Some(PreventionReason::AlreadyDefeated);
            report.hits.push(application);
            if stop {
                break;
            }
        }

        if report.hits.len() > 1 {
            self.narrate(format!("Hit {} times!", report.hits.len()));
        }

        let all_immune = report
            .hits
            .iter()
            .all(|hit| hit.event.prevented == Some(PreventionReason::TypeImmunity));
        if !all_immune {
            report.secondary = self.apply_secondary_effects(
                plan.attacker,
                plan.target,
                &plan.mv,
                report.dealt,
                plan.net_successes,
            )?;
            for effect in &report.secondary {
                if let SecondaryEffect::Recoil(recoil) = effect {
                    report.defeats.extend(recoil.defeat);
                }
            }
        }

        Ok(report)
    }
}
