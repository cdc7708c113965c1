//! Damage application and on-hit secondary effects.
//!
//! Every health change goes through [`BattleSession::apply_damage`], which
//! applies the loss, notifies the listener registry with the full event and
//! only then runs the defeat check against the post-damage health.

use crate::error::CombatResult;
use crate::session::BattleSession;
use crate::state::{CombatantId, Fraction, Move, MoveEffect, StatKind, StatusKind, StatusRejection};

use super::defeat::DefeatOutcome;
use super::listeners::{DamageEvent, DamageSource, PreventionReason};

const BURN_DAMAGE: Fraction = Fraction::new(1, 16);
const POISON_DAMAGE: Fraction = Fraction::new(1, 8);

/// A damage event plus the defeat it caused, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DamageApplication {
    pub event: DamageEvent,
    pub defeat: Option<DefeatOutcome>,
}

/// A secondary effect that fired (or was resisted) after a hit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SecondaryEffect {
    StatusInflicted {
        target: CombatantId,
        kind: StatusKind,
    },
    StatusResisted {
        target: CombatantId,
        kind: StatusKind,
        reason: StatusRejection,
    },
    SpeedLowered {
        target: CombatantId,
        /// Stages actually removed; 0 at the stage floor.
        stages: u8,
    },
    Recoil(DamageApplication),
    Drained {
        attacker: CombatantId,
        healed: u32,
    },
}

impl BattleSession {
    /// Apply `amount` damage to `target`.
    ///
    /// Listeners hear about every call, including ones where nothing was
    /// applied (defeated target, type immunity, zero damage).
    pub fn apply_damage(
        &mut self,
        target: CombatantId,
        amount: u32,
        source: DamageSource,
        immune: bool,
    ) -> CombatResult<DamageApplication> {
        let combatant = self.roster.get_mut(target)?;

        let prevented = if combatant.defeated {
            Some(PreventionReason::AlreadyDefeated)
        } else if immune {
            Some(PreventionReason::TypeImmunity)
        } else if amount == 0 {
            Some(PreventionReason::ZeroDamage)
        } else {
            None
        };
        let applied = match prevented {
            Some(_) => 0,
            None => combatant.take_damage(amount),
        };

        let event = DamageEvent {
            target,
            source,
            requested: amount,
            applied,
            prevented,
            hp_after: combatant.hp,
            max_hp: combatant.max_hp,
        };
        let name = combatant.name.clone();

        match prevented {
            None => self.narrate(format!(
                "{name} took {applied} damage{} ({}/{} HP).",
                source_suffix(&source),
                event.hp_after,
                event.max_hp
            )),
            Some(PreventionReason::TypeImmunity) => {
                self.narrate(format!("It doesn't affect {name}..."));
            }
            Some(_) => {}
        }

        self.listeners.notify(&event);

        let defeat = if prevented.is_none() && event.hp_after == 0 {
            self.resolve_defeat(target, source.into())?
        } else {
            None
        };

        Ok(DamageApplication { event, defeat })
    }

    /// Restore health to `target`, capped at maximum. Returns the gain.
    pub fn apply_heal(&mut self, target: CombatantId, amount: u32) -> CombatResult<u32> {
        let combatant = self.roster.get_mut(target)?;
        if !combatant.is_alive() {
            return Ok(0);
        }
        Ok(combatant.heal(amount))
    }

    /// Apply the move's secondary effect after a successful hit.
    ///
    /// `dealt` is the health the target actually lost across every hit of
    /// the move. Multi-hit and cone moves are handled by the strike planner
    /// and produce nothing here.
    pub fn apply_secondary_effects(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        mv: &Move,
        dealt: u32,
        net_successes: i32,
    ) -> CombatResult<Vec<SecondaryEffect>> {
        let mut effects = Vec::new();
        if net_successes < 0 {
            return Ok(effects);
        }

        match mv.effect {
            MoveEffect::Inflict(kind) => {
                let defender = self.roster.get_mut(target)?;
                if !defender.is_alive() {
                    return Ok(effects);
                }
                let types = defender.types.clone();
                let name = defender.name.clone();
                match defender.status.inflict(kind, &types) {
                    Ok(()) => {
                        self.narrate(format!("{name} is afflicted with {kind}."));
                        effects.push(SecondaryEffect::StatusInflicted { target, kind });
                    }
                    Err(reason) => effects.push(SecondaryEffect::StatusResisted {
                        target,
                        kind,
                        reason,
                    }),
                }
            }
            MoveEffect::SpeedDrop { stages } => {
                let defender = self.roster.get_mut(target)?;
                if !defender.is_alive() {
                    return Ok(effects);
                }
                let delta = -(stages.min(i8::MAX as u8) as i8);
                let applied = defender.stats.get_mut(StatKind::Speed).shift_stage(delta);
                let name = defender.name.clone();
                if applied != 0 {
                    self.narrate(format!("{name}'s speed fell."));
                }
                effects.push(SecondaryEffect::SpeedLowered {
                    target,
                    stages: applied.unsigned_abs(),
                });
            }
            MoveEffect::Recoil(fraction) if dealt > 0 => {
                let recoil = self.apply_damage(
                    attacker,
                    fraction.of(dealt),
                    DamageSource::Recoil { move_name: mv.name },
                    false,
                )?;
                effects.push(SecondaryEffect::Recoil(recoil));
            }
            MoveEffect::Drain(fraction) if dealt > 0 => {
                let healed = self.apply_heal(attacker, fraction.of(dealt))?;
                if healed > 0 {
                    let name = self.roster.get(attacker)?.name.clone();
                    self.narrate(format!("{name} drained {healed} HP."));
                }
                effects.push(SecondaryEffect::Drained { attacker, healed });
            }
            _ => {}
        }
        Ok(effects)
    }

    /// Status damage for every living combatant, then status expiry.
    ///
    /// Burn takes 1/16, poison 1/8 and bad poison `n/16` on its n-th round.
    pub fn apply_status_ticks(
        &mut self,
    ) -> CombatResult<(Vec<DamageApplication>, Vec<(CombatantId, StatusKind)>)> {
        let mut damage = Vec::new();
        let mut expired = Vec::new();

        for id in self.roster.living_ids() {
            let combatant = self.roster.get(id)?;
            let max_hp = combatant.max_hp;
            let ticks: Vec<(StatusKind, u32)> = combatant
                .status
                .iter()
                .filter_map(|effect| {
                    let amount = match effect.kind {
                        StatusKind::Burn => BURN_DAMAGE.of(max_hp),
                        StatusKind::Poison => POISON_DAMAGE.of(max_hp),
                        StatusKind::BadPoison => {
                            Fraction::new(effect.elapsed as u32 + 1, 16).of(max_hp)
                        }
                        _ => return None,
                    };
                    Some((effect.kind, amount))
                })
                .collect();

            for (kind, amount) in ticks {
                let application = self.apply_damage(id, amount, DamageSource::Status(kind), false)?;
                let defeated = application.event.hp_after == 0;
                damage.push(application);
                if defeated {
                    break;
                }
            }

            let combatant = self.roster.get_mut(id)?;
            if combatant.defeated {
                continue;
            }
            let name = combatant.name.clone();
            for kind in combatant.status.advance_round() {
                expired.push((id, kind));
                self.narrate(format!("{name} is no longer affected by {kind}."));
            }
        }

        Ok((damage, expired))
    }
}

fn source_suffix(source: &DamageSource) -> String {
    match source {
        DamageSource::Attack {
            move_name,
            critical: true,
            ..
        } => format!(" from a critical {move_name}"),
        DamageSource::Attack { move_name, .. } => format!(" from {move_name}"),
        DamageSource::Recoil { .. } => " from recoil".to_string(),
        DamageSource::Weather(kind) => format!(" from the {kind}"),
        DamageSource::Status(kind) => format!(" from {kind}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::combat::DamageListener;
    use crate::config::CombatConfig;
    use crate::dice::ScriptedDice;
    use crate::state::{Combatant, MoveCategory, Roster, Side, StatBlock};
    use crate::typing::TypeTag;

    #[derive(Default)]
    struct Capture {
        events: Mutex<Vec<DamageEvent>>,
    }

    impl DamageListener for Capture {
        fn name(&self) -> &'static str {
            "capture"
        }

        fn on_damage(&self, event: &DamageEvent) {
            self.events.lock().unwrap().push(*event);
        }
    }

    fn session() -> (BattleSession, Arc<Capture>) {
        let stats = StatBlock::new(50, 50, 50, 50, 50, 4, 3);
        let roster: Roster = [
            Combatant::new(
                CombatantId(1),
                "Leech",
                Side::Player,
                40,
                &[TypeTag::Grass],
                stats.clone(),
            ),
            Combatant::new(
                CombatantId(2),
                "Target",
                Side::Opponent,
                32,
                &[TypeTag::Water],
                stats,
            ),
        ]
        .into_iter()
        .collect();
        let mut session =
            BattleSession::new(CombatConfig::default(), roster, ScriptedDice::new([]));
        let capture = Arc::new(Capture::default());
        session.register_listener(capture.clone());
        (session, capture)
    }

    fn attack(attacker: u32) -> DamageSource {
        DamageSource::Attack {
            attacker: CombatantId(attacker),
            move_name: "Tackle",
            critical: false,
        }
    }

    #[test]
    fn listeners_hear_prevented_damage() {
        let (mut session, capture) = session();
        session.apply_damage(CombatantId(2), 10, attack(1), true).unwrap();
        session.apply_damage(CombatantId(2), 0, attack(1), false).unwrap();

        let events = capture.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].prevented, Some(PreventionReason::TypeImmunity));
        assert_eq!(events[1].prevented, Some(PreventionReason::ZeroDamage));
        assert_eq!(session.combatant(CombatantId(2)).unwrap().hp, 32);
    }

    #[test]
    fn lethal_damage_runs_the_defeat_check_after_listeners() {
        let (mut session, capture) = session();
        let application = session.apply_damage(CombatantId(2), 50, attack(1), false).unwrap();

        assert_eq!(application.event.applied, 32);
        assert!(application.event.is_lethal());
        assert!(application.defeat.is_some());
        assert_eq!(capture.events.lock().unwrap()[0].hp_after, 0);

        let again = session.apply_damage(CombatantId(2), 5, attack(1), false).unwrap();
        assert_eq!(again.event.prevented, Some(PreventionReason::AlreadyDefeated));
        assert!(again.defeat.is_none());
    }

    #[test]
    fn drain_and_recoil_use_damage_dealt() {
        let (mut session, _) = session();
        session.roster_mut().get_mut(CombatantId(1)).unwrap().hp = 10;

        let leech = Move::new("Leech", MoveCategory::Special, TypeTag::Grass, 6)
            .with_effect(MoveEffect::Drain(Fraction::new(1, 2)));
        let effects = session
            .apply_secondary_effects(CombatantId(1), CombatantId(2), &leech, 9, 2)
            .unwrap();
        assert_eq!(
            effects,
            vec![SecondaryEffect::Drained {
                attacker: CombatantId(1),
                healed: 4
            }]
        );

        let slam = Move::new("Slam", MoveCategory::Physical, TypeTag::Normal, 12)
            .with_effect(MoveEffect::Recoil(Fraction::new(1, 3)));
        let effects = session
            .apply_secondary_effects(CombatantId(1), CombatantId(2), &slam, 9, 2)
            .unwrap();
        let SecondaryEffect::Recoil(recoil) = &effects[0] else {
            panic!("expected recoil, got {effects:?}");
        };
        assert_eq!(recoil.event.applied, 3);
        assert_eq!(session.combatant(CombatantId(1)).unwrap().hp, 11);
    }

    #[test]
    fn status_effects_respect_immunity() {
        let (mut session, _) = session();
        let spark = Move::new("Spark", MoveCategory::Physical, TypeTag::Electric, 6)
            .with_effect(MoveEffect::Inflict(StatusKind::Paralysis));
        let effects = session
            .apply_secondary_effects(CombatantId(1), CombatantId(2), &spark, 5, 1)
            .unwrap();
        assert_eq!(
            effects,
            vec![SecondaryEffect::StatusInflicted {
                target: CombatantId(2),
                kind: StatusKind::Paralysis
            }]
        );

        let again = session
            .apply_secondary_effects(CombatantId(1), CombatantId(2), &spark, 5, 1)
            .unwrap();
        assert!(matches!(
            again[0],
            SecondaryEffect::StatusResisted {
                reason: StatusRejection::AlreadyAffected,
                ..
            }
        ));
    }

    #[test]
    fn speed_drop_stops_at_the_floor() {
        let (mut session, _) = session();
        let chill = Move::new("Chill", MoveCategory::Special, TypeTag::Ice, 4)
            .with_effect(MoveEffect::SpeedDrop { stages: 4 });
        session
            .apply_secondary_effects(CombatantId(1), CombatantId(2), &chill, 3, 1)
            .unwrap();
        let effects = session
            .apply_secondary_effects(CombatantId(1), CombatantId(2), &chill, 3, 1)
            .unwrap();
        assert_eq!(
            effects,
            vec![SecondaryEffect::SpeedLowered {
                target: CombatantId(2),
                stages: 2
            }]
        );
    }

    #[test]
    fn bad_poison_escalates() {
        let (mut session, _) = session();
        session
            .roster_mut()
            .get_mut(CombatantId(2))
            .unwrap()
            .status
            .inflict(StatusKind::BadPoison, &[])
            .unwrap();

        let (first, _) = session.apply_status_ticks().unwrap();
        let (second, _) = session.apply_status_ticks().unwrap();
        assert_eq!(first[0].event.applied, 2);
        assert_eq!(second[0].event.applied, 4);
    }
}
