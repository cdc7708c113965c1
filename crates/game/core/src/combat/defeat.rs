//! Defeat handling and luck refunds.

use crate::error::CombatResult;
use crate::session::BattleSession;
use crate::state::{CombatantId, StatusKind};
use crate::weather::WeatherKind;

use super::listeners::DamageSource;

/// What dealt the finishing blow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefeatCause {
    DirectAttack { attacker: CombatantId },
    Recoil,
    Weather(WeatherKind),
    Status(StatusKind),
}

impl From<DamageSource> for DefeatCause {
    fn from(source: DamageSource) -> Self {
        match source {
            DamageSource::Attack { attacker, .. } => Self::DirectAttack { attacker },
            DamageSource::Recoil { .. } => Self::Recoil,
            DamageSource::Weather(kind) => Self::Weather(kind),
            DamageSource::Status(kind) => Self::Status(kind),
        }
    }
}

/// Luck tokens returned to the attacker that landed a finishing blow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LuckRefund {
    pub attacker: CombatantId,
    pub restored: u32,
    pub max: u32,
}

/// A combatant leaving the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefeatOutcome {
    pub combatant: CombatantId,
    pub cause: DefeatCause,
    pub refund: Option<LuckRefund>,
}

impl BattleSession {
    /// Mark `id` defeated if its health has run out.
    ///
    /// Returns `Some` exactly once per combatant: later calls, and calls for
    /// a combatant that still has health, return `None`. A direct-attack
    /// finishing blow by an opponent refills the attacker's luck pool.
    pub fn resolve_defeat(
        &mut self,
        id: CombatantId,
        cause: DefeatCause,
    ) -> CombatResult<Option<DefeatOutcome>> {
        let combatant = self.roster.get_mut(id)?;
        if combatant.defeated || combatant.hp > 0 {
            return Ok(None);
        }
        combatant.defeated = true;
        let side = combatant.side;
        let name = combatant.name.clone();

        self.turn_order.retain(|&entry| entry != id);
        self.narrate(format!("{name} was defeated!"));

        let refund = match cause {
            DefeatCause::DirectAttack { attacker } if attacker != id => {
                let winner = self.roster.get_mut(attacker)?;
                if winner.side != side && winner.is_alive() {
                    let restored = winner.luck.refill();
                    let refund = LuckRefund {
                        attacker,
                        restored,
                        max: winner.luck.max,
                    };
                    let winner_name = winner.name.clone();
                    if restored > 0 {
                        self.narrate(format!("{winner_name}'s luck was restored."));
                    }
                    Some(refund)
                } else {
                    None
                }
            }
            _ => None,
        };

        Ok(Some(DefeatOutcome {
            combatant: id,
            cause,
            refund,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::dice::ScriptedDice;
    use crate::state::{Combatant, LuckPool, Roster, Side, StatBlock};

    fn session() -> BattleSession {
        // base stat total 500 -> luck max 2
        let stats = StatBlock::new(80, 80, 80, 80, 80, 5, 3);
        let roster: Roster = [
            Combatant::new(CombatantId(1), "Victor", Side::Player, 100, &[], stats.clone()),
            Combatant::new(CombatantId(2), "Fallen", Side::Opponent, 100, &[], stats.clone()),
            Combatant::new(CombatantId(3), "Ally", Side::Player, 100, &[], stats),
        ]
        .into_iter()
        .collect();
        BattleSession::new(CombatConfig::default(), roster, ScriptedDice::new([]))
    }

    #[test]
    fn defeat_resolves_exactly_once() {
        let mut session = session();
        session.roster_mut().get_mut(CombatantId(1)).unwrap().luck.current = 0;
        session.roster_mut().get_mut(CombatantId(2)).unwrap().hp = 0;
        let cause = DefeatCause::DirectAttack {
            attacker: CombatantId(1),
        };

        let outcome = session.resolve_defeat(CombatantId(2), cause).unwrap().unwrap();
        assert_eq!(
            outcome.refund,
            Some(LuckRefund {
                attacker: CombatantId(1),
                restored: 2,
                max: 2
            })
        );
        assert!(!session.turn_order().contains(&CombatantId(2)));
        assert_eq!(
            session.combatant(CombatantId(1)).unwrap().luck,
            LuckPool::full(2)
        );

        session.roster_mut().get_mut(CombatantId(1)).unwrap().luck.current = 0;
        assert_eq!(session.resolve_defeat(CombatantId(2), cause).unwrap(), None);
        assert_eq!(session.combatant(CombatantId(1)).unwrap().luck.current, 0);
    }

    #[test]
    fn living_combatants_are_not_defeated() {
        let mut session = session();
        assert_eq!(
            session
                .resolve_defeat(CombatantId(2), DefeatCause::Recoil)
                .unwrap(),
            None
        );
    }

    #[test]
    fn indirect_defeats_and_friendly_fire_earn_nothing() {
        let mut session = session();
        session.roster_mut().get_mut(CombatantId(2)).unwrap().hp = 0;
        let outcome = session
            .resolve_defeat(CombatantId(2), DefeatCause::Weather(WeatherKind::Hail))
            .unwrap()
            .unwrap();
        assert_eq!(outcome.refund, None);

        session.roster_mut().get_mut(CombatantId(3)).unwrap().hp = 0;
        let outcome = session
            .resolve_defeat(
                CombatantId(3),
                DefeatCause::DirectAttack {
                    attacker: CombatantId(1),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(outcome.refund, None);
    }
}
