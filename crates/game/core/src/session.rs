//! Battle session: the single owner of mutable battle state.
//!
//! The roster, the weather, the turn order and the dice stream all live
//! here. The combat pipelines borrow disjoint pieces of the session while
//! they run, and every mutation (damage, healing, status changes, defeat)
//! goes through a session method so the ordering
//! `damage -> listeners -> defeat check` is enforced in one place.
//!
//! The session never logs. Human-readable narration is queued with
//! [`BattleSession::narrate`] and drained by whoever drives the battle.

use std::sync::Arc;

use crate::combat::{DamageApplication, DamageListener, DamageSource, ListenerRegistry};
use crate::config::CombatConfig;
use crate::dice::{DiceSource, SeededDice};
use crate::error::CombatResult;
use crate::state::{Combatant, CombatantId, Roster, Side, StatusKind};
use crate::weather::{PeriodicEffect, Weather, WeatherChange, WeatherKind, periodic_effect};

/// Summary of end-of-round processing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RoundSummary {
    pub round: u32,
    /// Weather and status damage, in application order.
    pub damage: Vec<DamageApplication>,
    pub healing: Vec<(CombatantId, u32)>,
    pub expired: Vec<(CombatantId, StatusKind)>,
    pub weather_change: Option<WeatherChange>,
}

/// Final state reported when a battle ends.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BattleOutcome {
    /// `None` when both sides are still standing or both fell.
    pub winner: Option<Side>,
    pub rounds: u32,
    pub weather_reset: WeatherChange,
}

/// Mutable state of one battle.
pub struct BattleSession {
    pub(crate) config: CombatConfig,
    pub(crate) roster: Roster,
    pub(crate) weather: Weather,
    pub(crate) turn_order: Vec<CombatantId>,
    pub(crate) round: u32,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) narration: Vec<String>,
    pub(crate) dice: Box<dyn DiceSource>,
}

impl BattleSession {
    pub fn new(config: CombatConfig, roster: Roster, dice: impl DiceSource + 'static) -> Self {
        let mut session = Self {
            config,
            roster,
            weather: Weather::new(),
            turn_order: Vec::new(),
            round: 0,
            listeners: ListenerRegistry::new(),
            narration: Vec::new(),
            dice: Box::new(dice),
        };
        session.refresh_turn_order();
        session
    }

    /// Session rolling from a [`SeededDice`] stream.
    pub fn seeded(config: CombatConfig, roster: Roster, seed: u64) -> Self {
        Self::new(config, roster, SeededDice::new(seed))
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn combatant(&self, id: CombatantId) -> CombatResult<&Combatant> {
        self.roster.get(id)
    }

    /// Adds a combatant mid-battle and places it in the turn order.
    pub fn add_combatant(&mut self, combatant: Combatant) {
        self.roster.insert(combatant);
        self.refresh_turn_order();
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turn_order(&self) -> &[CombatantId] {
        &self.turn_order
    }

    pub fn dice(&mut self) -> &mut dyn DiceSource {
        &mut *self.dice
    }

    /// Replaces the dice stream (scripted replays, tests).
    pub fn set_dice(&mut self, dice: impl DiceSource + 'static) {
        self.dice = Box::new(dice);
    }

    pub fn register_listener(&mut self, listener: Arc<dyn DamageListener>) {
        self.listeners.register(listener);
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Queues a narration line.
    pub fn narrate(&mut self, line: impl Into<String>) {
        self.narration.push(line.into());
    }

    /// Takes every queued narration line, oldest first.
    pub fn drain_narration(&mut self) -> Vec<String> {
        std::mem::take(&mut self.narration)
    }

    /// Minimum net successes an attacker needs to hit `target`.
    pub fn evasion_threshold(&self, target: CombatantId) -> CombatResult<i32> {
        Ok(self.weather.evasion_threshold(self.roster.get(target)?))
    }

    /// Changes the weather. `None` duration uses the configured default.
    pub fn set_weather(&mut self, kind: WeatherKind, duration: Option<u32>) -> WeatherChange {
        let duration = duration.unwrap_or(self.config.weather_duration);
        let change = self.weather.set(kind, duration, &mut self.roster);
        self.narrate_weather(&change);
        change
    }

    /// Starts a new round and recomputes the turn order.
    pub fn begin_round(&mut self) -> &[CombatantId] {
        self.round += 1;
        self.refresh_turn_order();
        &self.turn_order
    }

    /// Living combatants by initiative, fastest first; ties by id.
    pub fn refresh_turn_order(&mut self) {
        let mut order: Vec<(u32, CombatantId)> = self
            .roster
            .living()
            .map(|c| (c.initiative(), c.id))
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        self.turn_order = order.into_iter().map(|(_, id)| id).collect();
    }

    /// Weather damage and healing for every living combatant.
    ///
    /// Combatants are processed one at a time; each application finishes
    /// its defeat check before the next combatant is looked at.
    pub fn apply_periodic_effects(&mut self) -> CombatResult<RoundSummary> {
        let mut summary = RoundSummary {
            round: self.round,
            ..RoundSummary::default()
        };
        let weather = self.weather.current();
        if weather == WeatherKind::None {
            return Ok(summary);
        }

        for id in self.roster.living_ids() {
            let Some(effect) = periodic_effect(weather, self.roster.get(id)?) else {
                continue;
            };
            match effect {
                PeriodicEffect::Damage(amount) => {
                    let application =
                        self.apply_damage(id, amount, DamageSource::Weather(weather), false)?;
                    summary.damage.push(application);
                }
                PeriodicEffect::Heal(amount) => {
                    let gained = self.roster.get_mut(id)?.heal(amount);
                    if gained > 0 {
                        let name = self.roster.get(id)?.name.clone();
                        self.narrate(format!("{name} restored {gained} HP in the {weather}."));
                        summary.healing.push((id, gained));
                    }
                }
            }
        }
        Ok(summary)
    }

    /// End-of-round processing: weather effects, status damage and expiry,
    /// then the weather countdown.
    pub fn end_round(&mut self) -> CombatResult<RoundSummary> {
        let mut summary = self.apply_periodic_effects()?;

        let (status_damage, expired) = self.apply_status_ticks()?;
        summary.damage.extend(status_damage);
        summary.expired = expired;

        if let Some(change) = self.weather.tick(&mut self.roster) {
            self.narrate_weather(&change);
            summary.weather_change = Some(change);
        }
        Ok(summary)
    }

    /// The side left standing, once the other has been wiped out.
    pub fn winner(&self) -> Option<Side> {
        match (
            self.roster.side_alive(Side::Player),
            self.roster.side_alive(Side::Opponent),
        ) {
            (true, false) => Some(Side::Player),
            (false, true) => Some(Side::Opponent),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        !(self.roster.side_alive(Side::Player) && self.roster.side_alive(Side::Opponent))
    }

    /// Ends the battle, clearing the weather and any stages it granted.
    pub fn end_battle(&mut self) -> BattleOutcome {
        let weather_reset = self.weather.reset(&mut self.roster);
        if weather_reset.from != WeatherKind::None {
            self.narrate_weather(&weather_reset);
        }
        let winner = self.winner();
        match winner {
            Some(side) => self.narrate(format!("The {side} side wins the battle.")),
            None => self.narrate("The battle ends without a winner."),
        }
        BattleOutcome {
            winner,
            rounds: self.round,
            weather_reset,
        }
    }

    fn narrate_weather(&mut self, change: &WeatherChange) {
        let line = match (change.from, change.to) {
            (from, WeatherKind::None) if from != WeatherKind::None => {
                format!("The {from} subsided.")
            }
            (from, to) if from == to => {
                format!("The {to} continues for {} turns.", change.remaining_turns)
            }
            (_, to) => format!("The weather became {to} for {} turns.", change.remaining_turns),
        };
        self.narrate(line);
    }
}

impl std::fmt::Debug for BattleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleSession")
            .field("round", &self.round)
            .field("weather", &self.weather.state())
            .field("turn_order", &self.turn_order)
            .field("combatants", &self.roster.len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::state::{StatBlock, StatusKind};
    use crate::typing::{Ability, TypeTag};

    fn session() -> BattleSession {
        let roster: Roster = [
            Combatant::new(
                CombatantId(1),
                "Quick",
                Side::Player,
                50,
                &[TypeTag::Rock],
                StatBlock::new(50, 50, 50, 50, 90, 4, 3),
            ),
            Combatant::new(
                CombatantId(2),
                "Slow",
                Side::Opponent,
                40,
                &[TypeTag::Grass],
                StatBlock::new(50, 50, 50, 50, 30, 4, 3),
            ),
            Combatant::new(
                CombatantId(3),
                "Middling",
                Side::Opponent,
                40,
                &[TypeTag::Water],
                StatBlock::new(50, 50, 50, 50, 60, 4, 3),
            )
            .with_ability(Ability::RainDish),
        ]
        .into_iter()
        .collect();
        BattleSession::new(CombatConfig::default(), roster, ScriptedDice::new([]))
    }

    #[test]
    fn turn_order_follows_initiative() {
        let mut session = session();
        assert_eq!(
            session.begin_round(),
            &[CombatantId(1), CombatantId(3), CombatantId(2)]
        );

        session
            .roster_mut()
            .get_mut(CombatantId(1))
            .unwrap()
            .status
            .inflict(StatusKind::Paralysis, &[])
            .unwrap();
        // 90 / 2 = 45 < 60
        assert_eq!(
            session.begin_round(),
            &[CombatantId(3), CombatantId(1), CombatantId(2)]
        );
        assert_eq!(session.round(), 2);
    }

    #[test]
    fn sandstorm_round_damages_the_unprotected() {
        let mut session = session();
        session.set_weather(WeatherKind::Sandstorm, Some(2));
        let summary = session.end_round().unwrap();

        let hit: Vec<_> = summary.damage.iter().map(|d| d.event.target).collect();
        assert_eq!(hit, vec![CombatantId(2), CombatantId(3)]);
        assert_eq!(session.combatant(CombatantId(2)).unwrap().hp, 36);
        assert_eq!(session.combatant(CombatantId(1)).unwrap().hp, 50);
        assert_eq!(session.weather().remaining_turns(), 1);
    }

    #[test]
    fn rain_heals_rain_dish_users() {
        let mut session = session();
        session.roster_mut().get_mut(CombatantId(3)).unwrap().hp = 20;
        session.set_weather(WeatherKind::Rain, Some(3));
        let summary = session.apply_periodic_effects().unwrap();
        assert_eq!(summary.healing, vec![(CombatantId(3), 4)]);
    }

    #[test]
    fn end_battle_resets_weather_and_reports_winner() {
        let mut session = session();
        session.set_weather(WeatherKind::Sandstorm, None);
        assert_eq!(
            session.combatant(CombatantId(1)).unwrap().stats.defense.stage,
            1
        );
        for id in [CombatantId(2), CombatantId(3)] {
            session.roster_mut().get_mut(id).unwrap().defeated = true;
        }

        let outcome = session.end_battle();
        assert_eq!(outcome.winner, Some(Side::Player));
        assert_eq!(session.weather().current(), WeatherKind::None);
        assert_eq!(
            session.combatant(CombatantId(1)).unwrap().stats.defense.stage,
            0
        );
        assert!(
            session
                .drain_narration()
                .iter()
                .any(|line| line.contains("wins"))
        );
        assert!(session.drain_narration().is_empty());
    }
}
