//! Battlefield weather state machine.
//!
//! One [`Weather`] instance lives in each battle session. Entering a
//! sandstorm grants rock-typed combatants +1 defense and +1 special defense
//! (only where the stage is below the cap) and records exactly which stages
//! were raised, so leaving the sandstorm reverses those stages and nothing
//! else.

mod periodic;

pub use periodic::{PeriodicEffect, periodic_effect};

use std::collections::BTreeMap;

use crate::config::CombatConfig;
use crate::state::{Combatant, CombatantId, Roster, StatKind};
use crate::typing::TypeTag;

/// Battlefield-wide weather condition.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeatherKind {
    #[default]
    None,
    Sun,
    Rain,
    Sandstorm,
    Snow,
    Hail,
    Fog,
}

/// Current condition and its countdown.
///
/// Invariant: `remaining_turns > 0` whenever `kind != None`, and
/// `remaining_turns == 0` when `kind == None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeatherState {
    pub kind: WeatherKind,
    pub remaining_turns: u32,
}

/// How the weather modifies a move of a given type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeatherTag {
    #[default]
    Neutral,
    /// ×1.5
    Boosted,
    /// ×0.5
    Weakened,
}

/// Stages granted to one combatant on sandstorm entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SandstormGrant {
    pub defense: bool,
    pub special_defense: bool,
}

impl SandstormGrant {
    pub fn is_empty(&self) -> bool {
        !self.defense && !self.special_defense
    }
}

/// Summary of a weather transition, used for narration and events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeatherChange {
    pub from: WeatherKind,
    pub to: WeatherKind,
    pub remaining_turns: u32,
    /// Combatants whose sandstorm stages were raised.
    pub granted: Vec<CombatantId>,
    /// Combatants whose sandstorm stages were reverted.
    pub reverted: Vec<CombatantId>,
}

/// Weather state plus the bookkeeping for weather-linked stat bonuses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weather {
    state: WeatherState,
    grants: BTreeMap<CombatantId, SandstormGrant>,
}

impl Weather {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> WeatherKind {
        self.state.kind
    }

    pub fn state(&self) -> WeatherState {
        self.state
    }

    pub fn remaining_turns(&self) -> u32 {
        self.state.remaining_turns
    }

    /// Stages currently granted by the sandstorm.
    pub fn grant_for(&self, id: CombatantId) -> Option<SandstormGrant> {
        self.grants.get(&id).copied()
    }

    /// Transition to `kind` for `duration` turns.
    ///
    /// A non-`None` kind always lasts at least one turn; `None` always
    /// carries zero turns. Setting a sandstorm while one is already active
    /// only refreshes the countdown.
    pub fn set(&mut self, kind: WeatherKind, duration: u32, roster: &mut Roster) -> WeatherChange {
        let from = self.state.kind;
        let mut change = WeatherChange {
            from,
            to: kind,
            ..WeatherChange::default()
        };

        if from == WeatherKind::Sandstorm && kind != WeatherKind::Sandstorm {
            change.reverted = self.revert_sandstorm(roster);
        }
        if kind == WeatherKind::Sandstorm && from != WeatherKind::Sandstorm {
            change.granted = self.grant_sandstorm(roster);
        }

        self.state = match kind {
            WeatherKind::None => WeatherState::default(),
            _ => WeatherState {
                kind,
                remaining_turns: duration.max(1),
            },
        };
        change.remaining_turns = self.state.remaining_turns;
        change
    }

    /// Count down one turn. Returns the transition when the weather ends.
    pub fn tick(&mut self, roster: &mut Roster) -> Option<WeatherChange> {
        if self.state.kind == WeatherKind::None {
            return None;
        }
        self.state.remaining_turns = self.state.remaining_turns.saturating_sub(1);
        if self.state.remaining_turns == 0 {
            return Some(self.set(WeatherKind::None, 0, roster));
        }
        None
    }

    /// Clears the weather (battle end), reversing any granted stages.
    pub fn reset(&mut self, roster: &mut Roster) -> WeatherChange {
        self.set(WeatherKind::None, 0, roster)
    }

    /// Minimum net successes an attacker needs to hit `target`.
    pub fn evasion_threshold(&self, target: &Combatant) -> i32 {
        if target.ability.evades_in(self.state.kind) {
            CombatConfig::WEATHER_EVASION_THRESHOLD
        } else {
            CombatConfig::BASE_EVASION_THRESHOLD
        }
    }

    /// Weather modifier for a move of type `move_type`.
    pub fn modifier_for(&self, move_type: TypeTag) -> WeatherTag {
        match (self.state.kind, move_type) {
            (WeatherKind::Sun, TypeTag::Fire)
            | (WeatherKind::Rain, TypeTag::Water)
            | (WeatherKind::Snow, TypeTag::Ice)
            | (WeatherKind::Sandstorm, TypeTag::Rock) => WeatherTag::Boosted,
            (WeatherKind::Sun, TypeTag::Water) | (WeatherKind::Rain, TypeTag::Fire) => {
                WeatherTag::Weakened
            }
            _ => WeatherTag::Neutral,
        }
    }

    fn grant_sandstorm(&mut self, roster: &mut Roster) -> Vec<CombatantId> {
        let mut granted = Vec::new();
        for combatant in roster.iter_mut() {
            if combatant.defeated || !combatant.has_type(TypeTag::Rock) {
                continue;
            }
            let grant = SandstormGrant {
                defense: raise_below_cap(combatant, StatKind::Defense),
                special_defense: raise_below_cap(combatant, StatKind::SpecialDefense),
            };
            if !grant.is_empty() {
                self.grants.insert(combatant.id, grant);
                granted.push(combatant.id);
            }
        }
        granted
    }

    fn revert_sandstorm(&mut self, roster: &mut Roster) -> Vec<CombatantId> {
        let mut reverted = Vec::new();
        for (id, grant) in std::mem::take(&mut self.grants) {
            // Combatants can leave the roster mid-battle; their grant simply lapses.
            let Ok(combatant) = roster.get_mut(id) else {
                continue;
            };
            if grant.defense {
                combatant.stats.defense.shift_stage(-1);
            }
            if grant.special_defense {
                combatant.stats.special_defense.shift_stage(-1);
            }
            reverted.push(id);
        }
        reverted
    }
}

fn raise_below_cap(combatant: &mut Combatant, kind: StatKind) -> bool {
    let stat = combatant.stats.get_mut(kind);
    !stat.is_at_max_stage() && stat.shift_stage(1) == 1
}
