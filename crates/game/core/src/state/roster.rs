//! The set of combatants taking part in a battle.

use super::combatant::Combatant;
use super::common::{CombatantId, Side};
use crate::error::{CombatError, CombatResult};

/// Owns every combatant in a battle, defeated ones included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Roster {
    combatants: Vec<Combatant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant, replacing any existing entry with the same id.
    pub fn insert(&mut self, combatant: Combatant) {
        match self.combatants.iter_mut().find(|c| c.id == combatant.id) {
            Some(existing) => *existing = combatant,
            None => self.combatants.push(combatant),
        }
    }

    pub fn get(&self, id: CombatantId) -> CombatResult<&Combatant> {
        self.combatants
            .iter()
            .find(|c| c.id == id)
            .ok_or(CombatError::UnknownCombatant(id))
    }

    pub fn get_mut(&mut self, id: CombatantId) -> CombatResult<&mut Combatant> {
        self.combatants
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CombatError::UnknownCombatant(id))
    }

    /// Like [`Self::get`] but also rejects defeated combatants.
    pub fn active(&self, id: CombatantId) -> CombatResult<&Combatant> {
        let combatant = self.get(id)?;
        if combatant.defeated {
            return Err(CombatError::CombatantDefeated(id));
        }
        Ok(combatant)
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatants.iter().any(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    pub fn living(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| !c.defeated)
    }

    /// Ids of non-defeated combatants, in roster order.
    pub fn living_ids(&self) -> Vec<CombatantId> {
        self.living().map(|c| c.id).collect()
    }

    pub fn side_alive(&self, side: Side) -> bool {
        self.living().any(|c| c.side == side)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }
}

impl FromIterator<Combatant> for Roster {
    fn from_iter<I: IntoIterator<Item = Combatant>>(iter: I) -> Self {
        let mut roster = Self::new();
        for combatant in iter {
            roster.insert(combatant);
        }
        roster
    }
}
