//! Stat blocks with bounded stages.
//!
//! Each stat has a base value and a stage in `[-6, +6]`. The effective value
//! scales the base by `max(2, 2 + stage) / max(2, 2 - stage)`, so +1 is ×1.5,
//! +6 is ×4 and -6 is ×0.25. Integer arithmetic only.

use crate::config::CombatConfig;

/// Individual stats tracked per combatant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::EnumCount,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatKind {
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    /// Dice pool for hit rolls.
    Accuracy,
    /// Dice pool for dodge rolls.
    Evasion,
}

/// A base value plus its current stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stat {
    pub base: u32,
    pub stage: i8,
}

impl Stat {
    pub const fn new(base: u32) -> Self {
        Self { base, stage: 0 }
    }

    /// Base value scaled by the current stage.
    pub fn effective(&self) -> u32 {
        let stage = self.stage as i32;
        let numerator = (2 + stage).max(2) as u32;
        let denominator = (2 - stage).max(2) as u32;
        self.base * numerator / denominator
    }

    /// Shift the stage by `delta`, clamped to the stage bounds.
    ///
    /// Returns the change actually applied, which is smaller than `delta`
    /// when the stage hits a bound.
    pub fn shift_stage(&mut self, delta: i8) -> i8 {
        let before = self.stage;
        self.stage = (before as i32 + delta as i32)
            .clamp(CombatConfig::MIN_STAGE as i32, CombatConfig::MAX_STAGE as i32)
            as i8;
        self.stage - before
    }

    pub fn is_at_max_stage(&self) -> bool {
        self.stage >= CombatConfig::MAX_STAGE
    }
}

/// Complete stat block for a combatant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatBlock {
    pub attack: Stat,
    pub defense: Stat,
    pub special_attack: Stat,
    pub special_defense: Stat,
    pub speed: Stat,
    pub accuracy: Stat,
    pub evasion: Stat,
}

impl StatBlock {
    /// Builds a block from base values; every stage starts at 0.
    pub const fn new(
        attack: u32,
        defense: u32,
        special_attack: u32,
        special_defense: u32,
        speed: u32,
        accuracy: u32,
        evasion: u32,
    ) -> Self {
        Self {
            attack: Stat::new(attack),
            defense: Stat::new(defense),
            special_attack: Stat::new(special_attack),
            special_defense: Stat::new(special_defense),
            speed: Stat::new(speed),
            accuracy: Stat::new(accuracy),
            evasion: Stat::new(evasion),
        }
    }

    pub fn get(&self, kind: StatKind) -> &Stat {
        match kind {
            StatKind::Attack => &self.attack,
            StatKind::Defense => &self.defense,
            StatKind::SpecialAttack => &self.special_attack,
            StatKind::SpecialDefense => &self.special_defense,
            StatKind::Speed => &self.speed,
            StatKind::Accuracy => &self.accuracy,
            StatKind::Evasion => &self.evasion,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut Stat {
        match kind {
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::SpecialAttack => &mut self.special_attack,
            StatKind::SpecialDefense => &mut self.special_defense,
            StatKind::Speed => &mut self.speed,
            StatKind::Accuracy => &mut self.accuracy,
            StatKind::Evasion => &mut self.evasion,
        }
    }

    pub fn effective(&self, kind: StatKind) -> u32 {
        self.get(kind).effective()
    }

    /// Sum of the base values that count toward the base stat total.
    ///
    /// Accuracy and evasion are dice pools, not part of the total.
    pub fn combat_base_total(&self) -> u32 {
        self.attack.base
            + self.defense.base
            + self.special_attack.base
            + self.special_defense.base
            + self.speed.base
    }
}
