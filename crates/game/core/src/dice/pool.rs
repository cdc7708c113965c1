//! Dice pools and opposed-roll results.

use crate::config::CombatConfig;

use super::rng::DiceSource;

/// Result of a single dice-pool roll.
///
/// Immutable once produced; hit resolution keeps the whole chain of rolls
/// (initial, luck reroll, forced rerolls) for narration and auditing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackRoll {
    /// Face values after any degradation.
    pub dice: Vec<u8>,
    pub successes: u32,
    pub failures: u32,
    pub net_successes: i32,
    /// Forcing tier the roll was made at (0 for an ordinary roll).
    pub penalty: u32,
}

impl AttackRoll {
    /// Builds a roll from face values, counting successes and failures.
    pub fn from_faces(dice: Vec<u8>, penalty: u32, config: &CombatConfig) -> Self {
        let successes = dice
            .iter()
            .filter(|&&face| face >= config.success_threshold)
            .count() as u32;
        let failures = dice
            .iter()
            .filter(|&&face| face <= config.failure_threshold)
            .count() as u32;

        Self {
            dice,
            successes,
            failures,
            net_successes: successes as i32 - failures as i32,
            penalty,
        }
    }

    /// A roll of an empty pool.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn pool_size(&self) -> usize {
        self.dice.len()
    }

    /// Adds a flat bonus to net successes (botched-dodge bonus).
    #[must_use]
    pub fn with_bonus(mut self, bonus: i32) -> Self {
        self.net_successes += bonus;
        self
    }
}

/// Roll `pool_size` dice and count net successes.
///
/// `roll_pool(0)` is legal and yields an empty roll with zero net successes.
pub fn roll_pool(
    dice: &mut (impl DiceSource + ?Sized),
    pool_size: u32,
    config: &CombatConfig,
) -> AttackRoll {
    roll_degraded(dice, pool_size, 0, config)
}

/// Roll a pool at a forcing tier.
///
/// Every face is lowered by `penalty` (never below 1) before counting, so
/// each tier costs successes and adds failures. An empty pool is unaffected,
/// which is why forcing needs an explicit iteration cap.
pub fn roll_degraded(
    dice: &mut (impl DiceSource + ?Sized),
    pool_size: u32,
    penalty: u32,
    config: &CombatConfig,
) -> AttackRoll {
    let faces = (0..pool_size)
        .map(|_| {
            let face = dice.roll_die(config.dice_sides) as u32;
            face.saturating_sub(penalty).max(1) as u8
        })
        .collect();

    AttackRoll::from_faces(faces, penalty, config)
}

/// Roll `pool_size` dice and sum the faces (damage variance).
pub fn roll_sum(
    dice: &mut (impl DiceSource + ?Sized),
    pool_size: u32,
    config: &CombatConfig,
) -> u32 {
    (0..pool_size)
        .map(|_| dice.roll_die(config.dice_sides) as u32)
        .sum()
}
