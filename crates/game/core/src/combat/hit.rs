//! Hit resolution: initial roll, luck rerolls and the forcing loop.
//!
//! # Sequence
//!
//! ```text
//! initial = roll(accuracy)
//! if net <= 0 and luck allowed: spend token, reroll, keep better
//! while net == 0 and forcing allowed:
//!     tier += 1
//!     forced = degraded roll at tier
//!     if forced.net < 0 and luck allowed (once): spend token, reroll at tier, keep better
//!     net = forced.net
//! hit = net >= evasion threshold
//! ```
//!
//! The forcing loop is always bounded by [`CombatConfig::max_forced_rerolls`].
//! An attack still sitting on zero net successes when the hard cap stops the
//! loop is an automatic miss.

use crate::config::{CombatConfig, ForcingPolicy};
use crate::dice::{AttackRoll, DiceSource, roll_degraded, roll_pool};
use crate::state::{LuckPolicy, LuckPool};

/// Why a roll in the hit chain was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollKind {
    Initial,
    /// Luck-token reroll.
    Luck,
    /// Forced reroll at the given tier.
    Forced(u32),
    /// Luck-token reroll of a forced roll that went negative.
    ForcedLuck(u32),
}

/// One roll in the resolution chain.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainedRoll {
    pub kind: RollKind,
    pub roll: AttackRoll,
}

/// Inputs to hit resolution.
#[derive(Clone, Copy, Debug)]
pub struct HitRequest {
    /// Accuracy pool, including any skill modifiers.
    pub accuracy: u32,
    /// Net successes required to hit (see [`crate::weather::Weather::evasion_threshold`]).
    pub threshold: i32,
    pub luck_policy: LuckPolicy,
}

/// Outcome of hit resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitResolution {
    /// Every roll made, in order.
    pub chain: Vec<ChainedRoll>,
    /// The roll whose result stands.
    pub final_roll: AttackRoll,
    pub threshold: i32,
    pub forced_rerolls: u32,
    pub luck_spent: u32,
    /// The hard cap stopped the forcing loop on a zero result.
    pub forcing_exhausted: bool,
    pub hit: bool,
}

impl HitResolution {
    pub fn net_successes(&self) -> i32 {
        self.final_roll.net_successes
    }
}

/// Resolve whether an attack connects.
pub fn resolve_hit(
    dice: &mut (impl DiceSource + ?Sized),
    request: HitRequest,
    luck: &mut LuckPool,
    config: &CombatConfig,
) -> HitResolution {
    let pool = request.accuracy;
    let luck_allowed = request.luck_policy == LuckPolicy::OnFailure;
    let mut chain = Vec::new();
    let mut luck_spent = 0;

    let initial = roll_pool(&mut *dice, pool, config);
    chain.push(ChainedRoll {
        kind: RollKind::Initial,
        roll: initial.clone(),
    });
    let mut current = initial;

    if current.net_successes <= 0 && luck_allowed && luck.try_spend() {
        luck_spent += 1;
        let reroll = roll_pool(&mut *dice, pool, config);
        chain.push(ChainedRoll {
            kind: RollKind::Luck,
            roll: reroll.clone(),
        });
        if reroll.net_successes > current.net_successes {
            current = reroll;
        }
    }

    let policy_limit = forcing_limit(config.forcing_policy, pool);
    let limit = policy_limit.min(config.max_forced_rerolls);
    let mut tier = 0;
    let mut forced_luck_used = false;

    while current.net_successes == 0 && tier < limit {
        tier += 1;
        let mut forced = roll_degraded(&mut *dice, pool, tier, config);
        chain.push(ChainedRoll {
            kind: RollKind::Forced(tier),
            roll: forced.clone(),
        });

        if forced.net_successes < 0 && luck_allowed && !forced_luck_used && luck.try_spend() {
            forced_luck_used = true;
            luck_spent += 1;
            let reroll = roll_degraded(&mut *dice, pool, tier, config);
            chain.push(ChainedRoll {
                kind: RollKind::ForcedLuck(tier),
                roll: reroll.clone(),
            });
            if reroll.net_successes > forced.net_successes {
                forced = reroll;
            }
        }

        current = forced;
    }

    let forcing_exhausted = current.net_successes == 0 && tier == limit && limit < policy_limit;
    let hit = !forcing_exhausted && current.net_successes >= request.threshold;

    HitResolution {
        chain,
        final_roll: current,
        threshold: request.threshold,
        forced_rerolls: tier,
        luck_spent,
        forcing_exhausted,
        hit,
    }
}

/// Forced rerolls a policy allows before the hard cap applies.
fn forcing_limit(policy: ForcingPolicy, accuracy: u32) -> u32 {
    match policy {
        ForcingPolicy::Never => 0,
        ForcingPolicy::Once => 1,
        ForcingPolicy::Dynamic => accuracy / 4 + 1,
        ForcingPolicy::Always => u32::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    fn request(accuracy: u32, luck_policy: LuckPolicy) -> HitRequest {
        HitRequest {
            accuracy,
            threshold: 1,
            luck_policy,
        }
    }

    #[test]
    fn clean_hit_uses_one_roll() {
        // 6, 6, 5, 3, 2 -> 3 successes, 0 failures
        let mut dice = ScriptedDice::new([6, 6, 5, 3, 2]);
        let mut luck = LuckPool::full(2);
        let config = CombatConfig::default();
        let result = resolve_hit(&mut dice, request(5, LuckPolicy::OnFailure), &mut luck, &config);

        assert!(result.hit);
        assert_eq!(result.net_successes(), 3);
        assert_eq!(result.chain.len(), 1);
        assert_eq!(luck.current, 2);
    }

    #[test]
    fn luck_reroll_keeps_the_better_roll() {
        // initial: 1, 1, 3 -> -2; luck: 6, 3, 3 -> +1
        let mut dice = ScriptedDice::new([1, 1, 3, 6, 3, 3]);
        let mut luck = LuckPool::full(2);
        let config = CombatConfig::default();
        let result = resolve_hit(&mut dice, request(3, LuckPolicy::OnFailure), &mut luck, &config);

        assert_eq!(result.chain[1].kind, RollKind::Luck);
        assert_eq!(result.net_successes(), 1);
        assert_eq!(result.luck_spent, 1);
        assert_eq!(luck.current, 1);
        assert!(result.hit);
    }

    #[test]
    fn luck_reroll_never_makes_things_worse() {
        // initial: 1, 3, 3 -> -1; luck: 1, 1, 3 -> -2
        let mut dice = ScriptedDice::new([1, 3, 3, 1, 1, 3]);
        let mut luck = LuckPool::full(1);
        let config = CombatConfig::default().with_forcing_policy(ForcingPolicy::Never);
        let result = resolve_hit(&mut dice, request(3, LuckPolicy::OnFailure), &mut luck, &config);

        assert_eq!(result.net_successes(), -1);
        assert!(!result.hit);
    }

    #[test]
    fn never_policy_rolls_once() {
        // 6, 1 -> 0 net successes, which would normally force
        let mut dice = ScriptedDice::new([6, 1]);
        let mut luck = LuckPool::full(3);
        let config = CombatConfig::default().with_forcing_policy(ForcingPolicy::Never);
        let result = resolve_hit(&mut dice, request(2, LuckPolicy::Never), &mut luck, &config);

        assert_eq!(result.chain.len(), 1);
        assert_eq!(result.forced_rerolls, 0);
        assert_eq!(result.net_successes(), 0);
        assert!(!result.forcing_exhausted);
        assert!(!result.hit);
    }

    #[test]
    fn once_policy_forces_a_single_reroll() {
        // initial 6, 1 -> 0; forced at tier 1: 6 -> 5, 2 -> 1 -> still 0
        let mut dice = ScriptedDice::new([6, 1, 6, 2]);
        let mut luck = LuckPool::full(0);
        let config = CombatConfig::default().with_forcing_policy(ForcingPolicy::Once);
        let result = resolve_hit(&mut dice, request(2, LuckPolicy::Never), &mut luck, &config);

        assert_eq!(result.forced_rerolls, 1);
        assert_eq!(result.chain[1].kind, RollKind::Forced(1));
        assert_eq!(result.net_successes(), 0);
        assert!(!result.forcing_exhausted);
    }

    #[test]
    fn forcing_stops_on_nonzero_result() {
        // initial 6, 1 -> 0; tier 1: 6, 6 -> 5, 5 -> +2
        let mut dice = ScriptedDice::new([6, 1, 6, 6]);
        let mut luck = LuckPool::full(0);
        let config = CombatConfig::default().with_forcing_policy(ForcingPolicy::Always);
        let result = resolve_hit(&mut dice, request(2, LuckPolicy::Never), &mut luck, &config);

        assert_eq!(result.forced_rerolls, 1);
        assert_eq!(result.net_successes(), 2);
        assert!(result.hit);
    }

    #[test]
    fn negative_forced_roll_may_spend_luck_once() {
        // initial 6, 1 -> 0; luck 3, 3 -> 0
        // tier 1: 2, 2 -> 1, 1 -> -2; forced luck: 6, 6 -> 5, 5 -> +2
        let mut dice = ScriptedDice::new([6, 1, 3, 3, 2, 2, 6, 6]);
        let mut luck = LuckPool::full(3);
        let config = CombatConfig::default().with_forcing_policy(ForcingPolicy::Always);
        let result = resolve_hit(&mut dice, request(2, LuckPolicy::OnFailure), &mut luck, &config);

        let kinds: Vec<_> = result.chain.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RollKind::Initial,
                RollKind::Luck,
                RollKind::Forced(1),
                RollKind::ForcedLuck(1)
            ]
        );
        assert_eq!(result.luck_spent, 2);
        assert_eq!(luck.current, 1);
        assert_eq!(result.net_successes(), 2);
        assert!(result.hit);
    }

    #[test]
    fn dynamic_policy_scales_with_accuracy() {
        assert_eq!(forcing_limit(ForcingPolicy::Dynamic, 0), 1);
        assert_eq!(forcing_limit(ForcingPolicy::Dynamic, 7), 2);
        assert_eq!(forcing_limit(ForcingPolicy::Dynamic, 8), 3);
    }

    #[test]
    fn zero_accuracy_always_policy_terminates_as_a_miss() {
        let mut dice = ScriptedDice::new([]);
        let mut luck = LuckPool::full(3);
        let config = CombatConfig::default()
            .with_forcing_policy(ForcingPolicy::Always)
            .with_max_forced_rerolls(8);
        let result = resolve_hit(&mut dice, request(0, LuckPolicy::OnFailure), &mut luck, &config);

        assert_eq!(result.forced_rerolls, 8);
        assert!(result.forcing_exhausted);
        assert!(!result.hit);
        // initial + luck reroll + 8 forced rolls
        assert_eq!(result.chain.len(), 10);
        assert_eq!(dice.consumed(), 0);
    }

    /// `count` copies of `face`, one pool's worth of dice.
    fn pool(face: u8, count: usize) -> impl Iterator<Item = u8> {
        std::iter::repeat_n(face, count)
    }

    #[test]
    fn dynamic_policy_stops_after_its_limit() {
        // accuracy 4 -> limit 2; every roll lands on 3s after the tier penalty
        let faces = pool(3, 4).chain(pool(4, 4)).chain(pool(5, 4)).chain(pool(6, 4));
        let mut dice = ScriptedDice::new(faces);
        let mut luck = LuckPool::full(0);
        let config = CombatConfig::default()
            .with_forcing_policy(ForcingPolicy::Dynamic)
            .with_max_forced_rerolls(10);
        let result = resolve_hit(&mut dice, request(4, LuckPolicy::Never), &mut luck, &config);

        assert_eq!(result.forced_rerolls, 2);
        assert_eq!(result.chain.len(), 3);
        assert_eq!(result.chain[2].kind, RollKind::Forced(2));
        assert_eq!(result.net_successes(), 0);
        // the policy ran its course; the hard cap was never reached
        assert!(!result.forcing_exhausted);
        assert!(!result.hit);
        assert_eq!(dice.consumed(), 12);
    }

    #[test]
    fn hard_cap_cuts_a_dynamic_policy_short() {
        // accuracy 12 -> dynamic limit 4, capped at 2
        let faces = pool(3, 12).chain(pool(4, 12)).chain(pool(5, 12));
        let mut dice = ScriptedDice::new(faces).with_fallback(6);
        let mut luck = LuckPool::full(0);
        let config = CombatConfig::default()
            .with_forcing_policy(ForcingPolicy::Dynamic)
            .with_max_forced_rerolls(2);
        let result = resolve_hit(&mut dice, request(12, LuckPolicy::Never), &mut luck, &config);

        assert_eq!(result.forced_rerolls, 2);
        assert_eq!(result.net_successes(), 0);
        assert!(result.forcing_exhausted);
        assert!(!result.hit);
        assert_eq!(dice.consumed(), 36);
    }
}
