//! Combatants and their per-battle resources.

use arrayvec::ArrayVec;

use super::common::{CombatantId, Side};
use super::moves::{Move, MoveSlot};
use super::stats::{StatBlock, StatKind};
use super::status::StatusEffects;
use crate::config::CombatConfig;
use crate::typing::{Ability, TypeTag};

/// Tactical disposition that feeds into damage calculation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    #[default]
    Balanced,
    /// Presses the advantage against wounded targets.
    Opportunistic,
    /// Lines up ranged shots; crits more easily beyond melee range.
    Precision,
}

/// Trainer class of the combatant's owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrainerClass {
    Ace,
    /// Super-effective hits land harder (2× → 2.5×, 4× → 5×).
    Elementalist,
    Ranger,
}

/// When a combatant spends luck tokens on a failed hit roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LuckPolicy {
    Never,
    /// Reroll whenever net successes are zero or below.
    #[default]
    OnFailure,
}

/// Bounded per-battle reroll currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LuckPool {
    pub current: u32,
    pub max: u32,
}

impl LuckPool {
    /// Maximum pool for a given base stat total:
    /// `max(1, floor((600 - total) / 80) + 1)`.
    pub fn max_for(base_stat_total: u32) -> u32 {
        let headroom = 600 - base_stat_total as i64;
        (headroom.div_euclid(80) + 1).max(1) as u32
    }

    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn try_spend(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Refill to maximum. Returns the number of tokens restored.
    pub fn refill(&mut self) -> u32 {
        let restored = self.max - self.current;
        self.current = self.max;
        restored
    }
}

/// A combatant participating in a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub hp: u32,
    pub max_hp: u32,
    pub types: ArrayVec<TypeTag, { CombatConfig::MAX_TYPES }>,
    pub stats: StatBlock,
    pub ability: Ability,
    pub status: StatusEffects,
    pub luck: LuckPool,
    pub luck_policy: LuckPolicy,
    pub strategy: Strategy,
    pub trainer_class: Option<TrainerClass>,
    pub moves: ArrayVec<MoveSlot, { CombatConfig::MAX_MOVES }>,
    /// Set once by the defeat resolver; defeated combatants stay in the
    /// roster but leave the turn order.
    pub defeated: bool,
}

impl Combatant {
    /// Creates a combatant at full health with a full luck pool.
    ///
    /// Extra types beyond two and moves beyond four are ignored.
    pub fn new(
        id: CombatantId,
        name: impl Into<String>,
        side: Side,
        max_hp: u32,
        types: &[TypeTag],
        stats: StatBlock,
    ) -> Self {
        let luck_max = LuckPool::max_for(max_hp + stats.combat_base_total());
        Self {
            id,
            name: name.into(),
            side,
            hp: max_hp,
            max_hp,
            types: types
                .iter()
                .copied()
                .take(CombatConfig::MAX_TYPES)
                .collect(),
            stats,
            ability: Ability::None,
            status: StatusEffects::empty(),
            luck: LuckPool::full(luck_max),
            luck_policy: LuckPolicy::default(),
            strategy: Strategy::default(),
            trainer_class: None,
            moves: ArrayVec::new(),
            defeated: false,
        }
    }

    #[must_use]
    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = ability;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_trainer_class(mut self, class: TrainerClass) -> Self {
        self.trainer_class = Some(class);
        self
    }

    #[must_use]
    pub fn with_luck_policy(mut self, policy: LuckPolicy) -> Self {
        self.luck_policy = policy;
        self
    }

    #[must_use]
    pub fn with_moves(mut self, moves: impl IntoIterator<Item = Move>) -> Self {
        for template in moves {
            if self.moves.try_push(MoveSlot::new(template)).is_err() {
                break;
            }
        }
        self
    }

    /// Base HP plus the five combat stat bases.
    pub fn base_stat_total(&self) -> u32 {
        self.max_hp + self.stats.combat_base_total()
    }

    pub fn has_type(&self, tag: TypeTag) -> bool {
        self.types.contains(&tag)
    }

    pub fn is_alive(&self) -> bool {
        !self.defeated && self.hp > 0
    }

    /// True below half of maximum health.
    pub fn is_wounded(&self) -> bool {
        self.hp * 2 < self.max_hp
    }

    pub fn stat(&self, kind: StatKind) -> u32 {
        self.stats.effective(kind)
    }

    /// Speed used for turn order; paralysis halves it.
    pub fn initiative(&self) -> u32 {
        let speed = self.stat(StatKind::Speed);
        if self.status.has(super::status::StatusKind::Paralysis) {
            speed / 2
        } else {
            speed
        }
    }

    /// Lose up to `amount` health. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Restore up to `amount` health, capped at maximum. Returns the gain.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_hp - self.hp);
        self.hp += gained;
        gained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luck_pool_formula() {
        assert_eq!(LuckPool::max_for(500), 2);
        assert_eq!(LuckPool::max_for(200), 6);
        assert_eq!(LuckPool::max_for(600), 1);
        assert_eq!(LuckPool::max_for(720), 1);
        assert_eq!(LuckPool::max_for(0), 8);
    }

    #[test]
    fn new_combatant_starts_full() {
        let stats = StatBlock::new(80, 80, 80, 80, 80, 5, 3);
        let mon = Combatant::new(
            CombatantId(1),
            "Rockling",
            Side::Player,
            100,
            &[TypeTag::Rock],
            stats,
        );
        assert_eq!(mon.base_stat_total(), 500);
        assert_eq!(mon.luck, LuckPool::full(2));
        assert!(mon.is_alive());
        assert!(!mon.is_wounded());
    }

    #[test]
    fn damage_and_healing_are_bounded() {
        let stats = StatBlock::new(10, 10, 10, 10, 10, 1, 1);
        let mut mon = Combatant::new(CombatantId(1), "Pebble", Side::Player, 20, &[], stats);
        assert_eq!(mon.take_damage(15), 15);
        assert!(mon.is_wounded());
        assert_eq!(mon.take_damage(15), 5);
        assert_eq!(mon.hp, 0);
        assert_eq!(mon.heal(50), 20);
    }
}
