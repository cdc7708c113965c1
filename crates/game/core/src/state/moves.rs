//! Move templates and per-battle move slots.
//!
//! A [`Move`] is an immutable template. Special behaviour is carried by a
//! single [`MoveEffect`] tag that the effect dispatcher interprets, so the
//! pipelines never branch on move names.

use bitflags::bitflags;

use super::status::StatusKind;
use crate::typing::TypeTag;

/// Damage category; decides which attack/defense stats are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

bitflags! {
    /// Static properties of a move template.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MoveFlags: u8 {
        /// Projectile attack; requires line of sight.
        const RANGED = 1 << 0;
        /// Contact attack.
        const MELEE = 1 << 1;
        /// Lowers the critical threshold by one.
        const HIGH_CRIT = 1 << 2;
    }
}

/// A fraction of some amount (damage dealt, maximum health).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

impl Fraction {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `amount * numerator / denominator`, floored, but never 0 for a
    /// positive amount.
    pub fn of(self, amount: u32) -> u32 {
        if amount == 0 || self.numerator == 0 {
            return 0;
        }
        (amount * self.numerator / self.denominator.max(1)).max(1)
    }
}

/// Special behaviour tag interpreted by the effect dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveEffect {
    #[default]
    None,
    /// Attacker takes a fraction of the damage dealt.
    Recoil(Fraction),
    /// Strikes between `min` and `max` times.
    MultiHit { min: u8, max: u8 },
    /// Also strikes targets adjacent to the primary target.
    Cone,
    /// Inflicts a status condition on hit.
    Inflict(StatusKind),
    /// Heals the attacker by a fraction of the health the target lost.
    Drain(Fraction),
    /// Lowers the target's speed stage.
    SpeedDrop { stages: u8 },
    /// Only usable through the reaction system.
    ReactionOnly,
}

/// Immutable move template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Move {
    pub name: &'static str,
    pub category: MoveCategory,
    pub power: u32,
    pub type_tag: TypeTag,
    /// Maximum distance in tiles.
    pub range: u32,
    /// Uses available per battle.
    pub max_uses: u8,
    pub flags: MoveFlags,
    pub effect: MoveEffect,
}

impl Move {
    pub const fn new(
        name: &'static str,
        category: MoveCategory,
        type_tag: TypeTag,
        power: u32,
    ) -> Self {
        Self {
            name,
            category,
            power,
            type_tag,
            range: 1,
            max_uses: 10,
            flags: MoveFlags::MELEE,
            effect: MoveEffect::None,
        }
    }

    #[must_use]
    pub const fn ranged(mut self, range: u32) -> Self {
        self.range = range;
        self.flags = MoveFlags::from_bits_truncate(
            (self.flags.bits() & !MoveFlags::MELEE.bits()) | MoveFlags::RANGED.bits(),
        );
        self
    }

    #[must_use]
    pub const fn with_uses(mut self, max_uses: u8) -> Self {
        self.max_uses = max_uses;
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: MoveFlags) -> Self {
        self.flags = MoveFlags::from_bits_truncate(self.flags.bits() | flags.bits());
        self
    }

    #[must_use]
    pub const fn with_effect(mut self, effect: MoveEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn is_ranged(&self) -> bool {
        self.flags.contains(MoveFlags::RANGED)
    }

    pub fn is_high_crit(&self) -> bool {
        self.flags.contains(MoveFlags::HIGH_CRIT)
    }

    pub fn is_reaction_only(&self) -> bool {
        matches!(self.effect, MoveEffect::ReactionOnly)
    }
}

/// A move template plus its remaining uses for this battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MoveSlot {
    pub template: Move,
    pub uses_left: u8,
}

impl MoveSlot {
    pub const fn new(template: Move) -> Self {
        Self {
            uses_left: template.max_uses,
            template,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.uses_left > 0 && !self.template.is_reaction_only()
    }

    /// Spend one use. Returns false when none were left.
    pub fn consume(&mut self) -> bool {
        if self.uses_left == 0 {
            return false;
        }
        self.uses_left -= 1;
        true
    }
}

impl From<Move> for MoveSlot {
    fn from(template: Move) -> Self {
        Self::new(template)
    }
}
