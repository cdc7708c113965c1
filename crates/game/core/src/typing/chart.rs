//! Type effectiveness lookup.
//!
//! Effectiveness is tracked in quarter units so every multiplier the engine
//! uses (0, ¼, ½, 1, 2, 2½, 4, 5) stays an exact integer.

use super::TypeTag;

/// Type matchup multiplier expressed in quarters (`4` is neutral).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Effectiveness(u8);

impl Effectiveness {
    pub const IMMUNE: Self = Self(0);
    pub const QUARTER: Self = Self(1);
    pub const HALF: Self = Self(2);
    pub const NEUTRAL: Self = Self(4);
    pub const DOUBLE: Self = Self(8);
    pub const ENHANCED_DOUBLE: Self = Self(10);
    pub const QUADRUPLE: Self = Self(16);
    pub const ENHANCED_QUADRUPLE: Self = Self(20);

    pub const fn quarters(self) -> u8 {
        self.0
    }

    pub const fn is_immune(self) -> bool {
        self.0 == 0
    }

    /// Combine two single-type matchups (dual-typed defenders).
    pub const fn combine(self, other: Self) -> Self {
        Self(((self.0 as u16 * other.0 as u16) / 4) as u8)
    }

    /// Trainer-class enhancement: 2× becomes 2.5× and 4× becomes 5×.
    pub const fn enhanced(self) -> Self {
        match self.0 {
            8 => Self::ENHANCED_DOUBLE,
            16 => Self::ENHANCED_QUADRUPLE,
            _ => self,
        }
    }

    /// Multiply `value` by this effectiveness, rounding to nearest.
    pub const fn apply(self, value: u32) -> u32 {
        (value * self.0 as u32 + 2) / 4
    }

    pub const fn tag(self) -> EffectivenessTag {
        match self.0 {
            0 => EffectivenessTag::Immune,
            1..=3 => EffectivenessTag::NotVeryEffective,
            4 => EffectivenessTag::Neutral,
            _ => EffectivenessTag::SuperEffective,
        }
    }
}

impl Default for Effectiveness {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Coarse effectiveness classification reported with damage results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectivenessTag {
    Immune,
    NotVeryEffective,
    #[default]
    Neutral,
    SuperEffective,
}

/// Effectiveness of an attacking type against a single defending type.
pub fn matchup(attack: TypeTag, defend: TypeTag) -> Effectiveness {
    use TypeTag::*;

    let (double, half, immune): (&[TypeTag], &[TypeTag], &[TypeTag]) = match attack {
        Normal => (&[], &[Rock, Steel], &[Ghost]),
        Fire => (&[Grass, Ice, Bug, Steel], &[Fire, Water, Rock, Dragon], &[]),
        Water => (&[Fire, Ground, Rock], &[Water, Grass, Dragon], &[]),
        Electric => (&[Water, Flying], &[Electric, Grass, Dragon], &[Ground]),
        Grass => (
            &[Water, Ground, Rock],
            &[Fire, Grass, Poison, Flying, Bug, Dragon, Steel],
            &[],
        ),
        Ice => (
            &[Grass, Ground, Flying, Dragon],
            &[Fire, Water, Ice, Steel],
            &[],
        ),
        Fighting => (
            &[Normal, Ice, Rock, Dark, Steel],
            &[Poison, Flying, Psychic, Bug, Fairy],
            &[Ghost],
        ),
        Poison => (&[Grass, Fairy], &[Poison, Ground, Rock, Ghost], &[Steel]),
        Ground => (
            &[Fire, Electric, Poison, Rock, Steel],
            &[Grass, Bug],
            &[Flying],
        ),
        Flying => (&[Grass, Fighting, Bug], &[Electric, Rock, Steel], &[]),
        Psychic => (&[Fighting, Poison], &[Psychic, Steel], &[Dark]),
        Bug => (
            &[Grass, Psychic, Dark],
            &[Fire, Fighting, Poison, Flying, Ghost, Steel, Fairy],
            &[],
        ),
        Rock => (
            &[Fire, Ice, Flying, Bug],
            &[Fighting, Ground, Steel],
            &[],
        ),
        Ghost => (&[Psychic, Ghost], &[Dark], &[Normal]),
        Dragon => (&[Dragon], &[Steel], &[Fairy]),
        Dark => (&[Psychic, Ghost], &[Fighting, Dark, Fairy], &[]),
        Steel => (&[Ice, Rock, Fairy], &[Fire, Water, Electric, Steel], &[]),
        Fairy => (&[Fighting, Dragon, Dark], &[Fire, Poison, Steel], &[]),
    };

    if immune.contains(&defend) {
        Effectiveness::IMMUNE
    } else if double.contains(&defend) {
        Effectiveness::DOUBLE
    } else if half.contains(&defend) {
        Effectiveness::HALF
    } else {
        Effectiveness::NEUTRAL
    }
}

/// Effectiveness of an attacking type against a (possibly dual-typed) defender.
///
/// A defender without types takes neutral damage.
pub fn effectiveness(attack: TypeTag, defender: &[TypeTag]) -> Effectiveness {
    defender
        .iter()
        .fold(Effectiveness::NEUTRAL, |acc, &defend| {
            acc.combine(matchup(attack, defend))
        })
}
