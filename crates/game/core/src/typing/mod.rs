//! Type and ability lookups.
//!
//! Pure functions mapping (move type, defender types) to an effectiveness
//! multiplier and (ability, weather) to the modifiers the pipelines apply.

pub mod ability;
pub mod chart;

pub use ability::{Ability, WeatherResponse};
pub use chart::{Effectiveness, EffectivenessTag, effectiveness, matchup};

/// Elemental type tag carried by moves and combatants.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeTag {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}
