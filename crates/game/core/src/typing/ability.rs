//! Ability tags and their weather interactions.

use crate::state::MoveCategory;
use crate::weather::WeatherKind;

/// Passive ability carried by a combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ability {
    #[default]
    None,
    /// Harder to hit in a sandstorm; no sandstorm damage.
    SandVeil,
    /// Harder to hit in snow or hail; no hail damage.
    SnowCloak,
    /// Harder to hit in fog.
    FogWalker,
    /// Physical moves hit 30% harder in a sandstorm; no sandstorm damage.
    SandForce,
    /// Moves hit 50% harder in sun, at the cost of 1/8 HP per round.
    SolarPower,
    /// Heals 1/8 in rain, loses 1/8 in sun.
    DrySkin,
    /// Heals 1/10 in rain.
    RainDish,
    /// Heals 1/10 in hail or snow instead of taking damage.
    IceBody,
    /// No weather damage of any kind.
    Overcoat,
}

/// How an ability overrides periodic weather effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherResponse {
    /// Typing rules decide.
    Default,
    /// Takes no weather damage.
    Immune,
    /// Heals `numerator / denominator` of maximum health.
    Heal { numerator: u32, denominator: u32 },
    /// Loses `numerator / denominator` of maximum health.
    Damage { numerator: u32, denominator: u32 },
}

impl Ability {
    /// True when this ability raises the evasion threshold under `weather`.
    pub fn evades_in(self, weather: WeatherKind) -> bool {
        matches!(
            (self, weather),
            (Self::SandVeil, WeatherKind::Sandstorm)
                | (Self::SnowCloak, WeatherKind::Snow | WeatherKind::Hail)
                | (Self::FogWalker, WeatherKind::Fog)
        )
    }

    /// Percentage power bonus granted to a move of `category` under `weather`.
    pub fn power_bonus(self, weather: WeatherKind, category: MoveCategory) -> Option<u32> {
        match (self, weather, category) {
            (Self::SandForce, WeatherKind::Sandstorm, MoveCategory::Physical) => Some(30),
            _ => None,
        }
    }

    /// True when the ability's flat 50% weather boost applies.
    pub fn boosted_by(self, weather: WeatherKind) -> bool {
        matches!((self, weather), (Self::SolarPower, WeatherKind::Sun))
    }

    /// End-of-round override for weather damage or healing.
    pub fn weather_response(self, weather: WeatherKind) -> WeatherResponse {
        use WeatherKind::*;

        match (self, weather) {
            (_, None | Fog) => WeatherResponse::Default,
            (Self::Overcoat, _) => WeatherResponse::Immune,
            (Self::SandVeil | Self::SandForce, Sandstorm) => WeatherResponse::Immune,
            (Self::SnowCloak, Hail) => WeatherResponse::Immune,
            (Self::IceBody, Hail | Snow) => WeatherResponse::Heal {
                numerator: 1,
                denominator: 10,
            },
            (Self::SolarPower | Self::DrySkin, Sun) => WeatherResponse::Damage {
                numerator: 1,
                denominator: 8,
            },
            (Self::DrySkin, Rain) => WeatherResponse::Heal {
                numerator: 1,
                denominator: 8,
            },
            (Self::RainDish, Rain) => WeatherResponse::Heal {
                numerator: 1,
                denominator: 10,
            },
            _ => WeatherResponse::Default,
        }
    }
}
