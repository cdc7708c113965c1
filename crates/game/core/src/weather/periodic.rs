//! End-of-round weather damage and healing.

use crate::state::{Combatant, Fraction};
use crate::typing::{TypeTag, WeatherResponse};

use super::WeatherKind;

/// Health change a weather condition applies to one combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodicEffect {
    Damage(u32),
    Heal(u32),
}

const SANDSTORM_DAMAGE: Fraction = Fraction::new(1, 10);
const HAIL_DAMAGE: Fraction = Fraction::new(1, 10);

/// Decide the periodic effect of `weather` on `combatant`.
///
/// Abilities override typing: they can negate the damage entirely or turn
/// it into healing. Healing a combatant already at full health is skipped.
pub fn periodic_effect(weather: WeatherKind, combatant: &Combatant) -> Option<PeriodicEffect> {
    if !combatant.is_alive() {
        return None;
    }

    let effect = match combatant.ability.weather_response(weather) {
        WeatherResponse::Immune => return None,
        WeatherResponse::Heal {
            numerator,
            denominator,
        } => PeriodicEffect::Heal(Fraction::new(numerator, denominator).of(combatant.max_hp)),
        WeatherResponse::Damage {
            numerator,
            denominator,
        } => PeriodicEffect::Damage(Fraction::new(numerator, denominator).of(combatant.max_hp)),
        WeatherResponse::Default => default_effect(weather, combatant)?,
    };

    match effect {
        PeriodicEffect::Heal(_) if combatant.hp >= combatant.max_hp => None,
        PeriodicEffect::Heal(0) | PeriodicEffect::Damage(0) => None,
        other => Some(other),
    }
}

fn default_effect(weather: WeatherKind, combatant: &Combatant) -> Option<PeriodicEffect> {
    let immune_types: &[TypeTag] = match weather {
        WeatherKind::Sandstorm => &[TypeTag::Rock, TypeTag::Steel, TypeTag::Ground],
        WeatherKind::Hail => &[TypeTag::Ice, TypeTag::Water],
        _ => return None,
    };
    if immune_types.iter().any(|&tag| combatant.has_type(tag)) {
        return None;
    }

    let fraction = match weather {
        WeatherKind::Sandstorm => SANDSTORM_DAMAGE,
        _ => HAIL_DAMAGE,
    };
    Some(PeriodicEffect::Damage(fraction.of(combatant.max_hp)))
}
