//! Layered damage calculation.
//!
//! # Formula
//!
//! ```text
//! base     = move power                               (0 -> no damage)
//! base    += opportunist bonus vs wounded target
//! damage   = max(base + floor((atk - def) / 5), ceil(base / 2))
//! damage  *= ability power bonus                      (sand force: +30%)
//! damage  *= type effectiveness                       (immune -> 0, stop)
//! damage  *= weather modifier                         (×1.5 / ×0.5)
//! damage  *= ability weather boost                    (solar power: ×1.5)
//! damage  *= 2 if net successes >= crit threshold
//! final    = sum of `damage` d6
//! ```
//!
//! Every multiplicative layer rounds to nearest and keeps a positive value
//! at 1 or more. Each layer's output is recorded so callers can narrate or
//! audit the calculation.

use crate::config::CombatConfig;
use crate::dice::{DiceSource, roll_sum};
use crate::state::{Combatant, Move, MoveCategory, StatKind, Strategy, TrainerClass};
use crate::typing::{Ability, Effectiveness, EffectivenessTag, effectiveness};
use crate::weather::{WeatherKind, WeatherTag};

/// A stage of the damage calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageLayer {
    BasePower,
    Opportunist,
    StatDifferential,
    AbilityPower,
    TypeEffectiveness,
    Weather,
    AbilityWeather,
    Critical,
    Variance,
}

/// Value after one stage of the calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerValue {
    pub layer: DamageLayer,
    pub value: u32,
}

/// An ability that changed the damage, and by how much (percent).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityModifier {
    pub ability: Ability,
    pub layer: DamageLayer,
    pub percent: u32,
}

/// Everything the calculation needs about one hit.
#[derive(Clone, Copy, Debug)]
pub struct DamageContext<'a> {
    pub attacker: &'a Combatant,
    pub target: &'a Combatant,
    pub mv: &'a Move,
    pub weather: WeatherKind,
    pub weather_tag: WeatherTag,
    /// Attacker's final net successes, including any botched-dodge bonus.
    pub net_successes: i32,
}

/// Outcome of the damage calculation. Not yet applied to anyone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageResult {
    /// Base power after the opportunist bonus.
    pub base_damage: u32,
    pub layers: Vec<LayerValue>,
    pub final_damage: u32,
    pub is_critical: bool,
    pub crit_threshold: i32,
    pub effectiveness: Effectiveness,
    pub effectiveness_tag: EffectivenessTag,
    pub weather_tag: WeatherTag,
    pub ability_log: Vec<AbilityModifier>,
}

impl DamageResult {
    pub fn layer(&self, layer: DamageLayer) -> Option<u32> {
        self.layers
            .iter()
            .find(|entry| entry.layer == layer)
            .map(|entry| entry.value)
    }

    fn record(&mut self, layer: DamageLayer, value: u32) -> u32 {
        self.layers.push(LayerValue { layer, value });
        value
    }
}

/// Net successes needed for a critical hit with `mv`.
pub fn crit_threshold(attacker: &Combatant, mv: &Move, config: &CombatConfig) -> i32 {
    let mut threshold = config.crit_threshold;
    if mv.is_high_crit() {
        threshold -= 1;
    }
    if attacker.strategy == Strategy::Precision && mv.range > 1 {
        threshold -= 1;
    }
    threshold.max(config.crit_threshold_floor)
}

/// Attack and defense stats compared for a move category.
pub fn stat_pair(category: MoveCategory) -> (StatKind, StatKind) {
    match category {
        MoveCategory::Special => (StatKind::SpecialAttack, StatKind::SpecialDefense),
        MoveCategory::Physical | MoveCategory::Status => (StatKind::Attack, StatKind::Defense),
    }
}

/// Compute damage for one hit. Only the variance layer consumes dice.
pub fn calculate_damage(
    ctx: DamageContext<'_>,
    dice: &mut (impl DiceSource + ?Sized),
    config: &CombatConfig,
) -> DamageResult {
    let DamageContext {
        attacker,
        target,
        mv,
        weather,
        weather_tag,
        net_successes,
    } = ctx;

    let mut result = DamageResult {
        crit_threshold: crit_threshold(attacker, mv, config),
        ..DamageResult::default()
    };

    let power = mv.power;
    if power == 0 {
        return result;
    }
    let mut damage = result.record(DamageLayer::BasePower, power);

    if attacker.strategy == Strategy::Opportunistic && target.is_wounded() {
        damage = result.record(DamageLayer::Opportunist, damage + config.opportunist_bonus);
    }
    result.base_damage = damage;

    let (offense, defense) = stat_pair(mv.category);
    let differential =
        (attacker.stat(offense) as i64 - target.stat(defense) as i64).div_euclid(5);
    // floored against the base after the opportunist bonus
    let floor = damage.div_ceil(2) as i64;
    damage = result.record(
        DamageLayer::StatDifferential,
        (damage as i64 + differential).max(floor) as u32,
    );

    if let Some(percent) = attacker.ability.power_bonus(weather, mv.category) {
        damage = result.record(DamageLayer::AbilityPower, scale(damage, 100 + percent, 100));
        result.ability_log.push(AbilityModifier {
            ability: attacker.ability,
            layer: DamageLayer::AbilityPower,
            percent,
        });
    }

    let mut matchup = effectiveness(mv.type_tag, &target.types);
    if attacker.trainer_class == Some(TrainerClass::Elementalist) {
        matchup = matchup.enhanced();
    }
    result.effectiveness = matchup;
    result.effectiveness_tag = matchup.tag();
    if matchup.is_immune() {
        result.record(DamageLayer::TypeEffectiveness, 0);
        return result;
    }
    damage = result.record(
        DamageLayer::TypeEffectiveness,
        matchup.apply(damage).max(1),
    );

    result.weather_tag = weather_tag;
    damage = match weather_tag {
        WeatherTag::Neutral => damage,
        WeatherTag::Boosted => result.record(DamageLayer::Weather, scale(damage, 3, 2)),
        WeatherTag::Weakened => result.record(DamageLayer::Weather, scale(damage, 1, 2)),
    };

    if attacker.ability.boosted_by(weather) {
        damage = result.record(DamageLayer::AbilityWeather, scale(damage, 3, 2));
        result.ability_log.push(AbilityModifier {
            ability: attacker.ability,
            layer: DamageLayer::AbilityWeather,
            percent: 50,
        });
    }

    if net_successes >= result.crit_threshold {
        result.is_critical = true;
        damage = result.record(DamageLayer::Critical, damage * 2);
    }

    result.final_damage =
        result.record(DamageLayer::Variance, roll_sum(&mut *dice, damage, config));
    result
}

/// `value * numerator / denominator`, rounded half up, never below 1.
fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    ((value * numerator + denominator / 2) / denominator).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::state::{CombatantId, MoveFlags, Side, StatBlock};
    use crate::typing::TypeTag;

    const TACKLE: Move = Move::new("Tackle", MoveCategory::Physical, TypeTag::Normal, 8);
    const EMBER: Move = Move::new("Ember", MoveCategory::Special, TypeTag::Fire, 8);

    fn mon(id: u32, types: &[TypeTag], atk: u32, def: u32) -> Combatant {
        Combatant::new(
            CombatantId(id),
            "Mon",
            Side::Player,
            100,
            types,
            StatBlock::new(atk, def, atk, def, 50, 4, 3),
        )
    }

    fn ctx<'a>(attacker: &'a Combatant, target: &'a Combatant, mv: &'a Move) -> DamageContext<'a> {
        DamageContext {
            attacker,
            target,
            mv,
            weather: WeatherKind::None,
            weather_tag: WeatherTag::Neutral,
            net_successes: 1,
        }
    }

    #[test]
    fn zero_power_short_circuits() {
        let growl = Move::new("Growl", MoveCategory::Status, TypeTag::Normal, 0);
        let a = mon(1, &[TypeTag::Normal], 60, 40);
        let t = mon(2, &[TypeTag::Normal], 60, 40);
        let mut dice = ScriptedDice::new([6]);
        let result = calculate_damage(ctx(&a, &t, &growl), &mut dice, &CombatConfig::default());

        assert_eq!(result.final_damage, 0);
        assert!(result.layers.is_empty());
        assert_eq!(dice.consumed(), 0);
    }

    #[test]
    fn stat_differential_is_floored_at_half_power() {
        let a = mon(1, &[TypeTag::Normal], 60, 40);
        let t = mon(2, &[TypeTag::Normal], 40, 60);
        let mut dice = ScriptedDice::new([]).with_fallback(3);
        let result = calculate_damage(ctx(&a, &t, &TACKLE), &mut dice, &CombatConfig::default());
        // 8 + (60 - 60) / 5 = 8
        assert_eq!(result.layer(DamageLayer::StatDifferential), Some(8));

        let weak = mon(3, &[TypeTag::Normal], 10, 10);
        let wall = mon(4, &[TypeTag::Normal], 100, 100);
        let mut dice = ScriptedDice::new([]).with_fallback(3);
        let result =
            calculate_damage(ctx(&weak, &wall, &TACKLE), &mut dice, &CombatConfig::default());
        // 8 - 18 -> floored at ceil(8 / 2)
        assert_eq!(result.layer(DamageLayer::StatDifferential), Some(4));
        // four dice at 3 each
        assert_eq!(result.final_damage, 12);
        assert_eq!(dice.consumed(), 4);
    }

    #[test]
    fn immunity_zeroes_everything() {
        let mut a = mon(1, &[TypeTag::Normal], 100, 40);
        a.strategy = Strategy::Opportunistic;
        let t = mon(2, &[TypeTag::Ghost], 40, 40);
        let mut context = ctx(&a, &t, &TACKLE);
        context.net_successes = 6;
        context.weather_tag = WeatherTag::Boosted;
        let mut dice = ScriptedDice::new([6, 6]);
        let result = calculate_damage(context, &mut dice, &CombatConfig::default());

        assert_eq!(result.final_damage, 0);
        assert_eq!(result.effectiveness_tag, EffectivenessTag::Immune);
        assert!(!result.is_critical);
        assert_eq!(dice.consumed(), 0);
    }

    #[test]
    fn super_effective_weather_boosted_crit() {
        let a = mon(1, &[TypeTag::Fire], 50, 50);
        let t = mon(2, &[TypeTag::Grass], 50, 50);
        let mut context = ctx(&a, &t, &EMBER);
        context.weather = WeatherKind::Sun;
        context.weather_tag = WeatherTag::Boosted;
        context.net_successes = 4;
        let mut dice = ScriptedDice::new([]).with_fallback(2);
        let result = calculate_damage(context, &mut dice, &CombatConfig::default());

        // 8 -> ×2 = 16 -> ×1.5 = 24 -> crit 48 -> 48 dice
        assert_eq!(result.layer(DamageLayer::TypeEffectiveness), Some(16));
        assert_eq!(result.layer(DamageLayer::Weather), Some(24));
        assert_eq!(result.layer(DamageLayer::Critical), Some(48));
        assert!(result.is_critical);
        assert_eq!(result.final_damage, 96);
        assert_eq!(result.effectiveness_tag, EffectivenessTag::SuperEffective);
    }

    #[test]
    fn elementalists_hit_harder_when_super_effective() {
        let a = mon(1, &[TypeTag::Fire], 50, 50).with_trainer_class(TrainerClass::Elementalist);
        let t = mon(2, &[TypeTag::Grass], 50, 50);
        let mut dice = ScriptedDice::new([1]);
        let result = calculate_damage(ctx(&a, &t, &EMBER), &mut dice, &CombatConfig::default());
        assert_eq!(result.effectiveness, Effectiveness::ENHANCED_DOUBLE);
        assert_eq!(result.layer(DamageLayer::TypeEffectiveness), Some(20));
    }

    #[test]
    fn opportunists_press_wounded_targets() {
        let a = mon(1, &[TypeTag::Normal], 50, 50).with_strategy(Strategy::Opportunistic);
        let mut t = mon(2, &[TypeTag::Normal], 50, 50);
        t.hp = 40;
        let mut dice = ScriptedDice::new([1]);
        let result = calculate_damage(ctx(&a, &t, &TACKLE), &mut dice, &CombatConfig::default());
        assert_eq!(result.base_damage, 10);
    }

    #[test]
    fn abilities_are_logged() {
        let a = mon(1, &[TypeTag::Ground], 50, 50).with_ability(Ability::SandForce);
        let t = mon(2, &[TypeTag::Normal], 50, 50);
        let mut context = ctx(&a, &t, &TACKLE);
        context.weather = WeatherKind::Sandstorm;
        let mut dice = ScriptedDice::new([1]);
        let result = calculate_damage(context, &mut dice, &CombatConfig::default());

        // 8 × 1.3 = 10.4 -> 10
        assert_eq!(result.layer(DamageLayer::AbilityPower), Some(10));
        assert_eq!(result.ability_log.len(), 1);
        assert_eq!(result.ability_log[0].ability, Ability::SandForce);
    }

    #[test]
    fn crit_threshold_adjustments() {
        let config = CombatConfig::default();
        let precise = mon(1, &[], 1, 1).with_strategy(Strategy::Precision);
        let sniper = Move::new("Snipe", MoveCategory::Physical, TypeTag::Normal, 5)
            .ranged(4)
            .with_flags(MoveFlags::RANGED.union(MoveFlags::HIGH_CRIT));

        assert_eq!(crit_threshold(&precise, &TACKLE, &config), 4);
        assert_eq!(crit_threshold(&precise, &sniper, &config), 2);
        let strict = config.clone().with_crit_threshold(3);
        assert_eq!(crit_threshold(&precise, &sniper, &strict), 2);
    }

    #[test]
    fn weakened_moves_keep_at_least_one() {
        let a = mon(1, &[TypeTag::Water], 1, 1);
        let t = mon(2, &[TypeTag::Water], 1, 1);
        let splash = Move::new("Drip", MoveCategory::Special, TypeTag::Water, 1);
        let mut context = ctx(&a, &t, &splash);
        context.weather_tag = WeatherTag::Weakened;
        let mut dice = ScriptedDice::new([1]);
        let result = calculate_damage(context, &mut dice, &CombatConfig::default());
        assert_eq!(result.layer(DamageLayer::Weather), Some(1));
    }

    #[test]
    fn differential_floor_counts_the_opportunist_bonus() {
        let weak = mon(1, &[TypeTag::Normal], 10, 10).with_strategy(Strategy::Opportunistic);
        let mut wall = mon(2, &[TypeTag::Normal], 100, 100);
        wall.hp = 40;
        let mut dice = ScriptedDice::new([]).with_fallback(1);
        let result =
            calculate_damage(ctx(&weak, &wall, &TACKLE), &mut dice, &CombatConfig::default());

        assert_eq!(result.base_damage, 10);
        // 10 - 18 -> floored at ceil(10 / 2)
        assert_eq!(result.layer(DamageLayer::StatDifferential), Some(5));
    }

    #[test]
    fn solar_power_stacks_on_the_sun_boost() {
        let a = mon(1, &[TypeTag::Fire], 50, 50).with_ability(Ability::SolarPower);
        let t = mon(2, &[TypeTag::Normal], 50, 50);
        let mut context = ctx(&a, &t, &EMBER);
        context.weather = WeatherKind::Sun;
        context.weather_tag = WeatherTag::Boosted;
        let mut dice = ScriptedDice::new([]).with_fallback(1);
        let result = calculate_damage(context, &mut dice, &CombatConfig::default());

        // 8 -> sun ×1.5 = 12 -> solar power ×1.5 = 18, no crit at +1
        assert_eq!(result.layer(DamageLayer::Weather), Some(12));
        assert_eq!(result.layer(DamageLayer::AbilityWeather), Some(18));
        assert_eq!(result.layer(DamageLayer::Critical), None);
        assert_eq!(result.final_damage, 18);
        assert_eq!(result.ability_log.len(), 1);
        assert_eq!(result.ability_log[0].layer, DamageLayer::AbilityWeather);
        assert_eq!(dice.consumed(), 18);
    }
}
