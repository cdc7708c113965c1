//! Combat configuration constants and tunable parameters.

/// Policy controlling the forcing loop that rerolls exact-zero hit rolls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForcingPolicy {
    /// Exact-zero rolls stand as they are.
    Never,
    /// At most one forced reroll.
    Once,
    /// Up to `floor(accuracy / 4) + 1` forced rerolls.
    #[default]
    Dynamic,
    /// Reroll until the result is nonzero, bounded by
    /// [`CombatConfig::max_forced_rerolls`].
    Always,
}

/// Rules configuration shared by every pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatConfig {
    /// Faces on every die rolled by the engine.
    pub dice_sides: u8,
    /// Face values at or above this count as successes.
    pub success_threshold: u8,
    /// Face values at or below this count as failures.
    pub failure_threshold: u8,
    pub forcing_policy: ForcingPolicy,
    /// Hard cap on forced rerolls regardless of policy. When the cap is
    /// reached with a zero result the attack is treated as a miss.
    pub max_forced_rerolls: u32,
    /// Net successes needed for a critical hit before move/strategy adjustments.
    pub crit_threshold: i32,
    /// Lowest value the critical threshold can be adjusted down to.
    pub crit_threshold_floor: i32,
    /// Flat bonus added to base power by opportunistic attackers against
    /// targets below half health.
    pub opportunist_bonus: u32,
    /// Default duration for weather set without an explicit turn count.
    pub weather_duration: u32,
}

impl CombatConfig {
    // ===== compile-time constants =====
    pub const MAX_TYPES: usize = 2;
    pub const MAX_MOVES: usize = 4;
    pub const MAX_STATUS_EFFECTS: usize = 4;
    pub const MIN_STAGE: i8 = -6;
    pub const MAX_STAGE: i8 = 6;

    /// Minimum net successes to hit a target without weather evasion.
    pub const BASE_EVASION_THRESHOLD: i32 = 1;
    /// Minimum net successes to hit a target whose ability matches the weather.
    pub const WEATHER_EVASION_THRESHOLD: i32 = 3;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_DICE_SIDES: u8 = 6;
    pub const DEFAULT_SUCCESS_THRESHOLD: u8 = 5;
    pub const DEFAULT_FAILURE_THRESHOLD: u8 = 1;
    pub const DEFAULT_MAX_FORCED_REROLLS: u32 = 12;
    pub const DEFAULT_CRIT_THRESHOLD: i32 = 4;
    pub const DEFAULT_CRIT_THRESHOLD_FLOOR: i32 = 2;
    pub const DEFAULT_OPPORTUNIST_BONUS: u32 = 2;
    pub const DEFAULT_WEATHER_DURATION: u32 = 5;

    pub fn new() -> Self {
        Self {
            dice_sides: Self::DEFAULT_DICE_SIDES,
            success_threshold: Self::DEFAULT_SUCCESS_THRESHOLD,
            failure_threshold: Self::DEFAULT_FAILURE_THRESHOLD,
            forcing_policy: ForcingPolicy::default(),
            max_forced_rerolls: Self::DEFAULT_MAX_FORCED_REROLLS,
            crit_threshold: Self::DEFAULT_CRIT_THRESHOLD,
            crit_threshold_floor: Self::DEFAULT_CRIT_THRESHOLD_FLOOR,
            opportunist_bonus: Self::DEFAULT_OPPORTUNIST_BONUS,
            weather_duration: Self::DEFAULT_WEATHER_DURATION,
        }
    }

    #[must_use]
    pub fn with_forcing_policy(mut self, policy: ForcingPolicy) -> Self {
        self.forcing_policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_forced_rerolls(mut self, cap: u32) -> Self {
        self.max_forced_rerolls = cap;
        self
    }

    #[must_use]
    pub fn with_crit_threshold(mut self, threshold: i32) -> Self {
        self.crit_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_weather_duration(mut self, turns: u32) -> Self {
        self.weather_duration = turns.max(1);
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
