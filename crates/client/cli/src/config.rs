//! CLI configuration loaded from the environment.
use std::env;
use std::time::Duration;

use combat_runtime::RuntimeConfig;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub runtime: RuntimeConfig,
    /// Rounds played before the battle is called.
    pub max_rounds: u32,
    /// How long each attack animation "plays" in the terminal.
    pub animation_delay: Duration,
}

impl CliConfig {
    pub const DEFAULT_MAX_ROUNDS: u32 = 20;
    pub const DEFAULT_ANIMATION_DELAY: Duration = Duration::from_millis(150);

    /// Reads `COMBAT_*` runtime settings plus `BATTLE_MAX_ROUNDS` and
    /// `BATTLE_ANIMATION_DELAY_MS`.
    pub fn from_env() -> Self {
        let max_rounds = env::var("BATTLE_MAX_ROUNDS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(Self::DEFAULT_MAX_ROUNDS)
            .max(1);
        let animation_delay = env::var("BATTLE_ANIMATION_DELAY_MS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Self::DEFAULT_ANIMATION_DELAY);

        Self {
            runtime: RuntimeConfig::from_env(),
            max_rounds,
            animation_delay,
        }
    }
}
