//! Randomness primitive: opposed dice-pool rolls producing net successes.

pub mod pool;
pub mod rng;

pub use pool::{AttackRoll, roll_degraded, roll_pool, roll_sum};
pub use rng::{DiceSource, PcgRng, RngOracle, ScriptedDice, SeededDice, compute_seed};
