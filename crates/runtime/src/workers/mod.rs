//! Worker tasks that back the runtime orchestration.
//!
//! The battle worker owns the session and executes rules commands; attack
//! tasks talk to it through [`RuntimeHandle`](crate::RuntimeHandle).

mod battle;

pub use battle::{BattleSnapshot, BattleWorker, Command};
