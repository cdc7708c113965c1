//! Battle state: combatants, stats, statuses and moves.

pub mod combatant;
pub mod common;
pub mod moves;
pub mod roster;
pub mod stats;
pub mod status;

pub use combatant::{Combatant, LuckPolicy, LuckPool, Strategy, TrainerClass};
pub use common::{CombatantId, Position, Side};
pub use moves::{Fraction, Move, MoveCategory, MoveEffect, MoveFlags, MoveSlot};
pub use roster::Roster;
pub use stats::{Stat, StatBlock, StatKind};
pub use status::{StatusEffect, StatusEffects, StatusKind, StatusRejection};
