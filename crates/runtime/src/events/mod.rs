//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. Publishing is best-effort: a topic without
//! subscribers silently drops its events.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{AttackEvent, BattleEvent};
