//! Stand-in presentation layer: every animation is a short pause.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use combat_runtime::{AttackCue, Presentation, PresentationError};

pub struct TerminalPresentation {
    delay: Duration,
}

impl TerminalPresentation {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

#[async_trait]
impl Presentation for TerminalPresentation {
    async fn attack_animation(&self, cue: &AttackCue) -> Result<(), PresentationError> {
        debug!(
            attack = %cue.attack,
            attacker = %cue.attacker,
            defender = %cue.target,
            move_name = cue.move_name,
            landed = cue.landed,
            "animating"
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn projectile_resolved(&self, cue: &AttackCue) -> Result<(), PresentationError> {
        debug!(attack = %cue.attack, "projectile flew past");
        tokio::time::sleep(self.delay / 2).await;
        Ok(())
    }

    fn clear_transient(&self) {
        debug!("cleared transient effects");
    }
}
