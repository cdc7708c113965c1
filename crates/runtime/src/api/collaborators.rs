//! Contracts the orchestrator consumes from the surrounding game.
//!
//! Positioning, presentation, reactions and the narration log are opaque to
//! the combat rules: the orchestrator awaits them between rule steps and
//! never inspects what they do. Each trait ships with an in-process default
//! so a runtime can be built headless.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use combat_core::{CombatantId, Position};

use super::errors::PresentationError;
use crate::orchestrator::AttackId;

/// What the presentation and reaction layers are told about an attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackCue {
    pub attack: AttackId,
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub move_name: &'static str,
    pub ranged: bool,
    /// Whether the attack connected with at least one target.
    pub landed: bool,
}

/// Grid queries and movement.
#[async_trait]
pub trait Positioning: Send + Sync {
    /// Tiles between the closest points of two combatants.
    async fn min_distance(&self, a: CombatantId, b: CombatantId) -> u32;

    async fn occupies_tile(&self, id: CombatantId, tile: Position) -> bool;

    /// Free tiles `target` may step to when dodging.
    async fn available_dodge_tiles(
        &self,
        target: CombatantId,
        attacker: CombatantId,
        ranged: bool,
    ) -> Vec<Position>;

    async fn line_of_sight_blocked(&self, a: CombatantId, b: CombatantId) -> bool;

    /// Extra combatants caught by a cone attack aimed at `target`.
    async fn cone_targets(
        &self,
        _attacker: CombatantId,
        _target: CombatantId,
    ) -> Vec<CombatantId> {
        Vec::new()
    }

    /// The first combatant a projectile meets after flying past `target`.
    ///
    /// Queried before the dodger leaves its tile.
    async fn projectile_continuation(
        &self,
        _attacker: CombatantId,
        _target: CombatantId,
    ) -> Option<CombatantId> {
        None
    }

    /// Moves a combatant that dodged onto its chosen tile.
    async fn dodge_to(&self, _id: CombatantId, _tile: Position) {}
}

/// Visual layer. Completion is all the orchestrator waits for.
#[async_trait]
pub trait Presentation: Send + Sync {
    async fn attack_animation(&self, cue: &AttackCue) -> Result<(), PresentationError>;

    async fn projectile_resolved(&self, _cue: &AttackCue) -> Result<(), PresentationError> {
        Ok(())
    }

    /// Drops lingering visual state (highlights, in-flight projectiles).
    fn clear_transient(&self) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub triggered: bool,
}

/// Gives a target the chance to answer an incoming attack instead of dodging.
#[async_trait]
pub trait ReactionSystem: Send + Sync {
    async fn try_trigger_reaction(
        &self,
        target: CombatantId,
        incoming: &AttackCue,
    ) -> ReactionOutcome;
}

/// Sink for narration lines.
pub trait BattleLog: Send + Sync {
    fn log_event(&self, message: &str);
}

/// Every collaborator the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub positioning: Arc<dyn Positioning>,
    pub presentation: Arc<dyn Presentation>,
    pub reactions: Arc<dyn ReactionSystem>,
    pub log: Arc<dyn BattleLog>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            positioning: Arc::new(GridPositioning::default()),
            presentation: Arc::new(NoPresentation),
            reactions: Arc::new(NoReactions),
            log: Arc::new(TracingLog),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

// ============================================================================
// Defaults
// ============================================================================

/// Presentation that completes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPresentation;

#[async_trait]
impl Presentation for NoPresentation {
    async fn attack_animation(&self, _cue: &AttackCue) -> Result<(), PresentationError> {
        Ok(())
    }
}

/// Reaction system where nothing ever triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReactions;

#[async_trait]
impl ReactionSystem for NoReactions {
    async fn try_trigger_reaction(
        &self,
        _target: CombatantId,
        _incoming: &AttackCue,
    ) -> ReactionOutcome {
        ReactionOutcome::default()
    }
}

/// Forwards narration to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl BattleLog for TracingLog {
    fn log_event(&self, message: &str) {
        info!(target: "runtime::narration", "{message}");
    }
}

#[derive(Debug, Default)]
struct GridState {
    positions: HashMap<CombatantId, Position>,
    walls: HashSet<Position>,
}

impl GridState {
    fn occupied(&self, tile: Position) -> bool {
        self.positions.values().any(|&p| p == tile)
    }
}

/// Rectangular grid with walls; combatants occupy one tile each.
///
/// Combatants that were never placed are treated as out of reach.
#[derive(Debug)]
pub struct GridPositioning {
    width: i32,
    height: i32,
    state: RwLock<GridState>,
}

impl GridPositioning {
    pub const DEFAULT_SIZE: i32 = 8;

    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            state: RwLock::new(GridState::default()),
        }
    }

    #[must_use]
    pub fn with_combatant(mut self, id: CombatantId, at: Position) -> Self {
        self.state.get_mut().positions.insert(id, at);
        self
    }

    #[must_use]
    pub fn with_wall(mut self, at: Position) -> Self {
        self.state.get_mut().walls.insert(at);
        self
    }

    pub async fn place(&self, id: CombatantId, at: Position) {
        self.state.write().await.positions.insert(id, at);
    }

    pub async fn position_of(&self, id: CombatantId) -> Option<Position> {
        self.state.read().await.positions.get(&id).copied()
    }

    fn in_bounds(&self, tile: Position) -> bool {
        (0..self.width).contains(&tile.x) && (0..self.height).contains(&tile.y)
    }
}

impl Default for GridPositioning {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE, Self::DEFAULT_SIZE)
    }
}

/// Tiles crossed walking from `from` to `to`, both ends included.
fn line_between(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let (mut x, mut y) = (from.x, from.y);
    let mut err = dx + dy;
    let mut tiles = Vec::new();
    loop {
        tiles.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
    tiles
}

#[async_trait]
impl Positioning for GridPositioning {
    async fn min_distance(&self, a: CombatantId, b: CombatantId) -> u32 {
        let state = self.state.read().await;
        match (state.positions.get(&a), state.positions.get(&b)) {
            (Some(&from), Some(&to)) => from.distance(to),
            _ => u32::MAX,
        }
    }

    async fn occupies_tile(&self, id: CombatantId, tile: Position) -> bool {
        self.state.read().await.positions.get(&id) == Some(&tile)
    }

    async fn available_dodge_tiles(
        &self,
        target: CombatantId,
        attacker: CombatantId,
        ranged: bool,
    ) -> Vec<Position> {
        let state = self.state.read().await;
        let Some(&origin) = state.positions.get(&target) else {
            return Vec::new();
        };
        // a projectile keeps flying through the tile straight behind the target
        let behind = state.positions.get(&attacker).filter(|_| ranged).map(|&from| {
            Position::new(
                origin.x + (origin.x - from.x).signum(),
                origin.y + (origin.y - from.y).signum(),
            )
        });

        let mut tiles = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let tile = Position::new(origin.x + dx, origin.y + dy);
                if tile == origin
                    || !self.in_bounds(tile)
                    || state.walls.contains(&tile)
                    || state.occupied(tile)
                    || Some(tile) == behind
                {
                    continue;
                }
                tiles.push(tile);
            }
        }
        tiles
    }

    async fn line_of_sight_blocked(&self, a: CombatantId, b: CombatantId) -> bool {
        let state = self.state.read().await;
        let (Some(&from), Some(&to)) = (state.positions.get(&a), state.positions.get(&b)) else {
            return false;
        };
        let path = line_between(from, to);
        path.iter()
            .skip(1)
            .take(path.len().saturating_sub(2))
            .any(|tile| state.walls.contains(tile))
    }

    async fn cone_targets(
        &self,
        attacker: CombatantId,
        target: CombatantId,
    ) -> Vec<CombatantId> {
        let state = self.state.read().await;
        let Some(&center) = state.positions.get(&target) else {
            return Vec::new();
        };
        let mut caught: Vec<CombatantId> = state
            .positions
            .iter()
            .filter(|&(&id, &at)| id != attacker && id != target && at.distance(center) == 1)
            .map(|(&id, _)| id)
            .collect();
        caught.sort();
        caught
    }

    async fn projectile_continuation(
        &self,
        attacker: CombatantId,
        target: CombatantId,
    ) -> Option<CombatantId> {
        let state = self.state.read().await;
        let from = *state.positions.get(&attacker)?;
        let through = *state.positions.get(&target)?;
        if from == through {
            return None;
        }
        // far enough along the same line to leave any grid
        let reach = self.width.max(self.height);
        let beyond = Position::new(
            through.x + (through.x - from.x) * reach,
            through.y + (through.y - from.y) * reach,
        );
        line_between(through, beyond)
            .into_iter()
            .skip(1)
            .take_while(|tile| self.in_bounds(*tile) && !state.walls.contains(tile))
            .find_map(|tile| {
                state
                    .positions
                    .iter()
                    .find(|&(&id, &at)| at == tile && id != attacker && id != target)
                    .map(|(&id, _)| id)
            })
    }

    async fn dodge_to(&self, id: CombatantId, tile: Position) {
        self.place(id, tile).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHER: CombatantId = CombatantId(1);
    const MARK: CombatantId = CombatantId(2);
    const BEHIND: CombatantId = CombatantId(3);

    #[tokio::test]
    async fn projectile_continues_along_the_line_of_fire() {
        let grid = GridPositioning::default()
            .with_combatant(ARCHER, Position::new(0, 0))
            .with_combatant(MARK, Position::new(1, 1))
            .with_combatant(BEHIND, Position::new(3, 3));
        assert_eq!(grid.projectile_continuation(ARCHER, MARK).await, Some(BEHIND));
        // nothing behind the far combatant
        assert_eq!(grid.projectile_continuation(ARCHER, BEHIND).await, None);
    }

    #[tokio::test]
    async fn walls_stop_a_continuing_projectile() {
        let grid = GridPositioning::default()
            .with_combatant(ARCHER, Position::new(0, 2))
            .with_combatant(MARK, Position::new(2, 2))
            .with_combatant(BEHIND, Position::new(5, 2))
            .with_wall(Position::new(4, 2));
        assert_eq!(grid.projectile_continuation(ARCHER, MARK).await, None);

        grid.place(BEHIND, Position::new(3, 2)).await;
        assert_eq!(grid.projectile_continuation(ARCHER, MARK).await, Some(BEHIND));
    }
}
