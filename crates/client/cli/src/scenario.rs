//! The demo skirmish: two creatures a side on a small walled grid.
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use combat_core::{
    Ability, BattleOutcome, Combatant, CombatantId, Fraction, LuckPolicy, Move, MoveCategory,
    MoveEffect, Position, Roster, Side, StatBlock, StatusKind, TypeTag,
};
use combat_runtime::{AttackRequest, GridPositioning, Quiescence, RuntimeHandle};

const EMBER: CombatantId = CombatantId(1);
const PEBBLE: CombatantId = CombatantId(2);
const TIDE: CombatantId = CombatantId(3);
const THORN: CombatantId = CombatantId(4);

const FLAME_FAN: Move = Move::new("Flame Fan", MoveCategory::Special, TypeTag::Fire, 6)
    .with_effect(MoveEffect::Cone);
const EMBER_SHOT: Move = Move::new("Ember Shot", MoveCategory::Special, TypeTag::Fire, 4)
    .ranged(4)
    .with_effect(MoveEffect::Inflict(StatusKind::Burn));
const ROCK_THROW: Move =
    Move::new("Rock Throw", MoveCategory::Physical, TypeTag::Rock, 5).ranged(3);
const DOUBLE_SLAM: Move = Move::new("Double Slam", MoveCategory::Physical, TypeTag::Normal, 3)
    .with_effect(MoveEffect::MultiHit { min: 2, max: 2 });
const AQUA_JET: Move = Move::new("Aqua Jet", MoveCategory::Physical, TypeTag::Water, 4);
const BUBBLE: Move = Move::new("Bubble", MoveCategory::Special, TypeTag::Water, 4).ranged(3);
const GIGA_SIP: Move = Move::new("Giga Sip", MoveCategory::Special, TypeTag::Grass, 5)
    .with_effect(MoveEffect::Drain(Fraction::new(1, 2)));
const VINE_LASH: Move = Move::new("Vine Lash", MoveCategory::Physical, TypeTag::Grass, 4).ranged(2);

pub fn roster() -> Roster {
    [
        Combatant::new(
            EMBER,
            "Ember",
            Side::Player,
            38,
            &[TypeTag::Fire],
            StatBlock::new(52, 43, 60, 50, 65, 5, 4),
        )
        .with_moves([FLAME_FAN, EMBER_SHOT]),
        Combatant::new(
            PEBBLE,
            "Pebble",
            Side::Player,
            45,
            &[TypeTag::Rock, TypeTag::Ground],
            StatBlock::new(80, 100, 30, 30, 20, 4, 2),
        )
        .with_ability(Ability::SandForce)
        .with_moves([DOUBLE_SLAM, ROCK_THROW]),
        Combatant::new(
            TIDE,
            "Tide",
            Side::Opponent,
            44,
            &[TypeTag::Water],
            StatBlock::new(48, 65, 50, 64, 43, 4, 4),
        )
        .with_luck_policy(LuckPolicy::Never)
        .with_moves([AQUA_JET, BUBBLE]),
        Combatant::new(
            THORN,
            "Thorn",
            Side::Opponent,
            45,
            &[TypeTag::Grass],
            StatBlock::new(49, 49, 65, 65, 45, 4, 3),
        )
        .with_moves([GIGA_SIP, VINE_LASH]),
    ]
    .into_iter()
    .collect()
}

pub fn arena() -> Arc<GridPositioning> {
    Arc::new(
        GridPositioning::new(8, 6)
            .with_combatant(EMBER, Position::new(2, 2))
            .with_combatant(PEBBLE, Position::new(1, 3))
            .with_combatant(TIDE, Position::new(3, 2))
            .with_combatant(THORN, Position::new(4, 3))
            .with_wall(Position::new(3, 4)),
    )
}

/// Plays rounds until one side falls or `max_rounds` runs out.
///
/// Everyone in the turn order attacks the first standing opponent; attacks
/// of a round run concurrently and the round closes once they settle.
pub async fn play(handle: &RuntimeHandle, max_rounds: u32) -> Result<BattleOutcome> {
    for _ in 0..max_rounds {
        let order = handle.begin_round().await?;
        let state = handle.query_state().await?;

        let mut attacks = Vec::with_capacity(order.len());
        for attacker in order {
            let Ok(combatant) = state.roster.get(attacker) else {
                continue;
            };
            let foe = state
                .roster
                .living()
                .find(|other| other.side == combatant.side.opposing())
                .map(|other| other.id);
            if let Some(target) = foe {
                attacks.push(handle.launch(AttackRequest::new(attacker, target)));
            }
        }

        if let Quiescence::ForceCleared { abandoned } = handle.complete_all_active_attacks().await {
            warn!(abandoned = abandoned.len(), "round closed with stalled attacks");
        }
        for attack in attacks {
            let id = attack.id();
            match attack.wait().await {
                Ok(report) => info!(
                    attack = %id,
                    outcome = ?report.outcome,
                    damage = report.damage_dealt(),
                    "attack settled"
                ),
                Err(err) => warn!(attack = %id, "attack did not settle: {err}"),
            }
        }

        let summary = handle.end_round().await?;
        info!(round = summary.round, "round over");

        if handle.query_state().await?.winner.is_some() {
            break;
        }
    }

    Ok(handle.end_battle().await?)
}
