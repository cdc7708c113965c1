mod common;

use std::sync::Arc;
use std::time::Duration;

use combat_core::{ScriptedDice, SeededDice};
use combat_runtime::{
    AttackOutcome, AttackRequest, GridPositioning, Quiescence, Runtime, RuntimeConfig,
    RuntimeError,
};
use common::*;

fn sturdy(id: combat_core::CombatantId, name: &str) -> combat_core::Combatant {
    let mut combatant = dummy(id, name);
    combatant.stats.evasion.base = 0;
    combatant.max_hp = 500;
    combatant.hp = 500;
    combatant
}

fn line_grid() -> Arc<GridPositioning> {
    Arc::new(
        GridPositioning::default()
            .with_combatant(STRIKER, at(0, 0))
            .with_combatant(DUMMY, at(1, 0))
            .with_combatant(BYSTANDER, at(2, 0)),
    )
}

#[tokio::test(start_paused = true)]
async fn attacks_by_one_attacker_queue_while_others_overlap() {
    let presentation = ScriptedPresentation::new(Playback::Sleep(Duration::from_millis(100)));
    let runtime = Runtime::builder()
        .roster(roster([
            striker([TACKLE]),
            sturdy(DUMMY, "Dummy"),
            sturdy(BYSTANDER, "Bystander"),
        ]))
        .dice(SeededDice::new(7))
        .positioning(line_grid())
        .presentation(presentation.clone())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let first = handle.launch(AttackRequest::new(STRIKER, DUMMY));
    let second = handle.launch(AttackRequest::new(STRIKER, DUMMY));
    let other = handle.launch(AttackRequest::new(BYSTANDER, DUMMY));
    let (a, b, c) = (first.id(), second.id(), other.id());

    assert!(handle.is_attacking(STRIKER));
    assert_eq!(handle.active_attacks().len(), 3);

    first.wait().await.unwrap();
    second.wait().await.unwrap();
    other.wait().await.unwrap();

    // same attacker: strictly one after the other
    assert!(presentation.position(a, "start") < presentation.position(a, "end"));
    assert!(presentation.position(a, "end") < presentation.position(b, "start"));
    // different attacker: overlaps the first attack
    assert!(presentation.position(c, "start") < presentation.position(a, "end"));

    assert!(handle.active_attacks().is_empty());
    assert!(!handle.is_attacking(STRIKER));
}

#[tokio::test]
async fn quiescence_is_idle_once_attacks_finish() {
    let runtime = Runtime::builder()
        .roster(roster([striker([TACKLE]), sturdy(DUMMY, "Dummy")]))
        .dice(SeededDice::new(11))
        .positioning(line_grid())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let pending: Vec<_> = (0..3)
        .map(|_| handle.launch(AttackRequest::new(STRIKER, DUMMY)))
        .collect();

    let quiescence = handle.complete_all_active_attacks().await;
    assert_eq!(quiescence, Quiescence::Idle);
    assert!(quiescence.is_clean());

    for attack in pending {
        attack.wait().await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn hung_attacks_are_force_cleared() {
    let presentation = ScriptedPresentation::new(Playback::Hang);
    let config = RuntimeConfig {
        animation_timeout: Duration::from_secs(60),
        quiescence_timeout: Duration::from_secs(5),
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder()
        .config(config)
        .roster(roster([striker([TACKLE]), sturdy(DUMMY, "Dummy")]))
        .dice(ScriptedDice::new([6, 6, 5, 3, 2]).with_fallback(2))
        .positioning(line_grid())
        .presentation(presentation.clone())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let stuck = handle.launch(AttackRequest::new(STRIKER, DUMMY));
    let id = stuck.id();

    let quiescence = handle.complete_all_active_attacks().await;
    assert_eq!(quiescence, Quiescence::ForceCleared { abandoned: vec![id] });
    assert!(presentation.was_cleared());
    assert!(handle.active_attacks().is_empty());

    match stuck.wait().await {
        Err(RuntimeError::AttackAbandoned { attack }) => assert_eq!(attack, id),
        other => panic!("expected an abandoned attack, got {other:?}"),
    }

    assert!(!handle.is_attacking(STRIKER));
}

#[tokio::test(start_paused = true)]
async fn slow_animation_times_out_without_losing_the_strike() {
    let presentation = ScriptedPresentation::new(Playback::Hang);
    let runtime = Runtime::builder()
        .roster(roster([striker([TACKLE]), sturdy(DUMMY, "Dummy")]))
        // hit +3, dodge pool is empty, damage four dice of 2
        .dice(ScriptedDice::new([6, 6, 5, 3, 2, 2, 2, 2, 2]))
        .positioning(line_grid())
        .presentation(presentation)
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let report = handle.attack(AttackRequest::new(STRIKER, DUMMY)).await.unwrap();

    assert_eq!(report.outcome, AttackOutcome::Hit);
    assert!(report.presentation_failed);
    assert_eq!(report.damage_dealt(), 8);
    let state = handle.query_state().await.unwrap();
    assert_eq!(state.roster.get(DUMMY).unwrap().hp, 492);
}

#[tokio::test]
async fn shutdown_waits_for_the_worker() {
    let runtime = Runtime::builder()
        .roster(roster([striker([TACKLE]), sturdy(DUMMY, "Dummy")]))
        .dice(SeededDice::new(3))
        .positioning(line_grid())
        .build()
        .await
        .unwrap();

    runtime
        .handle()
        .attack(AttackRequest::new(STRIKER, DUMMY))
        .await
        .unwrap();
    runtime.shutdown().await.unwrap();
}
