mod common;

use std::sync::Arc;

use combat_core::{ScriptedDice, Side, WeatherKind};
use combat_runtime::{
    AttackEvent, AttackOutcome, AttackRequest, BattleEvent, Event, GridPositioning, Runtime,
    RuntimeError, Topic,
};
use common::*;

async fn duel(log: Arc<RecordingLog>) -> Runtime {
    Runtime::builder()
        .roster(roster([striker([TACKLE]), dummy(DUMMY, "Dummy")]))
        .dice(ScriptedDice::new([6, 6, 5, 3, 2, 2, 3, 4, 2, 2, 2, 2]))
        .positioning(Arc::new(
            GridPositioning::default()
                .with_combatant(STRIKER, at(1, 1))
                .with_combatant(DUMMY, at(2, 1)),
        ))
        .battle_log(log)
        .build()
        .await
        .expect("runtime builds")
}

#[tokio::test]
async fn builder_requires_a_roster() {
    let result = Runtime::builder().build().await;
    assert!(matches!(result, Err(RuntimeError::MissingRoster)));
}

#[tokio::test]
async fn attack_lifecycle_is_published() {
    let runtime = duel(Arc::new(RecordingLog::default())).await;
    let handle = runtime.handle();
    let mut attacks = handle.subscribe(Topic::Attack);

    let report = handle.attack(AttackRequest::new(STRIKER, DUMMY)).await.unwrap();

    match attacks.recv().await.unwrap() {
        Event::Attack(AttackEvent::Started { attack, attacker, target }) => {
            assert_eq!(attack, report.id);
            assert_eq!(attacker, STRIKER);
            assert_eq!(target, DUMMY);
        }
        other => panic!("unexpected event {other:?}"),
    }
    let resolved = attacks.recv().await.unwrap();
    assert_eq!(
        resolved,
        Event::Attack(AttackEvent::Resolved {
            attack: report.id,
            attacker: STRIKER,
            target: DUMMY,
            move_name: Some("Tackle".to_owned()),
            outcome: AttackOutcome::Hit,
            damage: 8,
        })
    );

    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json["Attack"]["Resolved"]["damage"], 8);
    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(back.topic(), Topic::Attack);
}

#[tokio::test]
async fn rounds_weather_and_battle_end_flow_through_the_bus() {
    let log = Arc::new(RecordingLog::default());
    let runtime = duel(log.clone()).await;
    let handle = runtime.handle();
    let mut battle = handle.subscribe(Topic::Battle);

    let order = handle.begin_round().await.unwrap();
    assert_eq!(order, vec![STRIKER, DUMMY]);

    let change = handle
        .set_weather(WeatherKind::Sandstorm, Some(2))
        .await
        .unwrap();
    assert_eq!(change.to, WeatherKind::Sandstorm);
    assert_eq!(change.remaining_turns, 2);
    assert_eq!(
        battle.recv().await.unwrap(),
        Event::Battle(BattleEvent::WeatherChanged(change))
    );

    handle.attack(AttackRequest::new(STRIKER, DUMMY)).await.unwrap();

    let summary = handle.end_round().await.unwrap();
    assert_eq!(summary.round, 1);
    loop {
        match battle.recv().await.unwrap() {
            Event::Battle(BattleEvent::RoundEnded { round, damage_events }) => {
                assert_eq!(round, 1);
                assert_eq!(damage_events, summary.damage.len());
                break;
            }
            Event::Battle(BattleEvent::CombatantDefeated(_)) => continue,
            other => panic!("unexpected event {other:?}"),
        }
    }

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.round, 1);
    assert_eq!(state.weather.kind, WeatherKind::Sandstorm);

    let outcome = handle.end_battle().await.unwrap();
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.weather_reset.to, WeatherKind::None);
    loop {
        match battle.recv().await.unwrap() {
            Event::Battle(BattleEvent::BattleEnded { winner, rounds }) => {
                assert_eq!(winner, outcome.winner);
                assert_eq!(rounds, 1);
                break;
            }
            Event::Battle(BattleEvent::WeatherChanged(reset)) => {
                assert_eq!(reset.to, WeatherKind::None)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    assert!(log.contains("Striker used Tackle!"));
    assert!(!log.lines().is_empty());
}

#[tokio::test]
async fn late_joiners_take_part_in_the_next_round() {
    let runtime = duel(Arc::new(RecordingLog::default())).await;
    let handle = runtime.handle();

    let mut rival = dummy(BYSTANDER, "Rival");
    rival.side = Side::Player;
    rival.stats.speed.base = 90;
    handle.add_combatant(rival).await.unwrap();

    let order = handle.begin_round().await.unwrap();
    assert_eq!(order.first(), Some(&BYSTANDER));
    assert_eq!(order.len(), 3);
}
