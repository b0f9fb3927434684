//! Committed commands land in SQLite atomically and sessions can be
//! resumed from their snapshots.

use workforce_core::{
    clock::{FixedClock, SequentialIds},
    command::PlanCommand,
    config::PlanConfig,
    engine::PlanEngine,
    parameters::ParameterKind,
    state::LifecyclePhase,
    store::PlanStore,
    types::WORKING_ID,
};

fn config_with_interval(snapshot_interval: u64) -> PlanConfig {
    PlanConfig {
        snapshot_interval,
        ..PlanConfig::default()
    }
}

fn build_engine(session: &str, config: PlanConfig) -> PlanEngine {
    let store = PlanStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    PlanEngine::with_sources(
        session.to_string(),
        store,
        config,
        Box::new(FixedClock::at_epoch_secs(0)),
        Box::new(SequentialIds::default()),
    )
    .expect("engine")
}

fn restore(session: &str, store: PlanStore, config: PlanConfig) -> PlanEngine {
    PlanEngine::restore(
        session.to_string(),
        store,
        config,
        Box::new(FixedClock::at_epoch_secs(0)),
        Box::new(SequentialIds::default()),
    )
    .expect("restore")
}

fn edit(year: u16, value: &str) -> PlanCommand {
    PlanCommand::UpdateParameter {
        kind: ParameterKind::Supply,
        year,
        category: "Physicians".into(),
        value: value.into(),
    }
}

#[test]
fn scenario_rows_follow_the_state() {
    let mut engine = build_engine("persist-rows", PlanConfig::default());
    engine.execute(&edit(2024, "3000")).unwrap();
    engine.execute(&PlanCommand::Apply).unwrap();

    let rows = engine.store().load_scenarios("persist-rows").unwrap();
    assert_eq!(rows.get(WORKING_ID), engine.state().scenarios().get(WORKING_ID));

    engine
        .execute(&PlanCommand::CreateScenario { name: "Kept".into(), description: String::new() })
        .unwrap();
    let names = engine.store().scenario_names("persist-rows").unwrap();
    assert_eq!(names, vec![("scenario-1".to_string(), "Kept".to_string())]);

    engine
        .execute(&PlanCommand::DeleteScenario { id: "scenario-1".into() })
        .unwrap();
    assert!(engine.store().load_scenarios("persist-rows").unwrap().is_empty());
}

#[test]
fn rejected_commands_write_nothing() {
    let mut engine = build_engine("persist-reject", PlanConfig::default());
    let before = engine.events().unwrap().len();

    assert!(engine.execute(&PlanCommand::Apply).is_err());
    assert!(engine.execute(&edit(2050, "1")).is_err());

    assert_eq!(engine.events().unwrap().len(), before);
    assert_eq!(engine.store().last_seq("persist-reject").unwrap(), 0);
}

#[test]
fn snapshots_are_taken_on_the_interval() {
    let mut engine = build_engine("persist-snap", config_with_interval(2));
    for value in ["2600", "2700", "2800", "2900", "3000"] {
        engine.execute(&edit(2024, value)).unwrap();
    }
    assert_eq!(engine.store().snapshot_count("persist-snap").unwrap(), 2);
    let (seq, _) = engine.store().latest_snapshot("persist-snap").unwrap().unwrap();
    assert_eq!(seq, 4);
}

#[test]
fn restore_from_an_exact_snapshot_keeps_unapplied_edits() {
    let config = config_with_interval(3);
    let mut engine = build_engine("persist-exact", config.clone());
    engine
        .execute(&PlanCommand::CreateScenario { name: "Plan".into(), description: String::new() })
        .unwrap();
    engine.execute(&edit(2024, "2600")).unwrap();
    engine.execute(&edit(2025, "2700")).unwrap();
    let state = engine.state().clone();

    let restored = restore("persist-exact", engine.into_store(), config);
    assert_eq!(restored.state(), &state);
    assert_eq!(restored.seq(), 3);
    assert_eq!(restored.phase(), LifecyclePhase::ScenarioDirty("scenario-1".into()));
}

#[test]
fn restore_reconciles_rows_written_after_the_snapshot() {
    let config = config_with_interval(2);
    let mut engine = build_engine("persist-reconcile", config.clone());
    engine.execute(&edit(2024, "2600")).unwrap();
    engine.execute(&PlanCommand::Apply).unwrap(); // snapshot at 2
    engine
        .execute(&PlanCommand::CreateScenario { name: "Later".into(), description: String::new() })
        .unwrap();
    let scenarios = engine.state().scenarios().clone();

    let restored = restore("persist-reconcile", engine.into_store(), config);
    assert_eq!(restored.state().scenarios(), &scenarios);
    assert_eq!(restored.phase(), LifecyclePhase::Scenario("scenario-1".into()));
    assert_eq!(
        restored.state().editing(),
        &scenarios.get("scenario-1").unwrap().parameters
    );
    assert_eq!(restored.seq(), 3);
}

#[test]
fn restore_of_unknown_session_fails() {
    let store = PlanStore::in_memory().unwrap();
    store.migrate().unwrap();
    let result = PlanEngine::restore(
        "nobody".into(),
        store,
        PlanConfig::default(),
        Box::new(FixedClock::at_epoch_secs(0)),
        Box::new(SequentialIds::default()),
    );
    assert!(result.is_err());
}
