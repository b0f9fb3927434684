//! Two engines, same command stream.
//! They must produce byte-identical event logs and identical scenarios.

use workforce_core::{
    clock::{FixedClock, SequentialIds},
    command::PlanCommand,
    config::PlanConfig,
    engine::PlanEngine,
    event::EventLogEntry,
    parameters::ParameterKind,
    store::PlanStore,
};

const SESSION: &str = "det-test";

fn build_engine() -> PlanEngine {
    let store = PlanStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    PlanEngine::with_sources(
        SESSION.to_string(),
        store,
        PlanConfig::default(),
        Box::new(FixedClock::at_epoch_secs(1_700_000_000)),
        Box::new(SequentialIds::default()),
    )
    .expect("engine")
}

fn command_stream() -> Vec<PlanCommand> {
    let edit = |kind, year, category: &str, value: &str| PlanCommand::UpdateParameter {
        kind,
        year,
        category: category.to_string(),
        value: value.to_string(),
    };
    vec![
        edit(ParameterKind::RetirementRate, 2024, "Physicians", "0.10"),
        edit(ParameterKind::Supply, 2026, "Registered Nurses", "4500"),
        PlanCommand::Apply,
        PlanCommand::CreateScenario { name: "Plan A".into(), description: "first".into() },
        edit(ParameterKind::EducationalInflow, 2028, "Nurse Practitioners", "80"),
        PlanCommand::Apply,
        PlanCommand::CreateScenario { name: "Plan A".into(), description: String::new() },
        PlanCommand::SelectScenario { id: "scenario-1".into(), confirm_discard: false },
        edit(ParameterKind::PopulationGrowth, 2030, "85+", "0.05"),
        PlanCommand::Reset,
        PlanCommand::SelectScenario { id: "missing".into(), confirm_discard: false },
        PlanCommand::DeleteScenario { id: "scenario-2".into() },
        PlanCommand::LoadBaseline,
    ]
}

fn run(engine: &mut PlanEngine) -> Vec<EventLogEntry> {
    for command in command_stream() {
        engine.execute(&command).expect("command");
    }
    engine.events().expect("read events")
}

#[test]
fn same_commands_produce_identical_event_logs() {
    let mut engine_a = build_engine();
    let mut engine_b = build_engine();

    let log_a = run(&mut engine_a);
    let log_b = run(&mut engine_b);

    assert_eq!(
        log_a.len(), log_b.len(),
        "Event log lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(a.seq, b.seq, "seq diverged at entry {i}");
        assert_eq!(
            a.payload, b.payload,
            "Event log diverged at entry {i}:\n  A: {}\n  B: {}",
            a.payload, b.payload
        );
    }

    assert_eq!(engine_a.state(), engine_b.state());
}

#[test]
fn event_log_records_every_committed_command() {
    let mut engine = build_engine();
    let log = run(&mut engine);

    assert_eq!(engine.seq(), command_stream().len() as u64);
    assert_eq!(log.first().map(|e| e.event_type.as_str()), Some("session_started"));
    let last_seq = log.last().map(|e| e.seq).unwrap_or(0);
    assert_eq!(last_seq, engine.seq());
    assert!(log.iter().any(|e| e.event_type == "notice"));
}
