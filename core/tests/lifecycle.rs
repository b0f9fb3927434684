//! Scenario lifecycle driven through the engine: edit, apply, create,
//! select, reset, delete.

use workforce_core::{
    clock::{FixedClock, SequentialIds},
    command::PlanCommand,
    config::PlanConfig,
    engine::PlanEngine,
    error::PlanError,
    event::PlanEvent,
    parameters::ParameterKind,
    scenario::{ActiveScenario, UNNAMED_SCENARIO, WORKING_NAME},
    state::LifecyclePhase,
    store::PlanStore,
    types::WORKING_ID,
};

fn build_engine(session: &str) -> PlanEngine {
    let store = PlanStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    PlanEngine::with_sources(
        session.to_string(),
        store,
        PlanConfig::default(),
        Box::new(FixedClock::at_epoch_secs(1_735_689_600)),
        Box::new(SequentialIds::default()),
    )
    .expect("engine")
}

fn edit(kind: ParameterKind, year: u16, category: &str, value: &str) -> PlanCommand {
    PlanCommand::UpdateParameter {
        kind,
        year,
        category: category.to_string(),
        value: value.to_string(),
    }
}

fn create(name: &str) -> PlanCommand {
    PlanCommand::CreateScenario {
        name: name.to_string(),
        description: String::new(),
    }
}

fn select(id: &str, confirm_discard: bool) -> PlanCommand {
    PlanCommand::SelectScenario {
        id: id.to_string(),
        confirm_discard,
    }
}

#[test]
fn retirement_edit_applies_to_working_scenario() {
    let mut engine = build_engine("lc-retire");
    assert_eq!(engine.phase(), LifecyclePhase::Baseline);

    engine
        .execute(&edit(ParameterKind::RetirementRate, 2024, "Physicians", "0.10"))
        .unwrap();
    assert_eq!(engine.phase(), LifecyclePhase::BaselineDirty);

    let events = engine.execute(&PlanCommand::Apply).unwrap();
    assert_eq!(
        events,
        vec![PlanEvent::ChangesApplied { scenario_id: WORKING_ID.to_string() }]
    );
    assert_eq!(engine.phase(), LifecyclePhase::Working);

    let state = engine.state();
    let working = state.scenarios().get(WORKING_ID).expect("working scenario");
    assert!(working.is_temporary);
    assert_eq!(working.name, WORKING_NAME);

    let cell = working.projections.get(2024, "Physicians").unwrap();
    assert_eq!(cell.supply(), 2025);
    assert_eq!(cell.demand(), 2750);
    assert_eq!(cell.gap(), 725);

    // The baseline table is untouched.
    let base = state.baseline_projections().get(2024, "Physicians").unwrap();
    assert_eq!(base.supply(), 2125);
    assert_eq!(base.demand(), 2750);
}

#[test]
fn apply_without_edits_is_rejected_and_changes_nothing() {
    let mut engine = build_engine("lc-noop-apply");
    let before = engine.state().clone();
    let log_len = engine.events().unwrap().len();

    let err = engine.execute(&PlanCommand::Apply).unwrap_err();
    assert!(matches!(err, PlanError::NothingToApply));
    assert_eq!(engine.state(), &before);
    assert_eq!(engine.events().unwrap().len(), log_len);
    assert_eq!(engine.seq(), 0);
}

#[test]
fn duplicate_names_get_a_counter() {
    let mut engine = build_engine("lc-names");
    engine.execute(&create("Plan A")).unwrap();
    engine.execute(&create("Plan A")).unwrap();
    engine.execute(&create("  ")).unwrap();

    let names: Vec<&str> = engine
        .state()
        .scenarios()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["Plan A", "Plan A (2)", UNNAMED_SCENARIO]);

    let ids: Vec<&str> = engine.state().scenarios().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["scenario-1", "scenario-2", "scenario-3"]);
    assert_eq!(engine.phase(), LifecyclePhase::Scenario("scenario-3".into()));
}

#[test]
fn create_consumes_the_working_scenario() {
    let mut engine = build_engine("lc-promote");
    engine
        .execute(&edit(ParameterKind::EducationalInflow, 2026, "Registered Nurses", "260"))
        .unwrap();
    engine.execute(&PlanCommand::Apply).unwrap();
    let working_params = engine.state().scenarios().get(WORKING_ID).unwrap().parameters.clone();

    let events = engine.execute(&create("Nurse pipeline")).unwrap();
    assert!(events.contains(&PlanEvent::WorkingDiscarded));

    let state = engine.state();
    assert!(!state.scenarios().contains(WORKING_ID));
    let saved = state.scenarios().get("scenario-1").unwrap();
    assert_eq!(saved.parameters, working_params);
    assert!(!saved.is_temporary);
    assert_eq!(state.active(), &ActiveScenario::Saved("scenario-1".into()));
}

#[test]
fn select_with_unapplied_edits_needs_confirmation() {
    let mut engine = build_engine("lc-confirm");
    engine.execute(&create("Plan A")).unwrap();
    engine.execute(&PlanCommand::LoadBaseline).unwrap();
    engine
        .execute(&edit(ParameterKind::Supply, 2024, "Physicians", "2600"))
        .unwrap();
    let before = engine.state().clone();

    let err = engine.execute(&select("scenario-1", false)).unwrap_err();
    assert!(matches!(err, PlanError::UnsavedChanges { ref target } if target == "scenario-1"));
    assert_eq!(engine.state(), &before);
    assert_eq!(engine.phase(), LifecyclePhase::BaselineDirty);

    engine.execute(&select("scenario-1", true)).unwrap();
    assert_eq!(engine.phase(), LifecyclePhase::Scenario("scenario-1".into()));
    let state = engine.state();
    assert_eq!(state.editing(), &state.scenarios().get("scenario-1").unwrap().parameters);
}

#[test]
fn selecting_an_unknown_scenario_falls_back_to_baseline() {
    let mut engine = build_engine("lc-missing");
    engine.execute(&create("Plan A")).unwrap();

    let events = engine.execute(&select("nope", false)).unwrap();
    assert!(events.iter().any(|e| matches!(e, PlanEvent::Notice { .. })));
    assert_eq!(engine.phase(), LifecyclePhase::Baseline);
    assert_eq!(engine.state().editing(), engine.state().baseline());
    assert!(engine.state().scenarios().contains("scenario-1"));
}

#[test]
fn switching_away_from_working_discards_it() {
    let mut engine = build_engine("lc-switch");
    engine.execute(&create("Plan A")).unwrap();
    engine.execute(&PlanCommand::LoadBaseline).unwrap();
    engine
        .execute(&edit(ParameterKind::ReEntrants, 2025, "Physicians", "40"))
        .unwrap();
    engine.execute(&PlanCommand::Apply).unwrap();
    assert!(engine.state().scenarios().contains(WORKING_ID));

    engine.execute(&select("scenario-1", false)).unwrap();
    assert!(!engine.state().scenarios().contains(WORKING_ID));
    assert_eq!(engine.state().scenarios().len(), 1);
}

#[test]
fn reset_reloads_the_saved_scenario() {
    let mut engine = build_engine("lc-reset-saved");
    engine.execute(&create("Plan A")).unwrap();
    engine
        .execute(&edit(ParameterKind::AttritionRate, 2028, "Nurse Practitioners", "0.2"))
        .unwrap();
    assert_eq!(engine.phase(), LifecyclePhase::ScenarioDirty("scenario-1".into()));

    engine.execute(&PlanCommand::Reset).unwrap();
    assert_eq!(engine.phase(), LifecyclePhase::Scenario("scenario-1".into()));
    let state = engine.state();
    assert_eq!(state.editing(), &state.scenarios().get("scenario-1").unwrap().parameters);
    assert_eq!(state.pending_changes().count(), 0);
}

#[test]
fn reset_from_working_returns_to_baseline() {
    let mut engine = build_engine("lc-reset-working");
    engine
        .execute(&edit(ParameterKind::Supply, 2024, "Physicians", "3000"))
        .unwrap();
    engine.execute(&PlanCommand::Apply).unwrap();
    engine
        .execute(&edit(ParameterKind::Supply, 2024, "Physicians", "3500"))
        .unwrap();
    assert_eq!(engine.phase(), LifecyclePhase::WorkingDirty);

    let events = engine.execute(&PlanCommand::Reset).unwrap();
    assert!(events.contains(&PlanEvent::WorkingDiscarded));
    assert_eq!(engine.phase(), LifecyclePhase::Baseline);
    assert!(engine.state().scenarios().is_empty());
    assert_eq!(engine.state().editing(), engine.state().baseline());
}

#[test]
fn apply_on_saved_scenario_overwrites_in_place() {
    let mut engine = build_engine("lc-overwrite");
    engine.execute(&create("Plan A")).unwrap();
    engine.execute(&create("Plan B")).unwrap();
    engine.execute(&select("scenario-1", false)).unwrap();
    let original = engine.state().scenarios().get("scenario-1").unwrap().clone();

    engine
        .execute(&edit(ParameterKind::Supply, 2024, "Physicians", "5000"))
        .unwrap();
    engine.execute(&PlanCommand::Apply).unwrap();

    let state = engine.state();
    let ids: Vec<&str> = state.scenarios().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["scenario-1", "scenario-2"]);

    let updated = state.scenarios().get("scenario-1").unwrap();
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.created_at, original.created_at);
    assert_ne!(updated.parameters, original.parameters);
    assert_eq!(updated.parameters.get(ParameterKind::Supply, 2024, "Physicians"), Some(5000.0));
    assert!(!state.scenarios().contains(WORKING_ID));
    assert_eq!(engine.phase(), LifecyclePhase::Scenario("scenario-1".into()));
}

#[test]
fn deleting_the_active_scenario_returns_to_baseline() {
    let mut engine = build_engine("lc-delete");
    engine.execute(&create("Plan A")).unwrap();
    engine.execute(&create("Plan B")).unwrap();

    let events = engine
        .execute(&PlanCommand::DeleteScenario { id: "scenario-2".into() })
        .unwrap();
    assert_eq!(
        events,
        vec![PlanEvent::ScenarioDeleted { scenario_id: "scenario-2".into() }]
    );
    assert_eq!(engine.phase(), LifecyclePhase::Baseline);
    assert_eq!(engine.state().scenarios().len(), 1);
}

#[test]
fn deleting_unknown_or_baseline_changes_nothing() {
    let mut engine = build_engine("lc-delete-missing");
    engine.execute(&create("Plan A")).unwrap();
    let before = engine.state().clone();

    let events = engine
        .execute(&PlanCommand::DeleteScenario { id: "ghost".into() })
        .unwrap();
    assert!(matches!(events.as_slice(), [PlanEvent::Notice { .. }]));
    assert_eq!(engine.state(), &before);

    let err = engine
        .execute(&PlanCommand::DeleteScenario { id: "baseline".into() })
        .unwrap_err();
    assert!(matches!(err, PlanError::BaselineIsImmutable));
    assert_eq!(engine.state(), &before);
}

#[test]
fn load_baseline_keeps_saved_scenarios() {
    let mut engine = build_engine("lc-load-baseline");
    engine.execute(&create("Plan A")).unwrap();
    engine
        .execute(&edit(ParameterKind::Supply, 2030, "Physicians", "1"))
        .unwrap();

    engine.execute(&PlanCommand::LoadBaseline).unwrap();
    let state = engine.state();
    assert_eq!(engine.phase(), LifecyclePhase::Baseline);
    assert_eq!(state.editing(), state.baseline());
    assert!(state.scenarios().contains("scenario-1"));
}

#[test]
fn out_of_horizon_edit_is_rejected() {
    let mut engine = build_engine("lc-horizon");
    let err = engine
        .execute(&edit(ParameterKind::Supply, 2035, "Physicians", "1"))
        .unwrap_err();
    assert!(matches!(err, PlanError::YearOutOfRange { year: 2035 }));
    assert_eq!(engine.phase(), LifecyclePhase::Baseline);
}

#[test]
fn scenario_edits_propagate_against_the_saved_scenario() {
    let mut engine = build_engine("lc-reference");
    engine
        .execute(&edit(ParameterKind::EducationalInflow, 2024, "Physicians", "150"))
        .unwrap();
    engine.execute(&create("More graduates")).unwrap();
    let saved = engine.state().scenarios().get("scenario-1").unwrap().parameters.clone();
    let baseline_2025 = engine.state().baseline().get(ParameterKind::Supply, 2025, "Physicians").unwrap();

    engine
        .execute(&edit(ParameterKind::EducationalInflow, 2024, "Physicians", "200"))
        .unwrap();
    assert_eq!(engine.phase(), LifecyclePhase::ScenarioDirty("scenario-1".into()));

    // Delta of 50 against the scenario's 150, not 100 against the baseline's 100.
    let saved_2025 = saved.get(ParameterKind::Supply, 2025, "Physicians").unwrap();
    let edited_2025 = engine.state().editing().get(ParameterKind::Supply, 2025, "Physicians").unwrap();
    assert_eq!(edited_2025, saved_2025 + 50.0);
    assert!((edited_2025 - (baseline_2025 + 100.0)).abs() < 1e-9);
    assert_eq!(engine.state().scenarios().get("scenario-1").unwrap().parameters, saved);
}
