use workforce_core::{
    clock::{FixedClock, SequentialIds},
    command::PlanCommand,
    config::PlanConfig,
    engine::PlanEngine,
    error::PlanError,
    export::Cell,
    parameters::ParameterKind,
    store::PlanStore,
};

fn build_engine(session: &str) -> PlanEngine {
    let store = PlanStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    PlanEngine::with_sources(
        session.to_string(),
        store,
        PlanConfig::default(),
        // 2025-01-01T00:00:00Z
        Box::new(FixedClock::at_epoch_secs(1_735_689_600)),
        Box::new(SequentialIds::default()),
    )
    .expect("engine")
}

#[test]
fn baseline_workbook_has_every_sheet_in_order() {
    let engine = build_engine("export-sheets");
    let workbook = engine.export("baseline").unwrap();

    let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Summary",
            "Workforce Projections",
            "Current Supply",
            "Educational Inflow",
            "International Migrants",
            "Domestic Migrants",
            "Re-Entrants",
            "Retirement Rate",
            "Attrition Rate",
            "Demand Parameters",
        ]
    );
    assert_eq!(workbook.file_stem(), "Baseline_Export_2025-01-01");
}

#[test]
fn summary_lists_scenario_facts_then_totals() {
    let engine = build_engine("export-summary");
    let workbook = engine.export("baseline").unwrap();
    let summary = workbook.sheet("Summary").unwrap();

    assert_eq!(summary.rows[0], vec![Cell::from("Scenario Name"), Cell::from("Baseline")]);
    assert_eq!(summary.rows[1][1], Cell::from("2025-01-01"));
    assert_eq!(summary.rows[2][1], Cell::from("2024-2034"));
    assert_eq!(
        summary.rows[6],
        vec![
            Cell::from("Year"),
            Cell::from("Total Supply"),
            Cell::from("Total Demand"),
            Cell::from("Total Gap"),
        ]
    );
    // One totals row per projected year.
    assert_eq!(summary.rows.len(), 7 + 11);

    let first = &summary.rows[7];
    assert_eq!(first[0], Cell::Int(2024));
    match (&first[1], &first[2], &first[3]) {
        (Cell::Int(supply), Cell::Int(demand), Cell::Int(gap)) => assert_eq!(*gap, demand - supply),
        other => panic!("unexpected totals row {other:?}"),
    }
}

#[test]
fn projections_sheet_lists_every_cell() {
    let engine = build_engine("export-projections");
    let workbook = engine.export("baseline").unwrap();
    let sheet = workbook.sheet("Workforce Projections").unwrap();

    assert_eq!(sheet.rows.len(), 1 + 11 * 5);
    assert_eq!(
        sheet.rows[1],
        vec![
            Cell::Int(2024),
            Cell::from("Physicians"),
            Cell::Int(2125),
            Cell::Int(2750),
            Cell::Int(625),
        ]
    );
}

#[test]
fn parameter_sheets_serialise_to_csv() {
    let engine = build_engine("export-csv");
    let workbook = engine.export("baseline").unwrap();

    let supply = workbook.sheet("Current Supply").unwrap().to_csv().unwrap();
    let mut lines = supply.lines();
    assert_eq!(
        lines.next(),
        Some("Year,Physicians,Nurse Practitioners,Registered Nurses,Licensed Practical Nurses,Medical Office Assistants")
    );
    assert_eq!(lines.next(), Some("2024,2500,800,4200,1800,3200"));

    let demand = workbook.sheet("Demand Parameters").unwrap();
    assert_eq!(demand.rows.len(), 1 + 11 * 12);
    assert!(demand
        .rows
        .iter()
        .any(|row| row.get(1) == Some(&Cell::from("populationGrowth - 85+"))));
}

#[test]
fn scenario_export_uses_its_own_name_and_data() {
    let mut engine = build_engine("export-scenario");
    engine
        .execute(&PlanCommand::UpdateParameter {
            kind: ParameterKind::RetirementRate,
            year: 2024,
            category: "Physicians".into(),
            value: "0.10".into(),
        })
        .unwrap();
    engine
        .execute(&PlanCommand::CreateScenario { name: "Retire early / 2030".into(), description: String::new() })
        .unwrap();

    let workbook = engine.export("scenario-1").unwrap();
    assert_eq!(workbook.file_stem(), "Retire_early___2030_Export_2025-01-01");
    let sheet = workbook.sheet("Workforce Projections").unwrap();
    assert_eq!(sheet.rows[1][2], Cell::Int(2025));
}

#[test]
fn unknown_scenario_cannot_be_exported() {
    let engine = build_engine("export-missing");
    let before = engine.state().clone();
    let err = engine.export("scenario-404").unwrap_err();
    assert!(matches!(err, PlanError::ScenarioNotFound { ref id } if id == "scenario-404"));
    assert_eq!(engine.state(), &before);
}
