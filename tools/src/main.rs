//! plan-runner: headless runner for the workforce planning engine.
//!
//! Usage:
//!   plan-runner --db plan.db --population-csv population.csv
//!   plan-runner --db plan.db --session s1 --restore --export baseline --out exports
//!   plan-runner --db plan.db --ipc-mode

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use workforce_core::{
    analysis::{self, Insight, YearTotals},
    clock::{SystemClock, UuidGenerator},
    command::PlanCommand,
    config::PlanConfig,
    engine::PlanEngine,
    event::PlanEvent,
    population,
    state::LifecyclePhase,
    store::PlanStore,
    types::Seq,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    GetState,
    Command { command: PlanCommand },
    Export { scenario_id: String, out: String },
    Quit,
}

#[derive(serde::Serialize)]
struct ScenarioSummary {
    id:           String,
    name:         String,
    description:  String,
    is_temporary: bool,
}

#[derive(serde::Serialize)]
struct UiState {
    session_id: String,
    seq:        Seq,
    phase:      LifecyclePhase,
    active:     String,
    scenarios:  Vec<ScenarioSummary>,
    totals:     Vec<YearTotals>,
    insights:   Vec<Insight>,
    events:     Vec<PlanEvent>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let restore = args.iter().any(|a| a == "--restore");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let session_id = flag_value(&args, "--session")
        .map(str::to_string)
        .unwrap_or_else(|| format!("session-{}", chrono::Utc::now().timestamp()));

    let config = match flag_value(&args, "--config") {
        Some(path) => PlanConfig::load(path)?,
        None => PlanConfig::default(),
    };

    if !ipc_mode {
        println!("Workforce planning: plan-runner");
        println!("  db:       {db}");
        println!("  session:  {session_id}");
        println!();
    }

    let store = PlanStore::open(db).with_context(|| format!("opening {db}"))?;
    store.migrate()?;

    let mut engine = if restore {
        PlanEngine::restore(
            session_id,
            store,
            config,
            Box::new(SystemClock),
            Box::new(UuidGenerator),
        )?
    } else {
        PlanEngine::new(session_id, store, config)?
    };

    if let Some(path) = flag_value(&args, "--population-csv") {
        let file = fs::File::open(path).with_context(|| format!("opening {path}"))?;
        let rows = population::parse_population_csv(file)
            .with_context(|| format!("reading {path}"))?;
        engine.execute(&PlanCommand::ImportPopulation { rows })?;
    }

    if ipc_mode {
        return run_ipc_loop(&mut engine);
    }

    if let Some(scenario_id) = flag_value(&args, "--export") {
        let out = flag_value(&args, "--out").unwrap_or(".");
        let written = write_export(&engine, scenario_id, Path::new(out))?;
        println!("Exported {written} sheet(s) to {out}");
        println!();
    }

    print_summary(&engine)
}

fn run_ipc_loop(engine: &mut PlanEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match request {
            IpcRequest::Quit => break,
            IpcRequest::GetState => {
                let state = build_ui_state(engine, Vec::new());
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            IpcRequest::Command { command } => match engine.execute(&command) {
                Ok(events) => {
                    let state = build_ui_state(engine, events);
                    writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
                }
                Err(e) => {
                    log::warn!("{} rejected: {e}", command.name());
                    write_error(&mut stdout, &e.to_string())?;
                }
            },
            IpcRequest::Export { scenario_id, out } => {
                match write_export(engine, &scenario_id, Path::new(&out)) {
                    Ok(sheets) => {
                        let reply = serde_json::json!({ "exported": scenario_id, "sheets": sheets });
                        writeln!(stdout, "{reply}")?;
                    }
                    Err(e) => write_error(&mut stdout, &format!("{e:#}"))?,
                }
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{err_json}")?;
    stdout.flush()?;
    Ok(())
}

fn build_ui_state(engine: &PlanEngine, events: Vec<PlanEvent>) -> UiState {
    let state = engine.state();
    let projections = state.active_projections();
    UiState {
        session_id: engine.session_id().to_string(),
        seq:        engine.seq(),
        phase:      state.phase(),
        active:     state.active().id().to_string(),
        scenarios:  state
            .scenarios()
            .iter()
            .map(|s| ScenarioSummary {
                id:           s.id.clone(),
                name:         s.name.clone(),
                description:  s.description.clone(),
                is_temporary: s.is_temporary,
            })
            .collect(),
        totals:     analysis::totals(projections),
        insights:   analysis::insights(
            projections,
            &engine.config().occupation_names(),
            &engine.config().insights,
        ),
        events,
    }
}

/// Write every sheet of the export as `<out>/<file stem>/<sheet>.csv`.
fn write_export(engine: &PlanEngine, scenario_id: &str, out: &Path) -> Result<usize> {
    let workbook = engine.export(scenario_id)?;
    let dir = out.join(workbook.file_stem());
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    for sheet in &workbook.sheets {
        let path = dir.join(format!("{}.csv", sheet.name));
        fs::write(&path, sheet.to_csv()?).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(workbook.sheets.len())
}

fn print_summary(engine: &PlanEngine) -> Result<()> {
    let state = engine.state();
    let config = engine.config();

    println!("=== SESSION SUMMARY ===");
    println!("  session:    {}", engine.session_id());
    println!("  commands:   {}", engine.seq());
    println!("  phase:      {:?}", state.phase());
    println!("  scenarios:  {}", state.scenarios().len());
    for scenario in state.scenarios().iter() {
        println!("    {:<12} {}", scenario.id, scenario.name);
    }
    println!("  events:     {}", engine.events()?.len());

    println!();
    println!("=== OPENING POSITION ===");
    for position in analysis::opening_position(state.baseline(), config) {
        println!(
            "  {:<28} supply {:>6} | demand {:>6} | gap {:>6}",
            position.occupation,
            position.cell.supply(),
            position.cell.demand(),
            position.cell.gap()
        );
    }

    println!();
    println!("=== PROJECTED TOTALS ({}) ===", state.active().id());
    for row in analysis::totals(state.active_projections()) {
        println!(
            "  {} | supply {:>6} | demand {:>6} | gap {:>6}",
            row.year, row.supply, row.demand, row.gap
        );
    }

    let insights = analysis::insights(
        state.active_projections(),
        &config.occupation_names(),
        &config.insights,
    );
    if !insights.is_empty() {
        println!();
        println!("=== INSIGHTS ===");
        for insight in insights {
            println!("  [{:?}] {}", insight.kind, insight.message);
        }
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
