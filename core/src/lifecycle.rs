//! Scenario lifecycle transitions.
//!
//! Every function here is a pure reducer: it reads one `AppState` and
//! returns the next one together with the events describing the change.
//! The input state is never touched, so a transition that fails (or a
//! persist that fails afterwards) leaves the session exactly as it was.
//!
//! PHASES:
//!   Baseline ──edit──▶ BaselineDirty ──apply──▶ Working
//!   Working  ──edit──▶ WorkingDirty  ──apply──▶ Working
//!   any      ──create──▶ Scenario(id) ──edit──▶ ScenarioDirty(id)
//!   dirty    ──reset──▶ clean phase of the same scenario

use crate::{
    baseline,
    clock::{Clock, IdGenerator},
    command::PlanCommand,
    config::PlanConfig,
    error::{PlanError, PlanResult},
    event::PlanEvent,
    parameters::ParameterKind,
    population::PopulationRow,
    projection,
    propagation,
    scenario::{ActiveScenario, Scenario, ScenarioStore, UNNAMED_SCENARIO},
    state::{AppState, PendingChange},
    types::{Year, BASELINE_ID, WORKING_ID},
};
use im::OrdSet;

/// Attempts before giving up on a colliding generated id.
const MAX_ID_ATTEMPTS: usize = 16;

/// The outcome of one reducer call.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state:  AppState,
    pub events: Vec<PlanEvent>,
}

impl Transition {
    fn checked(state: AppState, events: Vec<PlanEvent>) -> PlanResult<Self> {
        state.check_invariants()?;
        Ok(Self { state, events })
    }
}

/// Everything a reducer may read besides the state itself.
pub struct Context<'a> {
    pub config: &'a PlanConfig,
    pub clock:  &'a dyn Clock,
    pub ids:    &'a dyn IdGenerator,
}

/// Dispatch a command to its reducer.
pub fn reduce(state: &AppState, command: &PlanCommand, ctx: &Context<'_>) -> PlanResult<Transition> {
    match command {
        PlanCommand::UpdateParameter { kind, year, category, value } => {
            update_parameter(state, *kind, *year, category, value)
        }
        PlanCommand::Apply => apply(state, ctx),
        PlanCommand::Reset => reset(state),
        PlanCommand::LoadBaseline => load_baseline(state),
        PlanCommand::CreateScenario { name, description } => {
            create_scenario(state, name, description, ctx)
        }
        PlanCommand::SelectScenario { id, confirm_discard } => {
            select_scenario(state, id, *confirm_discard)
        }
        PlanCommand::DeleteScenario { id } => delete_scenario(state, id),
        PlanCommand::ImportPopulation { rows } => import_population(state, rows, ctx.config),
    }
}

/// Record one grid edit against the reference store and mark the session
/// dirty. Nothing is projected until `apply`.
pub fn update_parameter(
    state: &AppState,
    kind: ParameterKind,
    year: Year,
    category: &str,
    raw_value: &str,
) -> PlanResult<Transition> {
    let value = propagation::parse_value(raw_value);
    let editing = propagation::update_parameter_value(
        &state.editing,
        state.reference_parameters(),
        kind,
        year,
        category,
        value,
    )?;

    let mut next = state.clone();
    next.editing = editing;
    next.dirty = true;
    next.pending = next.pending.update(PendingChange {
        kind,
        year,
        category: category.to_string(),
    });

    Transition::checked(
        next,
        vec![PlanEvent::ParameterUpdated {
            kind,
            year,
            category: category.to_string(),
            value,
        }],
    )
}

/// Project the edited parameters and store them. From the baseline this
/// creates (or replaces) the working scenario; otherwise the active
/// scenario is overwritten in place.
pub fn apply(state: &AppState, ctx: &Context<'_>) -> PlanResult<Transition> {
    if !state.dirty {
        return Err(PlanError::NothingToApply);
    }

    let projections = projection::project_with(&state.editing, ctx.config);
    let mut next = state.clone();

    let scenario = match &state.active {
        ActiveScenario::Baseline => {
            Scenario::working(state.editing.clone(), projections, ctx.clock.now())
        }
        active => {
            let existing = state
                .scenarios
                .get(active.id())
                .ok_or_else(|| PlanError::ScenarioNotFound { id: active.id().to_string() })?;
            Scenario {
                parameters: state.editing.clone(),
                projections,
                ..existing.clone()
            }
        }
    };

    let scenario_id = scenario.id.clone();
    next.active = ActiveScenario::from_id(&scenario_id);
    next.scenarios = state.scenarios.with_upserted(scenario);
    next.dirty = false;
    next.pending = OrdSet::new();

    log::info!("applied {} edit(s) to '{scenario_id}'", state.pending.len());
    Transition::checked(next, vec![PlanEvent::ChangesApplied { scenario_id }])
}

/// Drop unapplied edits. Reloads the active saved scenario, or returns to
/// the baseline (discarding the working scenario) otherwise.
pub fn reset(state: &AppState) -> PlanResult<Transition> {
    let mut next = state.clone();
    let mut events = Vec::new();

    match &state.active {
        ActiveScenario::Saved(id) => match state.scenarios.get(id) {
            Some(scenario) => next.editing = scenario.parameters.clone(),
            None => {
                events.push(notice(format!("Scenario '{id}' no longer exists; showing baseline")));
                return_to_baseline(&mut next, &mut events);
            }
        },
        ActiveScenario::Working | ActiveScenario::Baseline => {
            return_to_baseline(&mut next, &mut events);
        }
    }

    next.dirty = false;
    next.pending = OrdSet::new();
    events.push(PlanEvent::EditsDiscarded {
        reloaded_from: next.active.id().to_string(),
    });
    Transition::checked(next, events)
}

/// Go back to the untouched baseline from anywhere.
pub fn load_baseline(state: &AppState) -> PlanResult<Transition> {
    let mut next = state.clone();
    let mut events = Vec::new();
    return_to_baseline(&mut next, &mut events);
    next.dirty = false;
    next.pending = OrdSet::new();
    events.push(PlanEvent::BaselineLoaded);
    Transition::checked(next, events)
}

/// Save the current editing parameters as a new named scenario and make
/// it active. The working scenario, if any, is consumed.
pub fn create_scenario(
    state: &AppState,
    name: &str,
    description: &str,
    ctx: &Context<'_>,
) -> PlanResult<Transition> {
    let mut events = Vec::new();
    let base_store = if state.scenarios.contains(WORKING_ID) {
        events.push(PlanEvent::WorkingDiscarded);
        state.scenarios.without(WORKING_ID)
    } else {
        state.scenarios.clone()
    };

    let trimmed = name.trim();
    let name = base_store.unique_name(if trimmed.is_empty() { UNNAMED_SCENARIO } else { trimmed });
    let id = fresh_id(&base_store, ctx.ids)?;

    let scenario = Scenario {
        id: id.clone(),
        name: name.clone(),
        description: description.trim().to_string(),
        parameters: state.editing.clone(),
        projections: projection::project_with(&state.editing, ctx.config),
        created_at: ctx.clock.now(),
        is_temporary: false,
    };

    let mut next = state.clone();
    next.scenarios = base_store.with_upserted(scenario);
    next.active = ActiveScenario::Saved(id.clone());
    next.dirty = false;
    next.pending = OrdSet::new();

    log::info!("created scenario '{name}' ({id})");
    events.push(PlanEvent::ScenarioCreated { scenario_id: id, name });
    Transition::checked(next, events)
}

/// Switch the active scenario. Refuses to drop unapplied edits unless
/// `confirm_discard` is set. An unknown id falls back to the baseline.
pub fn select_scenario(state: &AppState, id: &str, confirm_discard: bool) -> PlanResult<Transition> {
    if state.dirty && !confirm_discard {
        return Err(PlanError::UnsavedChanges { target: id.to_string() });
    }

    let mut next = state.clone();
    let mut events = Vec::new();

    match ActiveScenario::from_id(id) {
        ActiveScenario::Baseline => return_to_baseline(&mut next, &mut events),
        target => match state.scenarios.get(target.id()) {
            Some(scenario) => {
                if target != ActiveScenario::Working && state.scenarios.contains(WORKING_ID) {
                    next.scenarios = state.scenarios.without(WORKING_ID);
                    events.push(PlanEvent::WorkingDiscarded);
                }
                next.editing = scenario.parameters.clone();
                next.active = target;
            }
            None => {
                log::warn!("select: scenario '{id}' not found, falling back to baseline");
                events.push(notice(format!("Scenario '{id}' not found; showing baseline")));
                return_to_baseline(&mut next, &mut events);
            }
        },
    }

    next.dirty = false;
    next.pending = OrdSet::new();
    events.push(PlanEvent::ScenarioSelected {
        scenario_id: next.active.id().to_string(),
    });
    Transition::checked(next, events)
}

/// Remove a scenario. Deleting the active one returns to the baseline;
/// deleting an unknown id changes nothing and reports a notice.
pub fn delete_scenario(state: &AppState, id: &str) -> PlanResult<Transition> {
    if id == BASELINE_ID {
        return Err(PlanError::BaselineIsImmutable);
    }
    if !state.scenarios.contains(id) {
        log::warn!("delete: scenario '{id}' not found");
        return Transition::checked(
            state.clone(),
            vec![notice(format!("Scenario '{id}' not found; nothing deleted"))],
        );
    }

    let mut next = state.clone();
    next.scenarios = state.scenarios.without(id);
    if state.active.id() == id {
        next.active = ActiveScenario::Baseline;
        next.editing = state.baseline.clone();
        next.dirty = false;
        next.pending = OrdSet::new();
    }

    Transition::checked(next, vec![PlanEvent::ScenarioDeleted { scenario_id: id.to_string() }])
}

/// Replace the global baseline with one derived from population rows.
/// Saved scenarios keep their own parameters; the working scenario and
/// any unapplied edits are dropped.
pub fn import_population(
    state: &AppState,
    rows: &[PopulationRow],
    config: &PlanConfig,
) -> PlanResult<Transition> {
    let baseline = baseline::generate_baseline_from_population(rows, config)?;
    let baseline_projections = projection::project_with(&baseline, config);

    let mut events = vec![PlanEvent::BaselineImported { rows: rows.len() }];
    let mut next = state.clone();
    next.baseline = baseline;
    next.baseline_projections = baseline_projections;
    return_to_baseline(&mut next, &mut events);
    next.dirty = false;
    next.pending = OrdSet::new();

    log::info!("imported population baseline from {} row(s)", rows.len());
    Transition::checked(next, events)
}

/// Point `next` at the baseline and drop the working scenario.
fn return_to_baseline(next: &mut AppState, events: &mut Vec<PlanEvent>) {
    if next.scenarios.contains(WORKING_ID) {
        next.scenarios = next.scenarios.without(WORKING_ID);
        events.push(PlanEvent::WorkingDiscarded);
    }
    next.active = ActiveScenario::Baseline;
    next.editing = next.baseline.clone();
}

fn fresh_id(store: &ScenarioStore, ids: &dyn IdGenerator) -> PlanResult<String> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = ids.next_id();
        if id != BASELINE_ID && id != WORKING_ID && !store.contains(&id) {
            return Ok(id);
        }
        log::debug!("generated scenario id '{id}' is taken, retrying");
    }
    Err(PlanError::InvariantViolation(
        "could not generate a free scenario id".into(),
    ))
}

fn notice(message: String) -> PlanEvent {
    PlanEvent::Notice { message }
}

