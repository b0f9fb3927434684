//! Single-parameter edits and their forward propagation.
//!
//! An edit at year Y never touches years before Y. How it reaches later
//! years depends on the kind:
//!
//!   supply                → later supply scaled by new / reference
//!   retirement, attrition → rate copied forward
//!   inflow kinds          → one-year delta added to every later supply
//!   demand drivers        → value copied forward
//!
//! "Reference" is the active scenario's saved parameters (or the global
//! baseline), never the in-progress values of other edits.

use crate::{
    error::{PlanError, PlanResult},
    parameters::{ParameterKind, ParameterStore},
    scenario::{ActiveScenario, ScenarioStore},
    types::{self, Year, LAST_YEAR},
};

/// Parse raw grid input. Anything unparseable or non-finite becomes 0.
pub fn parse_value(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            log::warn!("parameter input '{raw}' is not a number, using 0");
            0.0
        }
    }
}

/// The store edits are measured against: the active saved scenario's
/// parameters, or the global baseline when nothing saved is active.
pub fn resolve_baseline<'a>(
    active: &ActiveScenario,
    scenarios: &'a ScenarioStore,
    global_baseline: &'a ParameterStore,
) -> &'a ParameterStore {
    match active {
        ActiveScenario::Baseline => global_baseline,
        other => scenarios
            .get(other.id())
            .map(|s| &s.parameters)
            .unwrap_or(global_baseline),
    }
}

/// Apply one edit to `store` and propagate it forward. Returns a new store;
/// `store` and `reference` are never modified.
pub fn update_parameter(
    store: &ParameterStore,
    reference: &ParameterStore,
    kind: ParameterKind,
    year: Year,
    category: &str,
    raw_value: &str,
) -> PlanResult<ParameterStore> {
    update_parameter_value(store, reference, kind, year, category, parse_value(raw_value))
}

/// Same as `update_parameter`, for an already-parsed value.
pub fn update_parameter_value(
    store: &ParameterStore,
    reference: &ParameterStore,
    kind: ParameterKind,
    year: Year,
    category: &str,
    value: f64,
) -> PlanResult<ParameterStore> {
    if !types::in_horizon(year) {
        return Err(PlanError::YearOutOfRange { year });
    }

    let mut next = store.with_value(kind, year, category, value);
    let later = (year + 1)..=LAST_YEAR;

    match kind {
        ParameterKind::Supply => {
            let current = reference.lookup_or_default(ParameterKind::Supply, year, category, 0.0);
            if current == 0.0 {
                log::debug!("supply edit for {category} {year}: zero reference, no propagation");
                return Ok(next);
            }
            let ratio = value / current;
            for y in later {
                if let Some(future) = reference.get(ParameterKind::Supply, y, category) {
                    next.set(ParameterKind::Supply, y, category, (future * ratio).round());
                }
            }
        }

        ParameterKind::RetirementRate
        | ParameterKind::AttritionRate
        | ParameterKind::PopulationGrowth
        | ParameterKind::HealthStatusChange
        | ParameterKind::ServiceUtilization => {
            for y in later {
                next.set(kind, y, category, value);
            }
        }

        ParameterKind::EducationalInflow
        | ParameterKind::InternationalMigrants
        | ParameterKind::DomesticMigrants
        | ParameterKind::ReEntrants => {
            let delta = value - reference.lookup_or_default(kind, year, category, 0.0);
            for y in later {
                if let Some(future) = reference.get(ParameterKind::Supply, y, category) {
                    next.set(ParameterKind::Supply, y, category, future + delta);
                }
            }
        }
    }

    log::debug!("edit {kind} {year} {category} = {value}");
    Ok(next)
}
