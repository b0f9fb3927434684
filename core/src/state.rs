//! The application state value.
//!
//! RULE: An `AppState` is never mutated after construction. Every
//! lifecycle transition builds a new one; the engine swaps it in only
//! after the transition has been persisted.

use crate::{
    config::PlanConfig,
    error::{PlanError, PlanResult},
    parameters::{ParameterKind, ParameterStore},
    projection::{self, ProjectionTable},
    propagation,
    scenario::{ActiveScenario, ScenarioStore},
    types::{CategoryKey, ScenarioId, Year, BASELINE_ID, WORKING_ID},
};
use im::OrdSet;
use serde::{Deserialize, Serialize};

/// One edited cell that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PendingChange {
    pub kind:     ParameterKind,
    pub year:     Year,
    pub category: CategoryKey,
}

/// Where the session is in the scenario lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "scenario_id", rename_all = "snake_case")]
pub enum LifecyclePhase {
    Baseline,
    BaselineDirty,
    Working,
    WorkingDirty,
    Scenario(ScenarioId),
    ScenarioDirty(ScenarioId),
}

impl LifecyclePhase {
    pub fn is_dirty(&self) -> bool {
        matches!(
            self,
            Self::BaselineDirty | Self::WorkingDirty | Self::ScenarioDirty(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub(crate) baseline:             ParameterStore,
    pub(crate) baseline_projections: ProjectionTable,
    pub(crate) scenarios:            ScenarioStore,
    pub(crate) active:               ActiveScenario,
    pub(crate) editing:              ParameterStore,
    pub(crate) dirty:                bool,
    pub(crate) pending:              OrdSet<PendingChange>,
}

impl AppState {
    /// Fresh session on top of `baseline`: nothing saved, nothing edited.
    pub fn new(baseline: ParameterStore, config: &PlanConfig) -> Self {
        let baseline_projections = projection::project_with(&baseline, config);
        Self {
            editing: baseline.clone(),
            baseline,
            baseline_projections,
            scenarios: ScenarioStore::new(),
            active: ActiveScenario::Baseline,
            dirty: false,
            pending: OrdSet::new(),
        }
    }

    pub fn baseline(&self) -> &ParameterStore {
        &self.baseline
    }

    pub fn baseline_projections(&self) -> &ProjectionTable {
        &self.baseline_projections
    }

    pub fn scenarios(&self) -> &ScenarioStore {
        &self.scenarios
    }

    pub fn active(&self) -> &ActiveScenario {
        &self.active
    }

    /// The parameters currently shown in the grid, edits included.
    pub fn editing(&self) -> &ParameterStore {
        &self.editing
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pending_changes(&self) -> impl Iterator<Item = &PendingChange> + '_ {
        self.pending.iter()
    }

    pub fn phase(&self) -> LifecyclePhase {
        match (&self.active, self.dirty) {
            (ActiveScenario::Baseline, false)  => LifecyclePhase::Baseline,
            (ActiveScenario::Baseline, true)   => LifecyclePhase::BaselineDirty,
            (ActiveScenario::Working, false)   => LifecyclePhase::Working,
            (ActiveScenario::Working, true)    => LifecyclePhase::WorkingDirty,
            (ActiveScenario::Saved(id), false) => LifecyclePhase::Scenario(id.clone()),
            (ActiveScenario::Saved(id), true)  => LifecyclePhase::ScenarioDirty(id.clone()),
        }
    }

    /// The store edits propagate against.
    pub fn reference_parameters(&self) -> &ParameterStore {
        propagation::resolve_baseline(&self.active, &self.scenarios, &self.baseline)
    }

    /// Stored projections for `id`; `baseline` maps to the baseline table.
    pub fn projections_for(&self, id: &str) -> Option<&ProjectionTable> {
        if id == BASELINE_ID {
            return Some(&self.baseline_projections);
        }
        self.scenarios.get(id).map(|s| &s.projections)
    }

    /// Projections of the active scenario as last applied.
    pub fn active_projections(&self) -> &ProjectionTable {
        self.projections_for(self.active.id())
            .unwrap_or(&self.baseline_projections)
    }

    /// Bring a snapshot up to date with durable rows written after it.
    /// Unapplied edits made after the snapshot cannot be recovered, so the
    /// editing store is reloaded from the active scenario.
    pub(crate) fn reconciled(
        mut self,
        baseline: Option<ParameterStore>,
        scenarios: ScenarioStore,
        active: ActiveScenario,
        config: &PlanConfig,
    ) -> Self {
        if let Some(baseline) = baseline {
            self.baseline_projections = projection::project_with(&baseline, config);
            self.baseline = baseline;
        }
        self.scenarios = scenarios;
        self.active = active;
        if self.active != ActiveScenario::Baseline && !self.scenarios.contains(self.active.id()) {
            log::warn!("restore: active scenario '{}' is gone, using baseline", self.active.id());
            self.active = ActiveScenario::Baseline;
        }
        self.editing = self.reference_parameters().clone();
        self.dirty = false;
        self.pending = OrdSet::new();
        self
    }

    /// Checked after every transition; a failing state is never committed.
    pub fn check_invariants(&self) -> PlanResult<()> {
        match &self.active {
            ActiveScenario::Baseline => {}
            other if !self.scenarios.contains(other.id()) => {
                return Err(PlanError::InvariantViolation(format!(
                    "active scenario '{}' is not in the store",
                    other.id()
                )));
            }
            _ => {}
        }

        if self.scenarios.contains(BASELINE_ID) {
            return Err(PlanError::InvariantViolation(
                "baseline stored as a scenario".into(),
            ));
        }

        let working = self.scenarios.iter().filter(|s| s.id == WORKING_ID).count();
        if working > 1 {
            return Err(PlanError::InvariantViolation(format!(
                "{working} working scenarios"
            )));
        }

        let mut ids: Vec<&str> = self.scenarios.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.scenarios.len() {
            return Err(PlanError::InvariantViolation("duplicate scenario ids".into()));
        }

        if !self.dirty && !self.pending.is_empty() {
            return Err(PlanError::InvariantViolation(
                "pending changes on a clean state".into(),
            ));
        }
        Ok(())
    }
}
