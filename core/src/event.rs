//! Lifecycle events, the record of every committed transition.
//!
//! RULE: Every transition reports what it did as events.
//! Variants are appended, never removed or reordered.

use crate::{
    parameters::ParameterKind,
    types::{CategoryKey, ScenarioId, Seq, SessionId, Year},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    // ── Session ────────────────────────────────────
    SessionStarted {
        session_id: SessionId,
    },

    // ── Editing ────────────────────────────────────
    ParameterUpdated {
        kind: ParameterKind,
        year: Year,
        category: CategoryKey,
        value: f64,
    },
    EditsDiscarded {
        reloaded_from: ScenarioId,
    },

    // ── Scenario lifecycle ─────────────────────────
    ChangesApplied {
        scenario_id: ScenarioId,
    },
    ScenarioCreated {
        scenario_id: ScenarioId,
        name: String,
    },
    ScenarioSelected {
        scenario_id: ScenarioId,
    },
    ScenarioDeleted {
        scenario_id: ScenarioId,
    },
    WorkingDiscarded,
    BaselineLoaded,

    // ── Data import ────────────────────────────────
    BaselineImported {
        rows: usize,
    },

    // ── Recovered failures ─────────────────────────
    /// A non-fatal problem the caller should show the user.
    Notice {
        message: String,
    },
}

impl PlanEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. }   => "session_started",
            Self::ParameterUpdated { .. } => "parameter_updated",
            Self::EditsDiscarded { .. }   => "edits_discarded",
            Self::ChangesApplied { .. }   => "changes_applied",
            Self::ScenarioCreated { .. }  => "scenario_created",
            Self::ScenarioSelected { .. } => "scenario_selected",
            Self::ScenarioDeleted { .. }  => "scenario_deleted",
            Self::WorkingDiscarded        => "working_discarded",
            Self::BaselineLoaded          => "baseline_loaded",
            Self::BaselineImported { .. } => "baseline_imported",
            Self::Notice { .. }           => "notice",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub session_id: SessionId,
    pub seq: Seq,
    pub event_type: String,
    pub payload: String, // JSON-serialized PlanEvent
}
