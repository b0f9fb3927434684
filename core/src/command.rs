use crate::{
    parameters::ParameterKind,
    population::PopulationRow,
    types::{CategoryKey, ScenarioId, Year},
};
use serde::{Deserialize, Serialize};

/// All analyst-issued commands.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlanCommand {
    // ── Editing ───────────────────────────────────
    UpdateParameter {
        kind:     ParameterKind,
        year:     Year,
        category: CategoryKey,
        /// Raw grid input; unparseable text counts as 0.
        value:    String,
    },

    // ── Lifecycle ─────────────────────────────────
    Apply,
    Reset,
    LoadBaseline,
    CreateScenario {
        name:        String,
        #[serde(default)]
        description: String,
    },
    SelectScenario {
        id: ScenarioId,
        /// Must be true to switch away from unapplied edits.
        #[serde(default)]
        confirm_discard: bool,
    },
    DeleteScenario {
        id: ScenarioId,
    },

    // ── Data import ───────────────────────────────
    /// Rows must already be parsed; see `population::parse_population_csv`.
    ImportPopulation {
        rows: Vec<PopulationRow>,
    },
}

impl PlanCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateParameter { .. }  => "update_parameter",
            Self::Apply                   => "apply",
            Self::Reset                   => "reset",
            Self::LoadBaseline            => "load_baseline",
            Self::CreateScenario { .. }   => "create_scenario",
            Self::SelectScenario { .. }   => "select_scenario",
            Self::DeleteScenario { .. }   => "delete_scenario",
            Self::ImportPopulation { .. } => "import_population",
        }
    }
}
