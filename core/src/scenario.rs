//! Scenarios and the collection that owns them.
//!
//! The baseline is never an entry here; `ActiveScenario::Baseline` always
//! resolves to the global baseline store. At most one entry carries the
//! reserved `working` id.

use crate::{
    parameters::ParameterStore,
    projection::ProjectionTable,
    types::{ScenarioId, BASELINE_ID, WORKING_ID},
};
use chrono::{DateTime, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};

pub const WORKING_NAME: &str = "Working Changes";
pub const WORKING_DESCRIPTION: &str = "Applied parameter changes - save as scenario to keep";
pub const UNNAMED_SCENARIO: &str = "Unnamed Scenario";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub description: String,
    pub parameters: ParameterStore,
    pub projections: ProjectionTable,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_temporary: bool,
}

impl Scenario {
    pub fn working(
        parameters: ParameterStore,
        projections: ProjectionTable,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WORKING_ID.to_string(),
            name: WORKING_NAME.to_string(),
            description: WORKING_DESCRIPTION.to_string(),
            parameters,
            projections,
            created_at,
            is_temporary: true,
        }
    }
}

/// Which store the edit session is working against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActiveScenario {
    Baseline,
    Working,
    Saved(ScenarioId),
}

impl ActiveScenario {
    pub fn from_id(id: &str) -> Self {
        match id {
            BASELINE_ID => Self::Baseline,
            WORKING_ID  => Self::Working,
            other       => Self::Saved(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Baseline  => BASELINE_ID,
            Self::Working   => WORKING_ID,
            Self::Saved(id) => id,
        }
    }
}

/// Scenarios in creation order. Every method that changes the collection
/// returns a new one; the receiver is left as it was.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioStore {
    entries: Vector<Scenario>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> + '_ {
        self.entries.iter()
    }

    /// Saved scenarios only, without the working entry.
    pub fn saved(&self) -> impl Iterator<Item = &Scenario> + '_ {
        self.entries.iter().filter(|s| s.id != WORKING_ID)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the entry with the same id in place, or append.
    #[must_use]
    pub fn with_upserted(&self, scenario: Scenario) -> Self {
        let mut entries = self.entries.clone();
        match entries.iter().position(|s| s.id == scenario.id) {
            Some(index) => {
                entries.set(index, scenario);
            }
            None => entries.push_back(scenario),
        }
        Self { entries }
    }

    #[must_use]
    pub fn without(&self, id: &str) -> Self {
        Self {
            entries: self.entries.iter().filter(|s| s.id != id).cloned().collect(),
        }
    }

    /// `name` if free, otherwise `name (2)`, `name (3)`, ...
    pub fn unique_name(&self, name: &str) -> String {
        let taken = |candidate: &str| self.entries.iter().any(|s| s.name == candidate);
        if !taken(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{name} ({n})"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.to_string())
    }
}
