use crate::types::{ScenarioId, Year};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Population CSV is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// `row` is the line in the CSV file, the header being line 1.
    #[error("Population CSV line {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("Population data has no rows for base year {year}")]
    MissingBaseYear { year: Year },

    #[error("Year {year} is outside the projection horizon")]
    YearOutOfRange { year: Year },

    #[error("Scenario '{id}' not found")]
    ScenarioNotFound { id: ScenarioId },

    #[error("No pending edits to apply")]
    NothingToApply,

    #[error("Unapplied edits would be discarded; confirm before switching to '{target}'")]
    UnsavedChanges { target: ScenarioId },

    #[error("The baseline cannot be modified or deleted")]
    BaselineIsImmutable,

    #[error("State invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;
