//! Population CSV ingestion.
//!
//! Parsing is a pure step: it either returns every row or fails with the
//! first problem found. Nothing downstream runs until it has succeeded.

use crate::{
    error::{PlanError, PlanResult},
    types::{self, Year},
};
use serde::{Deserialize, Serialize};
use std::io::Read;

pub const REQUIRED_COLUMNS: [&str; 4] = ["Year", "Gender", "Age_Group", "Projected_Population"];
pub const GENDERS: [&str; 2] = ["Male", "Female"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRow {
    pub year: Year,
    pub gender: String,
    pub age_group: String,
    pub projected_population: f64,
}

impl PopulationRow {
    pub fn new(year: Year, gender: &str, age_group: &str, projected_population: f64) -> Self {
        Self {
            year,
            gender: gender.to_string(),
            age_group: age_group.to_string(),
            projected_population,
        }
    }
}

/// File line of the `index`-th data row; line 1 is the header.
pub fn csv_line(index: usize) -> usize {
    index + 2
}

/// Parse `Year,Gender,Age_Group,Projected_Population` rows.
/// Columns are matched by name; extra columns are ignored.
pub fn parse_population_csv<R: Read>(reader: R) -> PlanResult<Vec<PopulationRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| position(**c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PlanError::MissingColumns { missing });
    }

    // All four are present; checked just above.
    let idx = |name: &str| position(name).unwrap_or_default();
    let (year_idx, gender_idx, age_idx, pop_idx) = (
        idx("Year"),
        idx("Gender"),
        idx("Age_Group"),
        idx("Projected_Population"),
    );

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = csv_line(i);
        let record = record?;
        let field = |at: usize| record.get(at).unwrap_or("");

        let year: Year = field(year_idx).parse().map_err(|_| PlanError::InvalidRow {
            row: line,
            reason: format!("Year '{}' is not a year", field(year_idx)),
        })?;
        if !types::in_horizon(year) {
            return Err(PlanError::InvalidRow {
                row: line,
                reason: format!(
                    "Year {year} is outside {}-{}",
                    types::FIRST_YEAR,
                    types::LAST_YEAR
                ),
            });
        }

        let gender = field(gender_idx);
        if !GENDERS.contains(&gender) {
            return Err(PlanError::InvalidRow {
                row: line,
                reason: format!("Gender '{gender}' must be Male or Female"),
            });
        }

        let age_group = field(age_idx);
        if age_group.is_empty() {
            return Err(PlanError::InvalidRow {
                row: line,
                reason: "Age_Group is empty".to_string(),
            });
        }

        let projected_population: f64 = field(pop_idx)
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| PlanError::InvalidRow {
                row: line,
                reason: format!(
                    "Projected_Population '{}' is not a non-negative number",
                    field(pop_idx)
                ),
            })?;

        rows.push(PopulationRow::new(year, gender, age_group, projected_population));
    }

    log::debug!("parsed {} population rows", rows.len());
    Ok(rows)
}
