//! Spreadsheet export of one scenario (or the baseline).
//!
//! The workbook is a plain in-memory value: named sheets of rows. Each
//! sheet serialises to CSV on its own; writing files is the caller's job.
//!
//! SHEETS, in order:
//!   Summary                 scenario facts, then yearly totals
//!   Workforce Projections   year × occupation supply/demand/gap
//!   <workforce kind label>  one year × occupation matrix per kind
//!   Demand Parameters       year, "<kind> - <category>", value

use crate::{
    analysis,
    config::PlanConfig,
    error::{PlanError, PlanResult},
    parameters::{ParameterKind, ParameterStore},
    projection::ProjectionTable,
    state::AppState,
    types::{BASELINE_ID, FIRST_YEAR, LAST_YEAR},
};
use chrono::NaiveDate;
use std::fmt;

pub const BASELINE_NAME: &str = "Baseline";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Number(f64),
    Empty,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s)   => f.write_str(s),
            Cell::Int(n)    => write!(f, "{n}"),
            Cell::Number(x) => write!(f, "{x}"),
            Cell::Empty     => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Number(x)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    fn push<I, C>(&mut self, row: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Rows may have different lengths.
    pub fn to_csv(&self) -> PlanResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| PlanError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub scenario_name: String,
    pub export_date:   NaiveDate,
    pub sheets:        Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// `<scenario name, non-alphanumerics as _>_Export_<YYYY-MM-DD>`.
    pub fn file_stem(&self) -> String {
        let name: String = self
            .scenario_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{name}_Export_{}", self.export_date.format("%Y-%m-%d"))
    }
}

/// Build the workbook for `scenario_id`. Reads only; `baseline` exports
/// the global baseline.
pub fn build_workbook(
    state: &AppState,
    config: &PlanConfig,
    scenario_id: &str,
    export_date: NaiveDate,
) -> PlanResult<Workbook> {
    let (name, parameters, projections) = if scenario_id == BASELINE_ID {
        (BASELINE_NAME, state.baseline(), state.baseline_projections())
    } else {
        let scenario = state
            .scenarios()
            .get(scenario_id)
            .ok_or_else(|| PlanError::ScenarioNotFound { id: scenario_id.to_string() })?;
        (scenario.name.as_str(), &scenario.parameters, &scenario.projections)
    };

    let occupations = config.occupation_names();
    let mut sheets = vec![
        summary_sheet(name, export_date, &occupations, projections),
        projections_sheet(&occupations, projections),
    ];
    sheets.extend(
        ParameterKind::WORKFORCE
            .iter()
            .map(|kind| workforce_sheet(*kind, &occupations, parameters)),
    );
    sheets.push(demand_sheet(parameters));

    log::debug!("export '{name}': {} sheets", sheets.len());
    Ok(Workbook {
        scenario_name: name.to_string(),
        export_date,
        sheets,
    })
}

fn summary_sheet(
    name: &str,
    export_date: NaiveDate,
    occupations: &[String],
    projections: &ProjectionTable,
) -> Sheet {
    let mut sheet = Sheet::new("Summary");
    sheet.push(["Scenario Name", name]);
    sheet.push(vec![
        Cell::from("Export Date"),
        Cell::Text(export_date.format("%Y-%m-%d").to_string()),
    ]);
    sheet.push(vec![
        Cell::from("Years Covered"),
        Cell::Text(format!("{FIRST_YEAR}-{LAST_YEAR}")),
    ]);
    sheet.push(vec![Cell::from("Occupations"), Cell::Text(occupations.join(", "))]);
    sheet.rows.push(vec![Cell::Empty]);
    sheet.push(["Summary Statistics"]);
    sheet.push(["Year", "Total Supply", "Total Demand", "Total Gap"]);

    for row in analysis::totals(projections) {
        sheet.push([i64::from(row.year), row.supply, row.demand, row.gap]);
    }
    sheet
}

fn projections_sheet(occupations: &[String], projections: &ProjectionTable) -> Sheet {
    let mut sheet = Sheet::new("Workforce Projections");
    sheet.push(["Year", "Occupation", "Supply", "Demand", "Gap"]);
    for year in projections.years() {
        for occ in occupations {
            let (supply, demand, gap) = projections
                .get(year, occ)
                .map(|c| (c.supply(), c.demand(), c.gap()))
                .unwrap_or((0, 0, 0));
            sheet.push(vec![
                Cell::Int(i64::from(year)),
                Cell::Text(occ.clone()),
                Cell::Int(supply),
                Cell::Int(demand),
                Cell::Int(gap),
            ]);
        }
    }
    sheet
}

fn workforce_sheet(kind: ParameterKind, occupations: &[String], parameters: &ParameterStore) -> Sheet {
    let mut sheet = Sheet::new(kind.label());
    sheet.push(std::iter::once("Year".to_string()).chain(occupations.iter().cloned()));
    for year in parameters.years(kind) {
        let mut row = vec![Cell::Int(i64::from(year))];
        row.extend(
            occupations
                .iter()
                .map(|occ| Cell::Number(parameters.get(kind, year, occ).unwrap_or(0.0))),
        );
        sheet.rows.push(row);
    }
    sheet
}

fn demand_sheet(parameters: &ParameterStore) -> Sheet {
    let mut sheet = Sheet::new("Demand Parameters");
    sheet.push(["Year", "Parameter", "Value"]);
    for kind in ParameterKind::DEMAND {
        for year in parameters.years(kind) {
            for category in parameters.categories(kind, year) {
                let value = parameters.get(kind, year, category).unwrap_or(0.0);
                sheet.push(vec![
                    Cell::Int(i64::from(year)),
                    Cell::Text(format!("{kind} - {category}")),
                    Cell::Number(value),
                ]);
            }
        }
    }
    sheet
}
