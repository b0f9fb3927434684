//! Read-only views over projections and parameters for dashboards.
//!
//! Nothing here changes state; every function is a pure summary of the
//! tables passed in.

use crate::{
    config::{InsightThresholds, PlanConfig},
    parameters::{ParameterKind, ParameterStore},
    projection::{ProjectionCell, ProjectionTable},
    types::{Year, FIRST_YEAR},
};
use serde::{Deserialize, Serialize};

/// Weights applied to each inflow when charting its effect on supply.
const EDUCATIONAL_WEIGHT:    f64 = 0.8;
const INTERNATIONAL_WEIGHT:  f64 = 0.9;
const DOMESTIC_WEIGHT:       f64 = 0.85;
const RE_ENTRANT_WEIGHT:     f64 = 0.7;
/// Attrition is partly replaced within the system.
const ATTRITION_WEIGHT:      f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningPosition {
    pub occupation: String,
    pub cell:       ProjectionCell,
}

/// Base-year stock against reference demand, before any flows apply.
pub fn opening_position(parameters: &ParameterStore, config: &PlanConfig) -> Vec<OpeningPosition> {
    config
        .occupations
        .iter()
        .map(|occ| {
            let supply = parameters
                .get(ParameterKind::Supply, FIRST_YEAR, &occ.name)
                .unwrap_or(occ.base_supply);
            OpeningPosition {
                occupation: occ.name.clone(),
                cell:       ProjectionCell::from_raw(supply, occ.base_supply * config.demand_ratio),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Critical,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind:       InsightKind,
    pub occupation: String,
    pub message:    String,
}

/// Flag occupations whose average gap is high or whose gap widens fast.
pub fn insights(
    table: &ProjectionTable,
    occupations: &[String],
    thresholds: &InsightThresholds,
) -> Vec<Insight> {
    let years: Vec<Year> = table.years().collect();
    if years.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for occ in occupations {
        let gaps: Vec<i64> = years.iter().map(|y| gap_at(table, *y, occ)).collect();
        let average = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
        let trend = gaps.last().copied().unwrap_or(0) - gaps.first().copied().unwrap_or(0);

        if average > thresholds.critical_average_gap {
            found.push(Insight {
                kind:       InsightKind::Critical,
                occupation: occ.clone(),
                message:    format!(
                    "{occ} faces critical shortage with average gap of {} FTE",
                    average.round()
                ),
            });
        }
        if trend as f64 > thresholds.warning_gap_growth {
            found.push(Insight {
                kind:       InsightKind::Warning,
                occupation: occ.clone(),
                message:    format!("{occ} gap increasing rapidly - {trend} FTE growth over period"),
            });
        }
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearOverYear {
    pub previous:             i64,
    pub current:              i64,
    pub next:                 i64,
    pub change_from_previous: i64,
    pub change_to_next:       i64,
}

/// Gap around `year`. Years outside the table count as 0.
pub fn year_over_year(table: &ProjectionTable, occupation: &str, year: Year) -> YearOverYear {
    let previous = year.checked_sub(1).map_or(0, |y| gap_at(table, y, occupation));
    let current = gap_at(table, year, occupation);
    let next = year.checked_add(1).map_or(0, |y| gap_at(table, y, occupation));
    YearOverYear {
        previous,
        current,
        next,
        change_from_previous: current - previous,
        change_to_next:       next - current,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowImpact {
    pub occupation:             String,
    pub educational_inflow:     f64,
    pub international_migrants: f64,
    pub domestic_migrants:      f64,
    pub re_entrants:            f64,
    /// Negative: headcount lost.
    pub retirement:             f64,
    /// Negative: headcount lost.
    pub attrition:              f64,
}

/// Weighted inflows and outflows per occupation in `year`.
pub fn flow_impact(parameters: &ParameterStore, occupations: &[String], year: Year) -> Vec<FlowImpact> {
    occupations
        .iter()
        .map(|occ| {
            let value = |kind| parameters.lookup_or_default(kind, year, occ, 0.0);
            let supply = value(ParameterKind::Supply);
            FlowImpact {
                occupation:             occ.clone(),
                educational_inflow:     value(ParameterKind::EducationalInflow) * EDUCATIONAL_WEIGHT,
                international_migrants: value(ParameterKind::InternationalMigrants) * INTERNATIONAL_WEIGHT,
                domestic_migrants:      value(ParameterKind::DomesticMigrants) * DOMESTIC_WEIGHT,
                re_entrants:            value(ParameterKind::ReEntrants) * RE_ENTRANT_WEIGHT,
                retirement:             -value(ParameterKind::RetirementRate) * supply,
                attrition:              -value(ParameterKind::AttritionRate) * supply * ATTRITION_WEIGHT,
            }
        })
        .collect()
}

/// Percentage change of `current` against `reference`; `None` when the
/// reference is zero.
pub fn change_versus_reference(current: f64, reference: f64) -> Option<f64> {
    (reference != 0.0).then(|| (current - reference) / reference * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotals {
    pub year:   Year,
    pub supply: i64,
    pub demand: i64,
    pub gap:    i64,
}

/// All occupations summed, one row per year.
pub fn totals(table: &ProjectionTable) -> Vec<YearTotals> {
    table
        .years()
        .map(|year| {
            let (supply, demand) = table
                .year(year)
                .into_iter()
                .flat_map(|occs| occs.values())
                .fold((0i64, 0i64), |(s, d), cell| {
                    (s.saturating_add(cell.supply()), d.saturating_add(cell.demand()))
                });
            YearTotals {
                year,
                supply,
                demand,
                gap: demand.saturating_sub(supply),
            }
        })
        .collect()
}

fn gap_at(table: &ProjectionTable, year: Year, occupation: &str) -> i64 {
    table.get(year, occupation).map_or(0, |c| c.gap())
}
