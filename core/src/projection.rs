//! Projection engine. Parameters in, supply/demand/gap table out.
//!
//! ORDER MATTERS: years are walked 2024 → 2034 per occupation because each
//! year's supply starts from the previous year's computed supply. The
//! opening stock for the first year is the base-year supply parameter.
//!
//! A cell that cannot be computed (NaN, infinities, figures beyond
//! `MAX_FTE`) is replaced by the configured fallback cell; the rest of the
//! table is unaffected.

use crate::{
    config::{OccupationProfile, PlanConfig},
    parameters::{ParameterKind, ParameterStore},
    rng::ProjectionRng,
    types::{self, CategoryKey, Year, FIRST_YEAR},
};
use im::OrdMap;
use serde::{Deserialize, Serialize};

/// Largest supply or demand a cell can hold. Sums over every cell of a
/// table stay far from `i64::MAX`.
pub const MAX_FTE: i64 = 1_000_000_000_000_000;

/// One occupation in one year. `gap == demand - supply` by construction:
/// there is no way to build or deserialize a cell that breaks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CellRecord", into = "CellRecord")]
pub struct ProjectionCell {
    supply: i64,
    demand: i64,
}

impl ProjectionCell {
    /// Both figures are clamped to `0..=MAX_FTE`.
    pub fn new(supply: i64, demand: i64) -> Self {
        Self {
            supply: supply.clamp(0, MAX_FTE),
            demand: demand.clamp(0, MAX_FTE),
        }
    }

    /// Round and clamp raw figures to whole, non-negative FTE.
    pub fn from_raw(supply: f64, demand: f64) -> Self {
        let whole = |v: f64| v.clamp(0.0, MAX_FTE as f64).round() as i64;
        Self::new(whole(supply), whole(demand))
    }

    pub fn supply(&self) -> i64 {
        self.supply
    }

    pub fn demand(&self) -> i64 {
        self.demand
    }

    /// Positive = shortage.
    pub fn gap(&self) -> i64 {
        self.demand - self.supply
    }
}

/// Wire shape of a cell. `gap` is written for readers but ignored on input.
#[derive(Serialize, Deserialize)]
struct CellRecord {
    supply: i64,
    demand: i64,
    #[serde(default)]
    gap: i64,
}

impl From<CellRecord> for ProjectionCell {
    fn from(record: CellRecord) -> Self {
        Self::new(record.supply, record.demand)
    }
}

impl From<ProjectionCell> for CellRecord {
    fn from(cell: ProjectionCell) -> Self {
        Self {
            supply: cell.supply,
            demand: cell.demand,
            gap: cell.gap(),
        }
    }
}

/// year → occupation → cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionTable {
    years: OrdMap<Year, OrdMap<CategoryKey, ProjectionCell>>,
}

impl ProjectionTable {
    pub fn get(&self, year: Year, occupation: &str) -> Option<&ProjectionCell> {
        self.years.get(&year)?.get(occupation)
    }

    pub fn year(&self, year: Year) -> Option<&OrdMap<CategoryKey, ProjectionCell>> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.years.keys().copied()
    }

    /// Every cell in (year, occupation) order.
    pub fn cells(&self) -> impl Iterator<Item = (Year, &str, &ProjectionCell)> + '_ {
        self.years.iter().flat_map(|(year, occs)| {
            occs.iter().map(move |(occ, cell)| (*year, occ.as_str(), cell))
        })
    }

    pub fn len(&self) -> usize {
        self.years.values().map(|occs| occs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, year: Year, occupation: &str, cell: ProjectionCell) {
        self.years
            .entry(year)
            .or_insert_with(OrdMap::new)
            .insert(occupation.to_string(), cell);
    }
}

/// Project with the built-in model constants.
pub fn project(parameters: &ParameterStore) -> ProjectionTable {
    project_with(parameters, &PlanConfig::default())
}

/// Pure and deterministic: the same parameters always give the same table.
pub fn project_with(parameters: &ParameterStore, config: &PlanConfig) -> ProjectionTable {
    let mut table = ProjectionTable::default();

    for occ in &config.occupations {
        let name = occ.name.as_str();
        let mut previous = parameters
            .get(ParameterKind::Supply, FIRST_YEAR, name)
            .filter(|v| v.is_finite())
            .unwrap_or(occ.base_supply);

        for year in types::years() {
            let supply = next_supply(parameters, name, year, previous);
            let demand = demand_for(parameters, occ, year, config);

            match (supply, demand) {
                (Some(supply), Some(demand)) => {
                    previous = supply;
                    table.insert(year, name, ProjectionCell::from_raw(supply, demand));
                }
                _ => {
                    log::warn!("projection: {name} {year} not computable, using fallback cell");
                    previous = config.fallback_cell.supply() as f64;
                    table.insert(year, name, config.fallback_cell);
                }
            }
        }
    }

    table
}

/// `max(0, previous + inflows - previous * (retirement + attrition))`.
fn next_supply(parameters: &ParameterStore, occupation: &str, year: Year, previous: f64) -> Option<f64> {
    let inflows: f64 = ParameterKind::INFLOWS
        .iter()
        .map(|kind| parameters.lookup_or_default(*kind, year, occupation, 0.0))
        .sum();
    let exit_rate = parameters.lookup_or_default(ParameterKind::RetirementRate, year, occupation, 0.0)
        + parameters.lookup_or_default(ParameterKind::AttritionRate, year, occupation, 0.0);

    let supply = (previous + inflows - previous * exit_rate).max(0.0);
    representable(supply).then_some(supply)
}

/// Reference demand (base supply × demand ratio) scaled by secular growth
/// and, after the base year, by each demand driver with data that year.
fn demand_for(
    parameters: &ParameterStore,
    occupation: &OccupationProfile,
    year: Year,
    config: &PlanConfig,
) -> Option<f64> {
    let reference = occupation.base_supply * config.demand_ratio;
    let mut multiplier = 1.0 + f64::from(year - FIRST_YEAR) * config.secular_demand_growth;

    if year > FIRST_YEAR {
        for kind in ParameterKind::DEMAND {
            if let Some(avg) = parameters.average(kind, year) {
                multiplier *= 1.0 + avg;
            }
        }
    }

    let demand = (reference * multiplier).max(0.0);
    representable(demand).then_some(demand)
}

fn representable(value: f64) -> bool {
    value.is_finite() && value <= MAX_FTE as f64
}

/// Display-only projection used before any parameters exist: built-in
/// base supply with ±5% seeded jitter and linear 2% growth. Never used
/// once a parameter store is available.
pub fn project_unparameterized(config: &PlanConfig, rng: &mut ProjectionRng) -> ProjectionTable {
    let mut table = ProjectionTable::default();

    for year in types::years() {
        let multiplier = 1.0 + f64::from(year - FIRST_YEAR) * config.secular_demand_growth;
        for occ in &config.occupations {
            let supply = occ.base_supply * multiplier * rng.jitter(0.95, 0.1);
            let demand = occ.base_supply * config.demand_ratio * multiplier;
            table.insert(year, &occ.name, ProjectionCell::from_raw(supply, demand));
        }
    }

    table
}
