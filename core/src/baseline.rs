//! Baseline generation: the immutable starting parameter store.
//!
//! Two sources:
//!   - built-in constants from `PlanConfig` (deterministic, no randomness)
//!   - an imported population projection (see `population.rs`)
//!
//! Both produce a store with every kind populated for every year of the
//! horizon and every configured category.

use crate::{
    config::{CategoryRate, PlanConfig},
    error::{PlanError, PlanResult},
    parameters::{ParameterKind, ParameterStore},
    population::{self, PopulationRow},
    types::{self, Year, FIRST_YEAR},
};
use std::collections::BTreeMap;

/// Build the baseline from built-in per-occupation constants.
/// Supply grows linearly by `annual_supply_growth` of the base each year.
pub fn generate_baseline(config: &PlanConfig) -> ParameterStore {
    let mut params = ParameterStore::new();

    for year in types::years() {
        let elapsed = f64::from(year - FIRST_YEAR);

        for occ in &config.occupations {
            let name = occ.name.as_str();
            let supply = occ.base_supply * (1.0 + elapsed * config.annual_supply_growth);
            params.set(ParameterKind::Supply, year, name, supply);
            params.set(ParameterKind::EducationalInflow, year, name, occ.educational_inflow);
            params.set(ParameterKind::InternationalMigrants, year, name, occ.international_migrants);
            params.set(ParameterKind::DomesticMigrants, year, name, occ.domestic_migrants);
            params.set(ParameterKind::ReEntrants, year, name, occ.re_entrants);
            params.set(ParameterKind::RetirementRate, year, name, occ.retirement_rate);
            params.set(ParameterKind::AttritionRate, year, name, occ.attrition_rate);
        }

        set_rates(&mut params, ParameterKind::PopulationGrowth, year, &config.age_groups, 1.0);
        set_rates(&mut params, ParameterKind::HealthStatusChange, year, &config.health_status, 1.0);
        set_rates(&mut params, ParameterKind::ServiceUtilization, year, &config.service_utilization, 1.0);
    }

    params
}

/// Build a baseline from projected population counts.
///
/// Growth per age group is year-over-year change of the summed population
/// (both genders). The base year, and any year whose prior total is zero or
/// absent, uses `default_population_growth`. Workforce supply follows fixed
/// per-1000 ratios of the base-year population, compounded by the average
/// age-group growth. Health-status and utilization drivers are the built-in
/// defaults scaled by (average growth / default growth).
///
/// Validates everything before building; the caller's baseline is only
/// replaced by a successful result.
pub fn generate_baseline_from_population(
    rows: &[PopulationRow],
    config: &PlanConfig,
) -> PlanResult<ParameterStore> {
    let totals = population_totals(rows, config)?;

    let base_population: f64 = totals
        .get(&FIRST_YEAR)
        .map(|groups| groups.values().sum())
        .ok_or(PlanError::MissingBaseYear { year: FIRST_YEAR })?;

    let mut params = ParameterStore::new();
    let mut supply_factor = 1.0;

    for year in types::years() {
        let mut growth_sum = 0.0;
        for group in &config.age_groups {
            let growth = age_group_growth(&totals, year, &group.label, config.default_population_growth);
            params.set(ParameterKind::PopulationGrowth, year, &group.label, growth);
            growth_sum += growth;
        }
        let average_growth = if config.age_groups.is_empty() {
            config.default_population_growth
        } else {
            growth_sum / config.age_groups.len() as f64
        };

        if year > FIRST_YEAR {
            supply_factor *= 1.0 + average_growth;
        }

        for occ in &config.occupations {
            let name = occ.name.as_str();
            let base_supply = base_population * occ.per_thousand_population / 1000.0;
            let inflow = (base_supply * occ.inflow_fraction_of_supply).round();
            let shares = &config.inflow_shares;

            params.set(ParameterKind::Supply, year, name, (base_supply * supply_factor).round());
            params.set(ParameterKind::EducationalInflow, year, name, inflow);
            params.set(ParameterKind::InternationalMigrants, year, name, inflow * shares.international_migrants);
            params.set(ParameterKind::DomesticMigrants, year, name, inflow * shares.domestic_migrants);
            params.set(ParameterKind::ReEntrants, year, name, inflow * shares.re_entrants);
            params.set(ParameterKind::RetirementRate, year, name, occ.retirement_rate);
            params.set(ParameterKind::AttritionRate, year, name, occ.attrition_rate);
        }

        let scale = if config.default_population_growth == 0.0 {
            1.0
        } else {
            average_growth / config.default_population_growth
        };
        set_rates(&mut params, ParameterKind::HealthStatusChange, year, &config.health_status, scale);
        set_rates(&mut params, ParameterKind::ServiceUtilization, year, &config.service_utilization, scale);
    }

    log::info!(
        "population baseline built from {} rows (base population {base_population:.0})",
        rows.len()
    );
    Ok(params)
}

fn set_rates(
    params: &mut ParameterStore,
    kind: ParameterKind,
    year: Year,
    rates: &[CategoryRate],
    scale: f64,
) {
    for rate in rates {
        params.set(kind, year, &rate.label, rate.rate * scale);
    }
}

/// year → age group → summed population. Rejects unknown age groups.
fn population_totals(
    rows: &[PopulationRow],
    config: &PlanConfig,
) -> PlanResult<BTreeMap<Year, BTreeMap<String, f64>>> {
    let mut totals: BTreeMap<Year, BTreeMap<String, f64>> = BTreeMap::new();

    for (i, row) in rows.iter().enumerate() {
        if !config.age_groups.iter().any(|g| g.label == row.age_group) {
            return Err(PlanError::InvalidRow {
                row: population::csv_line(i),
                reason: format!("unknown age group '{}'", row.age_group),
            });
        }
        *totals
            .entry(row.year)
            .or_default()
            .entry(row.age_group.clone())
            .or_insert(0.0) += row.projected_population;
    }

    Ok(totals)
}

fn age_group_growth(
    totals: &BTreeMap<Year, BTreeMap<String, f64>>,
    year: Year,
    age_group: &str,
    default_growth: f64,
) -> f64 {
    if year == FIRST_YEAR {
        return default_growth;
    }
    let total = |y: Year| totals.get(&y).and_then(|groups| groups.get(age_group)).copied();

    match (total(year - 1), total(year)) {
        (Some(previous), Some(current)) if previous > 0.0 => (current - previous) / previous,
        _ => default_growth,
    }
}
