//! Model constants. `PlanConfig::default()` carries the built-in values;
//! `PlanConfig::load()` reads the same structure from a JSON file.

use crate::parameters::ParameterKind;
use crate::projection::ProjectionCell;
use crate::types::Seq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupationProfile {
    pub name: String,
    /// Base-year FTE stock.
    pub base_supply: f64,
    pub educational_inflow: f64,
    pub international_migrants: f64,
    pub domestic_migrants: f64,
    pub re_entrants: f64,
    pub retirement_rate: f64,
    pub attrition_rate: f64,
    /// FTE per 1000 residents, used when deriving supply from population.
    pub per_thousand_population: f64,
    /// Educational inflow as a fraction of derived base supply.
    pub inflow_fraction_of_supply: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRate {
    pub label: String,
    pub rate: f64,
}

impl CategoryRate {
    fn new(label: &str, rate: f64) -> Self {
        Self { label: label.to_string(), rate }
    }
}

/// Migration and re-entrant flows as fractions of educational inflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflowShares {
    pub international_migrants: f64,
    pub domestic_migrants: f64,
    pub re_entrants: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightThresholds {
    /// Average gap over the horizon above which a shortage is critical.
    pub critical_average_gap: f64,
    /// First-to-last-year gap growth above which a warning is raised.
    pub warning_gap_growth: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub occupations: Vec<OccupationProfile>,
    pub age_groups: Vec<CategoryRate>,
    pub health_status: Vec<CategoryRate>,
    pub service_utilization: Vec<CategoryRate>,
    /// Baseline supply growth per year after the base year.
    pub annual_supply_growth: f64,
    /// Base-year demand as a multiple of base-year supply.
    pub demand_ratio: f64,
    /// Linear demand growth per year, before demand drivers.
    pub secular_demand_growth: f64,
    /// Age-group growth used for the first year and for empty prior years.
    pub default_population_growth: f64,
    pub inflow_shares: InflowShares,
    /// Substituted for any cell that cannot be computed.
    pub fallback_cell: ProjectionCell,
    pub insights: InsightThresholds,
    /// Committed commands between session snapshots.
    pub snapshot_interval: Seq,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            occupations: vec![
                occupation("Physicians",                2500.0, 100.0, 25.0, 15.0, 10.0, 0.06, 2.5, 0.04),
                occupation("Nurse Practitioners",        800.0,  50.0, 10.0,  8.0,  5.0, 0.05, 0.8, 0.06),
                occupation("Registered Nurses",         4200.0, 200.0, 40.0, 30.0, 25.0, 0.04, 4.2, 0.05),
                occupation("Licensed Practical Nurses", 1800.0, 150.0, 20.0, 15.0, 12.0, 0.04, 1.8, 0.08),
                occupation("Medical Office Assistants", 3200.0, 100.0, 15.0, 10.0, 20.0, 0.03, 3.2, 0.04),
            ],
            age_groups: vec![
                CategoryRate::new("0-18", 0.01),
                CategoryRate::new("19-64", 0.015),
                CategoryRate::new("65-84", 0.025),
                CategoryRate::new("85+", 0.03),
            ],
            health_status: vec![
                CategoryRate::new("Major Chronic", 0.02),
                CategoryRate::new("Minor Acute", -0.01),
                CategoryRate::new("Palliative", 0.005),
                CategoryRate::new("Healthy", -0.015),
            ],
            service_utilization: vec![
                CategoryRate::new("Primary Care Visits", 0.02),
                CategoryRate::new("Preventive Care", 0.03),
                CategoryRate::new("Chronic Disease Management", 0.04),
                CategoryRate::new("Mental Health Services", 0.05),
            ],
            annual_supply_growth: 0.01,
            demand_ratio: 1.1,
            secular_demand_growth: 0.02,
            default_population_growth: 0.02,
            inflow_shares: InflowShares {
                international_migrants: 0.25,
                domestic_migrants: 0.15,
                re_entrants: 0.10,
            },
            fallback_cell: ProjectionCell::new(1000, 1100),
            insights: InsightThresholds {
                critical_average_gap: 200.0,
                warning_gap_growth: 100.0,
            },
            snapshot_interval: 10,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn occupation(
    name: &str,
    base_supply: f64,
    educational_inflow: f64,
    international_migrants: f64,
    domestic_migrants: f64,
    re_entrants: f64,
    retirement_rate: f64,
    per_thousand_population: f64,
    inflow_fraction_of_supply: f64,
) -> OccupationProfile {
    OccupationProfile {
        name: name.to_string(),
        base_supply,
        educational_inflow,
        international_migrants,
        domestic_migrants,
        re_entrants,
        retirement_rate,
        attrition_rate: 0.15,
        per_thousand_population,
        inflow_fraction_of_supply,
    }
}

impl PlanConfig {
    /// Load from a JSON file.
    /// In tests, use PlanConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PlanConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.occupations.is_empty() {
            anyhow::bail!("{path}: at least one occupation is required");
        }
        Ok(config)
    }

    pub fn occupation_names(&self) -> Vec<String> {
        self.occupations.iter().map(|o| o.name.clone()).collect()
    }

    pub fn occupation(&self, name: &str) -> Option<&OccupationProfile> {
        self.occupations.iter().find(|o| o.name == name)
    }

    /// Categories each demand kind is expected to carry.
    pub fn demand_categories(&self) -> Vec<(ParameterKind, Vec<String>)> {
        let labels = |rates: &[CategoryRate]| -> Vec<String> {
            rates.iter().map(|r| r.label.clone()).collect()
        };
        vec![
            (ParameterKind::PopulationGrowth, labels(&self.age_groups)),
            (ParameterKind::HealthStatusChange, labels(&self.health_status)),
            (ParameterKind::ServiceUtilization, labels(&self.service_utilization)),
        ]
    }
}
