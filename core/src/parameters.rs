//! Parameter store holding every editable input of the model.
//!
//! Layout: kind → year → category → value. Backed by persistent `im`
//! maps, so a clone shares structure and every write produces a new
//! version. No two holders of a store can ever observe each other's
//! writes; that is the isolation guarantee scenarios rely on.

use crate::types::{CategoryKey, Year};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    // ── Workforce (keyed by occupation) ─────────────
    Supply,
    EducationalInflow,
    InternationalMigrants,
    DomesticMigrants,
    ReEntrants,
    RetirementRate,
    AttritionRate,

    // ── Demand drivers (keyed by demographic/service label) ──
    PopulationGrowth,
    HealthStatusChange,
    ServiceUtilization,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 10] = [
        Self::Supply,
        Self::EducationalInflow,
        Self::InternationalMigrants,
        Self::DomesticMigrants,
        Self::ReEntrants,
        Self::RetirementRate,
        Self::AttritionRate,
        Self::PopulationGrowth,
        Self::HealthStatusChange,
        Self::ServiceUtilization,
    ];

    pub const WORKFORCE: [ParameterKind; 7] = [
        Self::Supply,
        Self::EducationalInflow,
        Self::InternationalMigrants,
        Self::DomesticMigrants,
        Self::ReEntrants,
        Self::RetirementRate,
        Self::AttritionRate,
    ];

    pub const DEMAND: [ParameterKind; 3] = [
        Self::PopulationGrowth,
        Self::HealthStatusChange,
        Self::ServiceUtilization,
    ];

    /// Headcount flows that add to supply each year.
    pub const INFLOWS: [ParameterKind; 4] = [
        Self::EducationalInflow,
        Self::InternationalMigrants,
        Self::DomesticMigrants,
        Self::ReEntrants,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supply                => "supply",
            Self::EducationalInflow     => "educationalInflow",
            Self::InternationalMigrants => "internationalMigrants",
            Self::DomesticMigrants      => "domesticMigrants",
            Self::ReEntrants            => "reEntrants",
            Self::RetirementRate        => "retirementRate",
            Self::AttritionRate         => "attritionRate",
            Self::PopulationGrowth      => "populationGrowth",
            Self::HealthStatusChange    => "healthStatusChange",
            Self::ServiceUtilization    => "serviceUtilization",
        }
    }

    /// Human-readable label, used for export sheet names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Supply                => "Current Supply",
            Self::EducationalInflow     => "Educational Inflow",
            Self::InternationalMigrants => "International Migrants",
            Self::DomesticMigrants      => "Domestic Migrants",
            Self::ReEntrants            => "Re-Entrants",
            Self::RetirementRate        => "Retirement Rate",
            Self::AttritionRate         => "Attrition Rate",
            Self::PopulationGrowth      => "Population Growth",
            Self::HealthStatusChange    => "Health Status Change",
            Self::ServiceUtilization    => "Service Utilization",
        }
    }

    pub fn is_workforce(&self) -> bool {
        Self::WORKFORCE.contains(self)
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown parameter kind: {s}"))
    }
}

pub type YearTable = OrdMap<CategoryKey, f64>;
pub type KindTable = OrdMap<Year, YearTable>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterStore {
    kinds: OrdMap<ParameterKind, KindTable>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact lookup, no fallback.
    pub fn get(&self, kind: ParameterKind, year: Year, category: &str) -> Option<f64> {
        self.kinds.get(&kind)?.get(&year)?.get(category).copied()
    }

    /// The single fallback policy for reads: same year, then the
    /// previous year, then `fallback`.
    pub fn lookup_or_default(
        &self,
        kind: ParameterKind,
        year: Year,
        category: &str,
        fallback: f64,
    ) -> f64 {
        self.get(kind, year, category)
            .or_else(|| {
                year.checked_sub(1)
                    .and_then(|prev| self.get(kind, prev, category))
            })
            .unwrap_or(fallback)
    }

    pub fn year_table(&self, kind: ParameterKind, year: Year) -> Option<&YearTable> {
        self.kinds.get(&kind)?.get(&year)
    }

    pub fn kind_table(&self, kind: ParameterKind) -> Option<&KindTable> {
        self.kinds.get(&kind)
    }

    /// Arithmetic mean over every category present for `year`.
    /// None when the kind has no data that year.
    pub fn average(&self, kind: ParameterKind, year: Year) -> Option<f64> {
        let table = self.year_table(kind, year)?;
        if table.is_empty() {
            return None;
        }
        let sum: f64 = table.values().sum();
        Some(sum / table.len() as f64)
    }

    /// A new store with one value replaced. `self` is left untouched.
    #[must_use]
    pub fn with_value(&self, kind: ParameterKind, year: Year, category: &str, value: f64) -> Self {
        let mut next = self.clone();
        next.set(kind, year, category, value);
        next
    }

    /// In-place write on an owned version. Other clones never see it.
    pub fn set(&mut self, kind: ParameterKind, year: Year, category: &str, value: f64) {
        self.kinds
            .entry(kind)
            .or_insert_with(OrdMap::new)
            .entry(year)
            .or_insert_with(OrdMap::new)
            .insert(category.to_string(), value);
    }

    pub fn years(&self, kind: ParameterKind) -> impl Iterator<Item = Year> + '_ {
        self.kinds
            .get(&kind)
            .into_iter()
            .flat_map(|table| table.keys().copied())
    }

    pub fn categories(&self, kind: ParameterKind, year: Year) -> impl Iterator<Item = &str> + '_ {
        self.year_table(kind, year)
            .into_iter()
            .flat_map(|table| table.keys().map(String::as_str))
    }

    /// Every (kind, year, category) triple that should exist but doesn't.
    pub fn missing_entries(
        &self,
        occupations: &[String],
        demand_categories: &[(ParameterKind, Vec<String>)],
    ) -> Vec<(ParameterKind, Year, String)> {
        let mut missing = Vec::new();
        for year in crate::types::years() {
            for kind in ParameterKind::WORKFORCE {
                for occ in occupations {
                    if self.get(kind, year, occ).is_none() {
                        missing.push((kind, year, occ.clone()));
                    }
                }
            }
            for (kind, labels) in demand_categories {
                for label in labels {
                    if self.get(*kind, year, label).is_none() {
                        missing.push((*kind, year, label.clone()));
                    }
                }
            }
        }
        missing
    }

    /// Every stored value, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (ParameterKind, Year, &str, f64)> + '_ {
        self.kinds.iter().flat_map(|(kind, years)| {
            years.iter().flat_map(move |(year, cats)| {
                cats.iter().map(move |(cat, v)| (*kind, *year, cat.as_str(), *v))
            })
        })
    }
}
