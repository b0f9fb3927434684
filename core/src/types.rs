//! Shared primitive types used across the planning core.

/// A projection year. The horizon is FIRST_YEAR..=LAST_YEAR.
pub type Year = u16;

/// An occupation name or a demand category label (age group, health
/// status, utilization category).
pub type CategoryKey = String;

/// Stable identifier of a saved scenario.
pub type ScenarioId = String;

/// The canonical session identifier.
pub type SessionId = String;

/// Monotonic sequence number of committed commands within a session.
pub type Seq = u64;

pub const FIRST_YEAR: Year = 2024;
pub const LAST_YEAR: Year = 2034;

/// Reserved id that always resolves to the immutable baseline.
pub const BASELINE_ID: &str = "baseline";

/// Reserved id of the temporary scenario holding applied-but-unsaved edits.
pub const WORKING_ID: &str = "working";

/// Every year of the horizon, in order.
pub fn years() -> impl DoubleEndedIterator<Item = Year> + Clone {
    FIRST_YEAR..=LAST_YEAR
}

pub fn in_horizon(year: Year) -> bool {
    (FIRST_YEAR..=LAST_YEAR).contains(&year)
}
