//! Store methods for scenario rows.
//!
//! The full scenario (parameters and projections) is kept as JSON in
//! `body_json`; the other columns exist for listing without decoding.

use crate::{
    error::PlanResult,
    scenario::{Scenario, ScenarioStore},
};
use rusqlite::{params, Connection};

use super::PlanStore;

impl PlanStore {
    /// All scenarios of a session, in the order they were first written.
    pub fn load_scenarios(&self, session_id: &str) -> PlanResult<ScenarioStore> {
        let mut stmt = self.conn.prepare(
            "SELECT body_json FROM scenario
             WHERE session_id = ?1
             ORDER BY rowid ASC",
        )?;
        let bodies = stmt
            .query_map(params![session_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut store = ScenarioStore::new();
        for body in bodies {
            let scenario: Scenario = serde_json::from_str(&body)?;
            store = store.with_upserted(scenario);
        }
        Ok(store)
    }

    /// `(scenario_id, name)` pairs, for listings.
    pub fn scenario_names(&self, session_id: &str) -> PlanResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT scenario_id, name FROM scenario
             WHERE session_id = ?1
             ORDER BY rowid ASC",
        )?;
        let names = stmt
            .query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Insert or update in place; an existing row keeps its position.
pub(super) fn upsert_row(conn: &Connection, session_id: &str, scenario: &Scenario) -> PlanResult<()> {
    let body = serde_json::to_string(scenario)?;
    conn.execute(
        "INSERT INTO scenario (
            session_id, scenario_id, name, description, is_temporary, created_at, body_json
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (session_id, scenario_id) DO UPDATE SET
            name         = excluded.name,
            description  = excluded.description,
            is_temporary = excluded.is_temporary,
            created_at   = excluded.created_at,
            body_json    = excluded.body_json",
        params![
            session_id,
            &scenario.id,
            &scenario.name,
            &scenario.description,
            if scenario.is_temporary { 1 } else { 0 },
            scenario.created_at.to_rfc3339(),
            body,
        ],
    )?;
    Ok(())
}

pub(super) fn delete_row(conn: &Connection, session_id: &str, scenario_id: &str) -> PlanResult<()> {
    conn.execute(
        "DELETE FROM scenario WHERE session_id = ?1 AND scenario_id = ?2",
        params![session_id, scenario_id],
    )?;
    Ok(())
}
