//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods; nothing else executes SQL.

use crate::{
    error::PlanResult,
    event::EventLogEntry,
    scenario::Scenario,
    types::Seq,
};
use rusqlite::{params, Connection, OptionalExtension};

mod scenario;

pub struct PlanStore {
    conn: Connection,
}

/// A recorded population import.
#[derive(Debug, Clone)]
pub struct BaselineImport {
    pub seq:         Seq,
    pub row_count:   usize,
    pub params_json: String,
}

/// Everything one committed command writes. Applied in a single
/// transaction by `persist_transition`.
#[derive(Debug, Default)]
pub struct TransitionWrite<'a> {
    pub events:          Vec<EventLogEntry>,
    pub upserted:        Vec<&'a Scenario>,
    pub deleted:         Vec<&'a str>,
    /// New active scenario id, when it changed.
    pub active:          Option<&'a str>,
    pub baseline_import: Option<BaselineImport>,
    /// `(seq, state_json)` when a snapshot is due.
    pub snapshot:        Option<(Seq, String)>,
}

impl TransitionWrite<'_> {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.upserted.is_empty()
            && self.deleted.is_empty()
            && self.active.is_none()
            && self.baseline_import.is_none()
            && self.snapshot.is_none()
    }
}

impl PlanStore {
    /// Open (or create) the planning database at `path`.
    pub fn open(path: &str) -> PlanResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PlanResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PlanResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(&self, session_id: &str, version: &str, started_at: &str) -> PlanResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, version, started_at) VALUES (?1, ?2, ?3)",
            params![session_id, version, started_at],
        )?;
        Ok(())
    }

    pub fn session_exists(&self, session_id: &str) -> PlanResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM session WHERE session_id = ?1",
                params![session_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Id of the scenario that was active after the last committed command.
    pub fn active_scenario(&self, session_id: &str) -> PlanResult<String> {
        let id = self.conn.query_row(
            "SELECT active_id FROM session WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> PlanResult<()> {
        insert_event(&self.conn, entry)
    }

    pub fn events_for_session(&self, session_id: &str) -> PlanResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, seq, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    session_id: row.get(1)?,
                    seq:        row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Highest committed sequence number, 0 for a fresh session.
    pub fn last_seq(&self, session_id: &str) -> PlanResult<Seq> {
        let seq: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM event_log WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(seq as u64)
    }

    // ── Transition ─────────────────────────────────────────────

    /// Write one committed command. Either every row lands or none does.
    pub fn persist_transition(&self, session_id: &str, write: &TransitionWrite<'_>) -> PlanResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        for entry in &write.events {
            insert_event(&tx, entry)?;
        }
        for row in &write.upserted {
            scenario::upsert_row(&tx, session_id, row)?;
        }
        for id in &write.deleted {
            scenario::delete_row(&tx, session_id, id)?;
        }
        if let Some(active) = write.active {
            tx.execute(
                "UPDATE session SET active_id = ?1 WHERE session_id = ?2",
                params![active, session_id],
            )?;
        }
        if let Some(import) = &write.baseline_import {
            tx.execute(
                "INSERT INTO baseline_import (session_id, seq, row_count, params_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, import.seq as i64, import.row_count as i64, import.params_json],
            )?;
        }
        if let Some((seq, state_json)) = &write.snapshot {
            insert_snapshot(&tx, session_id, *seq, state_json)?;
        }

        tx.commit()?;
        Ok(())
    }

    // ── Baseline import ────────────────────────────────────────

    pub fn latest_baseline_import(&self, session_id: &str) -> PlanResult<Option<BaselineImport>> {
        let import = self
            .conn
            .query_row(
                "SELECT seq, row_count, params_json FROM baseline_import
                 WHERE session_id = ?1
                 ORDER BY seq DESC LIMIT 1",
                params![session_id],
                |row| {
                    Ok(BaselineImport {
                        seq:         row.get::<_, i64>(0)? as u64,
                        row_count:   row.get::<_, i64>(1)? as usize,
                        params_json: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(import)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn latest_snapshot(&self, session_id: &str) -> PlanResult<Option<(Seq, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT seq, state_json FROM snapshot
                 WHERE session_id = ?1
                 ORDER BY seq DESC LIMIT 1",
                params![session_id],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }

    // ── Test / summary helpers ─────────────────────────────────

    pub fn snapshot_count(&self, session_id: &str) -> PlanResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM snapshot WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn insert_event(conn: &Connection, entry: &EventLogEntry) -> PlanResult<()> {
    conn.execute(
        "INSERT INTO event_log (session_id, seq, event_type, payload)
         VALUES (?1, ?2, ?3, ?4)",
        params![entry.session_id, entry.seq as i64, entry.event_type, entry.payload],
    )?;
    Ok(())
}

fn insert_snapshot(conn: &Connection, session_id: &str, seq: Seq, state_json: &str) -> PlanResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO snapshot (session_id, seq, state_json) VALUES (?1, ?2, ?3)",
        params![session_id, seq as i64, state_json],
    )?;
    Ok(())
}
