// crates/career-coordination-store-sqlite/src/decisions.rs
// ============================================================================
// Module: SQLite Decision Store
// Description: Durable decision record storage over the v8 table.
// Purpose: Persist decision records as opaque JSON with queryable keys.
// Dependencies: career-coordination-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Decision records serialize to JSON; only the decision and trace
//! identifiers are promoted to columns as the query surface. Listing orders
//! by decision identifier to match the in-memory store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use career_coordination_core::core::identifiers::DecisionId;
use career_coordination_core::core::identifiers::TraceId;
use career_coordination_core::domain::DecisionRecord;
use career_coordination_core::storage::DecisionStore;
use career_coordination_core::storage::StoreError;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::db::SqliteDb;
use crate::db::db_err;

// ============================================================================
// SECTION: Decision Store
// ============================================================================

/// Durable decision store over the `decision_records` table.
#[derive(Debug)]
pub struct SqliteDecisionStore {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteDecisionStore {
    /// Creates a store over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }
}

impl DecisionStore for SqliteDecisionStore {
    fn upsert(&self, record: &DecisionRecord) -> Result<(), StoreError> {
        let record_json = record
            .to_json()
            .map_err(|err| StoreError::Store(err.to_string()))?;
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO decision_records (decision_id, trace_id, record_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(decision_id) DO UPDATE SET
               trace_id    = excluded.trace_id,
               record_json = excluded.record_json",
            params![
                record.decision_id.as_str(),
                record.trace_id.as_str(),
                record_json,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get(&self, id: &DecisionId) -> Result<Option<DecisionRecord>, StoreError> {
        let conn = self.db.lock()?;
        let record_json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM decision_records WHERE decision_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        record_json
            .map(|text| {
                DecisionRecord::from_json(&text)
                    .map_err(|err| StoreError::Corrupt(err.to_string()))
            })
            .transpose()
    }

    fn list_by_trace(&self, trace_id: &TraceId) -> Result<Vec<DecisionRecord>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM decision_records
                 WHERE trace_id = ?1 ORDER BY decision_id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![trace_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        let mut records = Vec::new();
        for row in rows {
            let text = row.map_err(db_err)?;
            records.push(
                DecisionRecord::from_json(&text)
                    .map_err(|err| StoreError::Corrupt(err.to_string()))?,
            );
        }
        Ok(records)
    }
}
