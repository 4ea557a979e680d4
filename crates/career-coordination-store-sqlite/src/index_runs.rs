// crates/career-coordination-store-sqlite/src/index_runs.rs
// ============================================================================
// Module: SQLite Index Run Store
// Description: Durable run/entry provenance with counter-row run ids.
// Purpose: Back drift detection and atomic run identifier allocation.
// Dependencies: career-coordination-core, rusqlite
// ============================================================================

//! ## Overview
//! Runs and entries map to the v6 tables. `next_index_run_id` implements the
//! counter-row pattern: a `BEGIN IMMEDIATE` transaction upsert-increments the
//! `index_run` row in `id_counters` and reads the value back, so two
//! processes sharing the database file always receive different run
//! identifiers. Drift lookup joins entries to completed runs on the full
//! embedding configuration tuple and takes the most recent completion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use career_coordination_core::core::identifiers::RunId;
use career_coordination_core::indexing::IndexEntry;
use career_coordination_core::indexing::IndexRun;
use career_coordination_core::indexing::IndexRunStatus;
use career_coordination_core::indexing::IndexRunStore;
use career_coordination_core::storage::StoreError;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;

use crate::db::SqliteDb;
use crate::db::db_err;

// ============================================================================
// SECTION: Index Run Store
// ============================================================================

/// Durable index run store over the v6 tables and `id_counters`.
#[derive(Debug)]
pub struct SqliteIndexRunStore {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteIndexRunStore {
    /// Creates a store over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }

    /// Maps one row to a run record.
    fn row_to_run(row: &rusqlite::Row<'_>) -> Result<IndexRun, rusqlite::Error> {
        let status_label: String = row.get(6)?;
        Ok(IndexRun {
            run_id: RunId::new(row.get::<_, String>(0)?),
            started_at: row.get(1)?,
            completed_at: row.get(2)?,
            provider_id: row.get(3)?,
            model_id: row.get(4)?,
            prompt_version: row.get(5)?,
            status: IndexRunStatus::parse(&status_label).unwrap_or(IndexRunStatus::Failed),
            summary_json: row.get(7)?,
        })
    }
}

impl IndexRunStore for SqliteIndexRunStore {
    fn upsert_run(&self, run: &IndexRun) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO index_runs
               (run_id, started_at, completed_at, provider_id, model_id,
                prompt_version, status, summary_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(run_id) DO UPDATE SET
               started_at     = excluded.started_at,
               completed_at   = excluded.completed_at,
               provider_id    = excluded.provider_id,
               model_id       = excluded.model_id,
               prompt_version = excluded.prompt_version,
               status         = excluded.status,
               summary_json   = excluded.summary_json",
            params![
                run.run_id.as_str(),
                run.started_at,
                run.completed_at,
                run.provider_id,
                run.model_id,
                run.prompt_version,
                run.status.as_str(),
                run.summary_json,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn upsert_entry(&self, entry: &IndexEntry) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO index_entries
               (run_id, artifact_type, artifact_id, source_hash, vector_hash, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(run_id, artifact_type, artifact_id) DO UPDATE SET
               source_hash = excluded.source_hash,
               vector_hash = excluded.vector_hash,
               indexed_at  = excluded.indexed_at",
            params![
                entry.run_id.as_str(),
                entry.artifact_type,
                entry.artifact_id,
                entry.source_hash,
                entry.vector_hash,
                entry.indexed_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get_run(&self, run_id: &RunId) -> Result<Option<IndexRun>, StoreError> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT run_id, started_at, completed_at, provider_id, model_id,
                    prompt_version, status, summary_json
             FROM index_runs WHERE run_id = ?1",
            params![run_id.as_str()],
            |row| Self::row_to_run(row),
        )
        .optional()
        .map_err(db_err)
    }

    fn list_runs(&self) -> Result<Vec<IndexRun>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT run_id, started_at, completed_at, provider_id, model_id,
                        prompt_version, status, summary_json
                 FROM index_runs ORDER BY run_id",
            )
            .map_err(db_err)?;
        let rows = stmt.query_map([], |row| Self::row_to_run(row)).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn get_entries_for_run(&self, run_id: &RunId) -> Result<Vec<IndexEntry>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT run_id, artifact_type, artifact_id, source_hash, vector_hash, indexed_at
                 FROM index_entries WHERE run_id = ?1
                 ORDER BY artifact_type, artifact_id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![run_id.as_str()], |row| {
                Ok(IndexEntry {
                    run_id: RunId::new(row.get::<_, String>(0)?),
                    artifact_type: row.get(1)?,
                    artifact_id: row.get(2)?,
                    source_hash: row.get(3)?,
                    vector_hash: row.get(4)?,
                    indexed_at: row.get(5)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn get_last_source_hash(
        &self,
        artifact_id: &str,
        artifact_type: &str,
        provider_id: &str,
        model_id: &str,
        prompt_version: &str,
    ) -> Result<Option<String>, StoreError> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT ie.source_hash
             FROM index_entries ie
             JOIN index_runs ir ON ie.run_id = ir.run_id
             WHERE ie.artifact_id    = ?1
               AND ie.artifact_type  = ?2
               AND ir.provider_id    = ?3
               AND ir.model_id       = ?4
               AND ir.prompt_version = ?5
               AND ir.status         = 'completed'
             ORDER BY ir.completed_at DESC
             LIMIT 1",
            params![artifact_id, artifact_type, provider_id, model_id, prompt_version],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)
    }

    fn next_index_run_id(&self) -> Result<RunId, StoreError> {
        let mut conn = self.db.lock()?;
        // BEGIN IMMEDIATE takes the write lock before the read, so two
        // processes cannot observe the same counter value.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;
        tx.execute(
            "INSERT INTO id_counters (name, value) VALUES ('index_run', 1)
             ON CONFLICT(name) DO UPDATE SET value = value + 1",
            [],
        )
        .map_err(db_err)?;
        let value: i64 = tx
            .query_row(
                "SELECT value FROM id_counters WHERE name = 'index_run'",
                [],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        Ok(RunId::new(format!("run-{value}")))
    }
}
