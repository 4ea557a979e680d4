// crates/career-coordination-store-sqlite/src/snapshots.rs
// ============================================================================
// Module: Runtime Snapshots
// Description: Startup configuration snapshots over the v8 table.
// Purpose: Record the effective runtime configuration for later reproduction.
// Dependencies: career-coordination-core, rusqlite, serde
// ============================================================================

//! ## Overview
//! A runtime snapshot freezes the host's effective configuration (strategy,
//! retrieval bounds, embedding configuration, storage backends) at startup.
//! Operators replay a decision by pairing its audit trace with the snapshot
//! that was current when the trace was written.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use career_coordination_core::storage::StoreError;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;

use crate::db::SqliteDb;
use crate::db::db_err;

// ============================================================================
// SECTION: Snapshot Record
// ============================================================================

/// One frozen runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    /// Snapshot identifier.
    pub snapshot_id: String,
    /// Capture timestamp.
    pub created_at: String,
    /// Opaque configuration JSON.
    pub snapshot_json: String,
}

// ============================================================================
// SECTION: Snapshot Store
// ============================================================================

/// Durable snapshot store over the `runtime_snapshots` table.
#[derive(Debug)]
pub struct SqliteRuntimeSnapshotStore {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteRuntimeSnapshotStore {
    /// Creates a store over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }

    /// Inserts or replaces a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    pub fn upsert(&self, snapshot: &RuntimeSnapshot) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO runtime_snapshots (snapshot_id, created_at, snapshot_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(snapshot_id) DO UPDATE SET
               created_at    = excluded.created_at,
               snapshot_json = excluded.snapshot_json",
            params![snapshot.snapshot_id, snapshot.created_at, snapshot.snapshot_json],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Returns the most recently created snapshot, when any exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    pub fn get_latest(&self) -> Result<Option<RuntimeSnapshot>, StoreError> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT snapshot_id, created_at, snapshot_json FROM runtime_snapshots
             ORDER BY created_at DESC, snapshot_id DESC LIMIT 1",
            [],
            |row| {
                Ok(RuntimeSnapshot {
                    snapshot_id: row.get(0)?,
                    created_at: row.get(1)?,
                    snapshot_json: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(db_err)
    }
}
