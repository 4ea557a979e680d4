// crates/career-coordination-store-sqlite/src/audit.rs
// ============================================================================
// Module: SQLite Audit Log
// Description: Durable hash-chained audit log over the v3 table.
// Purpose: Allocate per-trace indexes atomically and persist chain hashes.
// Dependencies: career-coordination-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Append runs inside a `BEGIN IMMEDIATE` transaction: the next index and the
//! predecessor hash are read after the write lock is held, so two processes
//! sharing the database file cannot claim the same index or link to the same
//! predecessor. The `(trace_id, idx)` unique constraint backstops the
//! allocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use career_coordination_core::audit::AuditError;
use career_coordination_core::audit::AuditEvent;
use career_coordination_core::audit::AuditEventInput;
use career_coordination_core::audit::AuditLog;
use career_coordination_core::audit::GENESIS_HASH;
use career_coordination_core::audit::compute_event_hash;
use career_coordination_core::core::identifiers::EventId;
use career_coordination_core::core::identifiers::TraceId;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;

use crate::db::SqliteDb;

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Durable audit log over the `audit_events` table.
#[derive(Debug)]
pub struct SqliteAuditLog {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteAuditLog {
    /// Creates an audit log over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }
}

/// Maps any store or database error into an [`AuditError`].
fn audit_err(err: impl std::fmt::Display) -> AuditError {
    AuditError::Backend(err.to_string())
}

impl AuditLog for SqliteAuditLog {
    fn append(&self, input: AuditEventInput) -> Result<AuditEvent, AuditError> {
        let mut conn = self.db.lock().map_err(audit_err)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(audit_err)?;

        // Allocation happens with the write lock held: read max(idx) and the
        // predecessor hash, then insert, all in one transaction.
        let last: Option<(i64, String)> = tx
            .query_row(
                "SELECT idx, event_hash FROM audit_events
                 WHERE trace_id = ?1 ORDER BY idx DESC LIMIT 1",
                params![input.trace_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(audit_err)?;

        let (idx, previous_hash) = match last {
            Some((last_idx, last_hash)) => (last_idx + 1, last_hash),
            None => (0, GENESIS_HASH.to_string()),
        };
        let event_hash = compute_event_hash(&input, &previous_hash);
        let refs_json = serde_json::to_string(&input.refs).map_err(audit_err)?;

        tx.execute(
            "INSERT INTO audit_events
               (event_id, trace_id, event_type, payload, created_at, refs_json,
                idx, previous_hash, event_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                input.event_id.as_str(),
                input.trace_id.as_str(),
                input.event_type,
                input.payload,
                input.created_at,
                refs_json,
                idx,
                previous_hash,
                event_hash,
            ],
        )
        .map_err(audit_err)?;
        tx.commit().map_err(audit_err)?;

        Ok(AuditEvent {
            event_id: input.event_id,
            trace_id: input.trace_id,
            event_type: input.event_type,
            payload: input.payload,
            created_at: input.created_at,
            refs: input.refs,
            idx: u64::try_from(idx).map_err(audit_err)?,
            previous_hash,
            event_hash,
        })
    }

    fn query(&self, trace_id: &TraceId) -> Result<Vec<AuditEvent>, AuditError> {
        let conn = self.db.lock().map_err(audit_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT event_id, trace_id, event_type, payload, created_at, refs_json,
                        idx, previous_hash, event_hash
                 FROM audit_events WHERE trace_id = ?1 ORDER BY idx",
            )
            .map_err(audit_err)?;
        let rows = stmt
            .query_map(params![trace_id.as_str()], |row| {
                let refs_json: String = row.get(5)?;
                let idx: i64 = row.get(6)?;
                Ok(AuditEvent {
                    event_id: EventId::new(row.get::<_, String>(0)?),
                    trace_id: TraceId::new(row.get::<_, String>(1)?),
                    event_type: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: row.get(4)?,
                    refs: serde_json::from_str(&refs_json).unwrap_or_default(),
                    idx: u64::try_from(idx).unwrap_or_default(),
                    previous_hash: row.get(7)?,
                    event_hash: row.get(8)?,
                })
            })
            .map_err(audit_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(audit_err)
    }

    fn list_trace_ids(&self) -> Result<Vec<TraceId>, AuditError> {
        let conn = self.db.lock().map_err(audit_err)?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT trace_id FROM audit_events ORDER BY trace_id")
            .map_err(audit_err)?;
        let rows = stmt
            .query_map([], |row| Ok(TraceId::new(row.get::<_, String>(0)?)))
            .map_err(audit_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(audit_err)
    }
}
