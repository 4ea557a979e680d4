// crates/career-coordination-store-sqlite/src/db.rs
// ============================================================================
// Module: SQLite Database Handle
// Description: Shared connection with accumulative schema migrations.
// Purpose: Own pragmas, migrations, and serialized connection access.
// Dependencies: career-coordination-core, rusqlite
// ============================================================================

//! ## Overview
//! [`SqliteDb`] owns one connection behind a mutex; in-process callers are
//! serialized by the lock while `BEGIN IMMEDIATE` transactions guard the
//! cross-process races (audit index allocation, run-id counters). The schema
//! is versioned through `PRAGMA user_version` and migrations only ever add
//! tables, never rewrite them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use career_coordination_core::storage::StoreError;
use rusqlite::Connection;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current schema version; migrations run up to this value.
pub const SCHEMA_VERSION: i64 = 8;

/// Busy timeout applied to every connection (ms).
const BUSY_TIMEOUT_MS: i64 = 5_000;

/// Accumulative migrations; entry `N - 1` brings the schema to version `N`.
const MIGRATIONS: [&str; 8] = [
    // v1: atoms, opportunities, requirements
    "CREATE TABLE IF NOT EXISTS atoms (
        atom_id            TEXT PRIMARY KEY,
        domain             TEXT NOT NULL,
        title              TEXT NOT NULL,
        claim              TEXT NOT NULL,
        tags_json          TEXT NOT NULL,
        verified           INTEGER NOT NULL,
        evidence_refs_json TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS opportunities (
        opportunity_id TEXT PRIMARY KEY,
        company        TEXT NOT NULL,
        role_title     TEXT NOT NULL,
        source         TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS requirements (
        opportunity_id TEXT NOT NULL,
        position       INTEGER NOT NULL,
        text           TEXT NOT NULL,
        tags_json      TEXT NOT NULL,
        required       INTEGER NOT NULL,
        PRIMARY KEY (opportunity_id, position)
    );",
    // v2: interactions
    "CREATE TABLE IF NOT EXISTS interactions (
        interaction_id TEXT PRIMARY KEY,
        contact_id     TEXT NOT NULL,
        opportunity_id TEXT NOT NULL,
        state          TEXT NOT NULL
    );",
    // v3: audit events with chain columns
    "CREATE TABLE IF NOT EXISTS audit_events (
        event_id      TEXT PRIMARY KEY,
        trace_id      TEXT NOT NULL,
        event_type    TEXT NOT NULL,
        payload       TEXT NOT NULL,
        created_at    TEXT NOT NULL,
        refs_json     TEXT NOT NULL,
        idx           INTEGER NOT NULL,
        previous_hash TEXT NOT NULL,
        event_hash    TEXT NOT NULL,
        UNIQUE (trace_id, idx)
    );",
    // v4: resumes and their ingestion metadata
    "CREATE TABLE IF NOT EXISTS resumes (
        resume_id   TEXT PRIMARY KEY,
        resume_md   TEXT NOT NULL,
        resume_hash TEXT NOT NULL UNIQUE,
        created_at  TEXT
    );
    CREATE TABLE IF NOT EXISTS resume_meta (
        resume_id         TEXT PRIMARY KEY,
        source_path       TEXT,
        source_hash       TEXT NOT NULL,
        extraction_method TEXT NOT NULL,
        extracted_at      TEXT,
        ingestion_version TEXT NOT NULL
    );",
    // v5: derived token IRs
    "CREATE TABLE IF NOT EXISTS resume_token_ir (
        resume_id TEXT PRIMARY KEY,
        ir_json   TEXT NOT NULL
    );",
    // v6: index runs and provenance entries
    "CREATE TABLE IF NOT EXISTS index_runs (
        run_id         TEXT PRIMARY KEY,
        started_at     TEXT,
        completed_at   TEXT,
        provider_id    TEXT NOT NULL,
        model_id       TEXT NOT NULL,
        prompt_version TEXT NOT NULL,
        status         TEXT NOT NULL,
        summary_json   TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS index_entries (
        run_id        TEXT NOT NULL,
        artifact_type TEXT NOT NULL,
        artifact_id   TEXT NOT NULL,
        source_hash   TEXT NOT NULL,
        vector_hash   TEXT NOT NULL,
        indexed_at    TEXT,
        PRIMARY KEY (run_id, artifact_type, artifact_id)
    );",
    // v7: counter rows for atomic identifier allocation
    "CREATE TABLE IF NOT EXISTS id_counters (
        name  TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    );",
    // v8: decision records and runtime snapshots
    "CREATE TABLE IF NOT EXISTS decision_records (
        decision_id TEXT PRIMARY KEY,
        trace_id    TEXT NOT NULL,
        record_json TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS runtime_snapshots (
        snapshot_id   TEXT PRIMARY KEY,
        created_at    TEXT NOT NULL,
        snapshot_json TEXT NOT NULL
    );",
];

// ============================================================================
// SECTION: Database Handle
// ============================================================================

/// Shared SQLite handle with serialized access.
///
/// # Invariants
/// - The schema is migrated to [`SCHEMA_VERSION`] before the handle is
///   returned to callers.
#[derive(Debug)]
pub struct SqliteDb {
    /// The underlying connection, serialized by a mutex.
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Opens (creating if needed) and migrates a database file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be opened or a migration
    /// fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>, StoreError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|err| StoreError::Io(format!("open {}: {err}", path.as_ref().display())))?;
        Self::initialize(conn)
    }

    /// Opens an in-memory database (tests and ephemeral hosts).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a migration fails.
    pub fn open_in_memory() -> Result<Arc<Self>, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| StoreError::Io(format!("open in-memory: {err}")))?;
        Self::initialize(conn)
    }

    /// Applies pragmas and migrations, then wraps the connection.
    fn initialize(conn: Connection) -> Result<Arc<Self>, StoreError> {
        conn.pragma_update(None, "journal_mode", "wal")
            .map_err(|err| StoreError::Io(format!("journal_mode: {err}")))?;
        conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)
            .map_err(|err| StoreError::Io(format!("busy_timeout: {err}")))?;
        conn.pragma_update(None, "foreign_keys", "on")
            .map_err(|err| StoreError::Io(format!("foreign_keys: {err}")))?;

        let mut version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|err| StoreError::Io(format!("user_version: {err}")))?;
        if version > SCHEMA_VERSION {
            return Err(StoreError::Corrupt(format!(
                "database schema version {version} is newer than supported {SCHEMA_VERSION}"
            )));
        }

        while version < SCHEMA_VERSION {
            let step = usize::try_from(version)
                .map_err(|_| StoreError::Corrupt(format!("negative schema version {version}")))?;
            conn.execute_batch(MIGRATIONS[step])
                .map_err(|err| StoreError::Io(format!("migration to v{}: {err}", version + 1)))?;
            version += 1;
            conn.pragma_update(None, "user_version", version)
                .map_err(|err| StoreError::Io(format!("set user_version: {err}")))?;
        }

        Ok(Arc::new(Self {
            conn: Mutex::new(conn),
        }))
    }

    /// Locks the connection for one operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lock is poisoned.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Store("database lock poisoned".to_string()))
    }
}

/// Maps a rusqlite error into a [`StoreError`].
pub(crate) fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::Store(err.to_string())
}
