// crates/career-coordination-store-sqlite/src/resumes.rs
// ============================================================================
// Module: SQLite Resume Stores
// Description: Durable resume and token IR storage.
// Purpose: Persist canonical resumes with hash lookup and derived IRs.
// Dependencies: career-coordination-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Resume content and metadata live in sibling v4 tables joined on the
//! resume identifier; the `resume_hash` unique constraint enforces the
//! secondary-key contract. Token IRs serialize as JSON in the v5 table,
//! leaning on the domain type's serde round-trip law.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use career_coordination_core::core::identifiers::ResumeId;
use career_coordination_core::domain::IngestedResume;
use career_coordination_core::domain::ResumeMeta;
use career_coordination_core::domain::ResumeTokenIr;
use career_coordination_core::ingest::ResumeStore;
use career_coordination_core::storage::StoreError;
use career_coordination_core::tokenization::ResumeTokenStore;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::db::SqliteDb;
use crate::db::db_err;

// ============================================================================
// SECTION: Resume Store
// ============================================================================

/// Durable resume store over the v4 tables.
#[derive(Debug)]
pub struct SqliteResumeStore {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteResumeStore {
    /// Creates a store over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }

    /// Selects resumes joined with their metadata by an arbitrary filter.
    fn select_joined(
        &self,
        where_clause: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<IngestedResume>, StoreError> {
        let conn = self.db.lock()?;
        let sql = format!(
            "SELECT r.resume_id, r.resume_md, r.resume_hash, r.created_at,
                    m.source_path, m.source_hash, m.extraction_method,
                    m.extracted_at, m.ingestion_version
             FROM resumes r JOIN resume_meta m ON m.resume_id = r.resume_id
             {where_clause} ORDER BY r.resume_id"
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(bind, |row| {
                Ok(IngestedResume {
                    resume_id: ResumeId::new(row.get::<_, String>(0)?),
                    resume_md: row.get(1)?,
                    resume_hash: row.get(2)?,
                    created_at: row.get(3)?,
                    meta: ResumeMeta {
                        source_path: row.get(4)?,
                        source_hash: row.get(5)?,
                        extraction_method: row.get(6)?,
                        extracted_at: row.get(7)?,
                        ingestion_version: row.get(8)?,
                    },
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}

impl ResumeStore for SqliteResumeStore {
    fn upsert(&self, resume: &IngestedResume) -> Result<(), StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO resumes (resume_id, resume_md, resume_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(resume_id) DO UPDATE SET
               resume_md   = excluded.resume_md,
               resume_hash = excluded.resume_hash,
               created_at  = excluded.created_at",
            params![
                resume.resume_id.as_str(),
                resume.resume_md,
                resume.resume_hash,
                resume.created_at,
            ],
        )
        .map_err(db_err)?;
        tx.execute(
            "INSERT INTO resume_meta
               (resume_id, source_path, source_hash, extraction_method,
                extracted_at, ingestion_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(resume_id) DO UPDATE SET
               source_path       = excluded.source_path,
               source_hash       = excluded.source_hash,
               extraction_method = excluded.extraction_method,
               extracted_at      = excluded.extracted_at,
               ingestion_version = excluded.ingestion_version",
            params![
                resume.resume_id.as_str(),
                resume.meta.source_path,
                resume.meta.source_hash,
                resume.meta.extraction_method,
                resume.meta.extracted_at,
                resume.meta.ingestion_version,
            ],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)
    }

    fn get(&self, id: &ResumeId) -> Result<Option<IngestedResume>, StoreError> {
        let resumes = self.select_joined("WHERE r.resume_id = ?1", &[&id.as_str()])?;
        Ok(resumes.into_iter().next())
    }

    fn get_by_hash(&self, resume_hash: &str) -> Result<Option<IngestedResume>, StoreError> {
        let resumes = self.select_joined("WHERE r.resume_hash = ?1", &[&resume_hash])?;
        Ok(resumes.into_iter().next())
    }

    fn list_all(&self) -> Result<Vec<IngestedResume>, StoreError> {
        self.select_joined("", &[])
    }
}

// ============================================================================
// SECTION: Token IR Store
// ============================================================================

/// Durable token IR store over the v5 table.
#[derive(Debug)]
pub struct SqliteResumeTokenStore {
    /// Shared database handle.
    db: Arc<SqliteDb>,
}

impl SqliteResumeTokenStore {
    /// Creates a store over the shared handle.
    #[must_use]
    pub fn new(db: Arc<SqliteDb>) -> Self {
        Self { db }
    }
}

impl ResumeTokenStore for SqliteResumeTokenStore {
    fn upsert(&self, resume_id: &ResumeId, ir: &ResumeTokenIr) -> Result<(), StoreError> {
        let ir_json = serde_json::to_string(ir).map_err(|err| StoreError::Store(err.to_string()))?;
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO resume_token_ir (resume_id, ir_json) VALUES (?1, ?2)
             ON CONFLICT(resume_id) DO UPDATE SET ir_json = excluded.ir_json",
            params![resume_id.as_str(), ir_json],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn get(&self, resume_id: &ResumeId) -> Result<Option<ResumeTokenIr>, StoreError> {
        let conn = self.db.lock()?;
        let ir_json: Option<String> = conn
            .query_row(
                "SELECT ir_json FROM resume_token_ir WHERE resume_id = ?1",
                params![resume_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        ir_json
            .map(|text| {
                serde_json::from_str(&text).map_err(|err| StoreError::Corrupt(err.to_string()))
            })
            .transpose()
    }
}
