// crates/career-coordination-core/src/domain/resume.rs
// ============================================================================
// Module: Ingested Resumes
// Description: Canonical resume markdown with ingestion provenance.
// Purpose: Bind resume content to its hashes and extraction metadata.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An ingested resume is the canonical markdown produced by a format adapter
//! plus hygiene, together with the hashes that bind derived artifacts (such
//! as the token IR) back to it. `resume_hash` is a secondary unique key used
//! for content-based deduplication.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ResumeId;

// ============================================================================
// SECTION: Resume Metadata
// ============================================================================

/// Provenance metadata captured at ingestion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeMeta {
    /// Original file path, when ingested from a file.
    pub source_path: Option<String>,
    /// Stable hash of the raw pre-hygiene source bytes.
    pub source_hash: String,
    /// Extraction method label (for example `md-pass-through-v1`).
    pub extraction_method: String,
    /// Extraction timestamp; `None` for deterministic test fixtures.
    pub extracted_at: Option<String>,
    /// Ingestion pipeline version.
    pub ingestion_version: String,
}

// ============================================================================
// SECTION: Ingested Resume
// ============================================================================

/// Canonical ingested resume.
///
/// # Invariants
/// - `resume_hash` is the SHA-256 hex digest of `resume_md`.
/// - `meta.source_hash` fingerprints the raw bytes before hygiene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedResume {
    /// Resume identifier.
    pub resume_id: ResumeId,
    /// Canonical markdown content after hygiene.
    pub resume_md: String,
    /// SHA-256 hex digest of `resume_md`; secondary unique key.
    pub resume_hash: String,
    /// Ingestion provenance.
    pub meta: ResumeMeta,
    /// Timestamp when stored; `None` for deterministic test fixtures.
    pub created_at: Option<String>,
}
