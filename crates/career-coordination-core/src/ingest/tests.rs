// crates/career-coordination-core/src/ingest/tests.rs
// ============================================================================
// Module: Resume Ingest Tests
// Description: Unit tests for hygiene, adapters, and the default ingestor.
// Purpose: Pin canonicalization and provenance hash behavior.
// Dependencies: career-coordination-core
// ============================================================================

//! ## Overview
//! Covers each hygiene pass, hygiene idempotence, adapter extraction, and the
//! provenance hashes produced by byte-level ingestion.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::hashing::sha256_hex;
use crate::core::hashing::stable_hash64_hex;
use crate::core::providers::DeterministicIdGenerator;
use crate::core::providers::FixedClock;

use super::DefaultResumeIngestor;
use super::IngestError;
use super::IngestOptions;
use super::InMemoryResumeStore;
use super::ResumeIngestor;
use super::ResumeStore;
use super::apply_hygiene;
use super::collapse_blank_lines;
use super::detect_format;
use super::normalize_headings;
use super::normalize_line_endings;
use super::trim_trailing_whitespace;

// ============================================================================
// SECTION: Hygiene Passes
// ============================================================================

#[test]
fn line_endings_normalize_to_lf() {
    assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
}

#[test]
fn trailing_whitespace_is_trimmed_per_line() {
    assert_eq!(trim_trailing_whitespace("a  \nb\t\nc"), "a\nb\nc");
    assert_eq!(trim_trailing_whitespace("a  \n"), "a\n");
}

#[test]
fn blank_runs_collapse_to_two() {
    assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\n\nb");
    assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
}

#[test]
fn atx_headings_get_single_space() {
    assert_eq!(normalize_headings("#Title\n##  Sub\ntext"), "# Title\n## Sub\ntext");
    assert_eq!(normalize_headings("###\n"), "###\n");
}

#[test]
fn hygiene_is_idempotent() {
    let messy = "#Title\r\n\r\n\r\n\r\nBody line  \r\n##  Section\t\nmore";
    let once = apply_hygiene(messy);
    let twice = apply_hygiene(&once);
    assert_eq!(once, twice);
}

// ============================================================================
// SECTION: Adapters and Format Detection
// ============================================================================

#[test]
fn format_detection_uses_lowercased_extension() {
    assert_eq!(detect_format("/tmp/resume.MD"), Some("md".to_string()));
    assert_eq!(detect_format("resume.txt"), Some("txt".to_string()));
    assert_eq!(detect_format("resume"), None);
}

#[test]
fn unsupported_format_is_rejected() {
    let ingestor = DefaultResumeIngestor::new();
    let err = ingestor
        .ingest_bytes(
            b"data",
            "docx",
            &IngestOptions::default(),
            &DeterministicIdGenerator::new(),
            &FixedClock::new("2026-01-01T00:00:00Z"),
        )
        .expect_err("docx extraction is not wired in");
    assert!(matches!(err, IngestError::UnsupportedFormat(_)));
}

#[test]
fn empty_input_is_rejected() {
    let ingestor = DefaultResumeIngestor::new();
    let err = ingestor
        .ingest_bytes(
            b"",
            "md",
            &IngestOptions::default(),
            &DeterministicIdGenerator::new(),
            &FixedClock::new("2026-01-01T00:00:00Z"),
        )
        .expect_err("empty input");
    assert!(matches!(err, IngestError::Extraction(_)));
}

// ============================================================================
// SECTION: Ingestion
// ============================================================================

#[test]
fn markdown_ingestion_binds_both_hashes() {
    let raw = b"# Resume\r\n\r\nBuilt cpp20 systems  \n";
    let ingestor = DefaultResumeIngestor::new();
    let resume = ingestor
        .ingest_bytes(
            raw,
            "md",
            &IngestOptions::default(),
            &DeterministicIdGenerator::new(),
            &FixedClock::new("2026-01-01T00:00:00Z"),
        )
        .expect("ingest");

    assert_eq!(resume.resume_id.as_str(), "resume-0");
    assert_eq!(resume.resume_md, "# Resume\n\nBuilt cpp20 systems\n");
    assert_eq!(resume.resume_hash, sha256_hex(resume.resume_md.as_bytes()));
    assert_eq!(resume.meta.source_hash, stable_hash64_hex(raw));
    assert_eq!(resume.meta.extraction_method, "md-pass-through-v1");
    assert_eq!(resume.meta.extracted_at.as_deref(), Some("2026-01-01T00:00:00Z"));
}

#[test]
fn text_ingestion_wraps_under_resume_heading() {
    let ingestor = DefaultResumeIngestor::new();
    let resume = ingestor
        .ingest_bytes(
            b"plain text resume",
            "txt",
            &IngestOptions::default(),
            &DeterministicIdGenerator::new(),
            &FixedClock::new("2026-01-01T00:00:00Z"),
        )
        .expect("ingest");
    assert!(resume.resume_md.starts_with("# Resume\n\n"));
    assert_eq!(resume.meta.extraction_method, "txt-wrap-v1");
}

#[test]
fn ingestion_is_deterministic_under_fixed_providers() {
    let ingestor = DefaultResumeIngestor::new();
    let run = || {
        ingestor
            .ingest_bytes(
                b"# Resume\n\nDid things\n",
                "md",
                &IngestOptions::default(),
                &DeterministicIdGenerator::new(),
                &FixedClock::new("2026-01-01T00:00:00Z"),
            )
            .expect("ingest")
    };
    assert_eq!(run(), run());
}

// ============================================================================
// SECTION: Resume Store
// ============================================================================

#[test]
fn store_supports_hash_lookup() {
    let ingestor = DefaultResumeIngestor::new();
    let resume = ingestor
        .ingest_bytes(
            b"# Resume\n\nDid things\n",
            "md",
            &IngestOptions::default(),
            &DeterministicIdGenerator::new(),
            &FixedClock::new("2026-01-01T00:00:00Z"),
        )
        .expect("ingest");

    let store = InMemoryResumeStore::new();
    store.upsert(&resume).expect("upsert");

    let by_id = store.get(&resume.resume_id).expect("get").expect("present");
    assert_eq!(by_id, resume);
    let by_hash = store
        .get_by_hash(&resume.resume_hash)
        .expect("get_by_hash")
        .expect("present");
    assert_eq!(by_hash.resume_id, resume.resume_id);
    assert!(store.get_by_hash("missing").expect("get_by_hash").is_none());
}
