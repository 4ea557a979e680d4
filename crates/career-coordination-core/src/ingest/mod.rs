// crates/career-coordination-core/src/ingest/mod.rs
// ============================================================================
// Module: Resume Ingest
// Description: Format adapters, hygiene normalization, and resume storage.
// Purpose: Produce canonical resume markdown with provenance hashes.
// Dependencies: crate::core, crate::domain
// ============================================================================

//! ## Overview
//! Ingestion converts source bytes into canonical markdown: a format adapter
//! extracts text (markdown passes through, plain text is wrapped under a
//! `# Resume` heading; binary formats plug in behind the same seam), then the
//! hygiene pipeline normalizes line endings, trims trailing whitespace,
//! collapses runs of blank lines, and tidies ATX headings. The resulting
//! markdown is hashed with SHA-256 (`resume_hash`) while the raw pre-hygiene
//! bytes get a stable 64-bit fingerprint (`meta.source_hash`). The resume
//! store keys by identifier with a secondary content-hash lookup for
//! deduplication.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;

use crate::core::hashing::sha256_hex;
use crate::core::hashing::stable_hash64_hex;
use crate::core::identifiers::ResumeId;
use crate::core::providers::Clock;
use crate::core::providers::IdGenerator;
use crate::domain::IngestedResume;
use crate::domain::ResumeMeta;
use crate::storage::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Ingestion pipeline version recorded in resume metadata.
pub const INGESTION_VERSION: &str = "0.3";

/// Maximum consecutive blank lines retained by hygiene.
const MAX_BLANK_RUN: usize = 2;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Resume ingestion errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input could not be read.
    #[error("ingest read error: {0}")]
    Read(String),
    /// Input format is not supported.
    #[error("unsupported resume format: {0}")]
    UnsupportedFormat(String),
    /// Adapter failed to extract text.
    #[error("ingest extraction error: {0}")]
    Extraction(String),
}

// ============================================================================
// SECTION: Hygiene
// ============================================================================

/// Converts CRLF and bare CR line endings to LF.
#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Removes trailing spaces and tabs from every line.
#[must_use]
pub fn trim_trailing_whitespace(text: &str) -> String {
    let had_final_newline = text.ends_with('\n');
    let lines: Vec<&str> = text.lines().map(|line| line.trim_end_matches([' ', '\t'])).collect();
    let mut result = lines.join("\n");
    if had_final_newline {
        result.push('\n');
    }
    result
}

/// Collapses runs of more than two consecutive blank lines.
#[must_use]
pub fn collapse_blank_lines(text: &str) -> String {
    let had_final_newline = text.ends_with('\n');
    let mut result = String::with_capacity(text.len());
    let mut blank_run = 0_usize;
    for line in text.lines() {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > MAX_BLANK_RUN {
                continue;
            }
        } else {
            blank_run = 0;
        }
        result.push_str(line);
        result.push('\n');
    }
    if !had_final_newline && result.ends_with('\n') {
        result.pop();
    }
    result
}

/// Normalizes ATX headings to `#... text` with a single separating space.
#[must_use]
pub fn normalize_headings(text: &str) -> String {
    let had_final_newline = text.ends_with('\n');
    let mut result = String::with_capacity(text.len());
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix('#') {
            let extra_hashes = rest.chars().take_while(|ch| *ch == '#').count();
            let body = &rest[extra_hashes..];
            let trimmed = body.trim_start_matches([' ', '\t']);
            if trimmed.is_empty() {
                result.push_str(line);
            } else {
                result.push('#');
                result.push_str(&"#".repeat(extra_hashes));
                result.push(' ');
                result.push_str(trimmed);
            }
        } else {
            result.push_str(line);
        }
        result.push('\n');
    }
    if !had_final_newline && result.ends_with('\n') {
        result.pop();
    }
    result
}

/// Applies the full hygiene pipeline in its fixed order.
#[must_use]
pub fn apply_hygiene(text: &str) -> String {
    let text = normalize_line_endings(text);
    let text = trim_trailing_whitespace(&text);
    let text = collapse_blank_lines(&text);
    normalize_headings(&text)
}

// ============================================================================
// SECTION: Format Adapters
// ============================================================================

/// Converts source bytes of one format into markdown text.
pub trait FormatAdapter: Send + Sync {
    /// Extraction method label recorded in resume metadata.
    fn extraction_method(&self) -> &'static str;

    /// Extracts markdown from raw source bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when the bytes are empty or malformed.
    fn extract(&self, data: &[u8]) -> Result<String, IngestError>;
}

/// Markdown pass-through adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownAdapter;

impl FormatAdapter for MarkdownAdapter {
    fn extraction_method(&self) -> &'static str {
        "md-pass-through-v1"
    }

    fn extract(&self, data: &[u8]) -> Result<String, IngestError> {
        if data.is_empty() {
            return Err(IngestError::Extraction("Empty input data".to_string()));
        }
        String::from_utf8(data.to_vec())
            .map_err(|err| IngestError::Extraction(format!("Invalid UTF-8: {err}")))
    }
}

/// Plain-text adapter wrapping content under a `# Resume` heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAdapter;

impl FormatAdapter for TextAdapter {
    fn extraction_method(&self) -> &'static str {
        "txt-wrap-v1"
    }

    fn extract(&self, data: &[u8]) -> Result<String, IngestError> {
        if data.is_empty() {
            return Err(IngestError::Extraction("Empty input data".to_string()));
        }
        let text = String::from_utf8(data.to_vec())
            .map_err(|err| IngestError::Extraction(format!("Invalid UTF-8: {err}")))?;
        Ok(format!("# Resume\n\n{text}"))
    }
}

/// Returns the adapter for a format label (`md`, `markdown`, `txt`).
#[must_use]
pub fn adapter_for_format(format: &str) -> Option<Box<dyn FormatAdapter>> {
    match format {
        "md" | "markdown" => Some(Box::new(MarkdownAdapter)),
        "txt" | "text" => Some(Box::new(TextAdapter)),
        _ => None,
    }
}

/// Detects a format label from a file path extension.
#[must_use]
pub fn detect_format(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

// ============================================================================
// SECTION: Ingestor
// ============================================================================

/// Options controlling one ingestion.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Original file path recorded in metadata.
    pub source_path: Option<String>,
    /// Timestamp override for deterministic tests; `None` uses the clock.
    pub extracted_at: Option<String>,
    /// Whether to apply hygiene normalization; defaults to true via
    /// [`IngestOptions::default_enabled`].
    pub disable_hygiene: bool,
}

impl IngestOptions {
    /// Returns whether hygiene is enabled.
    #[must_use]
    pub const fn default_enabled(&self) -> bool {
        !self.disable_hygiene
    }
}

/// Resume ingestion seam.
pub trait ResumeIngestor: Send + Sync {
    /// Ingests a resume from a file path, detecting the format from its
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when the file cannot be read or the format is
    /// unsupported.
    fn ingest_file(
        &self,
        file_path: &str,
        options: &IngestOptions,
        id_gen: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<IngestedResume, IngestError>;

    /// Ingests a resume from raw bytes with an explicit format label.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when the format is unsupported or extraction
    /// fails.
    fn ingest_bytes(
        &self,
        data: &[u8],
        format: &str,
        options: &IngestOptions,
        id_gen: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<IngestedResume, IngestError>;
}

/// Default ingestor over the built-in format adapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResumeIngestor;

impl DefaultResumeIngestor {
    /// Creates the default ingestor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ResumeIngestor for DefaultResumeIngestor {
    fn ingest_file(
        &self,
        file_path: &str,
        options: &IngestOptions,
        id_gen: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<IngestedResume, IngestError> {
        let format = detect_format(file_path)
            .ok_or_else(|| IngestError::UnsupportedFormat(format!("no extension: {file_path}")))?;
        let data = std::fs::read(file_path)
            .map_err(|err| IngestError::Read(format!("{file_path}: {err}")))?;
        let mut options = options.clone();
        if options.source_path.is_none() {
            options.source_path = Some(file_path.to_string());
        }
        self.ingest_bytes(&data, &format, &options, id_gen, clock)
    }

    fn ingest_bytes(
        &self,
        data: &[u8],
        format: &str,
        options: &IngestOptions,
        id_gen: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<IngestedResume, IngestError> {
        let adapter = adapter_for_format(format)
            .ok_or_else(|| IngestError::UnsupportedFormat(format.to_string()))?;
        let extracted = adapter.extract(data)?;
        let resume_md = if options.default_enabled() {
            apply_hygiene(&extracted)
        } else {
            extracted
        };

        let extracted_at = options
            .extracted_at
            .clone()
            .or_else(|| Some(clock.now_iso8601()));

        Ok(IngestedResume {
            resume_id: ResumeId::new(id_gen.next("resume")),
            resume_hash: sha256_hex(resume_md.as_bytes()),
            resume_md,
            meta: ResumeMeta {
                source_path: options.source_path.clone(),
                source_hash: stable_hash64_hex(data),
                extraction_method: adapter.extraction_method().to_string(),
                extracted_at,
                ingestion_version: INGESTION_VERSION.to_string(),
            },
            created_at: None,
        })
    }
}

// ============================================================================
// SECTION: Resume Store
// ============================================================================

/// Storage contract for ingested resumes.
pub trait ResumeStore: Send + Sync {
    /// Inserts or replaces a resume under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert(&self, resume: &IngestedResume) -> Result<(), StoreError>;

    /// Returns the resume with the given identifier, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, id: &ResumeId) -> Result<Option<IngestedResume>, StoreError>;

    /// Returns the resume with the given content hash, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get_by_hash(&self, resume_hash: &str) -> Result<Option<IngestedResume>, StoreError>;

    /// Returns all resumes ordered by identifier ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_all(&self) -> Result<Vec<IngestedResume>, StoreError>;
}

/// In-memory resume store.
#[derive(Debug, Default)]
pub struct InMemoryResumeStore {
    /// Resumes keyed by identifier.
    resumes: Mutex<BTreeMap<String, IngestedResume>>,
}

impl InMemoryResumeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResumeStore for InMemoryResumeStore {
    fn upsert(&self, resume: &IngestedResume) -> Result<(), StoreError> {
        let mut resumes = self
            .resumes
            .lock()
            .map_err(|_| StoreError::Store("resume lock poisoned".to_string()))?;
        resumes.insert(resume.resume_id.as_str().to_string(), resume.clone());
        Ok(())
    }

    fn get(&self, id: &ResumeId) -> Result<Option<IngestedResume>, StoreError> {
        let resumes = self
            .resumes
            .lock()
            .map_err(|_| StoreError::Store("resume lock poisoned".to_string()))?;
        Ok(resumes.get(id.as_str()).cloned())
    }

    fn get_by_hash(&self, resume_hash: &str) -> Result<Option<IngestedResume>, StoreError> {
        let resumes = self
            .resumes
            .lock()
            .map_err(|_| StoreError::Store("resume lock poisoned".to_string()))?;
        Ok(resumes
            .values()
            .find(|resume| resume.resume_hash == resume_hash)
            .cloned())
    }

    fn list_all(&self) -> Result<Vec<IngestedResume>, StoreError> {
        let resumes = self
            .resumes
            .lock()
            .map_err(|_| StoreError::Store("resume lock poisoned".to_string()))?;
        Ok(resumes.values().cloned().collect())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
