// crates/career-coordination-core/src/tokenization/mod.rs
// ============================================================================
// Module: Resume Tokenization
// Description: Deterministic token IR providers over canonical resumes.
// Purpose: Derive validated token layers bound to their source hash.
// Dependencies: crate::core, crate::domain
// ============================================================================

//! ## Overview
//! Tokenization providers turn canonical resume markdown into a
//! [`ResumeTokenIr`] bound to the resume hash. The deterministic lexical
//! tokenizer is the no-inference baseline: sorted, deduplicated tokens with
//! an optional stop-word filter, stored under the `lexical` category. The
//! stub inference tokenizer stands in for model-assisted tokenizers in tests,
//! deriving categories from deterministic keyword buckets so TOK-series rules
//! have multi-category fixtures to chew on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::core::identifiers::ResumeId;
use crate::core::normalize::tokenize;
use crate::domain::ResumeTokenIr;
use crate::domain::TokenizerMetadata;
use crate::domain::TokenizerType;
use crate::domain::token_ir::TOKEN_IR_SCHEMA_VERSION;
use crate::storage::StoreError;

// ============================================================================
// SECTION: Stop Words
// ============================================================================

/// Common English stop words filtered by the lexical tokenizer.
///
/// The list is fixed so filtering stays reproducible.
const STOP_WORDS: &[&str] = &[
    // Articles
    "an", "the",
    // Prepositions
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beneath", "beside", "between", "beyond", "by", "down", "during", "except",
    "for", "from", "in", "inside", "into", "near", "of", "off", "on", "onto", "out", "outside",
    "over", "past", "since", "through", "throughout", "to", "toward", "under", "underneath",
    "until", "up", "upon", "with", "within", "without",
    // Conjunctions
    "and", "as", "but", "if", "nor", "or", "so", "than", "that", "though", "unless", "when",
    "where", "whether", "while", "yet",
    // Pronouns
    "he", "her", "hers", "herself", "him", "himself", "his", "it", "its", "itself", "me", "mine",
    "my", "myself", "our", "ours", "ourselves", "she", "their", "theirs", "them", "themselves",
    "these", "they", "this", "those", "us", "we", "what", "which", "who", "whom", "whose", "you",
    "your", "yours", "yourself",
    // Common verbs
    "am", "are", "be", "been", "being", "can", "could", "did", "do", "does", "doing", "had",
    "has", "have", "having", "is", "may", "might", "must", "shall", "should", "was", "were",
    "will", "would",
    // Other common words
    "all", "also", "any", "ask", "back", "both", "call", "come", "each", "even", "feel", "few",
    "find", "get", "give", "got", "just", "leave", "like", "made", "make", "more", "most", "no",
    "not", "only", "other", "own", "same", "seem", "some", "still", "such", "take", "tell",
    "then", "there", "try", "use", "very", "way", "well", "work",
];

// ============================================================================
// SECTION: Provider Interface
// ============================================================================

/// Produces a token IR from canonical resume markdown.
pub trait TokenizationProvider: Send + Sync {
    /// Tokenizes `resume_md`, binding the IR to `source_hash`.
    fn tokenize(&self, resume_md: &str, source_hash: &str) -> ResumeTokenIr;
}

// ============================================================================
// SECTION: Deterministic Lexical Tokenizer
// ============================================================================

/// Baseline tokenizer: sorted unique tokens with optional stop-word filtering.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicLexicalTokenizer {
    /// Whether stop words are removed.
    filter_stop_words: bool,
}

impl DeterministicLexicalTokenizer {
    /// Creates a tokenizer with explicit stop-word filtering.
    #[must_use]
    pub const fn new(filter_stop_words: bool) -> Self {
        Self { filter_stop_words }
    }
}

impl Default for DeterministicLexicalTokenizer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Tokenizes text into sorted, deduplicated tokens.
#[must_use]
pub fn tokenize_deterministic(text: &str) -> Vec<String> {
    let unique: BTreeSet<String> = tokenize(text).into_iter().collect();
    unique.into_iter().collect()
}

impl TokenizationProvider for DeterministicLexicalTokenizer {
    fn tokenize(&self, resume_md: &str, source_hash: &str) -> ResumeTokenIr {
        let mut tokens = tokenize_deterministic(resume_md);
        if self.filter_stop_words {
            tokens.retain(|token| !STOP_WORDS.contains(&token.as_str()));
        }

        let mut categories = BTreeMap::new();
        categories.insert("lexical".to_string(), tokens);

        ResumeTokenIr {
            schema_version: TOKEN_IR_SCHEMA_VERSION.to_string(),
            source_hash: source_hash.to_string(),
            tokenizer: TokenizerMetadata {
                tokenizer_type: TokenizerType::DeterministicLexical,
                model_id: None,
                prompt_version: None,
            },
            tokens: categories,
            // Line-level spans need positional parsing the baseline skips.
            spans: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Stub Inference Tokenizer
// ============================================================================

/// Deterministic stand-in for an inference-assisted tokenizer.
///
/// Buckets tokens into `skills`, `roles`, and `domains` by fixed keyword
/// lists, with the remainder under `entities`. Output depends only on the
/// input text, so tests that need multi-category IRs stay reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubInferenceTokenizer;

/// Keywords bucketed under `skills`.
const SKILL_TOKENS: &[&str] = &[
    "architecture", "cpp", "cpp20", "distributed", "embedded", "kubernetes", "linux", "python",
    "rust", "sql", "systems", "testing",
];

/// Keywords bucketed under `roles`.
const ROLE_TOKENS: &[&str] =
    &["architect", "director", "engineer", "lead", "manager", "principal", "staff"];

/// Keywords bucketed under `domains`.
const DOMAIN_TOKENS: &[&str] =
    &["fintech", "games", "governance", "healthcare", "infrastructure", "robotics", "security"];

impl TokenizationProvider for StubInferenceTokenizer {
    fn tokenize(&self, resume_md: &str, source_hash: &str) -> ResumeTokenIr {
        let mut skills = Vec::new();
        let mut roles = Vec::new();
        let mut domains = Vec::new();
        let mut entities = Vec::new();

        for token in tokenize_deterministic(resume_md) {
            if STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            if SKILL_TOKENS.contains(&token.as_str()) {
                skills.push(token);
            } else if ROLE_TOKENS.contains(&token.as_str()) {
                roles.push(token);
            } else if DOMAIN_TOKENS.contains(&token.as_str()) {
                domains.push(token);
            } else {
                entities.push(token);
            }
        }

        let mut categories = BTreeMap::new();
        for (name, bucket) in [
            ("skills", skills),
            ("roles", roles),
            ("domains", domains),
            ("entities", entities),
        ] {
            if !bucket.is_empty() {
                categories.insert(name.to_string(), bucket);
            }
        }

        ResumeTokenIr {
            schema_version: TOKEN_IR_SCHEMA_VERSION.to_string(),
            source_hash: source_hash.to_string(),
            tokenizer: TokenizerMetadata {
                tokenizer_type: TokenizerType::InferenceAssisted,
                model_id: Some("stub-inference".to_string()),
                prompt_version: Some("resume-tokenizer-v1".to_string()),
            },
            tokens: categories,
            spans: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Token Store
// ============================================================================

/// Storage contract for derived token IRs, keyed by resume.
pub trait ResumeTokenStore: Send + Sync {
    /// Inserts or replaces the IR derived for a resume.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert(&self, resume_id: &ResumeId, ir: &ResumeTokenIr) -> Result<(), StoreError>;

    /// Returns the IR derived for a resume, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, resume_id: &ResumeId) -> Result<Option<ResumeTokenIr>, StoreError>;
}

/// In-memory token store.
#[derive(Debug, Default)]
pub struct InMemoryResumeTokenStore {
    /// IRs keyed by resume identifier.
    irs: Mutex<BTreeMap<String, ResumeTokenIr>>,
}

impl InMemoryResumeTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResumeTokenStore for InMemoryResumeTokenStore {
    fn upsert(&self, resume_id: &ResumeId, ir: &ResumeTokenIr) -> Result<(), StoreError> {
        let mut irs = self
            .irs
            .lock()
            .map_err(|_| StoreError::Store("token store lock poisoned".to_string()))?;
        irs.insert(resume_id.as_str().to_string(), ir.clone());
        Ok(())
    }

    fn get(&self, resume_id: &ResumeId) -> Result<Option<ResumeTokenIr>, StoreError> {
        let irs = self
            .irs
            .lock()
            .map_err(|_| StoreError::Store("token store lock poisoned".to_string()))?;
        Ok(irs.get(resume_id.as_str()).cloned())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
