// crates/career-coordination-core/src/embedding/mod.rs
// ============================================================================
// Module: Embedding Subsystem
// Description: Text-to-vector providers and similarity indexes.
// Purpose: Supply the semantic retrieval seam used by hybrid matching.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The embedding provider converts text to a fixed-dimension vector; the
//! embedding index stores vectors by key and answers top-k cosine queries
//! with a deterministic ordering (score descending, key ascending on ties).
//! Two providers live here: a null provider that disables semantic retrieval
//! and a deterministic stub that hashes token histograms into buckets, used
//! wherever bit-reproducible output is required. Real model integrations
//! plug in behind [`EmbeddingProvider`] and must honor its determinism
//! contract (identical input, identical output).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::hashing::stable_hash64;
use crate::core::hashing::stable_hash64_hex;
use crate::core::normalize::tokenize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default dimension for the deterministic stub provider.
pub const DEFAULT_STUB_DIMENSION: usize = 128;

/// Absolute tolerance for score comparisons during ranking.
const SCORE_EPSILON: f64 = 1e-9;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Embedding vector type.
pub type Vector = Vec<f32>;

/// Converts text to a fixed-dimension vector.
///
/// Determinism contract: identical input yields byte-identical output.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds text into a vector of [`EmbeddingProvider::dimension`] entries.
    /// An empty return value disables embedding retrieval.
    fn embed_text(&self, text: &str) -> Vector;

    /// Returns the embedding dimension; zero disables embedding retrieval.
    fn dimension(&self) -> usize;
}

/// Provider that returns empty vectors, disabling semantic retrieval.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmbeddingProvider;

impl EmbeddingProvider for NullEmbeddingProvider {
    fn embed_text(&self, _text: &str) -> Vector {
        Vec::new()
    }

    fn dimension(&self) -> usize {
        0
    }
}

/// Deterministic stub provider hashing token histograms into buckets.
///
/// Each token's count is added at `stable_hash64(token) mod dim` and spread
/// at weight 0.3 to both neighbour buckets (mod dim); the result is
/// L2-normalized. Empty text yields the zero vector.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicStubEmbeddingProvider {
    /// Output vector dimension.
    dimension: usize,
}

impl DeterministicStubEmbeddingProvider {
    /// Creates a stub provider with the given dimension.
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for DeterministicStubEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_STUB_DIMENSION)
    }
}

impl EmbeddingProvider for DeterministicStubEmbeddingProvider {
    fn embed_text(&self, text: &str) -> Vector {
        if self.dimension == 0 {
            return Vec::new();
        }

        let mut embedding = vec![0.0_f32; self.dimension];
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return embedding;
        }

        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }

        let dim = self.dimension as u64;
        for (token, count) in counts {
            let bucket = usize::try_from(stable_hash64(token.as_bytes()) % dim).unwrap_or(0);
            #[allow(clippy::cast_precision_loss, reason = "Token counts stay far below f32 precision limits.")]
            let weight = count as f32;
            let prev = (bucket + self.dimension - 1) % self.dimension;
            let next = (bucket + 1) % self.dimension;
            embedding[bucket] += weight;
            embedding[prev] += weight * 0.3;
            embedding[next] += weight * 0.3;
        }

        let norm = embedding.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// SECTION: Index
// ============================================================================

/// One similarity search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Vector key (atom identifier or prefixed artifact key).
    pub key: String,
    /// Cosine similarity score against the query vector.
    pub score: f64,
    /// Opaque metadata JSON stored with the vector.
    pub metadata: String,
}

/// Vector store keyed by artifact, answering deterministic top-k queries.
pub trait EmbeddingIndex: Send + Sync {
    /// Inserts or replaces a vector and its metadata under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingIndexError`] when the backend rejects the write.
    fn upsert(&self, key: &str, embedding: &[f32], metadata: &str)
    -> Result<(), EmbeddingIndexError>;

    /// Returns the `top_k` nearest vectors by cosine similarity, sorted by
    /// score descending with lexicographic key tie-breaks.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingIndexError`] when the backend read fails.
    fn query(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>, EmbeddingIndexError>;

    /// Returns the stored vector for `key`, when present.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingIndexError`] when the backend read fails.
    fn get(&self, key: &str) -> Result<Option<Vector>, EmbeddingIndexError>;
}

/// Embedding index errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingIndexError {
    /// Backend storage failure.
    #[error("embedding index backend error: {0}")]
    Backend(String),
    /// Index implementation reserved for future use was invoked.
    #[error("embedding index unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Similarity
// ============================================================================

/// Computes cosine similarity; zero when dimensions differ or a norm is zero.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (lhs, rhs) in a.iter().zip(b.iter()) {
        dot += f64::from(*lhs) * f64::from(*rhs);
        norm_a += f64::from(*lhs) * f64::from(*lhs);
        norm_b += f64::from(*rhs) * f64::from(*rhs);
    }

    let norm = norm_a.sqrt() * norm_b.sqrt();
    if norm == 0.0 { 0.0 } else { dot / norm }
}

/// Ranks search results: score descending, then key ascending within the
/// shared comparison tolerance.
pub fn rank_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        if (a.score - b.score).abs() > SCORE_EPSILON {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        } else {
            a.key.cmp(&b.key)
        }
    });
}

/// Computes the stable hash of a vector's little-endian float bytes.
#[must_use]
pub fn vector_hash(embedding: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    stable_hash64_hex(&bytes)
}

// ============================================================================
// SECTION: In-memory Index
// ============================================================================

/// In-memory embedding index backed by an ordered map.
///
/// # Invariants
/// - Query ordering matches the durable index implementations exactly.
#[derive(Debug, Default)]
pub struct InMemoryEmbeddingIndex {
    /// Vector storage keyed by artifact key.
    vectors: Mutex<BTreeMap<String, (Vector, String)>>,
}

impl InMemoryEmbeddingIndex {
    /// Creates an empty in-memory index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the underlying map, mapping a poisoned lock to a backend error.
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, (Vector, String)>>, EmbeddingIndexError>
    {
        self.vectors
            .lock()
            .map_err(|_| EmbeddingIndexError::Backend("index lock poisoned".to_string()))
    }
}

impl EmbeddingIndex for InMemoryEmbeddingIndex {
    fn upsert(
        &self,
        key: &str,
        embedding: &[f32],
        metadata: &str,
    ) -> Result<(), EmbeddingIndexError> {
        let mut vectors = self.lock()?;
        vectors.insert(key.to_string(), (embedding.to_vec(), metadata.to_string()));
        Ok(())
    }

    fn query(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>, EmbeddingIndexError> {
        let vectors = self.lock()?;
        let mut results: Vec<SearchResult> = vectors
            .iter()
            .map(|(key, (embedding, metadata))| SearchResult {
                key: key.clone(),
                score: cosine_similarity(query, embedding),
                metadata: metadata.clone(),
            })
            .collect();
        rank_results(&mut results);
        results.truncate(top_k);
        Ok(results)
    }

    fn get(&self, key: &str) -> Result<Option<Vector>, EmbeddingIndexError> {
        let vectors = self.lock()?;
        Ok(vectors.get(key).map(|(embedding, _)| embedding.clone()))
    }
}

// ============================================================================
// SECTION: Reserved Index
// ============================================================================

/// Placeholder index for a backend that is configured but not yet available.
///
/// # Invariants
/// - Every operation fails with [`EmbeddingIndexError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct UnavailableEmbeddingIndex {
    /// Backend label reported in errors.
    backend: String,
}

impl UnavailableEmbeddingIndex {
    /// Creates a reserved index stub for the named backend.
    #[must_use]
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
        }
    }
}

impl EmbeddingIndex for UnavailableEmbeddingIndex {
    fn upsert(
        &self,
        _key: &str,
        _embedding: &[f32],
        _metadata: &str,
    ) -> Result<(), EmbeddingIndexError> {
        Err(EmbeddingIndexError::Unavailable(self.backend.clone()))
    }

    fn query(
        &self,
        _query: &[f32],
        _top_k: usize,
    ) -> Result<Vec<SearchResult>, EmbeddingIndexError> {
        Err(EmbeddingIndexError::Unavailable(self.backend.clone()))
    }

    fn get(&self, _key: &str) -> Result<Option<Vector>, EmbeddingIndexError> {
        Err(EmbeddingIndexError::Unavailable(self.backend.clone()))
    }
}

// ============================================================================
// SECTION: Metadata Helper
// ============================================================================

/// Builds the metadata JSON stored with indexed vectors.
#[must_use]
pub fn vector_metadata(artifact_type: &str, artifact_id: &str, source_hash: &str) -> String {
    serde_json::json!({
        "artifact_type": artifact_type,
        "artifact_id": artifact_id,
        "source_hash": source_hash,
    })
    .to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
