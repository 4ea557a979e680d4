// crates/career-coordination-store-sqlite/src/vectors.rs
// ============================================================================
// Module: SQLite Embedding Index
// Description: Durable vector store with deterministic cosine ranking.
// Purpose: Persist embeddings as float32 BLOBs in a dedicated database file.
// Dependencies: career-coordination-core, rusqlite
// ============================================================================

//! ## Overview
//! Vectors persist as little-endian float32 BLOBs with an explicit dimension
//! column and metadata JSON, in a database file separate from the entity
//! store. Queries load all vectors and rank with the shared cosine and
//! tie-break helpers, so durable and in-memory indexes return identical
//! orderings for identical inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Mutex;

use career_coordination_core::embedding::EmbeddingIndex;
use career_coordination_core::embedding::EmbeddingIndexError;
use career_coordination_core::embedding::SearchResult;
use career_coordination_core::embedding::Vector;
use career_coordination_core::embedding::cosine_similarity;
use career_coordination_core::embedding::rank_results;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Vector table schema (own database file, version-free).
const VECTOR_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS embedding_vectors (
    key           TEXT PRIMARY KEY,
    vector_blob   BLOB NOT NULL,
    dimension     INTEGER NOT NULL,
    metadata_json TEXT NOT NULL
);";

// ============================================================================
// SECTION: Byte Conversion
// ============================================================================

/// Serializes a vector to little-endian float32 bytes.
fn to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Deserializes little-endian float32 bytes into a vector.
fn from_blob(blob: &[u8]) -> Vector {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

// ============================================================================
// SECTION: Embedding Index
// ============================================================================

/// Durable embedding index over its own SQLite file.
#[derive(Debug)]
pub struct SqliteEmbeddingIndex {
    /// Dedicated vector database connection.
    conn: Mutex<Connection>,
}

impl SqliteEmbeddingIndex {
    /// Opens (creating if needed) the vector database file.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingIndexError`] when the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EmbeddingIndexError> {
        let conn = Connection::open(path.as_ref()).map_err(|err| {
            EmbeddingIndexError::Backend(format!("open {}: {err}", path.as_ref().display()))
        })?;
        Self::initialize(conn)
    }

    /// Opens an in-memory vector database (tests).
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingIndexError`] when the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, EmbeddingIndexError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| EmbeddingIndexError::Backend(format!("open in-memory: {err}")))?;
        Self::initialize(conn)
    }

    /// Applies the schema and wraps the connection.
    fn initialize(conn: Connection) -> Result<Self, EmbeddingIndexError> {
        conn.execute_batch(VECTOR_SCHEMA)
            .map_err(|err| EmbeddingIndexError::Backend(format!("schema: {err}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Locks the connection for one operation.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, EmbeddingIndexError> {
        self.conn
            .lock()
            .map_err(|_| EmbeddingIndexError::Backend("vector lock poisoned".to_string()))
    }
}

impl EmbeddingIndex for SqliteEmbeddingIndex {
    fn upsert(
        &self,
        key: &str,
        embedding: &[f32],
        metadata: &str,
    ) -> Result<(), EmbeddingIndexError> {
        let conn = self.lock()?;
        let dimension = i64::try_from(embedding.len())
            .map_err(|_| EmbeddingIndexError::Backend("dimension overflow".to_string()))?;
        conn.execute(
            "INSERT INTO embedding_vectors (key, vector_blob, dimension, metadata_json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
               vector_blob   = excluded.vector_blob,
               dimension     = excluded.dimension,
               metadata_json = excluded.metadata_json",
            params![key, to_blob(embedding), dimension, metadata],
        )
        .map_err(|err| EmbeddingIndexError::Backend(err.to_string()))?;
        Ok(())
    }

    fn query(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>, EmbeddingIndexError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key, vector_blob, metadata_json FROM embedding_vectors ORDER BY key")
            .map_err(|err| EmbeddingIndexError::Backend(err.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                let metadata: String = row.get(2)?;
                Ok((key, blob, metadata))
            })
            .map_err(|err| EmbeddingIndexError::Backend(err.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let (key, blob, metadata) =
                row.map_err(|err| EmbeddingIndexError::Backend(err.to_string()))?;
            let embedding = from_blob(&blob);
            results.push(SearchResult {
                key,
                score: cosine_similarity(query, &embedding),
                metadata,
            });
        }
        rank_results(&mut results);
        results.truncate(top_k);
        Ok(results)
    }

    fn get(&self, key: &str) -> Result<Option<Vector>, EmbeddingIndexError> {
        let conn = self.lock()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT vector_blob FROM embedding_vectors WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| EmbeddingIndexError::Backend(err.to_string()))?;
        Ok(blob.map(|bytes| from_blob(&bytes)))
    }
}
