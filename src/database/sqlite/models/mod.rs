#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An ingested document, immutable after insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub content: String,
    /// JSON array of the chunk texts produced at ingestion
    pub chunks: String,
    pub processed_at: NaiveDateTime,
}

impl Document {
    #[inline]
    pub fn chunk_texts(&self) -> Vec<String> {
        serde_json::from_str(&self.chunks).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub chunk_texts: Vec<String>,
}

impl NewDocument {
    #[inline]
    pub fn new(filename: String, content: String, chunk_texts: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename,
            content,
            chunk_texts,
        }
    }
}

/// One stored chunk embedding, owned by a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EmbeddingRecord {
    pub id: String,
    pub document_id: String,
    pub chunk_text: String,
    /// JSON array of f32 components
    pub embedding: String,
    pub chunk_index: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEmbedding {
    pub id: String,
    pub document_id: String,
    pub chunk_text: String,
    pub vector: Vec<f32>,
    pub chunk_index: i64,
}

impl NewEmbedding {
    #[inline]
    pub fn new(document_id: String, chunk_text: String, vector: Vec<f32>, chunk_index: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id,
            chunk_text,
            vector,
            chunk_index,
        }
    }
}

/// Embedding row joined with its document's filename, as returned by the
/// full-corpus scan used during retrieval
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StoredEmbedding {
    pub id: String,
    pub document_id: String,
    pub filename: String,
    pub chunk_text: String,
    pub embedding: String,
    pub chunk_index: i64,
}

impl StoredEmbedding {
    /// Parse the stored vector; `None` marks a malformed record, which
    /// retrieval treats as zero similarity rather than an error
    #[inline]
    pub fn vector(&self) -> Option<Vec<f32>> {
        serde_json::from_str(&self.embedding).ok()
    }
}
