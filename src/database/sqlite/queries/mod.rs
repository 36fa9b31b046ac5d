#[cfg(test)]
mod tests;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{Document, EmbeddingRecord, NewDocument, NewEmbedding, StoredEmbedding};

pub struct DocumentQueries;

impl DocumentQueries {
    #[inline]
    pub async fn insert(pool: &SqlitePool, new_document: &NewDocument) -> Result<Document> {
        let chunks_json = serde_json::to_string(&new_document.chunk_texts)
            .context("Failed to serialize chunk texts")?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            "INSERT INTO documents (id, filename, content, chunks, processed_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_document.id)
        .bind(&new_document.filename)
        .bind(&new_document.content)
        .bind(&chunks_json)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to insert document")?;

        Self::get_by_id(pool, &new_document.id)
            .await?
            .ok_or_else(|| anyhow!("Failed to retrieve inserted document"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Document>> {
        let result = sqlx::query_as::<_, Document>(
            "SELECT id, filename, content, chunks, processed_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get document by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn exists_by_filename(pool: &SqlitePool, filename: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE filename = ?")
                .bind(filename)
                .fetch_one(pool)
                .await
                .context("Failed to check document existence")?;

        Ok(count > 0)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(
            "SELECT id, filename, content, chunks, processed_at FROM documents ORDER BY processed_at DESC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list documents")?;

        Ok(documents)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await
            .context("Failed to count documents")?;

        Ok(count)
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete document")?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct EmbeddingQueries;

impl EmbeddingQueries {
    /// Insert a batch of embeddings in a single transaction
    #[inline]
    pub async fn insert_batch(pool: &SqlitePool, embeddings: &[NewEmbedding]) -> Result<usize> {
        if embeddings.is_empty() {
            return Ok(0);
        }

        let mut transaction = pool
            .begin()
            .await
            .context("Failed to begin transaction for batch embedding insert")?;

        for embedding in embeddings {
            let vector_json = serde_json::to_string(&embedding.vector)
                .context("Failed to serialize embedding vector")?;

            sqlx::query(
                "INSERT INTO embeddings (id, document_id, chunk_text, embedding, chunk_index) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&embedding.id)
            .bind(&embedding.document_id)
            .bind(&embedding.chunk_text)
            .bind(&vector_json)
            .bind(embedding.chunk_index)
            .execute(&mut *transaction)
            .await
            .context("Failed to insert embedding in batch")?;
        }

        transaction
            .commit()
            .await
            .context("Failed to commit batch embedding insert transaction")?;

        debug!("Inserted {} embeddings", embeddings.len());
        Ok(embeddings.len())
    }

    /// Full scan of every stored embedding joined with its document filename
    #[inline]
    pub async fn scan_all_with_filename(pool: &SqlitePool) -> Result<Vec<StoredEmbedding>> {
        let rows = sqlx::query_as::<_, StoredEmbedding>(
            r#"
            SELECT e.id, e.document_id, d.filename, e.chunk_text, e.embedding, e.chunk_index
            FROM embeddings e
            JOIN documents d ON e.document_id = d.id
            ORDER BY d.filename, e.chunk_index
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to scan stored embeddings")?;

        Ok(rows)
    }

    #[inline]
    pub async fn list_by_document(
        pool: &SqlitePool,
        document_id: &str,
    ) -> Result<Vec<EmbeddingRecord>> {
        let rows = sqlx::query_as::<_, EmbeddingRecord>(
            "SELECT id, document_id, chunk_text, embedding, chunk_index FROM embeddings WHERE document_id = ? ORDER BY chunk_index",
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
        .context("Failed to list embeddings by document")?;

        Ok(rows)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM embeddings")
            .fetch_one(pool)
            .await
            .context("Failed to count embeddings")?;

        Ok(count)
    }
}
