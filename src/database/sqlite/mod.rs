pub mod models;
pub mod queries;


use std::path::Path;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use self::models::{Document, NewDocument, NewEmbedding, StoredEmbedding};
use self::queries::{DocumentQueries, EmbeddingQueries};

const MAX_CONNECTIONS: u32 = 10;

/// Handle to the document store, cheap to clone
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the database at `path` and apply any
    /// pending migrations
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        debug!("Opened database at {}", path.display());

        let database = Self { pool };
        database.run_migrations().await?;
        Ok(database)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations up to date");
        Ok(())
    }

    #[inline]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[inline]
    pub async fn insert_document(&self, new_document: &NewDocument) -> Result<Document> {
        DocumentQueries::insert(&self.pool, new_document).await
    }

    #[inline]
    pub async fn document_exists(&self, filename: &str) -> Result<bool> {
        DocumentQueries::exists_by_filename(&self.pool, filename).await
    }

    #[inline]
    pub async fn document_count(&self) -> Result<i64> {
        DocumentQueries::count(&self.pool).await
    }

    #[inline]
    pub async fn insert_embeddings(&self, embeddings: &[NewEmbedding]) -> Result<usize> {
        EmbeddingQueries::insert_batch(&self.pool, embeddings).await
    }

    #[inline]
    pub async fn scan_embeddings(&self) -> Result<Vec<StoredEmbedding>> {
        EmbeddingQueries::scan_all_with_filename(&self.pool).await
    }

    #[inline]
    pub async fn embedding_count(&self) -> Result<i64> {
        EmbeddingQueries::count(&self.pool).await
    }
}
