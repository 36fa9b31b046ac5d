
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::chunking::{chunk_text, clean_text};
use crate::config::ChunkingConfig;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{NewDocument, NewEmbedding};
use crate::ollama::OllamaClient;

const INGESTABLE_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub documents_ingested: usize,
    pub documents_skipped: usize,
    pub chunks_embedded: usize,
    pub chunks_failed: usize,
}

/// Reads documents from disk, chunks them, embeds each chunk, and stores the
/// results. Re-running over the same directory skips files already ingested.
#[derive(Debug, Clone)]
pub struct Ingestor {
    client: OllamaClient,
    database: Database,
    chunking: ChunkingConfig,
}

impl Ingestor {
    #[inline]
    pub fn new(client: OllamaClient, database: Database, chunking: ChunkingConfig) -> Self {
        Self {
            client,
            database,
            chunking,
        }
    }

    /// Ingest every supported file in `dir`, in filename order. A file that
    /// fails is logged and skipped; the rest of the directory still ingests.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestStats> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read documents directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_ingestable(path))
            .collect();
        paths.sort();

        info!("Found {} ingestable files in {}", paths.len(), dir.display());

        let mut stats = IngestStats::default();
        for path in &paths {
            match self.ingest_file(path).await {
                Ok(file_stats) => {
                    stats.documents_ingested += file_stats.documents_ingested;
                    stats.documents_skipped += file_stats.documents_skipped;
                    stats.chunks_embedded += file_stats.chunks_embedded;
                    stats.chunks_failed += file_stats.chunks_failed;
                }
                Err(e) => warn!("Failed to ingest {}: {e:#}", path.display()),
            }
        }

        Ok(stats)
    }

    /// Ingest a single file, skipping it if a document with the same filename
    /// already exists
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestStats> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid filename: {}", path.display()))?
            .to_string();

        let mut stats = IngestStats::default();

        if self.database.document_exists(&filename).await? {
            debug!("Skipping {filename}, already ingested");
            stats.documents_skipped = 1;
            return Ok(stats);
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let content = clean_text(&raw);
        let chunks = chunk_text(&content, self.chunking.max_chunk_size, self.chunking.overlap);

        if chunks.is_empty() {
            warn!("No usable text in {filename}, skipping");
            stats.documents_skipped = 1;
            return Ok(stats);
        }

        let new_document = NewDocument::new(filename.clone(), content, chunks.clone());
        let document = self.database.insert_document(&new_document).await?;

        let progress = ProgressBar::new(chunks.len() as u64).with_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
                .context("Invalid progress bar template")?,
        );
        progress.set_message(filename.clone());

        let mut embeddings = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            match self.client.embed(chunk).await {
                Ok(vector) => {
                    embeddings.push(NewEmbedding::new(
                        document.id.clone(),
                        chunk.clone(),
                        vector,
                        index as i64,
                    ));
                }
                Err(e) => {
                    warn!("Failed to embed chunk {index} of {filename}, skipping it: {e:#}");
                    stats.chunks_failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        stats.chunks_embedded = self.database.insert_embeddings(&embeddings).await?;
        stats.documents_ingested = 1;
        info!(
            "Ingested {filename}: {} chunks embedded, {} failed",
            stats.chunks_embedded, stats.chunks_failed
        );

        Ok(stats)
    }
}

fn is_ingestable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            INGESTABLE_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}
