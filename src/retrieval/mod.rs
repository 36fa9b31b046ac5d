pub mod query;
pub mod rerank;


use std::collections::HashMap;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use self::query::QueryFormulator;
use self::rerank::Reranker;
use crate::config::{Config, RetrievalConfig};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::StoredEmbedding;
use crate::ollama::OllamaClient;

/// Candidates kept for reranking, as a multiple of the requested result count
const RERANK_POOL_FACTOR: usize = 2;

/// Language of the question, controls which prompt templates are used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pl,
}

/// One retrieved chunk with its provenance and scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub chunk_text: String,
    pub chunk_index: i64,
    pub similarity: f32,
    /// Which search text produced this candidate's best similarity
    pub query_used: String,
    pub rerank_score: Option<i64>,
}

/// Semantic search over the stored embeddings.
///
/// Retrieval is layered: an advanced pass with query enrichment and optional
/// reranking, a plain single-query pass as fallback, and an empty result set
/// as the last resort. It never surfaces an error to the caller.
#[derive(Debug, Clone)]
pub struct Retriever {
    client: OllamaClient,
    database: Database,
    config: RetrievalConfig,
    formulator: QueryFormulator,
    reranker: Reranker,
}

impl Retriever {
    #[inline]
    pub fn new(client: OllamaClient, database: Database, config: &Config) -> Self {
        let formulator =
            QueryFormulator::new(client.clone(), config.event.clone(), &config.retrieval);
        let reranker = Reranker::new(client.clone());

        Self {
            client,
            database,
            config: config.retrieval.clone(),
            formulator,
            reranker,
        }
    }

    /// Retrieve the most relevant chunks for `query`, at most `top_k` of them
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        language: Language,
    ) -> Vec<ScoredCandidate> {
        match self.advanced_search(query, top_k, language).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Advanced search failed, falling back to basic search: {e:#}");
                match self.basic_search(query, top_k).await {
                    Ok(candidates) => candidates,
                    Err(e) => {
                        error!("Basic search failed, returning no results: {e:#}");
                        Vec::new()
                    }
                }
            }
        }
    }

    async fn advanced_search(
        &self,
        query: &str,
        top_k: usize,
        language: Language,
    ) -> Result<Vec<ScoredCandidate>> {
        let variants = self.formulator.formulate(query, language).await;
        let rows = self.database.scan_embeddings().await?;
        debug!(
            "Searching {} stored chunks with {} query variants",
            rows.len(),
            variants.len()
        );

        let mut all_candidates = Vec::new();
        for variant in &variants {
            match self.search_variant(variant, &rows).await {
                Ok(candidates) => all_candidates.extend(candidates),
                Err(e) => warn!("Search variant failed, skipping it: {e:#}"),
            }
        }

        let mut merged = apply_threshold(
            merge_candidates(all_candidates),
            self.config.similarity_threshold,
        );
        merged.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        merged.truncate(top_k * RERANK_POOL_FACTOR);

        if self.config.use_reranking && !merged.is_empty() {
            merged = self.reranker.rerank(query, merged, language).await;
        }

        merged.truncate(top_k);
        Ok(merged)
    }

    /// Single-query search with no threshold, used when the advanced pass fails
    async fn basic_search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredCandidate>> {
        let rows = self.database.scan_embeddings().await?;
        let mut candidates = self.search_variant(query, &rows).await?;
        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        candidates.truncate(top_k);
        Ok(candidates)
    }

    async fn search_variant(
        &self,
        variant: &str,
        rows: &[StoredEmbedding],
    ) -> Result<Vec<ScoredCandidate>> {
        let query_vector = self.client.embed(variant).await?;

        let candidates = rows
            .iter()
            .map(|row| {
                let similarity = match row.vector() {
                    Some(vector) => cosine_similarity(&query_vector, &vector),
                    None => {
                        warn!("Malformed embedding for chunk {}, scoring it zero", row.id);
                        0.0
                    }
                };

                ScoredCandidate {
                    chunk_id: row.id.clone(),
                    document_id: row.document_id.clone(),
                    filename: row.filename.clone(),
                    chunk_text: row.chunk_text.clone(),
                    chunk_index: row.chunk_index,
                    similarity,
                    query_used: variant.to_string(),
                    rerank_score: None,
                }
            })
            .collect();

        Ok(candidates)
    }
}

/// Cosine similarity of two vectors; mismatched lengths, zero magnitudes, and
/// NaN all collapse to 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 {
        return 0.0;
    }

    let similarity = dot / magnitude;
    if similarity.is_nan() { 0.0 } else { similarity }
}

/// Deduplicate candidates found by several query variants, keeping the
/// highest similarity seen for each chunk
pub(crate) fn merge_candidates(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut best: HashMap<String, ScoredCandidate> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for candidate in candidates {
        match best.get_mut(&candidate.chunk_id) {
            Some(existing) => {
                if candidate.similarity > existing.similarity {
                    *existing = candidate;
                }
            }
            None => {
                order.push(candidate.chunk_id.clone());
                best.insert(candidate.chunk_id.clone(), candidate);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|chunk_id| best.remove(&chunk_id))
        .collect()
}

/// Drop candidates below the similarity cutoff. The boundary is inclusive: a
/// candidate exactly at the threshold is kept.
pub(crate) fn apply_threshold(
    mut candidates: Vec<ScoredCandidate>,
    threshold: f32,
) -> Vec<ScoredCandidate> {
    candidates.retain(|candidate| candidate.similarity >= threshold);
    candidates
}
