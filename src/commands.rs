use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::config::{Config, get_data_dir};
use crate::database::sqlite::Database;
use crate::ingest::Ingestor;
use crate::ollama::OllamaClient;
use crate::pipeline::RagPipeline;
use crate::retrieval::{Language, Retriever};
use crate::{EventRagError, Result};

fn load_config() -> Result<Config> {
    let data_dir = get_data_dir().map_err(|e| EventRagError::Config(e.to_string()))?;
    load_config_from(data_dir)
}

fn load_config_from(base_dir: PathBuf) -> Result<Config> {
    Config::load(base_dir).map_err(|e| EventRagError::Config(format!("{e:#}")))
}

async fn open_database(config: &Config) -> Result<Database> {
    Database::new(&config.database_path())
        .await
        .map_err(|e| EventRagError::Database(format!("{e:#}")))
}

fn build_client(config: &Config) -> Result<OllamaClient> {
    OllamaClient::new(config).map_err(|e| EventRagError::Backend(format!("{e:#}")))
}

/// Write a default config file so the user has something to edit
#[inline]
pub fn init_config() -> Result<()> {
    let data_dir = get_data_dir().map_err(|e| EventRagError::Config(e.to_string()))?;
    let config = Config {
        base_dir: data_dir,
        ..Config::default()
    };

    let path = config.config_file_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    config
        .save()
        .map_err(|e| EventRagError::Config(format!("{e:#}")))?;
    println!("Wrote default config to {}", path.display());
    println!("Documents directory: {}", config.documents_dir().display());
    Ok(())
}

/// Print the effective configuration
#[inline]
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;

    println!("Config file: {}", config.config_file_path().display());
    println!();
    println!("{rendered}");
    Ok(())
}

/// Ingest a directory of documents (defaults to the configured documents dir)
#[inline]
pub async fn ingest(path: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let client = build_client(&config)?;

    client
        .health_check()
        .await
        .map_err(|e| EventRagError::Backend(format!("Ollama is not reachable: {e:#}")))?;

    let documents_dir = config.documents_dir();
    let dir = path.unwrap_or(&documents_dir);
    info!("Ingesting documents from {}", dir.display());

    let ingestor = Ingestor::new(client, database, config.chunking.clone());
    let stats = ingestor
        .ingest_directory(dir)
        .await
        .map_err(|e| EventRagError::Ingest(format!("{e:#}")))?;

    println!("Ingestion complete:");
    println!("  Documents ingested: {}", stats.documents_ingested);
    println!("  Documents skipped:  {}", stats.documents_skipped);
    println!("  Chunks embedded:    {}", stats.chunks_embedded);
    if stats.chunks_failed > 0 {
        println!("  Chunks failed:      {}", stats.chunks_failed);
    }

    Ok(())
}

/// Run semantic search and print the matching chunks
#[inline]
pub async fn search(query: &str, language: Language, top_k: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let client = build_client(&config)?;

    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let retriever = Retriever::new(client, database, &config);
    let candidates = retriever.retrieve(query, top_k, language).await;

    if candidates.is_empty() {
        println!("No matching chunks found.");
        return Ok(());
    }

    println!("Found {} matching chunks:", candidates.len());
    println!();
    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "{}. {} (chunk {}) - {:.1}% match",
            i + 1,
            candidate.filename,
            candidate.chunk_index,
            candidate.similarity * 100.0
        );
        if let Some(score) = candidate.rerank_score {
            println!("   Rerank score: {score}/10");
        }
        println!("   {}", candidate.chunk_text);
        println!();
    }

    Ok(())
}

/// Answer a question from the ingested documents
#[inline]
pub async fn ask(question: &str, language: Language, top_k: Option<usize>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(top_k) = top_k {
        config.retrieval.top_k = top_k;
        config
            .retrieval
            .validate()
            .map_err(|e| EventRagError::Config(e.to_string()))?;
    }

    let database = open_database(&config).await?;
    let client = build_client(&config)?;

    let pipeline = RagPipeline::new(client, database, &config);
    let answer = pipeline
        .answer(question, language)
        .await
        .map_err(|e| EventRagError::Backend(format!("{e:#}")))?;

    println!("{}", answer.answer);
    if !answer.sources.is_empty() {
        println!();
        println!(
            "Sources: {} ({} chunks, {:.1}% avg relevance)",
            answer.sources.join(", "),
            answer.documents_used,
            answer.average_relevance * 100.0
        );
    }

    Ok(())
}

/// Show connectivity and corpus status
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("Status Report");
    println!("{}", "=".repeat(40));
    println!();

    println!("Database:");
    match open_database(&config).await {
        Ok(database) => {
            println!("  ✅ SQLite: Connected ({})", config.database_path().display());
            println!(
                "  Documents: {}",
                database.document_count().await.unwrap_or(0)
            );
            println!(
                "  Embeddings: {}",
                database.embedding_count().await.unwrap_or(0)
            );
        }
        Err(e) => println!("  ❌ SQLite: Failed to connect - {e}"),
    }

    println!();
    println!("Ollama:");
    match build_client(&config) {
        Ok(client) => match client.health_check().await {
            Ok(()) => {
                println!(
                    "  ✅ Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("  Chat model: {}", config.ollama.chat_model);
                println!("  Embedding model: {}", config.ollama.embedding_model);
            }
            Err(e) => println!("  ⚠️  Reachable but unhealthy - {e}"),
        },
        Err(e) => println!("  ❌ Failed to connect - {e}"),
    }

    println!();
    println!("Retrieval settings:");
    println!("  Query expansion: {}", config.retrieval.use_query_expansion);
    println!("  HyDE: {}", config.retrieval.use_hyde);
    println!("  Reranking: {}", config.retrieval.use_reranking);
    println!(
        "  Similarity threshold: {}",
        config.retrieval.similarity_threshold
    );
    println!("  Top K: {}", config.retrieval.top_k);

    Ok(())
}
