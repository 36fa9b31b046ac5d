use thiserror::Error;

pub type Result<T> = std::result::Result<T, EventRagError>;

#[derive(Error, Debug)]
pub enum EventRagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod database;
pub mod ingest;
pub mod ollama;
pub mod pipeline;
pub mod retrieval;
