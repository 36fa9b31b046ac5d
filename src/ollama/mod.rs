
use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Async client for a local Ollama instance, used for both embedding
/// and text generation.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    chat_model: String,
    embedding_model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Sampling options forwarded to Ollama's `options` object
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .ollama
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            chat_model: config.ollama.chat_model.clone(),
            embedding_model: config.ollama.embedding_model.clone(),
            client,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(self)
    }

    #[inline]
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Generate an embedding vector for a single text input
    #[inline]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let request = EmbedRequest {
            model: &self.embedding_model,
            input: text,
        };

        let body = self
            .post_for_text(url, &request)
            .await
            .context("Failed to generate embedding")?;

        let response: EmbedResponse =
            parse_response(&body).context("Failed to parse embedding response")?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Embedding response contained no vectors"))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    /// Generate text with the configured chat model.
    ///
    /// Streaming is disabled, but the body is still collapsed line-by-line in
    /// case the transport delivers a line-delimited stream anyway; only the
    /// final JSON object carries the full response text.
    #[inline]
    pub async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        debug!(
            "Generating text with model {} (prompt length: {})",
            self.chat_model,
            prompt.len()
        );

        let url = self
            .base_url
            .join("/api/generate")
            .context("Failed to build generate URL")?;

        let request = GenerateRequest {
            model: &self.chat_model,
            prompt,
            stream: false,
            options,
        };

        let body = self
            .post_for_text(url, &request)
            .await
            .context("Failed to generate text")?;

        let response: GenerateResponse =
            parse_response(collapse_streamed_body(&body)).context("Failed to parse generate response")?;

        Ok(response.response.trim().to_string())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub async fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build ping URL")?;

        debug!("Pinging Ollama server at {}", url);

        self.client
            .get(url)
            .send()
            .await
            .context("Failed to reach Ollama server")?
            .error_for_status()
            .context("Ollama server returned an error status")?;

        debug!("Server ping successful");
        Ok(())
    }

    /// List all available models
    #[inline]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let response: ModelsResponse = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch models")?
            .error_for_status()
            .context("Ollama server returned an error status")?
            .json()
            .await
            .context("Failed to parse models response")?;

        debug!("Found {} models", response.models.len());
        Ok(response.models)
    }

    /// Test connection to the Ollama server and verify model availability
    #[inline]
    pub async fn health_check(&self) -> Result<()> {
        self.ping().await.context("Server ping failed")?;

        let models = self.list_models().await.context("Failed to list models")?;
        for wanted in [&self.chat_model, &self.embedding_model] {
            if !models.iter().any(|m| &m.name == wanted) {
                warn!(
                    "Model {} not found. Available models: {:?}",
                    wanted,
                    models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>()
                );
            }
        }

        Ok(())
    }

    async fn post_for_text<T: Serialize>(&self, url: Url, request: &T) -> Result<String> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(anyhow!("Ollama error (HTTP {}): {}", status, error.error));
            }
            return Err(anyhow!("Ollama returned HTTP {}: {}", status, body));
        }

        Ok(body)
    }
}

/// Reduce a possibly line-delimited streamed body to its final payload line
fn collapse_streamed_body(body: &str) -> &str {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .unwrap_or(body)
}

fn parse_response<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T> {
    match serde_json::from_str(body) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            if let Ok(error) = serde_json::from_str::<ErrorResponse>(body) {
                return Err(anyhow!("Ollama error: {}", error.error));
            }
            Err(anyhow!("Malformed Ollama response: {}", e))
        }
    }
}
