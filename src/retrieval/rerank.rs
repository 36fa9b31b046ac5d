use std::cmp::Reverse;
use std::sync::LazyLock;
use std::time::Duration;

use fancy_regex::Regex;
use futures::future::join_all;
use tracing::{debug, warn};

use super::{Language, ScoredCandidate};
use crate::ollama::{GenerateOptions, OllamaClient};

const RERANK_BATCH_SIZE: usize = 3;
const BATCH_PAUSE: Duration = Duration::from_millis(100);
const SNIPPET_CHARS: usize = 400;
const MIN_SCORE: i64 = 1;
const MAX_SCORE: i64 = 10;
const DEFAULT_SCORE: i64 = 5;

static SCORE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("score regex is valid"));

/// Rescores retrieval candidates with the chat model so that wording-level
/// relevance can override raw embedding similarity
#[derive(Debug, Clone)]
pub struct Reranker {
    client: OllamaClient,
}

impl Reranker {
    #[inline]
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }

    /// Assign a 1-10 relevance score to every candidate and sort by it,
    /// descending. Candidates are scored in small concurrent batches with a
    /// pause between batches to avoid overwhelming the model server.
    pub async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<ScoredCandidate>,
        language: Language,
    ) -> Vec<ScoredCandidate> {
        if candidates.is_empty() {
            return candidates;
        }

        debug!("Reranking {} candidates", candidates.len());

        let mut scores = Vec::with_capacity(candidates.len());
        let batches: Vec<&[ScoredCandidate]> = candidates.chunks(RERANK_BATCH_SIZE).collect();
        let last_batch = batches.len().saturating_sub(1);

        for (i, batch) in batches.into_iter().enumerate() {
            let batch_scores = join_all(
                batch
                    .iter()
                    .map(|candidate| self.score_one(query, candidate, language)),
            )
            .await;
            scores.extend(batch_scores);

            if i < last_batch {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        for (candidate, score) in candidates.iter_mut().zip(scores) {
            candidate.rerank_score = Some(score);
        }

        // stable sort keeps the similarity order among equal scores
        candidates.sort_by_key(|c| Reverse(c.rerank_score.unwrap_or(DEFAULT_SCORE)));
        candidates
    }

    /// A scoring failure falls back to a neutral score so one bad generation
    /// cannot sink the whole rerank pass
    async fn score_one(
        &self,
        query: &str,
        candidate: &ScoredCandidate,
        language: Language,
    ) -> i64 {
        let snippet: String = candidate.chunk_text.chars().take(SNIPPET_CHARS).collect();
        let prompt = scoring_prompt(query, &snippet, language);
        let options = GenerateOptions {
            temperature: Some(0.1),
            num_predict: Some(5),
            ..GenerateOptions::default()
        };

        match self.client.generate(&prompt, &options).await {
            Ok(response) => parse_score(&response),
            Err(e) => {
                warn!("Rerank scoring failed, using neutral score: {e:#}");
                DEFAULT_SCORE
            }
        }
    }
}

fn scoring_prompt(query: &str, snippet: &str, language: Language) -> String {
    match language {
        Language::En => format!(
            "Rate how relevant this text is to the question on a scale of 1-10. \
             Reply with the number only.\n\nQuestion: {query}\n\nText: {snippet}"
        ),
        Language::Pl => format!(
            "Oceń w skali 1-10, jak trafny jest ten tekst względem pytania. \
             Odpowiedz tylko liczbą.\n\nPytanie: {query}\n\nTekst: {snippet}"
        ),
    }
}

/// Extract the first integer in the response and clamp it to the 1-10 scale;
/// anything unparseable gets the neutral score
pub(super) fn parse_score(response: &str) -> i64 {
    SCORE_REGEX
        .find(response)
        .ok()
        .flatten()
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(DEFAULT_SCORE)
        .clamp(MIN_SCORE, MAX_SCORE)
}
