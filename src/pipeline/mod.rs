#[cfg(test)]
mod tests;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Config, EventConfig};
use crate::database::sqlite::Database;
use crate::ollama::{GenerateOptions, OllamaClient};
use crate::retrieval::{Language, Retriever, ScoredCandidate};

/// How many retrieved chunks are quoted in the generation context
const CONTEXT_CHUNKS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
    pub documents_used: usize,
    pub average_relevance: f32,
}

/// End-to-end question answering: retrieve relevant chunks, then generate a
/// grounded answer with the chat model
#[derive(Debug, Clone)]
pub struct RagPipeline {
    client: OllamaClient,
    retriever: Retriever,
    event: EventConfig,
    top_k: usize,
}

impl RagPipeline {
    #[inline]
    pub fn new(client: OllamaClient, database: Database, config: &Config) -> Self {
        let retriever = Retriever::new(client.clone(), database, config);
        Self {
            client,
            retriever,
            event: config.event.clone(),
            top_k: config.retrieval.top_k,
        }
    }

    pub async fn answer(&self, question: &str, language: Language) -> Result<Answer> {
        let candidates = self.retriever.retrieve(question, self.top_k, language).await;

        if candidates.is_empty() {
            info!("No relevant chunks found for question");
            return Ok(Answer {
                answer: no_results_message(language).to_string(),
                sources: Vec::new(),
                documents_used: 0,
                average_relevance: 0.0,
            });
        }

        debug!("Generating answer from {} chunks", candidates.len());

        let context = build_document_context(&candidates);
        let prompt = self.answer_prompt(question, &context, language);
        let answer = self.client.generate(&prompt, &answer_options()).await?;

        let sources: Vec<String> = candidates
            .iter()
            .map(|c| c.filename.clone())
            .unique()
            .collect();
        let average_relevance =
            candidates.iter().map(|c| c.similarity).sum::<f32>() / candidates.len() as f32;

        Ok(Answer {
            answer,
            sources,
            documents_used: candidates.len(),
            average_relevance,
        })
    }

    fn answer_prompt(&self, question: &str, context: &str, language: Language) -> String {
        match language {
            Language::En => format!(
                "You are the official assistant for the {} conference, held at {} on {}. \
                 Answer the question using only the context below. If the context does not \
                 contain the answer, say you don't have that information. \
                 Be concise and factual.\n\nCONTEXT:\n{context}\n\nQUESTION: {question}\n\nANSWER:",
                self.event.name, self.event.venue, self.event.dates
            ),
            Language::Pl => format!(
                "Jesteś oficjalnym asystentem konferencji {}, która odbywa się w {} w dniach {}. \
                 Odpowiedz na pytanie wyłącznie na podstawie poniższego kontekstu. Jeśli kontekst \
                 nie zawiera odpowiedzi, powiedz, że nie masz tej informacji. \
                 Odpowiadaj zwięźle i rzeczowo.\n\nKONTEKST:\n{context}\n\nPYTANIE: {question}\n\nODPOWIEDŹ:",
                self.event.name, self.event.venue, self.event.dates
            ),
        }
    }
}

fn answer_options() -> GenerateOptions {
    GenerateOptions {
        temperature: Some(0.7),
        top_k: Some(40),
        top_p: Some(0.9),
        num_predict: Some(500),
        repeat_penalty: Some(1.1),
        stop: Some(
            ["USER:", "QUESTION:", "SOURCES:", "CONTEXT:"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        ),
    }
}

fn no_results_message(language: Language) -> &'static str {
    match language {
        Language::En => {
            "I couldn't find any relevant information about that in the conference materials. \
             Try rephrasing your question or ask about the schedule, speakers, venue, or registration."
        }
        Language::Pl => {
            "Nie znalazłem na ten temat żadnych informacji w materiałach konferencyjnych. \
             Spróbuj przeformułować pytanie albo zapytaj o program, prelegentów, miejsce lub rejestrację."
        }
    }
}

/// Quote the best chunks with provenance headers so the model can cite them
fn build_document_context(candidates: &[ScoredCandidate]) -> String {
    candidates
        .iter()
        .take(CONTEXT_CHUNKS)
        .enumerate()
        .map(|(i, candidate)| {
            let quality = match candidate.rerank_score {
                Some(score) => format!(" (Quality: {score}/10)"),
                None => String::new(),
            };
            format!(
                "[Source {}] {} - {:.1}% match{}\n{}",
                i + 1,
                candidate.filename,
                candidate.similarity * 100.0,
                quality,
                candidate.chunk_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
