use anyhow::{Result, bail};
use tracing::{debug, warn};

use super::Language;
use crate::config::{EventConfig, RetrievalConfig};
use crate::ollama::{GenerateOptions, OllamaClient};

const MAX_EXPANSION_PHRASES: usize = 4;
const MIN_PHRASE_CHARS: usize = 5;
const MAX_PHRASE_CHARS: usize = 100;

/// Builds the set of search texts for a question: the question itself, plus
/// optional expansion phrases and a hypothetical answer document
#[derive(Debug, Clone)]
pub struct QueryFormulator {
    client: OllamaClient,
    event: EventConfig,
    use_expansion: bool,
    use_hyde: bool,
}

impl QueryFormulator {
    #[inline]
    pub fn new(client: OllamaClient, event: EventConfig, retrieval: &RetrievalConfig) -> Self {
        Self {
            client,
            event,
            use_expansion: retrieval.use_query_expansion,
            use_hyde: retrieval.use_hyde,
        }
    }

    /// The original question always comes first; enrichment steps that fail
    /// are logged and skipped so formulation itself never errors
    pub async fn formulate(&self, query: &str, language: Language) -> Vec<String> {
        let mut variants = vec![query.to_string()];

        if self.use_expansion {
            match self.expand(query, language).await {
                Ok(phrases) => {
                    debug!("Query expansion produced {} phrases", phrases.len());
                    variants.extend(phrases);
                }
                Err(e) => warn!("Query expansion failed, continuing without it: {e:#}"),
            }
        }

        if self.use_hyde {
            match self.hypothetical_document(query, language).await {
                Ok(document) => {
                    debug!(
                        "Hypothetical document generated ({} chars)",
                        document.chars().count()
                    );
                    variants.push(document);
                }
                Err(e) => warn!("Hypothetical document generation failed, continuing without it: {e:#}"),
            }
        }

        variants
    }

    async fn expand(&self, query: &str, language: Language) -> Result<Vec<String>> {
        let prompt = self.expansion_prompt(query, language);
        let options = GenerateOptions {
            temperature: Some(0.5),
            top_p: Some(0.9),
            num_predict: Some(80),
            ..GenerateOptions::default()
        };

        let response = self.client.generate(&prompt, &options).await?;
        Ok(parse_expansion(&response))
    }

    async fn hypothetical_document(&self, query: &str, language: Language) -> Result<String> {
        let prompt = self.hyde_prompt(query, language);
        let options = GenerateOptions {
            temperature: Some(0.3),
            top_p: Some(0.8),
            num_predict: Some(200),
            ..GenerateOptions::default()
        };

        let document = self.client.generate(&prompt, &options).await?;
        if document.is_empty() {
            bail!("Model returned an empty hypothetical document");
        }
        Ok(document)
    }

    fn expansion_prompt(&self, query: &str, language: Language) -> String {
        match language {
            Language::En => format!(
                "You help search documents about the {} conference. \
                 Generate up to 4 short alternative phrasings or related search terms \
                 for the question below, separated by commas. \
                 Return only the phrases, nothing else.\n\nQuestion: {query}",
                self.event.name
            ),
            Language::Pl => format!(
                "Pomagasz przeszukiwać dokumenty o konferencji {}. \
                 Wygeneruj maksymalnie 4 krótkie alternatywne sformułowania lub powiązane \
                 hasła wyszukiwania dla poniższego pytania, oddzielone przecinkami. \
                 Zwróć tylko hasła, nic więcej.\n\nPytanie: {query}",
                self.event.name
            ),
        }
    }

    fn hyde_prompt(&self, query: &str, language: Language) -> String {
        match language {
            Language::En => format!(
                "Write a short, factual paragraph that could appear in official \
                 materials for the {} conference ({}, {}) and that answers the \
                 question below. Write only the paragraph.\n\nQuestion: {query}",
                self.event.name, self.event.venue, self.event.dates
            ),
            Language::Pl => format!(
                "Napisz krótki, rzeczowy akapit, który mógłby pojawić się w oficjalnych \
                 materiałach konferencji {} ({}, {}) i który odpowiada na poniższe \
                 pytanie. Napisz tylko ten akapit.\n\nPytanie: {query}",
                self.event.name, self.event.venue, self.event.dates
            ),
        }
    }
}

/// Split a model response into candidate phrases, keeping only those of a
/// plausible search-term length and capping the count
pub(super) fn parse_expansion(response: &str) -> Vec<String> {
    response
        .split([',', ';', '\n'])
        .map(str::trim)
        .filter(|phrase| {
            let chars = phrase.chars().count();
            chars > MIN_PHRASE_CHARS && chars < MAX_PHRASE_CHARS
        })
        .map(ToString::to_string)
        .take(MAX_EXPANSION_PHRASES)
        .collect()
}
