
use tracing::debug;

/// Sentence fragments at or below this many characters are discarded as noise
const MIN_SENTENCE_CHARS: usize = 10;
/// A topic shift only forces a split once the running buffer is this large
const TOPIC_SHIFT_MIN_CHARS: usize = 200;
/// Divisor turning the overlap budget into a carried word count
const OVERLAP_WORD_DIVISOR: usize = 10;

const GENERAL_TOPIC: &str = "general";

/// Bilingual (English/Polish) keyword families used to tag sentences with a
/// dominant topic. Declaration order breaks score ties.
const TOPIC_KEYWORDS: [(&str, &[&str]); 6] = [
    ("speakers", &[
        "speaker",
        "presenter",
        "talk",
        "presentation",
        "prelegent",
        "wykład",
        "prezentacja",
    ]),
    ("schedule", &[
        "time",
        "agenda",
        "program",
        "when",
        "czas",
        "harmonogram",
        "kiedy",
        "godzina",
    ]),
    ("location", &[
        "where",
        "venue",
        "address",
        "place",
        "gdzie",
        "miejsce",
        "adres",
        "lokalizacja",
        "browary",
    ]),
    ("registration", &[
        "register",
        "badge",
        "check-in",
        "rejestracja",
        "identyfikator",
        "odbiór",
    ]),
    ("workshops", &[
        "workshop",
        "training",
        "warsztat",
        "szkolenie",
        "warsztaty",
    ]),
    ("networking", &[
        "networking",
        "cocktail",
        "break",
        "przerwa",
        "spotkanie",
        "koktajl",
    ]),
];

/// A chunk with the topic and position metadata the public contract discards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticChunk {
    pub text: String,
    pub topic: &'static str,
    pub position: usize,
}

/// Collapse all whitespace runs into single spaces
#[inline]
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a sentence by its dominant topic family.
///
/// Each keyword occurring in the sentence scores one point for its family;
/// the highest score wins, ties go to the first-declared family, and a
/// sentence with no keyword hits is tagged "general".
#[inline]
pub fn classify_topic(sentence: &str) -> &'static str {
    let lower = sentence.to_lowercase();
    let mut best_topic = GENERAL_TOPIC;
    let mut best_score = 0;

    for (topic, keywords) in TOPIC_KEYWORDS {
        let score = keywords.iter().filter(|kw| lower.contains(*kw)).count();
        if score > best_score {
            best_score = score;
            best_topic = topic;
        }
    }

    best_topic
}

/// Split text into topic-coherent, size-bounded chunk texts with word overlap.
///
/// Empty or whitespace-only input yields no chunks.
#[inline]
pub fn chunk_text(text: &str, max_chunk_size: usize, overlap: usize) -> Vec<String> {
    chunk_with_topics(text, max_chunk_size, overlap)
        .into_iter()
        .map(|chunk| chunk.text)
        .collect()
}

/// Topic-aware variant of [`chunk_text`] retaining per-chunk metadata.
///
/// Sentences (split on `.`, `!`, `?`) accumulate into a running buffer. A new
/// chunk starts when the dominant topic changes while the buffer already
/// exceeds [`TOPIC_SHIFT_MIN_CHARS`], or when appending the sentence would
/// exceed `max_chunk_size` characters. The last `overlap / 10` words of the
/// outgoing chunk are carried into the new one.
#[inline]
pub fn chunk_with_topics(text: &str, max_chunk_size: usize, overlap: usize) -> Vec<SemanticChunk> {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .collect();

    let mut chunks: Vec<SemanticChunk> = Vec::new();
    let mut current = String::new();
    let mut current_topic = "";

    for sentence in sentences {
        let new_topic = classify_topic(sentence);
        let current_chars = current.chars().count();

        let should_split = (new_topic != current_topic && current_chars > TOPIC_SHIFT_MIN_CHARS)
            || (current_chars + sentence.chars().count() > max_chunk_size);

        if should_split && !current.trim().is_empty() {
            chunks.push(SemanticChunk {
                text: current.trim().to_string(),
                topic: if current_topic.is_empty() {
                    GENERAL_TOPIC
                } else {
                    current_topic
                },
                position: chunks.len(),
            });

            // Carry the tail of the outgoing chunk as a word-count overlap
            let words: Vec<&str> = current.split_whitespace().collect();
            let overlap_words = (overlap / OVERLAP_WORD_DIVISOR).min(words.len());
            current = words[words.len() - overlap_words..].join(" ");
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_topic = new_topic;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            if current_topic.is_empty() {
                current_topic = new_topic;
            }
        }
    }

    if !current.trim().is_empty() {
        chunks.push(SemanticChunk {
            text: current.trim().to_string(),
            topic: if current_topic.is_empty() {
                GENERAL_TOPIC
            } else {
                current_topic
            },
            position: chunks.len(),
        });
    }

    debug!(
        "Semantic chunking produced {} chunks, topics: {:?}",
        chunks.len(),
        chunks
            .iter()
            .map(|c| c.topic)
            .collect::<std::collections::BTreeSet<_>>()
    );

    chunks
}
