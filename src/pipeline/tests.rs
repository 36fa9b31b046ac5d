use super::*;

fn candidate(filename: &str, similarity: f32, rerank_score: Option<i64>) -> ScoredCandidate {
    ScoredCandidate {
        chunk_id: format!("{filename}-{similarity}"),
        document_id: "doc-1".to_string(),
        filename: filename.to_string(),
        chunk_text: format!("Content from {filename}."),
        chunk_index: 0,
        similarity,
        query_used: "question".to_string(),
        rerank_score,
    }
}

#[test]
fn context_quotes_chunks_with_provenance() {
    let context = build_document_context(&[
        candidate("venue.txt", 0.912, None),
        candidate("agenda.txt", 0.75, None),
    ]);

    assert!(context.contains("[Source 1] venue.txt - 91.2% match"));
    assert!(context.contains("[Source 2] agenda.txt - 75.0% match"));
    assert!(context.contains("Content from venue.txt."));
    assert!(!context.contains("Quality"));
}

#[test]
fn context_includes_rerank_quality_when_present() {
    let context = build_document_context(&[candidate("venue.txt", 0.9, Some(8))]);
    assert!(context.contains("(Quality: 8/10)"));
}

#[test]
fn context_is_capped_at_five_chunks() {
    let candidates: Vec<ScoredCandidate> = (0..8)
        .map(|i| candidate(&format!("file{i}.txt"), 0.9, None))
        .collect();

    let context = build_document_context(&candidates);
    assert!(context.contains("[Source 5]"));
    assert!(!context.contains("[Source 6]"));
}

#[test]
fn no_results_messages_are_localized() {
    assert!(no_results_message(Language::En).contains("couldn't find"));
    assert!(no_results_message(Language::Pl).contains("Nie znalazłem"));
}

#[test]
fn answer_options_stop_on_role_markers() {
    let options = answer_options();
    let stop = options.stop.expect("stop sequences are set");
    assert!(stop.contains(&"USER:".to_string()));
    assert!(stop.contains(&"CONTEXT:".to_string()));
    assert_eq!(options.temperature, Some(0.7));
    assert_eq!(options.num_predict, Some(500));
}
