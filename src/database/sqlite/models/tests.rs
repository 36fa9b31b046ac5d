use super::*;

#[test]
fn new_document_assigns_unique_ids() {
    let a = NewDocument::new("a.txt".to_string(), "text".to_string(), vec![]);
    let b = NewDocument::new("b.txt".to_string(), "text".to_string(), vec![]);
    assert_ne!(a.id, b.id);
}

#[test]
fn document_chunk_texts_roundtrip() {
    let chunks = vec!["first chunk".to_string(), "second chunk".to_string()];
    let document = Document {
        id: "doc-1".to_string(),
        filename: "agenda.txt".to_string(),
        content: "first chunk second chunk".to_string(),
        chunks: serde_json::to_string(&chunks).expect("chunks should serialize"),
        processed_at: chrono::Utc::now().naive_utc(),
    };

    assert_eq!(document.chunk_texts(), chunks);
}

#[test]
fn document_chunk_texts_tolerates_malformed_json() {
    let document = Document {
        id: "doc-1".to_string(),
        filename: "agenda.txt".to_string(),
        content: String::new(),
        chunks: "not json".to_string(),
        processed_at: chrono::Utc::now().naive_utc(),
    };

    assert!(document.chunk_texts().is_empty());
}

#[test]
fn stored_embedding_vector_parses_json_array() {
    let row = StoredEmbedding {
        id: "emb-1".to_string(),
        document_id: "doc-1".to_string(),
        filename: "agenda.txt".to_string(),
        chunk_text: "chunk".to_string(),
        embedding: "[0.5, -0.25, 1.0]".to_string(),
        chunk_index: 0,
    };

    assert_eq!(row.vector(), Some(vec![0.5, -0.25, 1.0]));
}

#[test]
fn stored_embedding_vector_none_on_malformed_data() {
    let row = StoredEmbedding {
        id: "emb-1".to_string(),
        document_id: "doc-1".to_string(),
        filename: "agenda.txt".to_string(),
        chunk_text: "chunk".to_string(),
        embedding: "{\"oops\": true}".to_string(),
        chunk_index: 0,
    };

    assert_eq!(row.vector(), None);
}
