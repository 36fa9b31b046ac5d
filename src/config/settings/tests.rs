use super::*;
use tempfile::TempDir;

#[test]
fn defaults_are_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.embedding_model, "mxbai-embed-large");
    assert!((config.retrieval.similarity_threshold - 0.6).abs() < f32::EPSILON);
    assert_eq!(config.retrieval.top_k, 8);
    assert!(!config.retrieval.use_hyde);
    assert!(!config.retrieval.use_query_expansion);
    assert!(!config.retrieval.use_reranking);
    assert_eq!(config.chunking.max_chunk_size, 800);
    assert_eq!(config.chunking.overlap, 150);
}

#[test]
fn load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("load should succeed");

    assert_eq!(config, Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    });
}

#[test]
fn save_and_reload_roundtrip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.retrieval.use_reranking = true;
    config.retrieval.similarity_threshold = 0.75;
    config.ollama.chat_model = "llama3.2:3b".to_string();
    config.event.name = "RustConf 2026".to_string();

    config.save().expect("save should succeed");

    let reloaded = Config::load(temp_dir.path()).expect("load should succeed");
    assert_eq!(reloaded, config);
}

#[test]
fn partial_toml_fills_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[retrieval]\ntop_k = 3\n",
    )
    .expect("should write config");

    let config = Config::load(temp_dir.path()).expect("load should succeed");
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
fn rejects_invalid_protocol() {
    let config = OllamaConfig {
        protocol: "ftp".to_string(),
        ..OllamaConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));
}

#[test]
fn rejects_empty_model() {
    let config = OllamaConfig {
        chat_model: "  ".to_string(),
        ..OllamaConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn rejects_out_of_range_threshold() {
    let config = RetrievalConfig {
        similarity_threshold: 1.5,
        ..RetrievalConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidSimilarityThreshold(_))
    ));
}

#[test]
fn rejects_zero_top_k() {
    let config = RetrievalConfig {
        top_k: 0,
        ..RetrievalConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTopK(0))));
}

#[test]
fn rejects_overlap_larger_than_chunk() {
    let config = ChunkingConfig {
        max_chunk_size: 200,
        overlap: 300,
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidOverlap(300, 200))
    ));
}

#[test]
fn ollama_url_builds_from_parts() {
    let config = OllamaConfig::default();
    let url = config.ollama_url().expect("url should parse");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}
