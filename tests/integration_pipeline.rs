#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests: ingestion pipeline and retrieval path with both
// providers mocked

use aven_rag::RagError;
use aven_rag::config::{Config, GeminiConfig, KnowledgeConfig, WeaviateConfig};
use aven_rag::indexer::IngestionPipeline;
use aven_rag::retriever::Retriever;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KNOWLEDGE_TEXT: &str = "What is an Interspousal Transfer Deed\nIt's a deed used to transfer property between spouses.\n\nHow to Contact Us\nCall 1-800-555-0100 or email support@example.com.\n";

fn test_config(gemini: &MockServer, weaviate: &MockServer, source: std::path::PathBuf) -> Config {
    Config {
        gemini: GeminiConfig {
            base_url: gemini.uri(),
            api_key: Some("test-key".to_string()),
            batch_size: 5,
            batch_delay_ms: 10,
            ..GeminiConfig::default()
        },
        weaviate: WeaviateConfig {
            endpoint: weaviate.uri(),
            api_key: None,
            class_name: "AvenKnowledge".to_string(),
        },
        knowledge: KnowledgeConfig {
            source_path: source,
        },
    }
}

async fn mount_embedding(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": {"values": [0.1, 0.2, 0.3]}
        })))
        .mount(server)
        .await;
}

async fn mount_generation(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": reply}]}}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_ingestion_run() {
    let gemini = MockServer::start().await;
    let weaviate = MockServer::start().await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let source = temp_dir.path().join("aven-data.txt");
    std::fs::write(&source, KNOWLEDGE_TEXT).expect("should write knowledge source");

    mount_embedding(&gemini).await;

    Mock::given(method("GET"))
        .and(path("/v1/schema/AvenKnowledge"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&weaviate)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&weaviate)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/objects"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&weaviate)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(body_string_contains("Aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"Aggregate": {"AvenKnowledge": [{"meta": {"count": 2}}]}}
        })))
        .mount(&weaviate)
        .await;

    let config = test_config(&gemini, &weaviate, source);
    let report = IngestionPipeline::new(config)
        .run()
        .await
        .expect("pipeline should succeed");

    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.embeddings_generated, 2);
    assert_eq!(report.documents_stored, 2);
}

#[tokio::test]
async fn ingestion_aborts_when_source_is_missing() {
    let gemini = MockServer::start().await;
    let weaviate = MockServer::start().await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&gemini, &weaviate, temp_dir.path().join("missing.txt"));

    let result = IngestionPipeline::new(config).run().await;
    assert!(matches!(result, Err(RagError::SourceUnavailable(_))));
}

#[tokio::test]
async fn ingestion_aborts_on_embedding_failure() {
    let gemini = MockServer::start().await;
    let weaviate = MockServer::start().await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let source = temp_dir.path().join("aven-data.txt");
    std::fs::write(&source, KNOWLEDGE_TEXT).expect("should write knowledge source");

    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&gemini)
        .await;

    // Nothing may reach the index when embedding fails.
    Mock::given(method("POST"))
        .and(path("/v1/objects"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&weaviate)
        .await;

    let config = test_config(&gemini, &weaviate, source);
    let result = IngestionPipeline::new(config).run().await;

    assert!(matches!(result, Err(RagError::EmbeddingFailed { .. })));
}

#[tokio::test]
async fn answer_with_retrieved_context() {
    let gemini = MockServer::start().await;
    let weaviate = MockServer::start().await;

    mount_embedding(&gemini).await;
    mount_generation(&gemini, "There are no fees at all.").await;

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(body_string_contains("nearVector"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "Get": {
                    "AvenKnowledge": [
                        {
                            "content": "What are your fees?\n\nNo fees.",
                            "question": "What are your fees?",
                            "answer": "No fees.",
                            "source": "aven-data.txt",
                            "category": "fees",
                            "chunkIndex": 0
                        }
                    ]
                }
            }
        })))
        .mount(&weaviate)
        .await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&gemini, &weaviate, temp_dir.path().join("unused.txt"));

    let retriever = Retriever::new(&config).expect("Failed to create retriever");
    let answer = retriever
        .answer("What are your fees?", None)
        .expect("answer should succeed");

    assert_eq!(answer.text, "There are no fees at all.");
    assert!(answer.context_used);
    assert_eq!(answer.documents_retrieved, 1);
}

#[tokio::test]
async fn answer_without_matches_still_generates() {
    let gemini = MockServer::start().await;
    let weaviate = MockServer::start().await;

    mount_embedding(&gemini).await;
    mount_generation(&gemini, "I couldn't find that in our knowledge base, but I can help.")
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"Get": {"AvenKnowledge": []}}
        })))
        .mount(&weaviate)
        .await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&gemini, &weaviate, temp_dir.path().join("unused.txt"));

    let retriever = Retriever::new(&config).expect("Failed to create retriever");
    let answer = retriever
        .answer("What are your fees?", None)
        .expect("answer should succeed");

    assert!(!answer.text.is_empty());
    assert!(!answer.context_used);
    assert_eq!(answer.documents_retrieved, 0);
}

#[tokio::test]
async fn answer_fails_when_search_fails() {
    let gemini = MockServer::start().await;
    let weaviate = MockServer::start().await;

    mount_embedding(&gemini).await;
    // Generation must never run when retrieval errored; there is no
    // answer-without-retrieval fallback.
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gemini)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&weaviate)
        .await;

    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&gemini, &weaviate, temp_dir.path().join("unused.txt"));

    let retriever = Retriever::new(&config).expect("Failed to create retriever");
    let result = retriever.answer("What are your fees?", None);

    assert!(matches!(result, Err(RagError::IndexUnavailable(_))));
}
