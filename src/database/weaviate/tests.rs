use super::*;
use crate::chunking::Category;

fn test_store() -> WeaviateStore {
    let config = WeaviateConfig {
        endpoint: "http://localhost:8080".to_string(),
        api_key: None,
        class_name: "AvenKnowledge".to_string(),
    };
    WeaviateStore::new(&config).expect("Failed to create store")
}

fn test_chunk() -> KnowledgeChunk {
    KnowledgeChunk {
        id: "chunk_0".to_string(),
        content: "What are your fees?\n\nNo fees.".to_string(),
        question: Some("What are your fees?".to_string()),
        answer: Some("No fees.".to_string()),
        metadata: SourceMetadata {
            source: "aven-data.txt".to_string(),
            chunk_index: 0,
            total_chunks: 1,
            category: Category::Fees,
        },
    }
}

#[test]
fn store_configuration() {
    let store = test_store();

    assert_eq!(store.class_name, "AvenKnowledge");
    assert_eq!(store.base_url.as_str(), "http://localhost:8080/");
    assert!(!store.show_progress);

    let store = store.with_progress(true);
    assert!(store.show_progress);
}

#[test]
fn document_from_chunk() {
    let chunk = test_chunk();
    let document = VectorDocument::from_chunk(chunk, vec![0.1, 0.2, 0.3]);

    assert_eq!(document.id, "chunk_0");
    assert_eq!(document.question.as_deref(), Some("What are your fees?"));
    assert_eq!(document.embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(document.metadata.category, Category::Fees);
}

#[test]
fn retrieved_document_deserializes_with_defaults() {
    let document: RetrievedDocument = serde_json::from_str(
        r#"{"content": "some content", "chunkIndex": 3}"#,
    )
    .expect("should deserialize");

    assert_eq!(document.content, "some content");
    assert_eq!(document.chunk_index, 3);
    assert_eq!(document.question, "");
    assert_eq!(document.category, "");
}

#[test]
fn get_response_deserializes() {
    let response: GraphQlResponse<GetData> = serde_json::from_str(
        r#"{
            "data": {
                "Get": {
                    "AvenKnowledge": [
                        {
                            "content": "q and a",
                            "question": "What are your fees?",
                            "answer": "No fees.",
                            "source": "aven-data.txt",
                            "category": "fees",
                            "chunkIndex": 0
                        }
                    ]
                }
            }
        }"#,
    )
    .expect("should deserialize");

    let data = response.data.expect("data should be present");
    let hits = data.get.get("AvenKnowledge").expect("class key present");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].question, "What are your fees?");
    assert_eq!(hits[0].category, "fees");
}

#[test]
fn graphql_errors_deserialize() {
    let response: GraphQlResponse<GetData> = serde_json::from_str(
        r#"{"errors": [{"message": "no such class"}]}"#,
    )
    .expect("should deserialize");

    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "no such class");
}

#[test]
fn aggregate_response_deserializes() {
    let response: GraphQlResponse<AggregateData> = serde_json::from_str(
        r#"{"data": {"Aggregate": {"AvenKnowledge": [{"meta": {"count": 42}}]}}}"#,
    )
    .expect("should deserialize");

    let data = response.data.expect("data should be present");
    let count = data
        .aggregate
        .get("AvenKnowledge")
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.meta.as_ref())
        .and_then(|meta| meta.count);
    assert_eq!(count, Some(42));
}
