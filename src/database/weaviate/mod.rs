#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::time::Duration;

use indicatif::ProgressBar;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::chunking::{KnowledgeChunk, SourceMetadata};
use crate::config::WeaviateConfig;
use crate::{RagError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// The persisted form of a knowledge chunk: all chunk fields plus the
/// embedding vector supplied by the caller. The index owns these
/// exclusively; the only mutation path is drop-and-recreate.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub embedding: Vec<f32>,
    pub metadata: SourceMetadata,
}

impl VectorDocument {
    #[inline]
    pub fn from_chunk(chunk: KnowledgeChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            content: chunk.content,
            question: chunk.question,
            answer: chunk.answer,
            embedding,
            metadata: chunk.metadata,
        }
    }
}

/// A search hit, deserialized into a typed shape at the client boundary.
/// Absent properties come back as empty strings rather than failing the
/// whole result set.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "chunkIndex", default)]
    pub chunk_index: i64,
}

/// Client for a Weaviate collection reached over REST/GraphQL. Similarity
/// semantics are whatever the index is configured with; vectors are always
/// supplied by the caller (`vectorizer: "none"`).
pub struct WeaviateStore {
    base_url: Url,
    class_name: String,
    api_key: Option<String>,
    agent: ureq::Agent,
    show_progress: bool,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct GetData {
    #[serde(rename = "Get")]
    get: HashMap<String, Vec<RetrievedDocument>>,
}

#[derive(Debug, Deserialize)]
struct ProbeData {
    #[serde(rename = "Get")]
    get: HashMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct AggregateData {
    #[serde(rename = "Aggregate")]
    aggregate: HashMap<String, Vec<AggregateEntry>>,
}

#[derive(Debug, Deserialize)]
struct AggregateEntry {
    meta: Option<MetaCount>,
}

#[derive(Debug, Deserialize)]
struct MetaCount {
    count: Option<u64>,
}

impl WeaviateStore {
    #[inline]
    pub fn new(config: &WeaviateConfig) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            class_name: config.class_name.clone(),
            api_key: config.resolve_api_key(),
            agent,
            show_progress: false,
        })
    }

    /// Render an indicatif progress bar while storing documents.
    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check whether the collection exists. A 404 means "no"; anything else
    /// that fails means the index is unreachable.
    #[inline]
    pub fn schema_exists(&self) -> Result<bool> {
        let url = self.schema_url()?;

        match self.http_get(&url) {
            Ok(_) => Ok(true),
            Err(ureq::Error::StatusCode(404)) => Ok(false),
            Err(e) => Err(RagError::IndexUnavailable(format!(
                "Failed to check schema {}: {}",
                self.class_name, e
            ))),
        }
    }

    /// Idempotently create the collection. A "not found" response on the
    /// existence check is the normal needs-creation signal, not an error;
    /// if the collection already exists this is a no-op.
    #[inline]
    pub fn ensure_schema(&self) -> Result<()> {
        if self.schema_exists()? {
            debug!("Schema {} already exists", self.class_name);
            return Ok(());
        }

        debug!("Schema {} not found, creating", self.class_name);

        let class = json!({
            "class": self.class_name,
            "description": "Customer support knowledge base",
            "vectorizer": "none",
            "properties": [
                {
                    "name": "content",
                    "dataType": ["text"],
                    "description": "The full content of the chunk",
                },
                {
                    "name": "question",
                    "dataType": ["text"],
                    "description": "The question from the Q&A pair",
                },
                {
                    "name": "answer",
                    "dataType": ["text"],
                    "description": "The answer from the Q&A pair",
                },
                {
                    "name": "source",
                    "dataType": ["text"],
                    "description": "Source of the data",
                },
                {
                    "name": "chunkIndex",
                    "dataType": ["int"],
                    "description": "Index of this chunk",
                },
                {
                    "name": "totalChunks",
                    "dataType": ["int"],
                    "description": "Total number of chunks",
                },
                {
                    "name": "category",
                    "dataType": ["text"],
                    "description": "Category of the question",
                },
            ],
        });

        let url = self.api_url("/v1/schema")?;
        self.http_post(&url, &class.to_string()).map_err(|e| {
            RagError::IndexUnavailable(format!(
                "Failed to create schema {}: {}",
                self.class_name, e
            ))
        })?;

        info!("Created schema {}", self.class_name);
        Ok(())
    }

    /// Insert each document as an individual record carrying its explicit
    /// vector. No batching or transaction guarantee: a failure partway
    /// through leaves the already-inserted records in place, and nothing is
    /// rolled back or retried.
    #[inline]
    pub fn store_documents(&self, documents: &[VectorDocument]) -> Result<()> {
        if documents.is_empty() {
            debug!("No documents to store");
            return Ok(());
        }

        let url = self.api_url("/v1/objects")?;
        let progress = if self.show_progress {
            ProgressBar::new(documents.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        let mut stored = 0usize;
        for document in documents {
            let object = json!({
                "class": self.class_name,
                "properties": {
                    "content": document.content,
                    "question": document.question.clone().unwrap_or_default(),
                    "answer": document.answer.clone().unwrap_or_default(),
                    "source": document.metadata.source,
                    "chunkIndex": document.metadata.chunk_index,
                    "totalChunks": document.metadata.total_chunks,
                    "category": document.metadata.category.as_str(),
                },
                "vector": document.embedding,
            });

            self.http_post(&url, &object.to_string()).map_err(|e| {
                RagError::IndexUnavailable(format!(
                    "Failed to store document {}: {}",
                    document.id, e
                ))
            })?;

            stored += 1;
            progress.inc(1);
            if stored % 10 == 0 {
                info!("Stored {} documents", stored);
            }
        }

        progress.finish_and_clear();
        info!("Successfully stored {} documents", stored);
        Ok(())
    }

    /// Nearest-neighbor search, returning up to `limit` documents in index
    /// order. No score threshold: poor matches are still returned and the
    /// caller decides what "no good match" means.
    #[inline]
    pub fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        debug!(
            "Searching {} for {} nearest documents",
            self.class_name, limit
        );

        let vector_json = serde_json::to_string(query_vector).map_err(|e| {
            RagError::IndexUnavailable(format!("Failed to serialize query vector: {e}"))
        })?;

        let query = format!(
            "{{ Get {{ {}(nearVector: {{vector: {}}}, limit: {}) {{ content question answer source category chunkIndex }} }} }}",
            self.class_name, vector_json, limit
        );

        let mut data: GetData = self.graphql(&query)?;
        let hits = data.get.remove(&self.class_name).unwrap_or_default();

        debug!("Search returned {} documents", hits.len());
        Ok(hits)
    }

    /// Total stored document count. On primary-path failure this falls back
    /// to a one-record existence probe and returns a coarse value (1 if
    /// anything exists, 0 otherwise) — never treat the fallback as exact.
    #[inline]
    pub fn count_documents(&self) -> Result<u64> {
        let query = format!(
            "{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}",
            self.class_name
        );

        match self.graphql::<AggregateData>(&query) {
            Ok(mut data) => {
                let count = data
                    .aggregate
                    .remove(&self.class_name)
                    .unwrap_or_default()
                    .first()
                    .and_then(|entry| entry.meta.as_ref())
                    .and_then(|meta| meta.count)
                    .unwrap_or(0);
                Ok(count)
            }
            Err(e) => {
                warn!("Aggregate count failed ({}), falling back to existence probe", e);
                self.probe_count().or_else(|probe_error| {
                    warn!("Fallback count also failed: {}", probe_error);
                    Ok(0)
                })
            }
        }
    }

    fn probe_count(&self) -> Result<u64> {
        let query = format!(
            "{{ Get {{ {}(limit: 1) {{ _additional {{ id }} }} }} }}",
            self.class_name
        );

        let mut data: ProbeData = self.graphql(&query)?;
        let found = data.get.remove(&self.class_name).unwrap_or_default();

        let estimate = u64::from(!found.is_empty());
        warn!("Returning approximate document count {}", estimate);
        Ok(estimate)
    }

    /// Drop the entire collection. Coarse-grained purge; there is no
    /// selective deletion.
    #[inline]
    pub fn delete_all(&self) -> Result<()> {
        let url = self.schema_url()?;

        self.http_delete(&url).map_err(|e| {
            RagError::IndexUnavailable(format!(
                "Failed to delete collection {}: {}",
                self.class_name, e
            ))
        })?;

        info!("Deleted collection {}", self.class_name);
        Ok(())
    }

    fn graphql<T: serde::de::DeserializeOwned>(&self, query: &str) -> Result<T> {
        let url = self.api_url("/v1/graphql")?;
        let body = json!({ "query": query }).to_string();

        let response_text = self
            .http_post(&url, &body)
            .map_err(|e| RagError::IndexUnavailable(format!("GraphQL request failed: {e}")))?;

        let response: GraphQlResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
            RagError::IndexUnavailable(format!("Failed to parse GraphQL response: {e}"))
        })?;

        if let Some(error) = response.errors.first() {
            return Err(RagError::IndexUnavailable(format!(
                "GraphQL error: {}",
                error.message
            )));
        }

        response
            .data
            .ok_or_else(|| RagError::IndexUnavailable("GraphQL response missing data".to_string()))
    }

    fn schema_url(&self) -> Result<Url> {
        self.api_url(&format!("/v1/schema/{}", self.class_name))
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RagError::IndexUnavailable(format!("Failed to build URL {path}: {e}")))
    }

    fn http_get(&self, url: &Url) -> std::result::Result<String, ureq::Error> {
        let mut request = self.agent.get(url.as_str());
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }
        request
            .call()
            .and_then(|mut response| response.body_mut().read_to_string())
    }

    fn http_post(&self, url: &Url, body: &str) -> std::result::Result<String, ureq::Error> {
        let mut request = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }
        request
            .send(body)
            .and_then(|mut response| response.body_mut().read_to_string())
    }

    fn http_delete(&self, url: &Url) -> std::result::Result<String, ureq::Error> {
        let mut request = self.agent.delete(url.as_str());
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }
        request
            .call()
            .and_then(|mut response| response.body_mut().read_to_string())
    }
}
