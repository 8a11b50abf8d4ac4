
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::GeminiConfig;
use crate::embeddings::{BatchPolicy, EmbeddingResult, run_grouped};
use crate::{RagError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Client for the Gemini `embedContent` endpoint. Vectors come back at the
/// model's fixed dimension (768 for `embedding-001`).
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    base_url: Url,
    model: String,
    api_key: Option<String>,
    batch_policy: BatchPolicy,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbedder {
    #[inline]
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            RagError::Config(format!("Invalid Gemini base URL {}: {}", config.base_url, e))
        })?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.embedding_model.clone(),
            api_key: config.resolve_api_key(),
            batch_policy: BatchPolicy {
                group_size: config.batch_size,
                group_delay: Duration::from_millis(config.batch_delay_ms),
            },
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.batch_policy = policy;
        self
    }

    /// Generate an embedding vector for a single text. Failures surface as
    /// `EmbeddingFailed` carrying the original text; nothing is retried.
    #[inline]
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let url = self
            .endpoint_url()
            .map_err(|reason| embedding_error(text, reason))?;

        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let request_json = serde_json::to_string(&request)
            .map_err(|e| embedding_error(text, format!("Failed to serialize request: {e}")))?;

        let response_text = self
            .post_json(&url, &request_json)
            .map_err(|reason| embedding_error(text, reason))?;

        let response: EmbedContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| embedding_error(text, format!("Failed to parse response: {e}")))?;

        if response.embedding.values.is_empty() {
            return Err(embedding_error(
                text,
                "Provider returned an empty vector".to_string(),
            ));
        }

        debug!(
            "Generated embedding with {} dimensions",
            response.embedding.values.len()
        );

        Ok(response.embedding.values)
    }

    /// Embed many texts under the batch policy: groups of `batch_size`
    /// dispatched concurrently, a fixed pause between groups, output order
    /// matching input order. All-or-nothing; a single failure aborts the
    /// whole call.
    #[inline]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let client = self.clone();
        let results = run_grouped(texts.to_vec(), &self.batch_policy, move |text| {
            let embedding = client.embed(&text)?;
            Ok(EmbeddingResult { text, embedding })
        })
        .await?;

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    fn endpoint_url(&self) -> std::result::Result<Url, String> {
        let path = format!("/v1beta/models/{}:embedContent", self.model);
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| format!("Failed to build embedding URL: {e}"))?;

        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(url)
    }

    fn post_json(&self, url: &Url, body: &str) -> std::result::Result<String, String> {
        match self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(body)
        {
            Ok(mut response) => response
                .body_mut()
                .read_to_string()
                .map_err(|e| format!("Failed to read response body: {e}")),
            Err(ureq::Error::StatusCode(status)) => Err(format!("Provider returned HTTP {status}")),
            Err(e) => Err(format!("Transport error: {e}")),
        }
    }
}

fn embedding_error(text: &str, reason: String) -> RagError {
    RagError::EmbeddingFailed {
        text: text.to_string(),
        reason,
    }
}
