
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::GeminiConfig;
use crate::{RagError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Client for the Gemini `generateContent` endpoint: one prompt string in,
/// generated text out.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    base_url: Url,
    model: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
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
            model: config.generation_model.clone(),
            api_key: config.resolve_api_key(),
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

    /// Generate a completion for the given prompt. Failures surface as
    /// `GenerationFailed`; nothing is retried.
    #[inline]
    pub fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Generating completion for prompt (length: {})", prompt.len());

        let url = self
            .endpoint_url()
            .map_err(RagError::GenerationFailed)?;

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let request_json = serde_json::to_string(&request)
            .map_err(|e| RagError::GenerationFailed(format!("Failed to serialize request: {e}")))?;

        let response_text = self
            .post_json(&url, &request_json)
            .map_err(RagError::GenerationFailed)?;

        let response: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| RagError::GenerationFailed(format!("Failed to parse response: {e}")))?;

        let text = response_to_text(response).ok_or_else(|| {
            RagError::GenerationFailed("Provider returned no candidates".to_string())
        })?;

        debug!("Generated {} characters", text.len());
        Ok(text)
    }

    fn endpoint_url(&self) -> std::result::Result<Url, String> {
        let path = format!("/v1beta/models/{}:generateContent", self.model);
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| format!("Failed to build generation URL: {e}"))?;

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

/// Extract the generated text: the first candidate's parts, concatenated.
fn response_to_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let content = candidate.content?;

    let text: String = content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect();

    if text.is_empty() { None } else { Some(text) }
}
