
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Environment variable that overrides the configured Gemini API key.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable that overrides the configured Weaviate API key.
pub const WEAVIATE_API_KEY_VAR: &str = "WEAVIATE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub weaviate: WeaviateConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeaviateConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub class_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub source_path: PathBuf,
}

impl Default for GeminiConfig {
    #[inline]
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            embedding_model: "embedding-001".to_string(),
            generation_model: "gemini-2.5-flash".to_string(),
            batch_size: 5,
            batch_delay_ms: 1000,
        }
    }
}

impl Default for WeaviateConfig {
    #[inline]
    fn default() -> Self {
        Self {
            endpoint: "localhost:8080".to_string(),
            api_key: None,
            class_name: "AvenKnowledge".to_string(),
        }
    }
}

impl Default for KnowledgeConfig {
    #[inline]
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("aven-data.txt"),
        }
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            weaviate: WeaviateConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid endpoint: {0} (cannot be empty)")]
    InvalidEndpoint(String),
    #[error("Invalid batch size: {0} (must be between 1 and 100)")]
    InvalidBatchSize(usize),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid class name: {0} (must start with an uppercase letter)")]
    InvalidClassName(String),
    #[error("Invalid source path (cannot be empty)")]
    InvalidSourcePath,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".aven-rag"))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the configuration from the config directory, falling back to
    /// defaults when no config file exists yet.
    #[inline]
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = Self::config_file_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gemini.validate()?;
        self.weaviate.validate()?;
        self.knowledge.validate()?;
        Ok(())
    }
}

impl GeminiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.generation_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.generation_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 100 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    /// The effective API key: the environment variable wins over the config
    /// file so credentials never have to live on disk.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(GEMINI_API_KEY_VAR)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

impl WeaviateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }

        if !self
            .class_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
        {
            return Err(ConfigError::InvalidClassName(self.class_name.clone()));
        }

        self.base_url()?;
        Ok(())
    }

    /// Resolve the endpoint into a full base URL. Bare endpoints (the form
    /// cloud consoles hand out) default to HTTPS; endpoints carrying an
    /// explicit scheme are used verbatim.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url_str = if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("https://{}", self.endpoint)
        };
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    /// The effective API key, with the environment variable taking precedence.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(WEAVIATE_API_KEY_VAR)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

impl KnowledgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidSourcePath);
        }
        Ok(())
    }
}
