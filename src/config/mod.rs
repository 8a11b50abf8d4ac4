// Configuration management module
// Handles TOML configuration for the Gemini and Weaviate clients

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, GeminiConfig, KnowledgeConfig, WeaviateConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
