use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Embedding failed for {text:?}: {reason}")]
    EmbeddingFailed { text: String, reason: String },

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod generation;
pub mod indexer;
pub mod retriever;
