// Ingestion pipeline module
// One-shot batch job that (re)populates the vector index from the
// knowledge source file


use tracing::info;

use crate::Result;
use crate::chunking;
use crate::config::Config;
use crate::database::weaviate::{VectorDocument, WeaviateStore};
use crate::embeddings::GeminiEmbedder;

/// Chunk -> embed -> ensure schema -> store -> count. Strictly sequential
/// and non-resumable: any stage failure aborts the run with that stage's
/// error, no checkpoint is persisted, and reruns start from full
/// re-chunking. Concurrent query traffic may observe the index mid-write;
/// that weak consistency is accepted.
pub struct IngestionPipeline {
    config: Config,
    show_progress: bool,
}

/// Summary of a completed ingestion run. `documents_stored` is the index's
/// own post-store count, which is approximate when the count fell back to
/// the existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks_created: usize,
    pub embeddings_generated: usize,
    pub documents_stored: u64,
}

impl IngestionPipeline {
    #[inline]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            show_progress: false,
        }
    }

    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run the pipeline end to end.
    #[inline]
    pub async fn run(&self) -> Result<IngestReport> {
        let source_path = &self.config.knowledge.source_path;
        info!("Chunking knowledge source {}", source_path.display());
        let chunks = chunking::chunk_file(source_path)?;
        let chunks_created = chunks.len();
        info!("Created {} chunks from {}", chunks_created, source_path.display());

        let embedder = GeminiEmbedder::new(&self.config.gemini)?;
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        let embeddings_generated = embeddings.len();
        info!("Generated {} embeddings", embeddings_generated);

        let documents: Vec<VectorDocument> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, result)| VectorDocument::from_chunk(chunk, result.embedding))
            .collect();

        let store = WeaviateStore::new(&self.config.weaviate)?.with_progress(self.show_progress);
        store.ensure_schema()?;
        store.store_documents(&documents)?;

        let documents_stored = store.count_documents()?;
        info!("Index reports {} stored documents", documents_stored);

        Ok(IngestReport {
            chunks_created,
            embeddings_generated,
            documents_stored,
        })
    }
}
