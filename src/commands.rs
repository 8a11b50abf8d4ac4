use anyhow::{Context, Result};
use console::style;
use dialoguer::Confirm;
use tracing::info;

use crate::chunking;
use crate::config::Config;
use crate::database::weaviate::WeaviateStore;
use crate::indexer::IngestionPipeline;
use crate::retriever::Retriever;

/// Run the full ingestion pipeline and print a summary
#[inline]
pub async fn ingest() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    println!("🚀 Starting knowledge base ingestion...");
    println!(
        "   Source: {}",
        config.knowledge.source_path.display()
    );
    println!();

    info!("Starting ingestion pipeline");
    let pipeline = IngestionPipeline::new(config.clone()).with_progress(true);
    let report = pipeline.run().await.context("Ingestion pipeline failed")?;

    println!("🎉 Pipeline completed successfully!");
    println!();
    println!("📊 Summary:");
    println!("   Chunks created: {}", report.chunks_created);
    println!("   Embeddings generated: {}", report.embeddings_generated);
    println!("   Documents stored: {}", report.documents_stored);

    // Re-chunking is deterministic, so this shows exactly what was stored.
    if let Ok(chunks) = chunking::chunk_file(&config.knowledge.source_path) {
        println!();
        println!("📝 Sample chunks:");
        for (index, chunk) in chunks.iter().take(3).enumerate() {
            println!(
                "{}. {}",
                index + 1,
                chunk.question.as_deref().unwrap_or("(no question)")
            );
            println!("   Category: {}", chunk.metadata.category);
            println!("   Content length: {} characters", chunk.content.len());
        }
    }

    Ok(())
}

/// Answer a single question against the knowledge base
#[inline]
pub fn ask(query: String, conversation: Option<String>) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let retriever = Retriever::new(&config)?;

    println!("🔍 {}", style(&query).bold());

    let answer = retriever
        .answer(&query, conversation.as_deref())
        .context("Failed to answer query")?;

    println!();
    println!("{}", answer.text);
    println!();

    if answer.context_used {
        println!(
            "{}",
            style(format!(
                "({} knowledge base documents used)",
                answer.documents_retrieved
            ))
            .dim()
        );
    } else {
        println!("{}", style("(no knowledge base documents matched)").dim());
    }

    Ok(())
}

/// Show connectivity and document-count status
#[inline]
pub fn status() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("📊 Aven RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Gemini Configuration:");
    println!("   Embedding model: {}", config.gemini.embedding_model);
    println!("   Generation model: {}", config.gemini.generation_model);
    println!("   Batch size: {}", config.gemini.batch_size);
    if config.gemini.resolve_api_key().is_some() {
        println!("   ✅ API key configured");
    } else {
        println!("   ⚠️  No API key configured (set GEMINI_API_KEY)");
    }

    println!();
    println!("🗄️  Vector Index:");
    match WeaviateStore::new(&config.weaviate) {
        Ok(store) => match store.schema_exists() {
            Ok(true) => {
                println!("   ✅ Weaviate: Connected ({})", config.weaviate.endpoint);
                println!("   📚 Collection: {}", config.weaviate.class_name);
                let count = store.count_documents()?;
                println!("   📄 Documents stored: {}", count);
            }
            Ok(false) => {
                println!("   ✅ Weaviate: Connected ({})", config.weaviate.endpoint);
                println!(
                    "   ⚠️  Collection {} does not exist yet",
                    config.weaviate.class_name
                );
                println!("   💡 Run 'aven-rag ingest' to create and populate it");
            }
            Err(e) => {
                println!("   ❌ Weaviate: Failed to connect - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Weaviate: Invalid configuration - {}", e);
        }
    }

    println!();
    println!(
        "📄 Knowledge source: {}",
        config.knowledge.source_path.display()
    );
    if !config.knowledge.source_path.exists() {
        println!("   ⚠️  Source file not found");
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'aven-rag ingest' to (re)populate the knowledge base");
    println!("   • Use 'aven-rag ask <question>' to query it");
    println!("   • Use 'aven-rag config' to update connection settings");

    Ok(())
}

/// Drop the vector collection after confirmation
#[inline]
pub fn reset(yes: bool) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let store = WeaviateStore::new(&config.weaviate)?;

    if !yes {
        println!(
            "This will delete the {} collection and all its documents.",
            config.weaviate.class_name
        );
        let confirmed = Confirm::new()
            .with_prompt("Delete the knowledge base?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.delete_all().context("Failed to delete collection")?;
    println!(
        "{}",
        style(format!(
            "✓ Collection {} deleted",
            config.weaviate.class_name
        ))
        .green()
    );

    Ok(())
}
