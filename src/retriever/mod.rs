
use tracing::{debug, info};

use crate::Result;
use crate::config::Config;
use crate::database::weaviate::{RetrievedDocument, WeaviateStore};
use crate::embeddings::GeminiEmbedder;
use crate::generation::GeminiGenerator;

/// How many documents to pull into the context block.
const TOP_K: usize = 5;

const PERSONA_PREAMBLE: &str = "You are Sarah, a senior customer support specialist at Aven. \
Use the following information from our knowledge base to answer the customer's question. \
Keep your response warm, professional, and concise (2-4 sentences maximum).";

const CLOSING_INSTRUCTION: &str = "Please provide a helpful, accurate response based on the \
information above. If the information doesn't fully address their question, acknowledge what \
you can help with and suggest next steps.";

/// Outcome of one retrieval-augmented answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagAnswer {
    pub text: String,
    pub context_used: bool,
    pub documents_retrieved: usize,
}

/// Query-time orchestrator: embed the query, search the index, format the
/// retrieved documents into a context block, and hand the composed prompt
/// to the generation client. Performs no ranking of its own — ordering is
/// entirely the index's.
pub struct Retriever {
    embedder: GeminiEmbedder,
    store: WeaviateStore,
    generator: GeminiGenerator,
    top_k: usize,
}

impl Retriever {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            embedder: GeminiEmbedder::new(&config.gemini)?,
            store: WeaviateStore::new(&config.weaviate)?,
            generator: GeminiGenerator::new(&config.gemini)?,
            top_k: TOP_K,
        })
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer a customer query. A zero-hit search still produces an answer
    /// (the context block is simply empty); any failure in the
    /// embed/search/generate chain propagates to the caller.
    #[inline]
    pub fn answer(&self, query: &str, conversation: Option<&str>) -> Result<RagAnswer> {
        let query_embedding = self.embedder.embed(query)?;
        let documents = self.store.search_similar(&query_embedding, self.top_k)?;
        debug!("Retrieved {} documents for query", documents.len());

        let context = build_context(&documents);
        let prompt = build_prompt(query, &context, conversation);
        let text = self.generator.generate(&prompt)?;

        info!(
            "Answered query using {} retrieved documents",
            documents.len()
        );

        Ok(RagAnswer {
            text,
            context_used: !documents.is_empty(),
            documents_retrieved: documents.len(),
        })
    }
}

/// Render retrieved documents into the fixed context-block template.
fn build_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let category = if document.category.is_empty() {
                "general"
            } else {
                document.category.as_str()
            };
            format!(
                "Document {} (Category: {}):\nQuestion: {}\nAnswer: {}\nContent: {}\n---",
                index + 1,
                category,
                document.question,
                document.answer,
                document.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_prompt(query: &str, context: &str, conversation: Option<&str>) -> String {
    let mut prompt = format!(
        "{PERSONA_PREAMBLE}\n\nRelevant Information from Our Knowledge Base:\n{context}\n\n"
    );

    if let Some(recent) = conversation {
        prompt.push_str(&format!("Recent Conversation:\n{recent}\n\n"));
    }

    prompt.push_str(&format!("Customer Question: {query}\n\n{CLOSING_INSTRUCTION}"));
    prompt
}
