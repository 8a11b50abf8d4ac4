// Vector database module

pub mod weaviate;

pub use weaviate::{RetrievedDocument, VectorDocument, WeaviateStore};
