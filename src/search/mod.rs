//! Similarity search: the in-memory vector index and the retrieval
//! engine that ties embedding and search together.

pub mod engine;
pub mod index;

pub use engine::RetrievalEngine;
pub use index::{SearchMatch, SimilarityIndex};
