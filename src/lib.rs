//! qamatch library
//!
//! Lightweight QA retrieval: answer a query with the most semantically
//! similar question from a preloaded knowledge base, plus a confidence
//! score. Built for resource-constrained deployments where a full search
//! engine is overkill.
//!
//! # Modules
//!
//! - `core`: QA knowledge-base source parsing
//! - `embed`: tokenizers and embedding backends (word-vector averaging
//!   and transformer inference)
//! - `search`: in-memory similarity index and the retrieval engine
//! - `error`: the shared error type

pub mod core;
pub mod embed;
pub mod error;
pub mod search;

// Re-exports for convenience
pub use crate::core::qafile::QaPair;
pub use embed::service::{EmbeddingService, ModelKind, ServiceConfig};
pub use embed::transformer::{
    InferenceSession, InputRole, InputRoleMap, SessionProvider, TensorBinding, TensorOutput,
};
pub use embed::{cosine_similarity, l2_normalize};
pub use error::{Error, Result};
pub use search::engine::RetrievalEngine;
pub use search::index::{SearchMatch, SimilarityIndex};
