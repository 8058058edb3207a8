//! Embedding generation: tokenizers, the two embedding backends, and the
//! service that owns whichever backend is active.
//!
//! Data flow: raw text → tokenizer → id/token sequence → embedder →
//! L2-normalized vector.

pub mod average;
pub mod service;
pub mod transformer;
pub mod vocab;
pub mod word_vectors;
pub mod wordpiece;

pub use average::AverageVectorEmbedder;
pub use service::{EmbeddingService, ModelKind, ServiceConfig};
pub use transformer::{
    InferenceSession, InputRole, InputRoleMap, SessionProvider, TensorBinding, TensorOutput,
    TransformerConfig, TransformerEmbedder,
};
pub use vocab::Vocabulary;
pub use word_vectors::WordVectorTable;
pub use wordpiece::WordpieceTokenizer;

/// Scale `vec` to unit length in place. Vectors with near-zero magnitude
/// are left untouched so callers get the designated all-zero vector
/// instead of NaN.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-6 {
        for val in vec {
            *val /= norm;
        }
    }
}

/// Cosine similarity between two vectors, 0.0 when either operand has
/// zero norm or the lengths differ (never NaN).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a < 1e-9 || norm_b < 1e-9 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
