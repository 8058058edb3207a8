//! Embedding service: owns exactly one active backend.
//!
//! The backend is a tagged variant selected once at initialization, not
//! dynamic dispatch per call; switching backends requires a full release
//! and re-initialize cycle.

use std::path::{Path, PathBuf};

use super::average::AverageVectorEmbedder;
use super::transformer::{SessionProvider, TransformerConfig, TransformerEmbedder};
use crate::error::{Error, Result};

/// Which embedding backend to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    WordVector,
    Transformer,
    /// Resolve by file extension once at initialization: `.onnx` means
    /// transformer, anything else a word-vector table.
    Auto,
}

impl ModelKind {
    /// Resolve `Auto` against a concrete model path; explicit kinds are
    /// returned unchanged.
    pub fn resolve(self, model_path: &Path) -> ModelKind {
        match self {
            ModelKind::Auto => {
                let is_onnx = model_path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));
                if is_onnx {
                    ModelKind::Transformer
                } else {
                    ModelKind::WordVector
                }
            }
            kind => kind,
        }
    }
}

/// Configuration resolved once at initialization.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub kind: ModelKind,
    /// Vocabulary file for the transformer path; defaults to `vocab.txt`
    /// next to the model.
    pub vocab_path: Option<PathBuf>,
    pub transformer: TransformerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Auto,
            vocab_path: None,
            transformer: TransformerConfig::default(),
        }
    }
}

enum Backend {
    WordVector(AverageVectorEmbedder),
    Transformer(TransformerEmbedder),
}

/// Uniform embed/embed_batch/dimension surface over the active backend.
#[derive(Default)]
pub struct EmbeddingService {
    backend: Option<Backend>,
}

impl EmbeddingService {
    pub fn new() -> Self {
        Self { backend: None }
    }

    /// Load the backend selected by `config.kind` (resolved against the
    /// model path when `Auto`). Replaces any previously active backend.
    ///
    /// The transformer path needs a [`SessionProvider`] for the external
    /// inference engine; passing `None` there is a state error.
    pub fn initialize(
        &mut self,
        model_path: &Path,
        config: &ServiceConfig,
        provider: Option<&dyn SessionProvider>,
    ) -> Result<()> {
        self.backend = None;

        let backend = match config.kind.resolve(model_path) {
            ModelKind::WordVector => {
                Backend::WordVector(AverageVectorEmbedder::load(model_path)?)
            }
            ModelKind::Transformer => {
                let provider = provider
                    .ok_or(Error::State("transformer model needs an inference session provider"))?;
                let vocab_path = match &config.vocab_path {
                    Some(path) => path.clone(),
                    None => model_path
                        .parent()
                        .unwrap_or_else(|| Path::new(""))
                        .join("vocab.txt"),
                };
                Backend::Transformer(TransformerEmbedder::initialize(
                    model_path,
                    &vocab_path,
                    provider,
                    config.transformer.clone(),
                )?)
            }
            ModelKind::Auto => unreachable!("Auto resolves to a concrete kind"),
        };

        self.backend = Some(backend);
        Ok(())
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match &self.backend {
            Some(Backend::WordVector(embedder)) => Ok(embedder.embed(text)),
            Some(Backend::Transformer(embedder)) => embedder.embed(text),
            None => Err(Error::State("embedding service is not initialized")),
        }
    }

    /// Element-wise embedding, order-preserving, failing fast on the
    /// first backend error.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match &self.backend {
            Some(Backend::WordVector(embedder)) => embedder.embed_batch(texts),
            Some(Backend::Transformer(embedder)) => embedder.embed_batch(texts),
            None => Err(Error::State("embedding service is not initialized")),
        }
    }

    /// Embedding dimension of the active backend, 0 when uninitialized.
    pub fn dimension(&self) -> usize {
        match &self.backend {
            Some(Backend::WordVector(embedder)) => embedder.dimension(),
            Some(Backend::Transformer(embedder)) => embedder.dimension(),
            None => 0,
        }
    }

    /// Approximate memory held by the active backend, in bytes.
    pub fn memory_estimate(&self) -> usize {
        match &self.backend {
            Some(Backend::WordVector(embedder)) => embedder.memory_estimate(),
            Some(Backend::Transformer(embedder)) => embedder.memory_estimate(),
            None => 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Drop the active backend. Idempotent.
    pub fn release(&mut self) {
        self.backend = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_auto_resolves_by_extension() {
        assert_eq!(
            ModelKind::Auto.resolve(Path::new("models/encoder.onnx")),
            ModelKind::Transformer
        );
        assert_eq!(
            ModelKind::Auto.resolve(Path::new("models/encoder.ONNX")),
            ModelKind::Transformer
        );
        assert_eq!(
            ModelKind::Auto.resolve(Path::new("models/words.bin")),
            ModelKind::WordVector
        );
        // Explicit kinds are untouched by the path.
        assert_eq!(
            ModelKind::WordVector.resolve(Path::new("weird.onnx")),
            ModelKind::WordVector
        );
    }

    #[test]
    fn test_word_vector_lifecycle() {
        let mut data = b"1 2\nhello ".to_vec();
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&0.0f32.to_le_bytes());
        let path = std::env::temp_dir().join(format!(
            "qamatch-w2v-{}-{:?}.bin",
            std::process::id(),
            std::thread::current().id()
        ));
        fs::write(&path, &data).unwrap();

        let mut service = EmbeddingService::new();
        assert!(!service.is_initialized());
        assert_eq!(service.dimension(), 0);
        assert!(matches!(service.embed("hi"), Err(Error::State(_))));

        service
            .initialize(&path, &ServiceConfig::default(), None)
            .unwrap();
        assert!(service.is_initialized());
        assert_eq!(service.dimension(), 2);
        assert!(service.memory_estimate() > 0);

        let batch = service
            .embed_batch(&["hello".to_string(), "zzz".to_string()])
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], vec![1.0, 0.0]);
        assert_eq!(batch[1], vec![0.0, 0.0]);

        service.release();
        assert!(!service.is_initialized());
        service.release(); // idempotent
        assert!(!service.is_initialized());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_transformer_without_provider_is_state_error() {
        let mut service = EmbeddingService::new();
        let err = service
            .initialize(Path::new("model.onnx"), &ServiceConfig::default(), None)
            .unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }
}
