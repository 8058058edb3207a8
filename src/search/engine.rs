//! Retrieval engine: embeds QA pairs into the similarity index and
//! answers queries against it.

use std::path::Path;

use crate::core::qafile::{self, QaPair};
use crate::embed::service::{EmbeddingService, ServiceConfig};
use crate::embed::transformer::SessionProvider;
use crate::error::{Error, Result};

use super::index::{SearchMatch, SimilarityIndex};

/// Orchestrates ingestion (embed QA pairs → populate index) and querying
/// (embed query → search index).
///
/// The engine keeps its own QA ledger for count and memory accounting.
/// Ingestion is transactional: the index's batch insert validates
/// everything before appending and the ledger is extended only after it
/// succeeds, so ledger size equals index size after every ingest,
/// successful or failed.
#[derive(Default)]
pub struct RetrievalEngine {
    service: EmbeddingService,
    index: SimilarityIndex,
    ledger: Vec<QaPair>,
    initialized: bool,
}

impl RetrievalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the embedding backend, then size the index to its
    /// dimension. Re-initializing releases any prior state first.
    pub fn initialize(
        &mut self,
        model_path: &Path,
        config: &ServiceConfig,
        provider: Option<&dyn SessionProvider>,
    ) -> Result<()> {
        if self.initialized {
            self.release();
        }
        self.service.initialize(model_path, config, provider)?;
        self.index.initialize(self.service.dimension())?;
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Embed all questions in one batch and append the pairs to the
    /// index and the ledger.
    pub fn ingest(&mut self, pairs: &[QaPair]) -> Result<usize> {
        if !self.initialized {
            return Err(Error::State("engine is not initialized"));
        }
        if pairs.is_empty() {
            return Err(Error::Format("QA pair list is empty".to_string()));
        }

        let questions: Vec<String> = pairs.iter().map(|p| p.question.clone()).collect();
        let answers: Vec<String> = pairs.iter().map(|p| p.answer.clone()).collect();

        let embeddings = self.service.embed_batch(&questions)?;
        self.index.add_batch(&questions, &answers, embeddings)?;
        self.ledger.extend_from_slice(pairs);
        Ok(pairs.len())
    }

    /// Parse a QA source file and ingest its pairs.
    pub fn ingest_file(&mut self, path: &Path) -> Result<usize> {
        let pairs = qafile::parse(path)?;
        self.ingest(&pairs)
    }

    /// Answer one query. An embedding failure (tokenizer or backend)
    /// degrades to the empty match with similarity 0, never an error.
    pub fn query(&self, text: &str) -> Result<SearchMatch> {
        if !self.initialized {
            return Err(Error::State("engine is not initialized"));
        }
        Ok(match self.service.embed(text) {
            Ok(embedding) => self.index.search(&embedding),
            Err(_) => SearchMatch::empty(),
        })
    }

    /// Answer queries independently, preserving input order. The result
    /// count always equals the input count; every failed embed degrades
    /// to the empty match.
    pub fn query_batch(&self, texts: &[String]) -> Result<Vec<SearchMatch>> {
        if !self.initialized {
            return Err(Error::State("engine is not initialized"));
        }
        Ok(texts
            .iter()
            .map(|text| match self.service.embed(text) {
                Ok(embedding) => self.index.search(&embedding),
                Err(_) => SearchMatch::empty(),
            })
            .collect())
    }

    /// Number of ingested QA pairs.
    pub fn count(&self) -> usize {
        self.ledger.len()
    }

    pub fn dimension(&self) -> usize {
        self.service.dimension()
    }

    /// Rough total memory held by the engine: ledger strings, the
    /// embedder's own estimate, and the stored embeddings.
    pub fn memory_estimate(&self) -> usize {
        let mut total: usize = self
            .ledger
            .iter()
            .map(|p| p.question.len() + p.answer.len())
            .sum();
        if self.service.is_initialized() {
            total += self.service.memory_estimate();
            total += self.service.dimension() * 4 * self.ledger.len();
        }
        total + std::mem::size_of::<Self>()
    }

    /// Release the embedding backend, the index, and the ledger. Safe to
    /// call repeatedly.
    pub fn release(&mut self) {
        self.service.release();
        self.index.clear();
        self.ledger.clear();
        self.initialized = false;
    }
}
