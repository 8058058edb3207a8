//! In-memory similarity index over QA entries.
//!
//! Deliberately an exhaustive linear scan: the target knowledge bases are
//! small enough that an ANN structure would cost more than it saves.

use crate::embed::cosine_similarity;
use crate::error::{Error, Result};

/// One stored entry, identified by insertion order.
struct QaEntry {
    question: String,
    answer: String,
    embedding: Vec<f32>,
}

/// Best match for a query: the stored question/answer plus the cosine
/// similarity, clamped to [-1, 1].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SearchMatch {
    pub question: String,
    pub answer: String,
    pub similarity: f32,
}

impl SearchMatch {
    /// The degraded result for empty/uninitialized indexes and failed
    /// query embeddings.
    pub fn empty() -> Self {
        Self {
            question: String::new(),
            answer: String::new(),
            similarity: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.question.is_empty() && self.answer.is_empty()
    }
}

/// Ordered store of (question, answer, embedding) with linear-scan
/// cosine-similarity lookup. The dimension is fixed at `initialize` and
/// reset only by `clear`.
#[derive(Default)]
pub struct SimilarityIndex {
    entries: Vec<QaEntry>,
    dim: usize,
    initialized: bool,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the embedding dimension and discard any prior entries.
    pub fn initialize(&mut self, dim: usize) -> Result<()> {
        if dim == 0 {
            return Err(Error::State("index dimension must be positive"));
        }
        self.entries.clear();
        self.dim = dim;
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn add(&mut self, question: &str, answer: &str, embedding: Vec<f32>) -> Result<()> {
        if !self.initialized {
            return Err(Error::State("index is not initialized"));
        }
        if embedding.len() != self.dim {
            return Err(Error::Format(format!(
                "embedding has dimension {}, index expects {}",
                embedding.len(),
                self.dim
            )));
        }
        self.entries.push(QaEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            embedding,
        });
        Ok(())
    }

    /// All-or-nothing batch insert: input lengths and every embedding's
    /// dimension are validated before anything is appended, so a failed
    /// batch leaves the index exactly as it was.
    pub fn add_batch(
        &mut self,
        questions: &[String],
        answers: &[String],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        if !self.initialized {
            return Err(Error::State("index is not initialized"));
        }
        if questions.len() != answers.len() || questions.len() != embeddings.len() {
            return Err(Error::Format(format!(
                "batch length mismatch: {} questions, {} answers, {} embeddings",
                questions.len(),
                answers.len(),
                embeddings.len()
            )));
        }
        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != self.dim {
                return Err(Error::Format(format!(
                    "embedding {} has dimension {}, index expects {}",
                    i,
                    embedding.len(),
                    self.dim
                )));
            }
        }

        self.entries.reserve(questions.len());
        for ((question, answer), embedding) in questions.iter().zip(answers).zip(embeddings) {
            self.entries.push(QaEntry {
                question: question.clone(),
                answer: answer.clone(),
                embedding,
            });
        }
        Ok(())
    }

    /// Exhaustive scan for the most similar entry. Exact ties keep the
    /// earliest insertion. Empty or uninitialized indexes yield the empty
    /// match for any query, including the zero vector.
    pub fn search(&self, query: &[f32]) -> SearchMatch {
        if !self.initialized || self.entries.is_empty() {
            return SearchMatch::empty();
        }

        let mut best_similarity = -1.0f32;
        let mut best_index = 0usize;
        for (i, entry) in self.entries.iter().enumerate() {
            let similarity = cosine_similarity(query, &entry.embedding);
            if similarity > best_similarity {
                best_similarity = similarity;
                best_index = i;
            }
        }

        let best = &self.entries[best_index];
        SearchMatch {
            question: best.question.clone(),
            answer: best.answer.clone(),
            similarity: best_similarity.clamp(-1.0, 1.0),
        }
    }

    /// Independent per-query search, preserving input order.
    pub fn search_batch(&self, queries: &[Vec<f32>]) -> Vec<SearchMatch> {
        queries.iter().map(|q| self.search(q)).collect()
    }

    /// Drop all entries and return to the uninitialized state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dim = 0;
        self.initialized = false;
    }
}
