//! Averaging embedder over a static word-vector table.

use std::path::Path;

use super::l2_normalize;
use super::word_vectors::WordVectorTable;
use crate::error::Result;

/// Embeds text as the L2-normalized mean of resolved token vectors.
pub struct AverageVectorEmbedder {
    table: WordVectorTable,
}

impl AverageVectorEmbedder {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            table: WordVectorTable::load(path)?,
        })
    }

    pub fn new(table: WordVectorTable) -> Self {
        Self { table }
    }

    pub fn dimension(&self) -> usize {
        self.table.dimension()
    }

    pub fn memory_estimate(&self) -> usize {
        self.table.memory_estimate()
    }

    pub fn table(&self) -> &WordVectorTable {
        &self.table
    }

    /// Embed `text`. When no token resolves against the table, the result
    /// is the all-zero vector of the configured dimension.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let dim = self.table.dimension();
        let mut sum = vec![0.0f32; dim];
        let mut resolved = 0usize;

        for token in self.table.tokenize(text) {
            if let Some(vec) = self.table.get(token) {
                for (acc, val) in sum.iter_mut().zip(vec) {
                    *acc += val;
                }
                resolved += 1;
            }
        }

        if resolved == 0 {
            return sum;
        }
        for val in &mut sum {
            *val /= resolved as f32;
        }
        l2_normalize(&mut sum);
        sum
    }

    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}
