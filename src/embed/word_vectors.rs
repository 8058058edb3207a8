//! Word-vector table (word2vec-style binary model) and its greedy
//! forward-maximum-match tokenizer.
//!
//! Two on-disk encodings are accepted:
//! (a) a text header line `<vocab_size> <dim>` followed by, per word, a
//!     whitespace-terminated UTF-8 word and `dim` little-endian f32s;
//! (b) when the text header does not parse, two raw little-endian u32s as
//!     the header, then the same per-word records.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

// Rough per-entry overhead of the hash map node, used in memory estimates.
const ENTRY_OVERHEAD: usize = 32;

/// Word to fixed-dimension vector mapping, immutable after load.
#[derive(Debug)]
pub struct WordVectorTable {
    vectors: HashMap<String, Vec<f32>>,
    dim: usize,
    /// Longest key in bytes; bounds greedy matching.
    max_word_len: usize,
}

impl WordVectorTable {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (vocab_size, dim, body_start) = parse_header(data)?;

        // Each record needs at least one word byte plus its vector, so a
        // header promising more entries than the payload can hold is
        // garbage. Checked before any allocation sized from the header.
        let record_min = dim
            .checked_mul(4)
            .and_then(|bytes| bytes.checked_add(1))
            .ok_or_else(|| Error::Format(format!("vector dimension {dim} overflows")))?;
        let body_len = data.len().saturating_sub(body_start);
        if vocab_size > body_len / record_min {
            return Err(Error::Format(format!(
                "header claims {vocab_size} entries of dimension {dim}, payload is {body_len} bytes"
            )));
        }

        let mut vectors = HashMap::with_capacity(vocab_size);
        let mut max_word_len = 0;
        let mut pos = body_start;

        for _ in 0..vocab_size {
            while pos < data.len() && data[pos].is_ascii_whitespace() {
                pos += 1;
            }
            let word_start = pos;
            while pos < data.len() && !data[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos == word_start {
                return Err(Error::Format("truncated word entry".to_string()));
            }
            let word = std::str::from_utf8(&data[word_start..pos])
                .map_err(|e| Error::Format(format!("word is not valid UTF-8: {e}")))?
                .to_string();
            // Single separator byte between the word and its vector.
            if pos < data.len() {
                pos += 1;
            }

            let end = pos + dim * 4;
            if end > data.len() {
                return Err(Error::Format(format!("short vector read for '{word}'")));
            }
            let vec: Vec<f32> = data[pos..end]
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
                .collect();
            pos = end;

            max_word_len = max_word_len.max(word.len());
            vectors.insert(word, vec);
        }

        Ok(Self {
            vectors,
            dim,
            max_word_len,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    /// Approximate heap usage of the table in bytes.
    pub fn memory_estimate(&self) -> usize {
        self.vectors
            .keys()
            .map(|w| w.len() + self.dim * 4 + ENTRY_OVERHEAD)
            .sum()
    }

    /// Forward-maximum-match tokenization.
    ///
    /// ASCII alphanumeric/underscore runs form one token and other ASCII
    /// bytes are separators. At a non-ASCII position the longest substring
    /// present in the table wins (bounded by the longest key); when nothing
    /// matches, exactly one codepoint is emitted. Greedy, no backtracking:
    /// a locally maximal match is not guaranteed to be globally optimal.
    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let bytes = text.as_bytes();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i].is_ascii() {
                if bytes[i].is_ascii_whitespace() {
                    i += 1;
                    continue;
                }
                let start = i;
                while i < bytes.len()
                    && bytes[i].is_ascii()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                if i > start {
                    tokens.push(&text[start..i]);
                } else {
                    // Separator byte, skip it.
                    i += 1;
                }
                continue;
            }

            let limit = self.max_word_len.min(bytes.len() - i);
            let mut matched = false;
            for len in (1..=limit).rev() {
                if !text.is_char_boundary(i + len) {
                    continue;
                }
                let sub = &text[i..i + len];
                if self.vectors.contains_key(sub) {
                    tokens.push(sub);
                    i += len;
                    matched = true;
                    break;
                }
            }
            if !matched {
                let ch_len = text[i..].chars().next().map_or(1, char::len_utf8);
                tokens.push(&text[i..i + ch_len]);
                i += ch_len;
            }
        }
        tokens
    }
}

/// Parse the model header, returning (vocab_size, dim, body offset).
fn parse_header(data: &[u8]) -> Result<(usize, usize, usize)> {
    if let Some((vocab_size, dim, body_start)) = parse_text_header(data) {
        return Ok((vocab_size, dim, body_start));
    }

    // Rewind and read two raw little-endian u32s instead.
    if data.len() < 8 {
        return Err(Error::Format("model header too short".to_string()));
    }
    let vocab_size = u32::from_le_bytes(data[0..4].try_into().unwrap()) as usize;
    let dim = u32::from_le_bytes(data[4..8].try_into().unwrap()) as usize;
    if vocab_size == 0 || dim == 0 {
        return Err(Error::Format("model header is neither text nor raw".to_string()));
    }
    Ok((vocab_size, dim, 8))
}

fn parse_text_header(data: &[u8]) -> Option<(usize, usize, usize)> {
    let newline = data.iter().position(|&b| b == b'\n')?;
    let line = std::str::from_utf8(&data[..newline]).ok()?;
    let mut fields = line.split_whitespace();
    let vocab_size: usize = fields.next()?.parse().ok()?;
    let dim: usize = fields.next()?.parse().ok()?;
    if vocab_size == 0 || dim == 0 {
        return None;
    }
    Some((vocab_size, dim, newline + 1))
}
