//! Wordpiece vocabulary: one token per line, line index = token id.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

// Default ids for the reserved tokens, used when the loaded vocabulary
// does not contain them (matches the common BERT layout).
const DEFAULT_CLS_ID: i64 = 101;
const DEFAULT_SEP_ID: i64 = 102;
const DEFAULT_UNK_ID: i64 = 100;
const DEFAULT_PAD_ID: i64 = 0;

/// Token-string to id mapping, immutable after load.
#[derive(Debug)]
pub struct Vocabulary {
    tokens: HashMap<String, i64>,
    cls_id: i64,
    sep_id: i64,
    unk_id: i64,
    pad_id: i64,
}

impl Vocabulary {
    /// Load a vocabulary file: one token per line, trailing `\r` stripped,
    /// line index becomes the id.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::from_lines(content.lines()))
    }

    /// Build from an iterator of token lines (id = iteration order).
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tokens = HashMap::new();
        for (id, line) in lines.into_iter().enumerate() {
            let token = line.strip_suffix('\r').unwrap_or(line);
            tokens.insert(token.to_string(), id as i64);
        }

        let cls_id = tokens.get("[CLS]").copied().unwrap_or(DEFAULT_CLS_ID);
        let sep_id = tokens.get("[SEP]").copied().unwrap_or(DEFAULT_SEP_ID);
        let unk_id = tokens.get("[UNK]").copied().unwrap_or(DEFAULT_UNK_ID);
        let pad_id = tokens.get("[PAD]").copied().unwrap_or(DEFAULT_PAD_ID);

        Self {
            tokens,
            cls_id,
            sep_id,
            unk_id,
            pad_id,
        }
    }

    pub fn id_of(&self, token: &str) -> Option<i64> {
        self.tokens.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn cls_id(&self) -> i64 {
        self.cls_id
    }

    pub fn sep_id(&self) -> i64 {
        self.sep_id
    }

    pub fn unk_id(&self) -> i64 {
        self.unk_id
    }

    pub fn pad_id(&self) -> i64 {
        self.pad_id
    }
}
