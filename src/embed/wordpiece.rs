//! Wordpiece tokenizer for the transformer embedding path.
//!
//! Normalization and splitting follow the classic BERT basic tokenizer:
//! lowercase ASCII, strip control characters, split on whitespace and
//! ASCII punctuation, and treat every non-ASCII codepoint (CJK characters
//! and CJK punctuation alike) as its own basic token. Unknown basic tokens
//! are greedily decomposed into `##`-prefixed subword pieces.

use super::vocab::Vocabulary;

/// Subword tokenizer over a loaded [`Vocabulary`].
pub struct WordpieceTokenizer {
    vocab: Vocabulary,
}

impl WordpieceTokenizer {
    pub fn new(vocab: Vocabulary) -> Self {
        Self { vocab }
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn pad_id(&self) -> i64 {
        self.vocab.pad_id()
    }

    /// Tokenize `text` into exactly `max_len` ids:
    /// `[CLS] content... [SEP] [PAD]...`.
    ///
    /// A basic token whose pieces would overflow the remaining budget is
    /// dropped whole, never split across the boundary.
    pub fn tokenize(&self, text: &str, max_len: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(max_len);
        ids.push(self.vocab.cls_id());

        // One slot must stay free for [SEP].
        let content_limit = max_len.saturating_sub(1);
        for token in split_basic(text) {
            let pieces = self.decompose(&token);
            if ids.len() + pieces.len() > content_limit {
                break;
            }
            ids.extend(pieces);
        }

        ids.push(self.vocab.sep_id());
        ids.truncate(max_len);
        while ids.len() < max_len {
            ids.push(self.vocab.pad_id());
        }
        ids
    }

    /// Map one basic token to vocabulary ids: direct hit, else greedy
    /// longest-match decomposition, else `[UNK]` for the whole token.
    fn decompose(&self, token: &str) -> Vec<i64> {
        if let Some(id) = self.vocab.id_of(token) {
            return vec![id];
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < token.len() {
            let mut end = token.len();
            let mut matched = None;
            while start < end {
                let sub = &token[start..end];
                let candidate = if start > 0 {
                    format!("##{sub}")
                } else {
                    sub.to_string()
                };
                if let Some(id) = self.vocab.id_of(&candidate) {
                    matched = Some(id);
                    break;
                }
                end = prev_char_boundary(token, end);
            }

            match matched {
                Some(id) => {
                    pieces.push(id);
                    start = end;
                }
                // No decomposition exists: the whole token is unknown.
                None => return vec![self.vocab.unk_id()],
            }
        }
        pieces
    }
}

/// Largest char boundary strictly below `index`.
fn prev_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index - 1;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Normalize and split into basic tokens.
fn split_basic(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut run = String::new();

    let mut flush = |run: &mut String, tokens: &mut Vec<String>| {
        if !run.is_empty() {
            tokens.push(std::mem::take(run));
        }
    };

    for c in text.chars() {
        // Lowercase ASCII letters; drop control characters other than
        // tab/newline/carriage-return (which count as whitespace).
        let c = if c.is_ascii_uppercase() {
            c.to_ascii_lowercase()
        } else {
            c
        };
        if c.is_ascii_control() && c != '\t' && c != '\n' && c != '\r' {
            continue;
        }

        if c.is_ascii() {
            if c.is_ascii_whitespace() {
                flush(&mut run, &mut tokens);
            } else if c.is_ascii_punctuation() {
                flush(&mut run, &mut tokens);
                tokens.push(c.to_string());
            } else {
                run.push(c);
            }
        } else {
            // Every non-ASCII codepoint stands alone.
            flush(&mut run, &mut tokens);
            tokens.push(c.to_string());
        }
    }
    flush(&mut run, &mut tokens);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> WordpieceTokenizer {
        WordpieceTokenizer::new(Vocabulary::from_lines([
            "[PAD]", // 0
            "[UNK]", // 1
            "[CLS]", // 2
            "[SEP]", // 3
            "hello", // 4
            "world", // 5
            "un",    // 6
            "##aff", // 7
            "##able", // 8
            "世",    // 9
            ",",     // 10
        ]))
    }

    #[test]
    fn test_empty_text_is_cls_sep_padding() {
        let t = tokenizer();
        assert_eq!(t.tokenize("", 8), vec![2, 3, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_basic_split_and_lowercase() {
        let t = tokenizer();
        assert_eq!(t.tokenize("Hello, WORLD", 8), vec![2, 4, 10, 5, 3, 0, 0, 0]);
    }

    #[test]
    fn test_subword_decomposition() {
        let t = tokenizer();
        // "unaffable" -> un + ##aff + ##able
        assert_eq!(t.tokenize("unaffable", 8), vec![2, 6, 7, 8, 3, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_token_maps_to_unk() {
        let t = tokenizer();
        // "xyz" has no direct hit and no subword cover.
        assert_eq!(t.tokenize("xyz", 6), vec![2, 1, 3, 0, 0, 0]);
    }

    #[test]
    fn test_cjk_chars_split_individually() {
        let t = tokenizer();
        // "世" is in vocabulary, "界" is not.
        assert_eq!(t.tokenize("世界", 6), vec![2, 9, 1, 3, 0, 0]);
    }

    #[test]
    fn test_overflowing_token_dropped_whole() {
        let t = tokenizer();
        // max_len 5 leaves budget for 3 content pieces; "unaffable" (3
        // pieces) after "hello" would need 4, so it is dropped whole.
        assert_eq!(t.tokenize("hello unaffable", 5), vec![2, 4, 3, 0, 0]);
    }

    #[test]
    fn test_output_is_exactly_max_len() {
        let t = tokenizer();
        for max_len in [2, 4, 16, 128] {
            assert_eq!(t.tokenize("hello world hello world", max_len).len(), max_len);
        }
    }

    #[test]
    fn test_control_chars_dropped_tabs_split() {
        let t = tokenizer();
        assert_eq!(
            t.tokenize("hel\u{0}lo\tworld", 6),
            vec![2, 4, 5, 3, 0, 0]
        );
    }
}
