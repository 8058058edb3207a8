//! QA source file parser.
//!
//! One pair per line, question and answer separated by `|`, tab, or `,`
//! (tried in that order). Blank lines and `#` comments are skipped, as is
//! a leading CSV header line. Malformed lines are skipped rather than
//! failing the whole file.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// One (question, answer) pair from the knowledge base source.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Parse a QA file. A file that yields zero pairs is a format error.
pub fn parse(path: &Path) -> Result<Vec<QaPair>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let pairs = parse_str(&content);
    if pairs.is_empty() {
        return Err(Error::Format(format!(
            "no QA pairs found in {}",
            path.display()
        )));
    }
    Ok(pairs)
}

/// Parse QA pairs from text, skipping anything malformed.
pub fn parse_str(text: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut first_content_line = true;

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        if first_content_line {
            first_content_line = false;
            // CSV header line, e.g. "question,answer,category".
            if line.contains("question") && line.contains("answer") {
                continue;
            }
        }
        if line.starts_with('#') {
            continue;
        }

        let sep = line
            .find('|')
            .or_else(|| line.find('\t'))
            .or_else(|| line.find(','));
        let sep = match sep {
            // Separator at either edge means one side is empty.
            Some(pos) if pos > 0 && pos < line.len() - 1 => pos,
            _ => continue,
        };

        let question = clean_field(&line[..sep]);
        let answer = clean_field(&line[sep + 1..]);
        if !question.is_empty() && !answer.is_empty() {
            pairs.push(QaPair::new(question, answer));
        }
    }
    pairs
}

/// Trim whitespace and strip one pair of surrounding double quotes.
fn clean_field(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_tab_comma_separators() {
        let pairs = parse_str("q1|a1\nq2\ta2\nq3,a3\n");
        assert_eq!(
            pairs,
            vec![
                QaPair::new("q1", "a1"),
                QaPair::new("q2", "a2"),
                QaPair::new("q3", "a3"),
            ]
        );
    }

    #[test]
    fn test_pipe_wins_over_comma() {
        let pairs = parse_str("what, exactly|the answer, exactly\n");
        assert_eq!(pairs, vec![QaPair::new("what, exactly", "the answer, exactly")]);
    }

    #[test]
    fn test_header_comments_and_blanks_skipped() {
        let pairs = parse_str("question,answer,category\n\n# a comment\nq|a\n");
        assert_eq!(pairs, vec![QaPair::new("q", "a")]);
    }

    #[test]
    fn test_header_only_skipped_on_first_line() {
        // Later lines mentioning both words are real pairs.
        let pairs = parse_str("q1|a1\nwhat is a question|an answer\n");
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_quotes_and_whitespace_stripped() {
        let pairs = parse_str("  \"how deep\" , \"very deep\"  \n");
        assert_eq!(pairs, vec![QaPair::new("how deep", "very deep")]);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let pairs = parse_str("no separator here\n|leading\ntrailing|\nq|a\n");
        assert_eq!(pairs, vec![QaPair::new("q", "a")]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse(Path::new("/nonexistent/qa.txt")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
