//! Inspect command - model, vocabulary, and knowledge-base details

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use qamatch::embed::vocab::Vocabulary;
use qamatch::embed::word_vectors::WordVectorTable;
use qamatch::embed::wordpiece::WordpieceTokenizer;
use qamatch::ModelKind;

/// Run inspect command
pub fn run(
    model: &Path,
    qa: Option<&Path>,
    kind: ModelKind,
    tokenize: Option<&str>,
    json: bool,
) -> Result<()> {
    match kind.resolve(model) {
        ModelKind::WordVector => inspect_word_vectors(model, qa, tokenize, json),
        ModelKind::Transformer => inspect_transformer_vocab(model, qa, tokenize, json),
        ModelKind::Auto => unreachable!("Auto resolves to a concrete kind"),
    }
}

fn inspect_word_vectors(
    model: &Path,
    qa: Option<&Path>,
    tokenize: Option<&str>,
    json: bool,
) -> Result<()> {
    let table = WordVectorTable::load(model)
        .with_context(|| format!("failed to load word-vector model {}", model.display()))?;
    let qa_count = qa_pair_count(qa)?;
    let tokens: Option<Vec<String>> =
        tokenize.map(|text| table.tokenize(text).iter().map(|t| t.to_string()).collect());

    if json {
        println!(
            "{}",
            serde_json::json!({
                "kind": "word-vector",
                "model": model.display().to_string(),
                "vocab_size": table.len(),
                "dimension": table.dimension(),
                "memory_bytes": table.memory_estimate(),
                "qa_entries": qa_count,
                "tokens": tokens,
            })
        );
        return Ok(());
    }

    println!("{} {}", "Model:".bold(), model.display());
    println!("  kind       {}", "word-vector".green());
    println!("  vocab      {}", table.len());
    println!("  dimension  {}", table.dimension());
    println!("  memory     {} KB", table.memory_estimate() / 1024);
    if let Some(count) = qa_count {
        println!("  qa entries {count}");
    }
    if let Some(tokens) = tokens {
        println!("  tokens     {}", tokens.join(" | ").cyan());
    }
    Ok(())
}

/// Without an inference runtime the transformer path can still show its
/// vocabulary and tokenization.
fn inspect_transformer_vocab(
    model: &Path,
    qa: Option<&Path>,
    tokenize: Option<&str>,
    json: bool,
) -> Result<()> {
    let vocab_path = model
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("vocab.txt");
    let vocab = Vocabulary::load(&vocab_path)
        .with_context(|| format!("failed to load vocabulary {}", vocab_path.display()))?;
    let qa_count = qa_pair_count(qa)?;

    let vocab_size = vocab.len();
    let pad_id = vocab.pad_id();
    let ids = tokenize.map(|text| {
        let tokenizer = WordpieceTokenizer::new(vocab);
        tokenizer.tokenize(text, 32)
    });

    if json {
        println!(
            "{}",
            serde_json::json!({
                "kind": "transformer",
                "model": model.display().to_string(),
                "vocab": vocab_path.display().to_string(),
                "vocab_size": vocab_size,
                "pad_id": pad_id,
                "qa_entries": qa_count,
                "token_ids": ids,
            })
        );
        return Ok(());
    }

    println!("{} {}", "Model:".bold(), model.display());
    println!("  kind       {}", "transformer".green());
    println!("  vocab      {} ({} tokens)", vocab_path.display(), vocab_size);
    println!(
        "  {}",
        "note: embedding requires an external inference runtime".dimmed()
    );
    if let Some(count) = qa_count {
        println!("  qa entries {count}");
    }
    if let Some(ids) = ids {
        let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        println!("  token ids  {}", rendered.join(" ").cyan());
    }
    Ok(())
}

fn qa_pair_count(qa: Option<&Path>) -> Result<Option<usize>> {
    match qa {
        Some(path) => {
            let pairs = qamatch::core::qafile::parse(path)
                .with_context(|| format!("failed to parse QA file {}", path.display()))?;
            Ok(Some(pairs.len()))
        }
        None => Ok(None),
    }
}
