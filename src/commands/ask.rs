//! Ask command - query the QA knowledge base

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use qamatch::{ModelKind, RetrievalEngine, ServiceConfig};

/// Run ask command
pub fn run(query: &str, model: &Path, qa: &Path, kind: ModelKind, json: bool) -> Result<()> {
    if matches!(kind.resolve(model), ModelKind::Transformer) {
        anyhow::bail!(
            "transformer models need an external inference runtime, which this \
             binary does not link; use a word-vector model"
        );
    }

    let mut engine = RetrievalEngine::new();
    let config = ServiceConfig {
        kind,
        ..Default::default()
    };
    engine
        .initialize(model, &config, None)
        .with_context(|| format!("failed to load model {}", model.display()))?;
    let loaded = engine
        .ingest_file(qa)
        .with_context(|| format!("failed to load QA file {}", qa.display()))?;

    let result = engine.query(query)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "query": query,
                "question": result.question,
                "answer": result.answer,
                "similarity": result.similarity,
                "entries": loaded,
            })
        );
        return Ok(());
    }

    if result.is_empty() {
        println!("{} No match for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!("{} {}", "→".dimmed(), query.cyan());
    println!();
    println!(
        "  {} {}  {}",
        "Q:".bold(),
        result.question,
        format!("({:.3})", result.similarity).dimmed()
    );
    println!("  {} {}", "A:".bold(), result.answer.green());
    Ok(())
}
