mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use qamatch::ModelKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qamatch")]
#[command(about = "Semantic QA matching over a preloaded knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Word-vector averaging model
    WordVector,
    /// Transformer model (needs an inference runtime)
    Transformer,
    /// Pick by file extension
    Auto,
}

impl From<KindArg> for ModelKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::WordVector => ModelKind::WordVector,
            KindArg::Transformer => ModelKind::Transformer,
            KindArg::Auto => ModelKind::Auto,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a query from the QA knowledge base
    Ask {
        query: String,
        #[arg(long, help = "Embedding model file")]
        model: PathBuf,
        #[arg(long, help = "QA knowledge-base file")]
        qa: PathBuf,
        #[arg(long, value_enum, default_value = "auto", help = "Model kind")]
        kind: KindArg,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show model, vocabulary, and knowledge-base details
    Inspect {
        #[arg(long, help = "Embedding model or vocabulary file")]
        model: PathBuf,
        #[arg(long, help = "QA knowledge-base file")]
        qa: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "auto", help = "Model kind")]
        kind: KindArg,
        #[arg(long, help = "Show the tokenization of this text")]
        tokenize: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            query,
            model,
            qa,
            kind,
            json,
        } => commands::ask::run(&query, &model, &qa, kind.into(), json),
        Commands::Inspect {
            model,
            qa,
            kind,
            tokenize,
            json,
        } => commands::inspect::run(&model, qa.as_deref(), kind.into(), tokenize.as_deref(), json),
    }
}
