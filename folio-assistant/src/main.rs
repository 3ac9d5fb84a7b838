//! `folio`: ask questions about a portfolio document from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_assistant::{PortfolioAssistant, Settings, init_telemetry};
use folio_model::{
    GenerationClient, GenerationConfig, LlmBackend, OpenAICompatibleBackend,
    OpenAICompatibleConfig,
};
use folio_rag::{FastEmbedConfig, FastEmbedEmbedder};
use tracing::info;

/// Folio - portfolio question answering with retrieval and model fallback
#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
struct Cli {
    /// Portfolio file to ingest; overrides FOLIO_PORTFOLIO_PATH
    #[arg(short, long, global = true, value_name = "PATH")]
    portfolio: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question about the portfolio
    Ask {
        /// The question
        question: String,

        /// Number of excerpts to retrieve
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Report embedder, index and model candidate status
    Health,
    /// Send a connectivity prompt to every model candidate
    Probe,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    init_telemetry(settings.log_format);

    let assistant = build_assistant(&settings).await?;

    let path = cli.portfolio.unwrap_or_else(|| settings.portfolio_path.clone());
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read portfolio {}", path.display()))?;
    let report = assistant.ingest(&raw).await?;
    info!(path = %path.display(), chunk_count = report.chunk_count, "portfolio loaded");

    let output = match cli.command {
        Command::Ask { question, k } => serde_json::to_value(assistant.answer(&question, k).await?)?,
        Command::Health => serde_json::to_value(assistant.health().await)?,
        Command::Probe => serde_json::to_value(assistant.probe_models().await)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn build_assistant(settings: &Settings) -> anyhow::Result<PortfolioAssistant> {
    let mut embed_config = FastEmbedConfig::default();
    if let Some(model) = &settings.embedding_model {
        embed_config.model = model.clone();
    }
    // Model loading downloads and parses ONNX weights; keep it off the runtime threads.
    let embedder = tokio::task::spawn_blocking(move || FastEmbedEmbedder::new(embed_config))
        .await
        .context("embedding model loader panicked")??;

    let mut candidates: Vec<Arc<dyn LlmBackend>> = Vec::with_capacity(settings.models.len());
    for model in &settings.models {
        let config = match &settings.llm_base_url {
            Some(base) => OpenAICompatibleConfig::compatible(&settings.api_key, base, model),
            None => OpenAICompatibleConfig::groq(&settings.api_key, model),
        };
        candidates.push(Arc::new(OpenAICompatibleBackend::new(config)?));
    }

    let generator = GenerationClient::builder()
        .config(GenerationConfig::default())
        .candidates(candidates)
        .build()?;

    Ok(PortfolioAssistant::builder().embedder(Arc::new(embedder)).generator(generator).build()?)
}
