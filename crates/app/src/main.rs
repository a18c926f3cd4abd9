mod server;

use chrono::Utc;
use clap::Parser;
use rag_engine_core::{
    AnswerEngine, ChromaStore, ChunkingOptions, DocumentExtractor, GroqGenerator,
    IngestionPipeline, JobStore, DEFAULT_GROQ_MODEL,
};
use server::{serve, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rag-engine-server", version)]
struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "RAG_BIND", default_value = "0.0.0.0:8001")]
    bind: String,

    /// Directory where uploaded documents are kept.
    #[arg(long, env = "RAG_DATA_DIR", default_value = "data/uploads")]
    data_dir: PathBuf,

    /// ChromaDB base URL.
    #[arg(long, env = "CHROMA_URL", default_value = "http://localhost:8000")]
    chroma_url: String,

    /// Chroma collection holding the indexed fragments.
    #[arg(long, env = "CHROMA_COLLECTION", default_value = "rag_collection")]
    collection: String,

    /// Groq API key; when absent, answers are simulated and retrieval still works.
    #[arg(long, env = "GROQ_API_KEY")]
    groq_api_key: Option<String>,

    /// Groq model used for answer generation.
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_GROQ_MODEL)]
    groq_model: String,

    /// Maximum fragment size in characters.
    #[arg(long, default_value_t = 600)]
    chunk_size: usize,

    /// Overlap between consecutive fragments in characters.
    #[arg(long, default_value_t = 100)]
    chunk_overlap: usize,

    /// Number of background ingestion workers.
    #[arg(long, default_value_t = 2)]
    workers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.chunk_size == 0 || cli.chunk_overlap >= cli.chunk_size {
        anyhow::bail!("--chunk-overlap must be smaller than --chunk-size, and --chunk-size positive");
    }

    tokio::fs::create_dir_all(&cli.data_dir).await?;

    let index = Arc::new(
        ChromaStore::connect(&cli.chroma_url, &cli.collection)
            .await
            .map_err(|error| anyhow::anyhow!("chroma connection failed: {error}"))?,
    );

    let generator = Arc::new(GroqGenerator::from_key(cli.groq_api_key, &cli.groq_model));
    if !generator.is_configured() {
        warn!("GROQ_API_KEY is not set; answers will be simulated");
    }

    let options = ChunkingOptions {
        max_chars: cli.chunk_size,
        overlap_chars: cli.chunk_overlap,
    };
    let jobs = JobStore::new();
    let pipeline = Arc::new(IngestionPipeline::spawn(
        jobs.clone(),
        Arc::clone(&index),
        Arc::new(DocumentExtractor),
        options,
        cli.workers,
    ));
    let engine = Arc::new(AnswerEngine::new(index, generator));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        collection = %cli.collection,
        "rag-engine boot"
    );

    serve(
        AppState {
            jobs,
            pipeline,
            engine,
            upload_dir: cli.data_dir,
        },
        &cli.bind,
    )
    .await
}
