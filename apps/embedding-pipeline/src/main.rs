//! Embedding Pipeline
//!
//! One-shot batch job: reads the product catalog CSV, computes embeddings
//! locally, upserts the batch into Qdrant and archives a dated Parquet
//! snapshot. Runs independently of the recommendation API; the two share
//! only the durable index content. Do not run two pipeline instances
//! against the same collection at once.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use domain_catalog::{
    EmbeddingModelId, EmbeddingPipeline, EmbeddingProvider, FastEmbedConfig, FastEmbedProvider,
    PipelineConfig, QdrantConfig, QdrantProductRepository,
};
use eyre::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "embedding-pipeline")]
#[command(about = "Materialize product embeddings into the vector index")]
struct Cli {
    /// Path to the product catalog CSV (default: DATA_PATH env or data/products.csv)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Directory for dated Parquet snapshots (default: SNAPSHOTS_DIR env or snapshots)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Embedding model name (default: EMBEDDING_MODEL env or all-MiniLM-L6-v2)
    #[arg(long)]
    model: Option<String>,

    /// THB to USD exchange rate applied to prices
    #[arg(long)]
    exchange_rate: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    let mut pipeline_config = PipelineConfig::from_env();
    if let Some(csv) = cli.csv {
        pipeline_config.csv_path = csv;
    }
    if let Some(snapshot_dir) = cli.snapshot_dir {
        pipeline_config.snapshot_dir = snapshot_dir;
    }
    if let Some(rate) = cli.exchange_rate {
        pipeline_config.exchange_rate = rate;
    }

    let mut embed_config = FastEmbedConfig::from_env()?;
    if let Some(name) = cli.model {
        embed_config.model = EmbeddingModelId::from_name(&name)
            .ok_or_else(|| eyre::eyre!("unknown embedding model '{}'", name))?;
    }

    info!(
        model = embed_config.model.model_name(),
        "loading embedding model"
    );
    let embedder = FastEmbedProvider::new(embed_config)?;

    // The collection's vector size always follows the model; mixing models
    // in one collection is undefined
    let mut qdrant_config = QdrantConfig::from_env();
    qdrant_config.vector_size = embedder.dimension();

    info!("Connecting to Qdrant at {}", qdrant_config.url);
    let repository = QdrantProductRepository::new(qdrant_config).await?;

    let pipeline = EmbeddingPipeline::new(repository, Arc::new(embedder), pipeline_config);

    let report = pipeline.run().await?;

    info!(
        "Pipeline completed: {} rows read, {} skipped, {} indexed, snapshot at {}",
        report.rows_read,
        report.rows_skipped,
        report.rows_indexed,
        report.snapshot_path.display()
    );

    Ok(())
}
