//! Batch materialization of the product index.
//!
//! Four stages composed sequentially: ingest the raw CSV catalog,
//! transform rows into embedded products, persist them to the vector
//! index in one batch, and archive the transformed batch as a
//! date-partitioned Parquet snapshot. Each stage is idempotent given the
//! same input and model version; re-running overwrites index entries by
//! `product_id` without duplication.

pub mod ingest;
pub mod snapshot;
pub mod transform;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

pub use ingest::CatalogRow;
pub use transform::{canonical_text, convert_price_to_usd, RowTransformError, TransformOutcome};

use crate::embedding::EmbeddingProvider;
use crate::error::CatalogResult;
use crate::repository::ProductRepository;

/// Pipeline configuration, constructed explicitly at startup
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub csv_path: PathBuf,
    pub snapshot_dir: PathBuf,
    /// THB → USD conversion rate applied during transform
    pub exchange_rate: f64,
}

impl PipelineConfig {
    pub fn new(csv_path: impl Into<PathBuf>, snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            snapshot_dir: snapshot_dir.into(),
            exchange_rate: 0.035,
        }
    }

    pub fn with_exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = rate;
        self
    }

    pub fn from_env() -> Self {
        let csv_path =
            std::env::var("DATA_PATH").unwrap_or_else(|_| "data/products.csv".to_string());
        let snapshot_dir = std::env::var("SNAPSHOTS_DIR").unwrap_or_else(|_| "snapshots".to_string());
        let exchange_rate = std::env::var("EXCHANGE_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.035);

        Self::new(csv_path, snapshot_dir).with_exchange_rate(exchange_rate)
    }
}

/// Outcome of a pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_indexed: usize,
    pub snapshot_path: PathBuf,
}

/// The embedding materialization pipeline.
///
/// Owns nothing but its collaborators: the repository it persists into,
/// the embedding provider it transforms with, and its configuration. The
/// serving path shares only the durable index content with it.
pub struct EmbeddingPipeline<R: ProductRepository> {
    repository: Arc<R>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: PipelineConfig,
}

impl<R: ProductRepository> EmbeddingPipeline<R> {
    pub fn new(repository: R, embedder: Arc<dyn EmbeddingProvider>, config: PipelineConfig) -> Self {
        Self::from_arc(Arc::new(repository), embedder, config)
    }

    pub fn from_arc(
        repository: Arc<R>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            repository,
            embedder,
            config,
        }
    }

    /// Run the full ingest → transform → persist → snapshot flow once.
    #[instrument(skip(self), fields(model = %self.embedder.model_name()))]
    pub async fn run(&self) -> CatalogResult<PipelineReport> {
        info!(csv = %self.config.csv_path.display(), "reading product catalog");
        let rows = ingest::read_catalog(&self.config.csv_path)?;
        let rows_read = rows.len();

        let outcome =
            transform::transform_rows(rows, self.embedder.as_ref(), self.config.exchange_rate)
                .await?;
        let mut rows_skipped = outcome.skipped;

        self.repository.ensure_collection().await?;

        // Transform already guarantees the embedding contract, but keep
        // the batch alive if anything slipped through: drop bad rows
        // individually rather than failing the whole upsert
        let dimension = self.embedder.dimension();
        let mut indexable = Vec::with_capacity(outcome.products.len());
        for product in &outcome.products {
            match product.indexable_vector(dimension) {
                Ok(_) => indexable.push(product.clone()),
                Err(e) => {
                    rows_skipped += 1;
                    warn!(product_id = %product.product_id, error = %e, "skipping unindexable row");
                }
            }
        }

        let rows_indexed = if indexable.is_empty() {
            0
        } else {
            self.repository.upsert_batch(indexable).await?
        };

        let snapshot_path = snapshot::write_snapshot(
            &outcome.products,
            &self.config.snapshot_dir,
            Utc::now().date_naive(),
        )?;

        info!(
            rows_read,
            rows_skipped,
            rows_indexed,
            snapshot = %snapshot_path.display(),
            "pipeline run complete"
        );

        Ok(PipelineReport {
            rows_read,
            rows_skipped,
            rows_indexed,
            snapshot_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use async_trait::async_trait;

    use super::*;
    use crate::error::CatalogError;
    use crate::memory::MemoryProductRepository;
    use crate::models::SimilarityQuery;
    use crate::service::RecommendationService;

    const DIMENSION: usize = 8;

    /// Deterministic stand-in for a real model: hashes the text into a
    /// fixed-dimension vector, so identical input yields identical vectors
    /// across runs
    struct StubEmbedder;

    fn stub_vector(text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        (0..DIMENSION)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                (text, i).hash(&mut hasher);
                (hasher.finish() % 1000) as f32 / 1000.0
            })
            .collect()
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        fn model_name(&self) -> String {
            "stub".to_string()
        }

        fn dimension(&self) -> usize {
            DIMENSION
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, CatalogError> {
            Ok(stub_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CatalogError> {
            Ok(texts.iter().map(|t| stub_vector(t)).collect())
        }
    }

    const CATALOG: &str = "\
product_id,product_name,main_category,sub_category,ratings,no_of_ratings,price
P1,Galaxy S24,electronics,Smartphones,4.5,12034,\"฿28,999\"
P2,Pixel 9,electronics,Smartphones,4.4,88,\"฿24,999\"
P3,ThinkPad X1,electronics,Laptops,4.7,412,\"฿52,990\"
P4,,electronics,Smartphones,,,฿999
";

    fn write_catalog(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("products.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        path
    }

    fn build_pipeline(
        dir: &std::path::Path,
    ) -> (
        Arc<MemoryProductRepository>,
        EmbeddingPipeline<MemoryProductRepository>,
    ) {
        let repository = Arc::new(MemoryProductRepository::new(DIMENSION));
        let config = PipelineConfig::new(write_catalog(dir), dir.join("snapshots"));
        let pipeline =
            EmbeddingPipeline::from_arc(Arc::clone(&repository), Arc::new(StubEmbedder), config);
        (repository, pipeline)
    }

    #[tokio::test]
    async fn test_run_ingests_transforms_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let (repository, pipeline) = build_pipeline(dir.path());

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.rows_read, 4);
        // P4 has no product name
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.rows_indexed, 3);
        assert!(report.snapshot_path.exists());

        let stored = repository.get_by_id("P1", true).await.unwrap().unwrap();
        assert_eq!(stored.price_usd.as_deref(), Some("$1014.97"));
        assert_eq!(stored.embedding.as_ref().map(Vec::len), Some(DIMENSION));
    }

    #[tokio::test]
    async fn test_run_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (repository, pipeline) = build_pipeline(dir.path());

        pipeline.run().await.unwrap();
        let first = repository.get_by_id("P2", true).await.unwrap().unwrap();

        pipeline.run().await.unwrap();
        let second = repository.get_by_id("P2", true).await.unwrap().unwrap();

        assert_eq!(repository.len().await, 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_materialized_index_serves_recommendations() {
        let dir = tempfile::tempdir().unwrap();
        let (repository, pipeline) = build_pipeline(dir.path());
        pipeline.run().await.unwrap();

        let service = RecommendationService::from_arc(repository);
        let recommendations = service.recommend("P1", 5).await.unwrap().unwrap();

        // P2 shares the Smartphones sub-category; P3 (Laptops) never shows
        let ids: Vec<&str> = recommendations
            .results
            .iter()
            .map(|r| r.product.product_id.as_str())
            .collect();
        assert_eq!(ids, vec!["P2"]);
    }

    #[tokio::test]
    async fn test_search_scope_matches_sub_category_after_run() {
        let dir = tempfile::tempdir().unwrap();
        let (repository, pipeline) = build_pipeline(dir.path());
        pipeline.run().await.unwrap();

        let anchor = repository.get_by_id("P3", true).await.unwrap().unwrap();

        let hits = repository
            .search_similar(
                SimilarityQuery::new(anchor.embedding.unwrap(), 10)
                    .with_filter("sub_category", "Laptops"),
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.product_id, "P3");
    }
}
