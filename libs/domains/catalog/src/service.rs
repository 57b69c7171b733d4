use std::sync::Arc;

use tracing::instrument;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{ProductRecommendation, Recommendations, SimilarityQuery};
use crate::repository::ProductRepository;

/// Recommendation engine.
///
/// Stateless over a shared repository; `recommend` calls are independent
/// and safe to run concurrently. The engine only reads from the index and
/// never retries on its own (retry policy belongs to the caller).
pub struct RecommendationService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> RecommendationService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn from_arc(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Top-`limit` products most similar to `product_id`, restricted to
    /// the anchor's sub-category and excluding the anchor itself.
    ///
    /// `Ok(None)` means the anchor does not exist; an anchor with no
    /// same-sub-category peers yields an empty set instead. `limit` must
    /// be positive.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        product_id: &str,
        limit: usize,
    ) -> CatalogResult<Option<Recommendations>> {
        if limit == 0 {
            return Err(CatalogError::Validation(
                "limit must be greater than 0".to_string(),
            ));
        }

        let Some(anchor) = self.repository.get_by_id(product_id, true).await? else {
            return Ok(None);
        };

        let anchor_vector = anchor.embedding.clone().ok_or_else(|| {
            CatalogError::IndexUnavailable(format!(
                "indexed product {} has no stored vector",
                product_id
            ))
        })?;

        // Over-fetch by one: the anchor is normally its own nearest
        // neighbor and gets dropped below
        let query = SimilarityQuery::new(anchor_vector, limit + 1)
            .with_filter("sub_category", &anchor.sub_category);

        let hits = self.repository.search_similar(query).await?;

        let results: Vec<ProductRecommendation> = hits
            .into_iter()
            .filter(|hit| hit.product.product_id != anchor.product_id)
            .take(limit)
            .map(ProductRecommendation::from)
            .collect();

        Ok(Some(Recommendations { results }))
    }
}

impl<R: ProductRepository> Clone for RecommendationService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
