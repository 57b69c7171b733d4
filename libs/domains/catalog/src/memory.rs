use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Product, ScoredProduct, SimilarityQuery};
use crate::repository::ProductRepository;

/// In-memory implementation of [`ProductRepository`].
///
/// Exact cosine scan over a hash map, enforcing the same embedding
/// contract and distance convention as the Qdrant adapter. Lets services
/// and the pipeline be exercised without a running index; not intended for
/// large catalogs.
pub struct MemoryProductRepository {
    vector_size: usize,
    points: RwLock<HashMap<String, Product>>,
}

impl MemoryProductRepository {
    pub fn new(vector_size: usize) -> Self {
        Self {
            vector_size,
            points: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored points
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }

    fn validated(&self, product: &Product) -> CatalogResult<()> {
        product.indexable_vector(self.vector_size).map(|_| ())
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

fn payload_field(product: &Product, field: &str) -> Option<String> {
    match product.payload().get(field) {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(other) if !other.is_null() => Some(other.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn ensure_collection(&self) -> CatalogResult<()> {
        Ok(())
    }

    async fn upsert(&self, product: Product) -> CatalogResult<()> {
        self.validated(&product)?;

        self.points
            .write()
            .await
            .insert(product.product_id.clone(), product);

        Ok(())
    }

    async fn upsert_batch(&self, products: Vec<Product>) -> CatalogResult<usize> {
        // Validate everything up front; an invalid product fails the batch
        // before any write
        for product in &products {
            self.validated(product)?;
        }

        let count = products.len();
        let mut points = self.points.write().await;
        for product in products {
            points.insert(product.product_id.clone(), product);
        }

        Ok(count)
    }

    async fn get_by_id(
        &self,
        product_id: &str,
        with_vector: bool,
    ) -> CatalogResult<Option<Product>> {
        let points = self.points.read().await;

        Ok(points.get(product_id).map(|product| {
            let mut product = product.clone();
            if !with_vector {
                product.embedding = None;
            }
            product
        }))
    }

    async fn search_similar(&self, query: SimilarityQuery) -> CatalogResult<Vec<ScoredProduct>> {
        if query.vector.len() != self.vector_size {
            return Err(CatalogError::Validation(format!(
                "query vector has {} dimensions, expected {}",
                query.vector.len(),
                self.vector_size
            )));
        }

        let points = self.points.read().await;

        let mut hits: Vec<ScoredProduct> = points
            .values()
            .filter(|product| match &query.filter {
                Some(filter) => {
                    payload_field(product, &filter.field).as_deref() == Some(filter.value.as_str())
                }
                None => true,
            })
            .filter_map(|product| {
                let embedding = product.embedding.as_deref()?;
                Some(ScoredProduct {
                    product: product.clone(),
                    distance: cosine_distance(&query.vector, embedding),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(query.limit);

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, sub_category: &str, embedding: Vec<f32>) -> Product {
        Product {
            product_id: id.to_string(),
            product_name: format!("{} name", id),
            main_category: "electronics".to_string(),
            sub_category: sub_category.to_string(),
            ratings: Some(4.0),
            no_of_ratings: Some(100),
            price: "฿999".to_string(),
            price_usd: Some("$34.97".to_string()),
            embedding: Some(embedding),
        }
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimensionality() {
        let repo = MemoryProductRepository::new(2);

        let err = repo
            .upsert(product("P1", "Smartphones", vec![1.0, 0.0, 0.5]))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(repo.get_by_id("P1", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_batch_with_invalid_product_writes_nothing() {
        let repo = MemoryProductRepository::new(2);

        let err = repo
            .upsert_batch(vec![
                product("P1", "Smartphones", vec![1.0, 0.0]),
                product("P2", "Smartphones", vec![1.0]),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let repo = MemoryProductRepository::new(2);

        repo.upsert(product("P1", "Smartphones", vec![1.0, 0.0]))
            .await
            .unwrap();
        let mut updated = product("P1", "Smartphones", vec![0.0, 1.0]);
        updated.price_usd = Some("$9.99".to_string());
        repo.upsert(updated).await.unwrap();

        assert_eq!(repo.len().await, 1);
        let stored = repo.get_by_id("P1", true).await.unwrap().unwrap();
        assert_eq!(stored.embedding, Some(vec![0.0, 1.0]));
        assert_eq!(stored.price_usd, Some("$9.99".to_string()));
    }

    #[tokio::test]
    async fn test_get_by_id_without_vector_omits_embedding() {
        let repo = MemoryProductRepository::new(2);
        repo.upsert(product("P1", "Smartphones", vec![1.0, 0.0]))
            .await
            .unwrap();

        let stored = repo.get_by_id("P1", false).await.unwrap().unwrap();
        assert_eq!(stored.embedding, None);

        let stored = repo.get_by_id("P1", true).await.unwrap().unwrap();
        assert_eq!(stored.embedding, Some(vec![1.0, 0.0]));
    }

    #[tokio::test]
    async fn test_search_filters_by_sub_category_and_orders_by_distance() {
        let repo = MemoryProductRepository::new(2);
        repo.upsert_batch(vec![
            product("P1", "Smartphones", vec![1.0, 0.0]),
            product("P2", "Smartphones", vec![0.9, 0.1]),
            product("P3", "Smartphones", vec![0.5, 0.5]),
            // Nearly identical vector, wrong sub-category
            product("P4", "Laptops", vec![0.99, 0.01]),
        ])
        .await
        .unwrap();

        let hits = repo
            .search_similar(
                SimilarityQuery::new(vec![1.0, 0.0], 10)
                    .with_filter("sub_category", "Smartphones"),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.product.product_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);

        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let repo = MemoryProductRepository::new(2);
        repo.upsert_batch(vec![
            product("P1", "Smartphones", vec![1.0, 0.0]),
            product("P2", "Smartphones", vec![0.9, 0.1]),
            product("P3", "Smartphones", vec![0.5, 0.5]),
        ])
        .await
        .unwrap();

        let hits = repo
            .search_similar(SimilarityQuery::new(vec![1.0, 0.0], 2))
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_search_rejects_wrong_query_dimensionality() {
        let repo = MemoryProductRepository::new(2);

        let err = repo
            .search_similar(SimilarityQuery::new(vec![1.0, 0.0, 0.0], 2))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_cosine_distance_of_identical_vectors_is_zero() {
        let d = cosine_distance(&[0.6, 0.8], &[0.6, 0.8]);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_of_orthogonal_vectors_is_one() {
        let d = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-6);
    }
}
