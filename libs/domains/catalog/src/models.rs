use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{CatalogError, CatalogResult};

/// A catalog product.
///
/// `product_id` is the stable identity and doubles as the index key.
/// `sub_category` scopes similarity search: recommendations never cross
/// sub-category boundaries. The embedding is optional on the struct because
/// products exist before the pipeline has materialized their vectors, but a
/// product submitted for indexing must carry one (see
/// [`Product::indexable_vector`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub main_category: String,
    pub sub_category: String,
    #[serde(default)]
    pub ratings: Option<f64>,
    #[serde(default)]
    pub no_of_ratings: Option<u64>,
    pub price: String,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl Product {
    /// The embedding this product would be indexed under, or a validation
    /// error when it is absent or has the wrong dimensionality.
    pub fn indexable_vector(&self, vector_size: usize) -> CatalogResult<&[f32]> {
        let embedding = self.embedding.as_deref().ok_or_else(|| {
            CatalogError::Validation(format!(
                "product {} has no embedding and cannot be indexed",
                self.product_id
            ))
        })?;

        if embedding.len() != vector_size {
            return Err(CatalogError::Validation(format!(
                "product {} embedding has {} dimensions, expected {}",
                self.product_id,
                embedding.len(),
                vector_size
            )));
        }

        Ok(embedding)
    }

    /// The denormalized payload stored alongside the vector in the index.
    /// Everything except the embedding itself; the vector is addressable by
    /// the same point id.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "product_id": self.product_id,
            "product_name": self.product_name,
            "main_category": self.main_category,
            "sub_category": self.sub_category,
            "ratings": self.ratings,
            "no_of_ratings": self.no_of_ratings,
            "price": self.price,
            "price_usd": self.price_usd,
        })
    }

    /// Rebuild a product from a stored index payload. A payload that does
    /// not round-trip is a schema mismatch in the backing store, not caller
    /// error.
    pub fn from_payload(payload: serde_json::Value) -> CatalogResult<Self> {
        serde_json::from_value(payload)
            .map_err(|e| CatalogError::IndexUnavailable(format!("malformed index payload: {}", e)))
    }
}

/// Equality filter on a single payload field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

/// Nearest-neighbor query against the product index
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    pub vector: Vec<f32>,
    pub limit: usize,
    pub filter: Option<FieldFilter>,
}

impl SimilarityQuery {
    pub fn new(vector: Vec<f32>, limit: usize) -> Self {
        Self {
            vector,
            limit,
            filter: None,
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }
}

/// A search hit: the stored product plus its cosine distance from the query
/// vector (`1 - cosine_similarity`, so nearer means smaller). Results are
/// ordered by non-decreasing distance.
#[derive(Debug, Clone)]
pub struct ScoredProduct {
    pub product: Product,
    pub distance: f32,
}

/// The partial product projection surfaced to recommendation callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecommendedProduct {
    pub product_id: String,
    /// The product's main category
    pub category: String,
    pub sub_category: String,
    /// Normalized USD display price, when the pipeline could derive one
    pub price: Option<String>,
}

/// A single recommendation with its similarity distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductRecommendation {
    pub product: RecommendedProduct,
    pub distance: f32,
}

impl From<ScoredProduct> for ProductRecommendation {
    fn from(hit: ScoredProduct) -> Self {
        ProductRecommendation {
            product: RecommendedProduct {
                product_id: hit.product.product_id,
                category: hit.product.main_category,
                sub_category: hit.product.sub_category,
                price: hit.product.price_usd,
            },
            distance: hit.distance,
        }
    }
}

/// Ordered recommendation set, ranked nearest-first. May be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendations {
    pub results: Vec<ProductRecommendation>,
}

/// Embedding model selection.
///
/// The model identity is part of the index contract: vectors from different
/// models are not comparable, so changing the model requires a full
/// re-index into a collection of the matching dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbeddingModelId {
    /// sentence-transformers/all-MiniLM-L6-v2 (384 dimensions)
    #[default]
    AllMiniLmL6V2,
    /// sentence-transformers/all-MiniLM-L12-v2 (384 dimensions)
    AllMiniLmL12V2,
    /// BAAI/bge-small-en-v1.5 (384 dimensions)
    BgeSmallEnV15,
    /// BAAI/bge-base-en-v1.5 (768 dimensions)
    BgeBaseEnV15,
}

impl EmbeddingModelId {
    pub fn dimension(&self) -> usize {
        match self {
            EmbeddingModelId::AllMiniLmL6V2 => 384,
            EmbeddingModelId::AllMiniLmL12V2 => 384,
            EmbeddingModelId::BgeSmallEnV15 => 384,
            EmbeddingModelId::BgeBaseEnV15 => 768,
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            EmbeddingModelId::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            EmbeddingModelId::AllMiniLmL12V2 => "all-MiniLM-L12-v2",
            EmbeddingModelId::BgeSmallEnV15 => "bge-small-en-v1.5",
            EmbeddingModelId::BgeBaseEnV15 => "bge-base-en-v1.5",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all-MiniLM-L6-v2" => Some(EmbeddingModelId::AllMiniLmL6V2),
            "all-MiniLM-L12-v2" => Some(EmbeddingModelId::AllMiniLmL12V2),
            "bge-small-en-v1.5" => Some(EmbeddingModelId::BgeSmallEnV15),
            "bge-base-en-v1.5" => Some(EmbeddingModelId::BgeBaseEnV15),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            product_id: "B09G9FPGTN".to_string(),
            product_name: "Noise cancelling headphones".to_string(),
            main_category: "electronics".to_string(),
            sub_category: "Headphones".to_string(),
            ratings: Some(4.3),
            no_of_ratings: Some(1522),
            price: "฿2,499".to_string(),
            price_usd: Some("$87.47".to_string()),
            embedding: Some(vec![0.1, 0.2, 0.3, 0.4]),
        }
    }

    #[test]
    fn test_payload_round_trip() {
        let product = sample_product();
        let restored = Product::from_payload(product.payload()).unwrap();

        assert_eq!(restored.product_id, product.product_id);
        assert_eq!(restored.sub_category, product.sub_category);
        assert_eq!(restored.ratings, product.ratings);
        assert_eq!(restored.price_usd, product.price_usd);
        // The payload never carries the vector
        assert_eq!(restored.embedding, None);
    }

    #[test]
    fn test_from_payload_rejects_missing_identity() {
        let payload = serde_json::json!({ "product_name": "orphan" });
        let err = Product::from_payload(payload).unwrap_err();
        assert!(matches!(err, CatalogError::IndexUnavailable(_)));
    }

    #[test]
    fn test_indexable_vector_requires_embedding() {
        let mut product = sample_product();
        product.embedding = None;

        let err = product.indexable_vector(4).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_indexable_vector_rejects_wrong_dimensionality() {
        let product = sample_product();

        assert!(product.indexable_vector(4).is_ok());
        let err = product.indexable_vector(384).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_recommendation_projection_is_partial() {
        let hit = ScoredProduct {
            product: sample_product(),
            distance: 0.12,
        };

        let recommendation = ProductRecommendation::from(hit);
        assert_eq!(recommendation.product.product_id, "B09G9FPGTN");
        assert_eq!(recommendation.product.category, "electronics");
        assert_eq!(recommendation.product.price, Some("$87.47".to_string()));
        assert_eq!(recommendation.distance, 0.12);
    }

    #[test]
    fn test_embedding_model_lookup() {
        let model = EmbeddingModelId::from_name("all-MiniLM-L6-v2").unwrap();
        assert_eq!(model, EmbeddingModelId::AllMiniLmL6V2);
        assert_eq!(model.dimension(), 384);
        assert_eq!(EmbeddingModelId::from_name("word2vec"), None);
    }
}
