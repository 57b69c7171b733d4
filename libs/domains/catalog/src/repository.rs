use async_trait::async_trait;

use crate::error::CatalogResult;
use crate::models::{Product, ScoredProduct, SimilarityQuery};

/// Repository trait for the product vector index.
///
/// Abstracts the backing vector database. Implementations own a single
/// collection with a fixed vector size and cosine distance;
/// `ensure_collection` must succeed before any other operation is used.
///
/// Distance convention at this boundary: cosine distance
/// (`1 - cosine_similarity`), ascending, nearest first. Tie order between
/// equidistant points is not guaranteed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Create the backing collection if it does not exist. Idempotent.
    async fn ensure_collection(&self) -> CatalogResult<()>;

    /// Insert or overwrite a single product, keyed by `product_id`.
    ///
    /// The product must carry an embedding of the configured
    /// dimensionality; otherwise fails with a validation error and leaves
    /// the index unmodified.
    async fn upsert(&self, product: Product) -> CatalogResult<()>;

    /// Insert or overwrite a batch of products in one round trip.
    ///
    /// Every product must satisfy the same embedding contract as
    /// [`ProductRepository::upsert`]; a batch containing an invalid product
    /// fails as a whole before anything is written. Returns the number of
    /// points written.
    async fn upsert_batch(&self, products: Vec<Product>) -> CatalogResult<usize>;

    /// Fetch a product by id. Absence is a normal outcome (`Ok(None)`),
    /// never an error. The stored vector is included only when
    /// `with_vector` is set.
    async fn get_by_id(&self, product_id: &str, with_vector: bool)
        -> CatalogResult<Option<Product>>;

    /// Nearest-neighbor search over stored vectors, optionally restricted
    /// by an equality filter on a payload field. Returns up to
    /// `query.limit` hits ordered by non-decreasing cosine distance.
    async fn search_similar(&self, query: SimilarityQuery) -> CatalogResult<Vec<ScoredProduct>>;
}
