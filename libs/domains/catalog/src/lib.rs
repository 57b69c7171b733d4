//! Catalog Domain Library
//!
//! Similar-product recommendations over a vector index of product
//! embeddings, plus the batch pipeline that materializes that index.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐   ┌───────────────────────┐
//! │ RecommendationService │   │   EmbeddingPipeline   │
//! │  (online, per request)│   │  (offline, batch)     │
//! └───────────┬───────────┘   └───────┬───────┬───────┘
//!             │                       │       │
//!      ┌──────▼───────────────────────▼──┐  ┌─▼─────────────────┐
//!      │     ProductRepository (trait)   │  │ EmbeddingProvider │
//!      └──────┬───────────────────┬──────┘  │     (trait)       │
//!             │                   │         └─┬─────────────────┘
//!  ┌──────────▼──────────┐ ┌──────▼────────┐ ┌▼──────────────────┐
//!  │ QdrantProduct-      │ │ MemoryProduct-│ │ FastEmbedProvider │
//!  │ Repository          │ │ Repository    │ │ (local ONNX)      │
//!  └─────────────────────┘ └───────────────┘ └───────────────────┘
//! ```
//!
//! The serving path and the pipeline share nothing in-process; their only
//! coupling is the durable index content. Recommendation serving is
//! stateless and read-only against the index, so concurrent requests never
//! interfere.

pub mod embedding;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod pipeline;
pub mod qdrant;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use embedding::{EmbeddingProvider, FastEmbedConfig, FastEmbedProvider};
pub use error::{CatalogError, CatalogResult, ErrorResponse};
pub use handlers::ApiDoc;
pub use memory::MemoryProductRepository;
pub use models::{
    EmbeddingModelId, FieldFilter, Product, ProductRecommendation, RecommendedProduct,
    Recommendations, ScoredProduct, SimilarityQuery,
};
pub use pipeline::{EmbeddingPipeline, PipelineConfig, PipelineReport};
pub use qdrant::{QdrantConfig, QdrantProductRepository};
pub use repository::ProductRepository;
pub use service::RecommendationService;
