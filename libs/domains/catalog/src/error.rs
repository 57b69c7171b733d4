use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Core error taxonomy.
///
/// Product absence is deliberately not a variant: lookups return
/// `Option` so a missing anchor stays a normal outcome and is never
/// conflated with a failing backend. Gateway trouble is never reinterpreted
/// as bad input and vice versa, so callers can pick the right recovery
/// (reject vs. retry).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed input to a core operation. Caller-fixable; never retried.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The vector index backing store is unreachable or errored. Retryable
    /// by the caller; the engine itself never retries.
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<qdrant_client::QdrantError> for CatalogError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        CatalogError::IndexUnavailable(err.to_string())
    }
}

/// JSON error body returned by the HTTP layer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::IndexUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CatalogError::Embedding(_) | CatalogError::Config(_) | CatalogError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = CatalogError::Validation("limit must be greater than 0".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_index_unavailable_maps_to_service_unavailable() {
        let response =
            CatalogError::IndexUnavailable("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_embedding_maps_to_internal_error() {
        let response = CatalogError::Embedding("model not loaded".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
