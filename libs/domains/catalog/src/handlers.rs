//! HTTP handlers for the recommendation API

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};

use crate::error::{CatalogError, ErrorResponse};
use crate::models::{ProductRecommendation, RecommendedProduct, Recommendations};
use crate::repository::ProductRepository;
use crate::service::RecommendationService;

/// OpenAPI documentation for the recommendation API
#[derive(OpenApi)]
#[openapi(
    paths(get_recommendation),
    components(schemas(
        Recommendations,
        ProductRecommendation,
        RecommendedProduct,
        ErrorResponse
    )),
    tags(
        (name = "recommendations", description = "Similar-product recommendations")
    )
)]
pub struct ApiDoc;

struct RecommendationState<R: ProductRepository> {
    service: RecommendationService<R>,
    default_limit: usize,
}

/// Query parameters for the recommendation endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct RecommendationParams {
    /// ID of the product to get recommendations for
    pub product_id: String,
    /// Maximum number of recommendations; must be positive. Defaults from
    /// configuration when omitted.
    pub limit: Option<usize>,
}

/// Build the recommendation router around a shared service
pub fn router<R: ProductRepository + 'static>(
    service: RecommendationService<R>,
    default_limit: usize,
) -> Router {
    let state = Arc::new(RecommendationState {
        service,
        default_limit,
    });

    Router::new()
        .route("/get-recommendation", get(get_recommendation))
        .with_state(state)
}

/// Get similar products to the given product ID within its sub-category
#[utoipa::path(
    get,
    path = "/get-recommendation",
    tag = "recommendations",
    params(RecommendationParams),
    responses(
        (status = 200, description = "Similar products ranked by distance", body = Recommendations),
        (status = 400, description = "Non-positive limit", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 503, description = "Vector index unavailable", body = ErrorResponse),
    )
)]
async fn get_recommendation<R: ProductRepository + 'static>(
    State(state): State<Arc<RecommendationState<R>>>,
    Query(params): Query<RecommendationParams>,
) -> Response {
    let limit = params.limit.unwrap_or(state.default_limit);

    // Reject bad limits here; the engine contract assumes a positive one
    if limit < 1 {
        return CatalogError::Validation("limit must be greater than 0".to_string())
            .into_response();
    }

    match state.service.recommend(&params.product_id, limit).await {
        Ok(Some(recommendations)) => Json(recommendations).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Product with ID {} not found", params.product_id),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
