//! Recommendation API - REST server
//!
//! Serves similar-product recommendations from the shared Qdrant index.
//! The index itself is populated out-of-band by the embedding-pipeline
//! binary; this process only reads.

use axum::{routing::get, Json};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::{
    handlers, ApiDoc, ProductRepository, QdrantProductRepository, RecommendationService,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

mod config;
mod health;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to Qdrant at {}", config.qdrant.url);

    let repository = QdrantProductRepository::new(config.qdrant.clone()).await?;
    repository.ensure_collection().await?;

    let service = RecommendationService::new(repository);

    let app = handlers::router(service, config.default_limit)
        .merge(health::router())
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(TraceLayer::new_for_http())
        // The storefront calls this API from anywhere
        .layer(CorsLayer::permissive());

    let address = config.server.address();
    info!("Starting recommendation API on {}", address);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Recommendation API shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
