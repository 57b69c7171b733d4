use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::ingest::CatalogRow;
use crate::embedding::EmbeddingProvider;
use crate::error::{CatalogError, CatalogResult};
use crate::models::Product;

/// A single row failing transformation. Isolated to that row: logged,
/// counted, and excluded from the batch without aborting the run.
#[derive(Debug, Error)]
pub enum RowTransformError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("embedding has {got} dimensions, expected {expected}")]
    EmbeddingShape { expected: usize, got: usize },
}

/// Transformed batch plus the number of rows dropped along the way
#[derive(Debug)]
pub struct TransformOutcome {
    pub products: Vec<Product>,
    pub skipped: usize,
}

/// The canonical text a product is embedded under. Fixed template; any
/// change re-shapes the whole vector space and requires a re-index.
pub fn canonical_text(name: &str, main_category: &str, sub_category: &str) -> String {
    format!("{name}. Category: {main_category}. Sub-category: {sub_category}")
}

/// Normalize a Thai-Baht display price into USD.
///
/// Strips the currency symbol and thousands separators, converts at the
/// given rate and formats as `$x.yz`. Anything unparseable passes through
/// unchanged; this never fails.
pub fn convert_price_to_usd(price: &str, exchange_rate: f64) -> String {
    let cleaned: String = price
        .chars()
        .filter(|c| *c != '฿' && *c != ',')
        .collect();

    match cleaned.trim().parse::<f64>() {
        Ok(value) => format!("${:.2}", value * exchange_rate),
        Err(_) => price.to_string(),
    }
}

/// Turn raw catalog rows into indexable products: canonical text, one
/// batched embedding call, price normalization and identity assignment.
pub async fn transform_rows(
    rows: Vec<CatalogRow>,
    embedder: &dyn EmbeddingProvider,
    exchange_rate: f64,
) -> CatalogResult<TransformOutcome> {
    let mut skipped = 0;
    let mut prepared = Vec::with_capacity(rows.len());

    for row in rows {
        match validate_row(&row) {
            Ok(()) => {
                let text = canonical_text(&row.product_name, &row.main_category, &row.sub_category);
                prepared.push((row, text));
            }
            Err(e) => {
                skipped += 1;
                warn!(product_name = %row.product_name, error = %e, "skipping catalog row");
            }
        }
    }

    let texts: Vec<String> = prepared.iter().map(|(_, text)| text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    if embeddings.len() != prepared.len() {
        return Err(CatalogError::Embedding(format!(
            "embedding batch returned {} vectors for {} inputs",
            embeddings.len(),
            prepared.len()
        )));
    }

    let dimension = embedder.dimension();
    let mut products = Vec::with_capacity(prepared.len());

    for ((row, text), embedding) in prepared.into_iter().zip(embeddings) {
        if embedding.len() != dimension {
            skipped += 1;
            let error = RowTransformError::EmbeddingShape {
                expected: dimension,
                got: embedding.len(),
            };
            warn!(product_name = %row.product_name, error = %error, "skipping catalog row");
            continue;
        }

        products.push(build_product(row, &text, embedding, exchange_rate));
    }

    Ok(TransformOutcome { products, skipped })
}

fn validate_row(row: &CatalogRow) -> Result<(), RowTransformError> {
    if row.product_name.trim().is_empty() {
        return Err(RowTransformError::MissingField("product_name"));
    }
    if row.sub_category.trim().is_empty() {
        return Err(RowTransformError::MissingField("sub_category"));
    }

    Ok(())
}

fn build_product(row: CatalogRow, text: &str, embedding: Vec<f32>, exchange_rate: f64) -> Product {
    // Rows without an id get a deterministic one so re-runs upsert the
    // same point instead of accumulating duplicates
    let product_id = row
        .product_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, text.as_bytes()).to_string());

    let price_usd = convert_price_to_usd(&row.price, exchange_rate);

    Product {
        product_id,
        product_name: row.product_name,
        main_category: row.main_category,
        sub_category: row.sub_category,
        ratings: row.ratings,
        no_of_ratings: row.no_of_ratings,
        price: row.price,
        price_usd: Some(price_usd),
        embedding: Some(embedding),
    }
}
