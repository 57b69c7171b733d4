use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Builder, Float64Array, Int64Array, ListBuilder, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::{CatalogError, CatalogResult};
use crate::models::Product;

/// Write the full transformed batch, embeddings included, as a
/// date-partitioned Parquet file:
/// `<snapshot_dir>/date=YYYY-MM-DD/products.parquet`.
///
/// One file per run; a re-run for the same date overwrites it. The archive
/// exists for reproducibility and offline reprocessing and is never read
/// by the serving path.
pub fn write_snapshot(
    products: &[Product],
    snapshot_dir: &Path,
    date: NaiveDate,
) -> CatalogResult<PathBuf> {
    let partition = snapshot_dir.join(format!("date={}", date.format("%Y-%m-%d")));
    fs::create_dir_all(&partition).map_err(|e| {
        CatalogError::Internal(format!(
            "cannot create snapshot partition {}: {}",
            partition.display(),
            e
        ))
    })?;

    let path = partition.join("products.parquet");
    let batch = build_batch(products)?;

    let file = fs::File::create(&path).map_err(|e| {
        CatalogError::Internal(format!("cannot create snapshot {}: {}", path.display(), e))
    })?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(WriterProperties::default()))
        .map_err(|e| CatalogError::Internal(format!("snapshot writer: {}", e)))?;
    writer
        .write(&batch)
        .map_err(|e| CatalogError::Internal(format!("snapshot write: {}", e)))?;
    writer
        .close()
        .map_err(|e| CatalogError::Internal(format!("snapshot close: {}", e)))?;

    Ok(path)
}

fn build_batch(products: &[Product]) -> CatalogResult<RecordBatch> {
    let product_ids: StringArray = products
        .iter()
        .map(|p| Some(p.product_id.as_str()))
        .collect();
    let product_names: StringArray = products
        .iter()
        .map(|p| Some(p.product_name.as_str()))
        .collect();
    let main_categories: StringArray = products
        .iter()
        .map(|p| Some(p.main_category.as_str()))
        .collect();
    let sub_categories: StringArray = products
        .iter()
        .map(|p| Some(p.sub_category.as_str()))
        .collect();
    let ratings: Float64Array = products.iter().map(|p| p.ratings).collect();
    let rating_counts: Int64Array = products
        .iter()
        .map(|p| p.no_of_ratings.map(|n| n as i64))
        .collect();
    let prices: StringArray = products.iter().map(|p| Some(p.price.as_str())).collect();
    let prices_usd: StringArray = products.iter().map(|p| p.price_usd.as_deref()).collect();

    let mut embeddings = ListBuilder::new(Float32Builder::new());
    for product in products {
        match &product.embedding {
            Some(embedding) => {
                embeddings.values().append_slice(embedding);
                embeddings.append(true);
            }
            None => embeddings.append(false),
        }
    }
    let embeddings = embeddings.finish();

    RecordBatch::try_from_iter([
        ("product_id", Arc::new(product_ids) as ArrayRef),
        ("product_name", Arc::new(product_names) as ArrayRef),
        ("main_category", Arc::new(main_categories) as ArrayRef),
        ("sub_category", Arc::new(sub_categories) as ArrayRef),
        ("ratings", Arc::new(ratings) as ArrayRef),
        ("no_of_ratings", Arc::new(rating_counts) as ArrayRef),
        ("price", Arc::new(prices) as ArrayRef),
        ("price_usd", Arc::new(prices_usd) as ArrayRef),
        ("embedding", Arc::new(embeddings) as ArrayRef),
    ])
    .map_err(|e| CatalogError::Internal(format!("snapshot batch: {}", e)))
}
