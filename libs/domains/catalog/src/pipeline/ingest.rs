use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::{CatalogError, CatalogResult};

/// A raw catalog row as it appears in the input CSV.
///
/// Numeric columns are coerced leniently: blank or unparseable values
/// become absent, never zero and never an error. `product_id` may be
/// missing; the transform stage assigns one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogRow {
    #[serde(default)]
    pub product_id: Option<String>,
    pub product_name: String,
    pub main_category: String,
    pub sub_category: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ratings: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub no_of_ratings: Option<u64>,
    pub price: String,
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as u64))
    }))
}

/// Read the raw product catalog from a CSV file.
///
/// Rows that fail to deserialize at all (missing required columns) are
/// logged and skipped; they never abort the read.
pub fn read_catalog(path: &Path) -> CatalogResult<Vec<CatalogRow>> {
    let reader = csv::Reader::from_path(path).map_err(|e| {
        CatalogError::Config(format!("cannot read catalog at {}: {}", path.display(), e))
    })?;

    Ok(collect_rows(reader))
}

fn collect_rows<R: std::io::Read>(mut reader: csv::Reader<R>) -> Vec<CatalogRow> {
    let mut rows = Vec::new();

    for record in reader.deserialize() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!(error = %e, "skipping malformed catalog row"),
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Vec<CatalogRow> {
        collect_rows(csv::Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn test_reads_well_formed_rows() {
        let rows = parse(
            "product_id,product_name,main_category,sub_category,ratings,no_of_ratings,price\n\
             P1,Galaxy S24,electronics,Smartphones,4.5,12034,\"฿28,999\"\n",
        );

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.product_id.as_deref(), Some("P1"));
        assert_eq!(row.product_name, "Galaxy S24");
        assert_eq!(row.sub_category, "Smartphones");
        assert_eq!(row.ratings, Some(4.5));
        assert_eq!(row.no_of_ratings, Some(12034));
        assert_eq!(row.price, "฿28,999");
    }

    #[test]
    fn test_blank_numerics_become_absent() {
        let rows = parse(
            "product_id,product_name,main_category,sub_category,ratings,no_of_ratings,price\n\
             P1,Galaxy S24,electronics,Smartphones,,,฿999\n",
        );

        assert_eq!(rows[0].ratings, None);
        assert_eq!(rows[0].no_of_ratings, None);
    }

    #[test]
    fn test_unparseable_numerics_become_absent() {
        let rows = parse(
            "product_id,product_name,main_category,sub_category,ratings,no_of_ratings,price\n\
             P1,Galaxy S24,electronics,Smartphones,not rated,\"1,234\",฿999\n",
        );

        assert_eq!(rows[0].ratings, None);
        // Thousands separators are not a numeric format here either
        assert_eq!(rows[0].no_of_ratings, None);
    }

    #[test]
    fn test_float_counts_are_truncated() {
        let rows = parse(
            "product_id,product_name,main_category,sub_category,ratings,no_of_ratings,price\n\
             P1,Galaxy S24,electronics,Smartphones,4.0,127.0,฿999\n",
        );

        assert_eq!(rows[0].no_of_ratings, Some(127));
    }

    #[test]
    fn test_missing_product_id_is_none() {
        let rows = parse(
            "product_id,product_name,main_category,sub_category,ratings,no_of_ratings,price\n\
             ,Galaxy S24,electronics,Smartphones,4.0,10,฿999\n",
        );

        assert_eq!(rows[0].product_id, None);
    }

    #[test]
    fn test_malformed_rows_are_skipped_not_fatal() {
        let rows = parse(
            "product_id,product_name,main_category,sub_category,ratings,no_of_ratings,price\n\
             P1,Galaxy S24,electronics,Smartphones,4.0,10,฿999\n\
             P2,too,few,columns\n\
             P3,Pixel 9,electronics,Smartphones,4.4,88,฿24999\n",
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].product_id.as_deref(), Some("P3"));
    }
}
