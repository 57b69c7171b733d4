use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, Distance, Filter, GetPointsBuilder, PointId,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Product, ScoredProduct, SimilarityQuery};
use crate::repository::ProductRepository;

/// Qdrant-backed implementation of [`ProductRepository`].
///
/// Qdrant point ids must be UUIDs or integers while catalog ids are
/// free-form strings, so point ids are derived as UUIDv5 of the
/// `product_id`. The derivation is deterministic, which keeps upserts
/// idempotent per product; the payload keeps the authoritative string id.
///
/// Qdrant reports cosine *similarity* (higher is closer); this adapter
/// converts to the repository's cosine distance convention
/// (`1 - similarity`, ascending).
pub struct QdrantProductRepository {
    client: Qdrant,
    collection: String,
    vector_size: usize,
}

impl QdrantProductRepository {
    pub async fn new(config: QdrantConfig) -> CatalogResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder.build().map_err(|e| {
            CatalogError::IndexUnavailable(format!("failed to build Qdrant client: {}", e))
        })?;

        Ok(Self {
            client,
            collection: config.collection,
            vector_size: config.vector_size,
        })
    }

    pub fn from_client(client: Qdrant, collection: String, vector_size: usize) -> Self {
        Self {
            client,
            collection,
            vector_size,
        }
    }

    fn point_id(product_id: &str) -> PointId {
        PointId::from(
            Uuid::new_v5(&Uuid::NAMESPACE_OID, product_id.as_bytes()).to_string(),
        )
    }

    fn to_point(&self, product: &Product) -> CatalogResult<PointStruct> {
        let vector = product.indexable_vector(self.vector_size)?;

        Ok(PointStruct::new(
            Self::point_id(&product.product_id),
            vector.to_vec(),
            json_to_qdrant_payload(product.payload()),
        ))
    }

    #[allow(deprecated)]
    fn extract_vector(vectors: &Option<qdrant::VectorsOutput>) -> Option<Vec<f32>> {
        match vectors {
            Some(qdrant::VectorsOutput {
                vectors_options: Some(opts),
            }) => match opts {
                qdrant::vectors_output::VectorsOptions::Vector(v) => Some(v.data.clone()),
                qdrant::vectors_output::VectorsOptions::Vectors(map) => {
                    map.vectors.values().next().map(|v| v.data.clone())
                }
            },
            _ => None,
        }
    }
}

fn json_to_qdrant_payload(value: serde_json::Value) -> HashMap<String, QdrantValue> {
    let mut payload = HashMap::new();

    if let serde_json::Value::Object(map) = value {
        for (key, val) in map {
            if let Some(qdrant_val) = json_to_qdrant_value(val) {
                payload.insert(key, qdrant_val);
            }
        }
    }

    payload
}

fn json_to_qdrant_value(val: serde_json::Value) -> Option<QdrantValue> {
    match val {
        // Absent optional fields are simply not stored
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(QdrantValue::from(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(QdrantValue::from(i))
            } else {
                n.as_f64().map(QdrantValue::from)
            }
        }
        serde_json::Value::String(s) => Some(QdrantValue::from(s)),
        other => Some(QdrantValue::from(other.to_string())),
    }
}

fn qdrant_payload_to_json(payload: HashMap<String, QdrantValue>) -> serde_json::Value {
    let mut map = serde_json::Map::new();

    for (key, val) in payload {
        if let Some(json_val) = qdrant_value_to_json(val) {
            map.insert(key, json_val);
        }
    }

    serde_json::Value::Object(map)
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::NullValue(_)) => Some(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => {
            serde_json::Number::from_f64(f).map(serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        _ => None,
    }
}

#[async_trait]
impl ProductRepository for QdrantProductRepository {
    async fn ensure_collection(&self) -> CatalogResult<()> {
        if self.client.collection_exists(&self.collection).await? {
            return Ok(());
        }

        self.client
            .create_collection(CreateCollectionBuilder::new(&self.collection).vectors_config(
                VectorParamsBuilder::new(self.vector_size as u64, Distance::Cosine),
            ))
            .await?;

        tracing::info!(
            collection = %self.collection,
            vector_size = self.vector_size,
            "created product collection"
        );

        Ok(())
    }

    async fn upsert(&self, product: Product) -> CatalogResult<()> {
        let point = self.to_point(&product)?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await?;

        Ok(())
    }

    async fn upsert_batch(&self, products: Vec<Product>) -> CatalogResult<usize> {
        // Validate the whole batch before the single network round trip so
        // a bad product never partially writes
        let points = products
            .iter()
            .map(|product| self.to_point(product))
            .collect::<CatalogResult<Vec<PointStruct>>>()?;

        let count = points.len();
        if count == 0 {
            return Ok(0);
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await?;

        Ok(count)
    }

    async fn get_by_id(
        &self,
        product_id: &str,
        with_vector: bool,
    ) -> CatalogResult<Option<Product>> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, vec![Self::point_id(product_id)])
                    .with_vectors(with_vector)
                    .with_payload(true),
            )
            .await?;

        let Some(point) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let mut product = Product::from_payload(qdrant_payload_to_json(point.payload))?;
        if with_vector {
            product.embedding = Self::extract_vector(&point.vectors);
        }

        Ok(Some(product))
    }

    async fn search_similar(&self, query: SimilarityQuery) -> CatalogResult<Vec<ScoredProduct>> {
        let mut builder =
            SearchPointsBuilder::new(&self.collection, query.vector, query.limit as u64)
                .with_payload(true);

        if let Some(filter) = query.filter {
            builder = builder.filter(Filter::must([Condition::matches(
                filter.field,
                filter.value,
            )]));
        }

        let response = self.client.search_points(builder).await?;

        response
            .result
            .into_iter()
            .map(|point| {
                let product = Product::from_payload(qdrant_payload_to_json(point.payload))?;

                Ok(ScoredProduct {
                    product,
                    distance: 1.0 - point.score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_deterministic() {
        let first = QdrantProductRepository::point_id("B09G9FPGTN");
        let second = QdrantProductRepository::point_id("B09G9FPGTN");
        let other = QdrantProductRepository::point_id("B09G9FPGTX");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_payload_round_trip_through_qdrant_values() {
        let product = Product {
            product_id: "P1".to_string(),
            product_name: "USB-C cable".to_string(),
            main_category: "accessories".to_string(),
            sub_category: "Cables".to_string(),
            ratings: Some(4.0),
            no_of_ratings: Some(10),
            price: "฿199".to_string(),
            price_usd: Some("$6.97".to_string()),
            embedding: Some(vec![0.0; 4]),
        };

        let round_tripped = Product::from_payload(qdrant_payload_to_json(json_to_qdrant_payload(
            product.payload(),
        )))
        .unwrap();

        assert_eq!(round_tripped.product_id, product.product_id);
        assert_eq!(round_tripped.ratings, product.ratings);
        assert_eq!(round_tripped.no_of_ratings, product.no_of_ratings);
        assert_eq!(round_tripped.price_usd, product.price_usd);
    }

    #[test]
    fn test_null_fields_are_dropped_and_default_on_read() {
        let product = Product {
            product_id: "P2".to_string(),
            product_name: "Mystery item".to_string(),
            main_category: "misc".to_string(),
            sub_category: "Unsorted".to_string(),
            ratings: None,
            no_of_ratings: None,
            price: "N/A".to_string(),
            price_usd: None,
            embedding: None,
        };

        let payload = json_to_qdrant_payload(product.payload());
        assert!(!payload.contains_key("ratings"));

        let round_tripped = Product::from_payload(qdrant_payload_to_json(payload)).unwrap();
        assert_eq!(round_tripped.ratings, None);
        assert_eq!(round_tripped.price_usd, None);
    }
}
