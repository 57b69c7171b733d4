/// Qdrant connection and collection configuration.
///
/// Built explicitly at startup and handed to the repository; core logic
/// never reads the environment on its own.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Collection holding the product points
    pub collection: String,
    /// Vector dimensionality fixed at collection creation; every point's
    /// vector length must match
    pub vector_size: usize,
}

impl QdrantConfig {
    pub fn new(url: impl Into<String>, collection: impl Into<String>, vector_size: usize) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout_secs: 30,
            collection: collection.into(),
            vector_size,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn from_env() -> Self {
        let url =
            std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());

        let api_key = std::env::var("QDRANT_API_KEY").ok();

        let timeout_secs = std::env::var("QDRANT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let collection =
            std::env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "products".to_string());

        let vector_size = std::env::var("VECTOR_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(384);

        Self {
            url,
            api_key,
            timeout_secs,
            collection,
            vector_size,
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new("http://localhost:6334", "products", 384)
    }
}
