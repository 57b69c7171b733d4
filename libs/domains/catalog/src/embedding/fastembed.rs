use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use fastembed::{InitOptions, TextEmbedding};

use super::EmbeddingProvider;
use crate::error::{CatalogError, CatalogResult};
use crate::models::EmbeddingModelId;

/// Local embedding provider configuration
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    pub model: EmbeddingModelId,
    /// Directory for downloaded model files; fastembed's default cache
    /// when unset
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
}

impl FastEmbedConfig {
    pub fn new(model: EmbeddingModelId) -> Self {
        Self {
            model,
            cache_dir: None,
            show_download_progress: false,
        }
    }

    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    pub fn from_env() -> CatalogResult<Self> {
        let name =
            std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "all-MiniLM-L6-v2".to_string());

        let model = EmbeddingModelId::from_name(&name)
            .ok_or_else(|| CatalogError::Config(format!("unknown embedding model '{}'", name)))?;

        let cache_dir = std::env::var("MODELS_DIR").ok().map(PathBuf::from);

        Ok(Self {
            model,
            cache_dir,
            show_download_progress: false,
        })
    }
}

/// Embedding provider running sentence-transformer models locally via
/// fastembed (ONNX runtime).
pub struct FastEmbedProvider {
    // The ONNX session is not re-entrant; serialize access
    model: Mutex<TextEmbedding>,
    id: EmbeddingModelId,
}

impl FastEmbedProvider {
    pub fn new(config: FastEmbedConfig) -> CatalogResult<Self> {
        let mut options = InitOptions::new(to_fastembed_model(config.model))
            .with_show_download_progress(config.show_download_progress);

        if let Some(dir) = config.cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options).map_err(|e| {
            CatalogError::Embedding(format!(
                "failed to load embedding model {}: {}",
                config.model.model_name(),
                e
            ))
        })?;

        Ok(Self {
            model: Mutex::new(model),
            id: config.model,
        })
    }
}

fn to_fastembed_model(id: EmbeddingModelId) -> fastembed::EmbeddingModel {
    match id {
        EmbeddingModelId::AllMiniLmL6V2 => fastembed::EmbeddingModel::AllMiniLML6V2,
        EmbeddingModelId::AllMiniLmL12V2 => fastembed::EmbeddingModel::AllMiniLML12V2,
        EmbeddingModelId::BgeSmallEnV15 => fastembed::EmbeddingModel::BGESmallENV15,
        EmbeddingModelId::BgeBaseEnV15 => fastembed::EmbeddingModel::BGEBaseENV15,
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn model_name(&self) -> String {
        self.id.model_name().to_string()
    }

    fn dimension(&self) -> usize {
        self.id.dimension()
    }

    async fn embed(&self, text: &str) -> CatalogResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;

        vectors
            .pop()
            .ok_or_else(|| CatalogError::Embedding("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> CatalogResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let model = self
            .model
            .lock()
            .map_err(|_| CatalogError::Embedding("embedding model lock poisoned".to_string()))?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| CatalogError::Embedding(e.to_string()))
    }
}
