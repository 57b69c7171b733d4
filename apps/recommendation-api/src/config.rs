//! Configuration for the recommendation API

use core_config::{env_parse_or_default, server::ServerConfig, FromEnv};
use domain_catalog::QdrantConfig;

pub use core_config::Environment;

/// Application configuration, loaded once at startup
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    /// Recommendation count when the query omits `limit`
    pub default_limit: usize,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let qdrant = QdrantConfig::from_env();
        let default_limit = env_parse_or_default("DEFAULT_RECOMMENDATION_LIMIT", 5)?;

        Ok(Self {
            environment,
            server,
            qdrant,
            default_limit,
        })
    }
}
