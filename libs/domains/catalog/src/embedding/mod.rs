mod fastembed;
mod provider;

pub use self::fastembed::{FastEmbedConfig, FastEmbedProvider};
pub use self::provider::EmbeddingProvider;

#[cfg(test)]
pub use self::provider::MockEmbeddingProvider;
