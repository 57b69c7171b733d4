mod client;
mod config;

pub use client::QdrantProductRepository;
pub use config::QdrantConfig;
