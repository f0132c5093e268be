use snipvec_common::Result;
use async_trait::async_trait;

/// Common trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for text
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f64>>;

    /// Test connection/availability
    async fn test_connection(&self) -> Result<bool>;
}
