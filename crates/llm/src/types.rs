use serde::{Deserialize, Serialize};

/// Ollama embedding request
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    /// Model name (e.g., "mxbai-embed-large:latest")
    pub model: String,

    /// Text to embed
    pub prompt: String,
}

/// Ollama embedding response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    /// Embedding vector
    #[serde(default)]
    pub embedding: Vec<f64>,
}
