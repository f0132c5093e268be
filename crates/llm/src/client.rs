use snipvec_common::{Result, SnipvecError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::embedder::Embedder;
use crate::types::{EmbedRequest, EmbedResponse};

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
    max_retries: u32,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| SnipvecError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self {
            base_url,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Override the number of attempts per embedding request (minimum 1)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate embedding with retry and exponential backoff
    async fn embed_with_retry(&self, model: &str, text: &str) -> Result<Vec<f64>> {
        let url = format!("{}/api/embeddings", self.base_url);

        debug!("Generating embedding - Model: {}, Text length: {}", model, text.len());

        let request = EmbedRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        let mut attempt = 1;
        loop {
            match self.try_embed(&url, &request).await {
                Ok(embedding) => {
                    debug!("Received embedding - Dimension: {}", embedding.len());
                    return Ok(embedding);
                }
                Err(e) if attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt - 1));
                    tracing::warn!(
                        "Embedding request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt,
                        self.max_retries,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single attempt to generate embedding
    async fn try_embed(&self, url: &str, request: &EmbedRequest) -> Result<Vec<f64>> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| SnipvecError::network(format!("Failed to send embedding request: {}", e)))?
            .error_for_status()
            .map_err(|e| SnipvecError::embedding(format!("Ollama embedding API error: {}", e)))?;

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SnipvecError::embedding(format!("Failed to parse embedding response: {}", e)))?;

        if result.embedding.is_empty() {
            return Err(SnipvecError::embedding(format!(
                "Empty embedding from Ollama (model '{}')",
                request.model
            )));
        }

        Ok(result.embedding)
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f64>> {
        self.embed_with_retry(model, text).await
    }

    /// Test connection to Ollama
    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SnipvecError::network(format!("Failed to connect to Ollama: {}", e)))?;
        Ok(response.status().is_success())
    }
}
