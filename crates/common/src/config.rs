use crate::error::SnipvecError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_STORE_PATH: &str = "./db/vectors.jsonl";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_EMBEDDING_MODEL: &str = "mxbai-embed-large:latest";
const DEFAULT_LOG_DIR: &str = "./db/log";
const DEFAULT_CHUNK_SEPARATOR: &str = "<!-- SPLIT -->";

/// snipvec application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Journal file backing the vector store
    pub store_path: PathBuf,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Minimum similarity score for search results
    pub search_threshold: f64,

    /// Maximum number of search results
    pub search_max_results: usize,

    /// Marker separating chunks in ingested documents
    pub chunk_separator: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            ollama_base_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_level: "info".to_string(),
            search_threshold: 0.5,
            search_max_results: 2,
            chunk_separator: DEFAULT_CHUNK_SEPARATOR.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, SnipvecError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let config = Self {
            store_path: Self::get_env_path("STORE_PATH").unwrap_or(defaults.store_path),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            search_threshold: Self::get_env_parsed("SEARCH_THRESHOLD")?
                .unwrap_or(defaults.search_threshold),
            search_max_results: Self::get_env_parsed("SEARCH_MAX_RESULTS")?
                .unwrap_or(defaults.search_max_results),
            chunk_separator: std::env::var("CHUNK_SEPARATOR")
                .unwrap_or(defaults.chunk_separator),
        };

        config.validate()?;
        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Parse an environment variable, failing loudly on malformed values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, SnipvecError> {
        match std::env::var(key) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| SnipvecError::config(format!("Invalid value for {}: '{}'", key, raw))),
            Err(_) => Ok(None),
        }
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), SnipvecError> {
        let mut dirs = vec![self.log_dir.clone()];
        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent.to_path_buf());
            }
        }

        for dir in dirs {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    SnipvecError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), SnipvecError> {
        if self.embedding_model.trim().is_empty() {
            return Err(SnipvecError::config("Embedding model name cannot be empty"));
        }

        if !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://") {
            return Err(SnipvecError::config(
                "Ollama base URL must start with http:// or https://"
            ));
        }

        // Cosine scores live in [-1, 1]
        if !(-1.0..=1.0).contains(&self.search_threshold) {
            return Err(SnipvecError::config(format!(
                "Search threshold must be within [-1, 1], got {}",
                self.search_threshold
            )));
        }

        if self.search_max_results == 0 {
            return Err(SnipvecError::config("Search max results must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store_path, PathBuf::from("./db/vectors.jsonl"));
        assert_eq!(config.search_max_results, 2);
        assert_eq!(config.chunk_separator, "<!-- SPLIT -->");
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = AppConfig::default();
        invalid_config.embedding_model = String::new();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.ollama_base_url = "localhost:11434".to_string();
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_validate_search_bounds() {
        let mut config = AppConfig::default();
        config.search_threshold = 1.5;
        assert!(config.validate().is_err());

        config.search_threshold = -1.0;
        assert!(config.validate().is_ok());

        config.search_max_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ensure_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            store_path: tmp.path().join("data").join("vectors.jsonl"),
            log_dir: tmp.path().join("log"),
            ..AppConfig::default()
        };

        config.ensure_directories().unwrap();
        assert!(tmp.path().join("data").is_dir());
        assert!(tmp.path().join("log").is_dir());
    }
}
