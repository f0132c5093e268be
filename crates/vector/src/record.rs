use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A text snippet and the embedding that represents it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Record ID (empty until the store assigns one)
    #[serde(default)]
    pub id: String,

    /// Text chunk the embedding represents
    pub prompt: String,

    /// Embedding vector
    pub embedding: Vec<f64>,

    /// Additional metadata, opaque to the store
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Creation time, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Expiry time, informational only (never enforced)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl VectorRecord {
    /// Create a record without an id
    pub fn new(prompt: impl Into<String>, embedding: Vec<f64>) -> Self {
        Self {
            prompt: prompt.into(),
            embedding,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Embedding dimension
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// Search result: a stored record and its cosine score against the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    /// Stored record
    pub record: VectorRecord,

    /// Cosine similarity (-1.0 to 1.0, higher is closer)
    pub score: f64,
}

impl ScoredRecord {
    pub fn new(record: VectorRecord, score: f64) -> Self {
        Self { record, score }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn prompt(&self) -> &str {
        &self.record.prompt
    }

    /// Drop the score and keep the record
    pub fn into_record(self) -> VectorRecord {
        self.record
    }
}
