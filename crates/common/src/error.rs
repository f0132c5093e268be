/// snipvec error types
#[derive(Debug, thiserror::Error)]
pub enum SnipvecError {
    /// Two embeddings of different dimensionality were compared
    #[error("Length mismatch: cannot compare a {left}-dimensional vector with a {right}-dimensional vector")]
    LengthMismatch { left: usize, right: usize },

    /// No record stored under the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store holds no records
    #[error("Empty store: no vector records found")]
    EmptyStore,

    /// The persistence backend failed to read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Operation called before `initialize`
    #[error("Vector store is not initialized")]
    NotInitialized,

    /// Embedding service error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Record rejected before reaching the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SnipvecError {
    /// Create length mismatch error
    pub fn length_mismatch(left: usize, right: usize) -> Self {
        Self::LengthMismatch { left, right }
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound(id.into())
    }

    /// Create persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create embedding error
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error is the "store has no records" condition.
    ///
    /// Callers that prefer collection semantics can map this case to an empty result.
    pub fn is_empty_store(&self) -> bool {
        matches!(self, Self::EmptyStore)
    }
}
