//! snipvec vector store
//!
//! Text snippets with precomputed embeddings, searched by exact cosine similarity.

mod persistence;
mod record;
mod similarity;
mod store;

pub use persistence::{JournalBackend, MemoryBackend, PersistenceBackend};
pub use record::{ScoredRecord, VectorRecord};
pub use similarity::{cosine_score, top_n, validate_lengths};
pub use store::VectorStore;
