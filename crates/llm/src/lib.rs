//! snipvec embedding integration
//!
//! Ollama embedding client and document splitting

mod chunking;
mod client;
mod embedder;
mod types;

pub use chunking::{chunk_text, split_on_marker, split_paragraphs, TextChunk};
pub use client::OllamaClient;
pub use embedder::Embedder;
pub use types::{EmbedRequest, EmbedResponse};
