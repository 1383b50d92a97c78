//! Embedding index store: durable id → (text, embedding, metadata) mapping
//! with nearest-neighbor query.
//!
//! Embeddings are computed here, at the boundary of every upsert and query,
//! so indexed and queried vectors always come from the same embedder.

mod ops;
mod search;

// pub(crate): module internals hidden; public items re-exported explicitly via lib.rs
pub(crate) mod store;

pub use store::{DB_FILE_NAME, DEFAULT_COLLECTION, EmbeddingIndex, IndexOptions, MAX_SEARCH_LIMIT};

#[cfg(test)]
mod tests;
