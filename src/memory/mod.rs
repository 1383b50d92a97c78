//! Retrieval-augmented memory: adapts the embedding index to the agent's
//! query/response vocabulary.
//!
//! `retrieve` is a pass-through to the index with a default fan-out and no
//! relevance threshold. `record` stores a response under an id derived from
//! the (query, response) pair, so recording the same exchange twice
//! overwrites instead of duplicating.

mod id;
mod prompt;

pub use id::fragment_id;
pub use prompt::augment_prompt;

use std::path::Path;

use tracing::info;

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::fragment::{Fragment, Metadata, QUERY_KEY, RetrievalResult, SOURCE_KEY};
use crate::index::{EmbeddingIndex, IndexOptions};

/// Results returned by [`RetrievalMemory::retrieve_default`].
pub const DEFAULT_TOP_K: usize = 3;

/// Question/answer memory over an [`EmbeddingIndex`].
///
/// Error-transparent: every index error reaches the caller unchanged.
pub struct RetrievalMemory {
    index: EmbeddingIndex,
}

impl RetrievalMemory {
    /// Wrap an already-open index.
    pub fn new(index: EmbeddingIndex) -> Self {
        Self { index }
    }

    /// Open the index at `store_dir` and wrap it.
    pub fn open(
        store_dir: &Path,
        embedder: Box<dyn Embedder>,
        options: IndexOptions,
    ) -> Result<Self, Error> {
        Ok(Self::new(EmbeddingIndex::open(store_dir, embedder, options)?))
    }

    #[must_use = "handle the error or results may be lost"]
    /// Past responses nearest to `query`, ascending by distance.
    ///
    /// The embedding is computed over stored response text, so a new query
    /// matches the wording of past answers, not past questions.
    pub fn retrieve(&mut self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>, Error> {
        self.index.query(query, top_k)
    }

    #[must_use = "handle the error or results may be lost"]
    /// [`retrieve`](Self::retrieve) with [`DEFAULT_TOP_K`].
    pub fn retrieve_default(&mut self, query: &str) -> Result<Vec<RetrievalResult>, Error> {
        self.retrieve(query, DEFAULT_TOP_K)
    }

    #[must_use = "handle the error or the exchange may be lost"]
    /// Persist one exchange. Returns the fragment id.
    ///
    /// The fragment text is `response`; metadata carries `source` and `query`.
    ///
    /// # Errors
    ///
    /// Propagates every index error, including `Embedding` for an empty
    /// response and `IdentifierCollision` when the index rejects duplicates.
    pub fn record(&mut self, query: &str, response: &str, source: &str) -> Result<String, Error> {
        let id = fragment_id(query, response);

        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), source.to_string());
        metadata.insert(QUERY_KEY.to_string(), query.to_string());

        let outcome = self.index.upsert(&id, response, &metadata)?;
        info!(id = %id, source, ?outcome, "recorded exchange");
        Ok(id)
    }

    /// Look up a previously recorded exchange by fragment id.
    pub fn get(&self, id: &str) -> Result<Option<Fragment>, Error> {
        self.index.get(id)
    }

    /// Borrow the underlying index.
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Mutably borrow the underlying index.
    pub fn index_mut(&mut self) -> &mut EmbeddingIndex {
        &mut self.index
    }

    /// Close the underlying store.
    pub fn close(self) -> Result<(), Error> {
        self.index.close()
    }
}
