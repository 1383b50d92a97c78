//! Nearest-neighbor query for the embedding index.

use tracing::debug;

use crate::errors::Error;
use crate::fragment::RetrievalResult;

use super::store::EmbeddingIndex;

impl EmbeddingIndex {
    #[must_use = "handle the error or results may be lost"]
    /// Return the `top_k` fragments nearest to `text`, ascending by distance.
    ///
    /// Returns `min(top_k, N)` results for a collection of `N` fragments, for
    /// any `top_k >= 1`. An empty collection yields an empty vector without
    /// running the embedder.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `top_k` is 0 (`InvalidInput`)
    /// - The embedder fails (`Embedding`)
    /// - A stored row cannot be read or decoded (`Storage`)
    pub fn query(&mut self, text: &str, top_k: usize) -> Result<Vec<RetrievalResult>, Error> {
        Self::validate_top_k(top_k)?;

        if self.count()? == 0 {
            debug!(collection = %self.collection.name, "query on empty collection");
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text)?;
        let results = self.db.search(
            &self.collection.name,
            &embedding,
            self.collection.dimensions,
            self.collection.distance_metric,
            top_k,
        )?;

        debug!(
            collection = %self.collection.name,
            top_k,
            returned = results.len(),
            nearest = results.first().map(|r| r.distance),
            "queried index"
        );
        Ok(results)
    }
}
