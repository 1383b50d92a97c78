//! Write and lookup operations for the embedding index.

use tracing::debug;

use crate::errors::Error;
use crate::fragment::{Fragment, Metadata, UpsertOutcome};
use crate::sqlite;

use super::store::EmbeddingIndex;

impl EmbeddingIndex {
    #[must_use = "handle the error or the write may be lost"]
    /// Embed `text` and store it under `id`, overwriting or rejecting an
    /// existing fragment according to the index's duplicate policy.
    ///
    /// The write is a single SQLite transaction and is durable on return.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `id` is empty (`InvalidInput`)
    /// - The embedder fails, including on empty text (`Embedding`)
    /// - The id exists under the reject policy (`IdentifierCollision`)
    /// - The database write fails (`Storage`)
    pub fn upsert(
        &mut self,
        id: &str,
        text: &str,
        metadata: &Metadata,
    ) -> Result<UpsertOutcome, Error> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Fragment id cannot be empty".to_string(),
            ));
        }

        let embedding = self.embedder.embed(text)?;
        let outcome = match self.db.upsert(
            &self.collection.name,
            id,
            text,
            &embedding,
            self.collection.dimensions,
            metadata,
            self.duplicate_policy,
        ) {
            Err(sqlite::Error::DuplicateId(id)) => return Err(Error::IdentifierCollision(id)),
            result => result?,
        };

        debug!(
            collection = %self.collection.name,
            id,
            ?outcome,
            bytes = text.len(),
            "upserted fragment"
        );
        Ok(outcome)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Get a fragment by id. Returns `None` if it doesn't exist.
    pub fn get(&self, id: &str) -> Result<Option<Fragment>, Error> {
        Ok(self.db.get(&self.collection.name, id)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// List fragments, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if `limit` is 0 or exceeds `MAX_SEARCH_LIMIT`.
    pub fn list(&self, limit: usize) -> Result<Vec<Fragment>, Error> {
        Self::validate_limit(limit)?;
        Ok(self.db.list(&self.collection.name, limit)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Number of fragments in the collection.
    pub fn count(&self) -> Result<usize, Error> {
        Ok(self.db.count(&self.collection.name)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Delete a fragment.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the fragment was deleted
    /// - `Ok(false)` if it didn't exist
    pub fn delete(&self, id: &str) -> Result<bool, Error> {
        let deleted = self.db.delete(&self.collection.name, id)?;
        debug!(collection = %self.collection.name, id, deleted, "delete fragment");
        Ok(deleted)
    }
}
