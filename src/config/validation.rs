//! Configuration validation logic.

use crate::errors::Error;
use crate::index::MAX_SEARCH_LIMIT;
use std::path::Path;

/// Longest accepted collection name.
pub const MAX_COLLECTION_NAME_LEN: usize = 64;

/// Validates configuration values.
pub struct ConfigValidator<'a> {
    pub store_path: &'a Path,
    pub collection: &'a str,
    /// HuggingFace embedding model identifier.
    pub embedding_model: &'a str,
    pub top_k: usize,
}

impl ConfigValidator<'_> {
    /// Validate all configuration values for correctness and constraints.
    ///
    /// Checks that:
    /// - `top_k` is between 1 and `MAX_SEARCH_LIMIT`
    /// - The collection name is 1 to 64 characters of `[A-Za-z0-9_-]`
    /// - Embedding model is not empty
    /// - Store path is not empty
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any validation check fails.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_top_k()?;
        self.validate_collection()?;
        self.validate_embedding_model()?;
        self.validate_store_path()?;

        Ok(())
    }

    fn validate_top_k(&self) -> Result<(), Error> {
        if self.top_k == 0 || self.top_k > MAX_SEARCH_LIMIT {
            return Err(Error::Config(format!(
                "Invalid top_k: {} (must be between 1 and {MAX_SEARCH_LIMIT})",
                self.top_k
            )));
        }

        Ok(())
    }

    fn validate_collection(&self) -> Result<(), Error> {
        if self.collection.is_empty() {
            return Err(Error::Config("Collection name cannot be empty".to_string()));
        }

        if self.collection.len() > MAX_COLLECTION_NAME_LEN {
            return Err(Error::Config(format!(
                "Collection name too long: {} characters (maximum {MAX_COLLECTION_NAME_LEN})",
                self.collection.len()
            )));
        }

        if !self
            .collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "Invalid collection name '{}': use letters, digits, '_' or '-'",
                self.collection
            )));
        }

        Ok(())
    }

    fn validate_embedding_model(&self) -> Result<(), Error> {
        if self.embedding_model.trim().is_empty() {
            return Err(Error::Config("Embedding model cannot be empty".to_string()));
        }

        Ok(())
    }

    fn validate_store_path(&self) -> Result<(), Error> {
        if self.store_path.as_os_str().is_empty() {
            return Err(Error::Config("Store path cannot be empty".to_string()));
        }

        Ok(())
    }
}
