//! Core index struct combining an embedder with SQLite persistence.

use std::path::{Component, Path};

use tracing::info;

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::fragment::{DistanceMetric, DuplicatePolicy};
use crate::sqlite::{CollectionInfo, Database};

/// Maximum allowed list limit.
pub use crate::sqlite::search::MAX_SEARCH_LIMIT;

/// File name of the SQLite database inside the store directory.
pub const DB_FILE_NAME: &str = "index.db";

/// Collection name used when none is configured.
pub const DEFAULT_COLLECTION: &str = "knowledge";

/// Options fixed when an index is opened.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub collection: String,
    /// Only used when the collection is created; an existing collection must match.
    pub distance_metric: DistanceMetric,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            distance_metric: DistanceMetric::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Embedding index over one named collection of a directory-backed store.
///
/// # Mutability Requirements
///
/// `upsert` and `query` take `&mut self` because the embedder mutates
/// internal state while running. This also makes each index a single
/// critical section: share it across threads behind a `Mutex`.
pub struct EmbeddingIndex {
    pub(crate) db: Database,
    pub(crate) embedder: Box<dyn Embedder>,
    pub(crate) collection: CollectionInfo,
    pub(crate) duplicate_policy: DuplicatePolicy,
}

impl EmbeddingIndex {
    /// Open (or create) the store at `store_dir` and the configured collection.
    ///
    /// The database lives at `<store_dir>/index.db`; the directory is created
    /// if missing.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `store_dir` contains `..` components
    /// - The collection name is empty
    /// - The directory or database cannot be created or opened
    /// - The collection exists with a different embedding model, dimensionality
    ///   or distance metric
    pub fn open(
        store_dir: &Path,
        embedder: Box<dyn Embedder>,
        options: IndexOptions,
    ) -> Result<Self, Error> {
        // Path traversal guard: reject parent directory components (works on all platforms)
        if store_dir
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(Error::Config(
                "Invalid store path: contains '..' which may escape the intended directory"
                    .to_string(),
            ));
        }

        if options.collection.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Collection name cannot be empty".to_string(),
            ));
        }

        std::fs::create_dir_all(store_dir).map_err(|e| {
            Error::Config(format!(
                "Failed to create store directory {}: {e}",
                store_dir.display()
            ))
        })?;

        let db = Database::open(&store_dir.join(DB_FILE_NAME))?;
        let collection = db.ensure_collection(
            &options.collection,
            embedder.model_id(),
            embedder.dimensions(),
            options.distance_metric,
        )?;

        info!(
            store = %store_dir.display(),
            collection = %collection.name,
            model = %collection.embedding_model,
            dimensions = collection.dimensions,
            metric = %collection.distance_metric,
            "opened embedding index"
        );

        Ok(EmbeddingIndex {
            db,
            embedder,
            collection,
            duplicate_policy: options.duplicate_policy,
        })
    }

    /// Parameters of the open collection.
    pub fn collection(&self) -> &CollectionInfo {
        &self.collection
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Close the underlying database. Dropping the index also closes it;
    /// this variant reports errors instead of ignoring them.
    pub fn close(self) -> Result<(), Error> {
        Ok(self.db.close()?)
    }

    /// Reject a `top_k` of 0. Any larger value is capped by the collection size.
    pub(crate) fn validate_top_k(top_k: usize) -> Result<(), Error> {
        if top_k == 0 {
            return Err(Error::InvalidInput(
                "top_k must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject a list limit outside `1..=MAX_SEARCH_LIMIT`.
    pub(crate) fn validate_limit(limit: usize) -> Result<(), Error> {
        if limit == 0 || limit > MAX_SEARCH_LIMIT {
            return Err(Error::InvalidInput(format!(
                "Limit must be between 1 and {}, got {}",
                MAX_SEARCH_LIMIT, limit
            )));
        }
        Ok(())
    }
}
